//! Fixed prompt template for alignment justifications.

/// Instruction preceding the controls.
pub const INSTRUCTION: &str = "Given the following source cybersecurity control and a set of target controls, \
briefly explain why they are conceptually aligned. Identify any notable gaps as well.";

/// Render the prompt for one source control and its matched targets.
///
/// ```
/// let prompt = ctrlmap_justify::build_prompt("Enforce MFA", &["MFA for admins".to_string()]);
/// assert!(prompt.ends_with("Justification and Gap:"));
/// ```
pub fn build_prompt(source_requirement: &str, target_requirements: &[String]) -> String {
    let targets = target_requirements
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{INSTRUCTION}\n\nSource Control:\n{source_requirement}\n\nTarget Controls:\n{targets}\n\nJustification and Gap:"
    )
}
