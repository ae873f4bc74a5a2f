//! Formatting utilities

/// Mask a secret value for display, keeping only the last four characters
/// of long values
pub fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len == 0 {
        "(empty)".to_string()
    } else if len <= 8 {
        "****".to_string()
    } else {
        let tail: String = value.chars().skip(len - 4).collect();
        format!("****{}", tail)
    }
}
