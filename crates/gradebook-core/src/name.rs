//! Variable name normalization
//!
//! Formulas refer to grade items by name. Item names are typed by teachers
//! ("Exam 1", " TP Final"), formulas are typed separately ("exam1"), so both
//! sides go through [`variable_key`] before any comparison.

/// Normalize a name into the key used by formula variables.
///
/// Surrounding whitespace is trimmed, inner whitespace is removed and the
/// result is lower-cased.
///
/// ```rust
/// use gradebook_core::variable_key;
///
/// assert_eq!(variable_key("  Exam 1 "), "exam1");
/// assert_eq!(variable_key("abs_td"), "abs_td");
/// ```
pub fn variable_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_and_lowercases() {
        assert_eq!(variable_key("Exam 1"), "exam1");
        assert_eq!(variable_key("\tFinal  Grade\n"), "finalgrade");
        assert_eq!(variable_key("Contrôle Continu"), "contrôlecontinu");
    }

    #[test]
    fn test_empty() {
        assert_eq!(variable_key("   "), "");
    }
}
