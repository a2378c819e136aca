//! Grade items (gradebook columns)

use crate::id::{ClassId, GradeItemId, GroupId};
use crate::name::variable_key;

/// A gradebook column.
///
/// An item with a non-blank `formula` is *calculated*: its records are
/// derived by the recalculation engine and never typed in. `group_id` of
/// `None` means the item is shared by every student of the class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeItem {
    pub id: GradeItemId,
    pub class_id: ClassId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default = "default_max_score"))]
    pub max_score: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_weight"))]
    pub weight: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_id: Option<GroupId>,
}

#[cfg(feature = "serde")]
fn default_max_score() -> f64 {
    20.0
}

#[cfg(feature = "serde")]
fn default_weight() -> f64 {
    1.0
}

impl GradeItem {
    /// Create a raw (non-calculated) item scored out of 20 with weight 1
    pub fn new(id: GradeItemId, class_id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id,
            class_id,
            name: name.into(),
            max_score: 20.0,
            weight: 1.0,
            formula: None,
            group_id: None,
        }
    }

    /// Builder: attach a formula
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Builder: restrict the item to one group
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Formula text, if the item is calculated
    pub fn formula(&self) -> Option<&str> {
        self.formula
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// Whether the item's records are derived from a formula
    pub fn is_calculated(&self) -> bool {
        self.formula().is_some()
    }

    /// Whether the item applies to a student of the given group
    pub fn applies_to(&self, student_group: Option<GroupId>) -> bool {
        match self.group_id {
            None => true,
            Some(group) => student_group == Some(group),
        }
    }

    /// Key under which the item's score is visible to formulas
    pub fn variable_name(&self) -> String {
        variable_key(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> GradeItem {
        GradeItem::new(GradeItemId(1), ClassId(1), "Exam 1")
    }

    #[test]
    fn test_calculated_requires_non_blank_formula() {
        assert!(!item().is_calculated());
        assert!(!item().with_formula("   ").is_calculated());
        assert!(item().with_formula(" a + b ").is_calculated());
        assert_eq!(item().with_formula(" a + b ").formula(), Some("a + b"));
    }

    #[test]
    fn test_group_scoping() {
        let shared = item();
        assert!(shared.applies_to(None));
        assert!(shared.applies_to(Some(GroupId(3))));

        let scoped = item().with_group(GroupId(3));
        assert!(scoped.applies_to(Some(GroupId(3))));
        assert!(!scoped.applies_to(Some(GroupId(4))));
        assert!(!scoped.applies_to(None));
    }

    #[test]
    fn test_variable_name() {
        assert_eq!(item().variable_name(), "exam1");
    }
}
