//! Students

use crate::id::{ClassId, GroupId, StudentId};

/// A student enrolled in a class
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Student {
    pub id: StudentId,
    pub class_id: ClassId,
    /// Group selecting which group-scoped items apply
    #[cfg_attr(feature = "serde", serde(default))]
    pub group_id: Option<GroupId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
}

impl Student {
    /// Create a student without a group
    pub fn new(id: StudentId, class_id: ClassId) -> Self {
        Self {
            id,
            class_id,
            group_id: None,
            name: String::new(),
        }
    }

    /// Builder: assign a group
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}
