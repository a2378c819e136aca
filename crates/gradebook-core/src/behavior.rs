//! Behavior points

use crate::id::StudentId;

/// Whether a behavior entry counts for or against the student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum BehaviorKind {
    Positive,
    Negative,
}

/// One behavior entry for a student
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BehaviorRecord {
    pub student_id: StudentId,
    pub kind: BehaviorKind,
}

impl BehaviorRecord {
    pub fn positive(student_id: StudentId) -> Self {
        Self {
            student_id,
            kind: BehaviorKind::Positive,
        }
    }

    pub fn negative(student_id: StudentId) -> Self {
        Self {
            student_id,
            kind: BehaviorKind::Negative,
        }
    }
}
