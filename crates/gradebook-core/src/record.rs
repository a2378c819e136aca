//! Grade records (one score per student and item)

use crate::id::{GradeItemId, RecordId, StudentId};

/// Attendance status of a grade record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum GradeStatus {
    #[default]
    Present,
    Absent,
    Missing,
    Excused,
}

/// Identity of a grade record: at most one record per student and item
pub type RecordKey = (StudentId, GradeItemId);

/// A student's score on one grade item
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeRecord {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: RecordId,
    pub student_id: StudentId,
    pub grade_item_id: GradeItemId,
    pub score: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: GradeStatus,
}

impl GradeRecord {
    /// A record not yet saved, with status PRESENT
    pub fn new(student_id: StudentId, grade_item_id: GradeItemId, score: f64) -> Self {
        Self {
            id: RecordId::UNSAVED,
            student_id,
            grade_item_id,
            score,
            status: GradeStatus::Present,
        }
    }

    /// Builder: set the status
    pub fn with_status(mut self, status: GradeStatus) -> Self {
        self.status = status;
        self
    }

    /// Identity key of the record
    pub fn key(&self) -> RecordKey {
        (self.student_id, self.grade_item_id)
    }
}
