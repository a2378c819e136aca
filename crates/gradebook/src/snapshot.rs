//! Consistent view of one class

use crate::{
    AttendanceRecordWithType, BehaviorRecord, ClassId, GradeItem, GradeRecord, SessionTotals,
    Student,
};

/// Everything the engine reads for one class, taken at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassSnapshot {
    pub class_id: ClassId,
    pub grade_items: Vec<GradeItem>,
    pub grade_records: Vec<GradeRecord>,
    pub students: Vec<Student>,
    pub attendance: Vec<AttendanceRecordWithType>,
    pub behavior: Vec<BehaviorRecord>,
    pub totals: SessionTotals,
}

impl ClassSnapshot {
    /// Empty snapshot for a class
    pub fn new(class_id: ClassId) -> Self {
        Self {
            class_id,
            ..Self::default()
        }
    }

    /// Items carrying a formula, in their stored order
    pub fn calculated_items(&self) -> impl Iterator<Item = &GradeItem> + '_ {
        self.grade_items.iter().filter(|item| item.is_calculated())
    }
}
