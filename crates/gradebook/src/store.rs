//! Data layer contract
//!
//! The engine never talks to a database directly. Everything it reads and
//! the one thing it writes go through [`GradebookStore`].

use crate::snapshot::ClassSnapshot;
use crate::{
    AttendanceRecordWithType, BehaviorRecord, ClassId, GradeItem, GradeRecord, Result,
    SessionTotals, SessionType, Student,
};

/// Storage backend consumed by the recalculation engine
pub trait GradebookStore {
    /// All grade items of a class, calculated or not
    fn load_grade_items(&self, class_id: ClassId) -> Result<Vec<GradeItem>>;

    /// All grade records of a class
    fn load_grade_records(&self, class_id: ClassId) -> Result<Vec<GradeRecord>>;

    /// All students enrolled in a class
    fn load_students(&self, class_id: ClassId) -> Result<Vec<Student>>;

    /// Attendance of the class joined with each session's type
    fn load_attendance_with_type(&self, class_id: ClassId) -> Result<Vec<AttendanceRecordWithType>>;

    /// Behavior entries of the class's students
    fn load_behavior_records(&self, class_id: ClassId) -> Result<Vec<BehaviorRecord>>;

    /// Number of sessions of the given type held in the class
    fn count_sessions_by_type(&self, class_id: ClassId, session_type: &SessionType) -> Result<u32>;

    /// Number of lecture sessions held in the class
    fn count_cours_sessions(&self, class_id: ClassId) -> Result<u32>;

    /// Insert the record if none exists for its (student, item) key,
    /// otherwise update the existing record's score only
    fn upsert_grade_record(&self, record: GradeRecord) -> Result<()>;

    /// Read everything the engine needs for one class.
    ///
    /// Stores that can read under a single transaction or lock should
    /// override this so the snapshot is consistent.
    fn load_snapshot(&self, class_id: ClassId) -> Result<ClassSnapshot> {
        Ok(ClassSnapshot {
            class_id,
            grade_items: self.load_grade_items(class_id)?,
            grade_records: self.load_grade_records(class_id)?,
            students: self.load_students(class_id)?,
            attendance: self.load_attendance_with_type(class_id)?,
            behavior: self.load_behavior_records(class_id)?,
            totals: SessionTotals {
                td: self.count_sessions_by_type(class_id, &SessionType::Td)?,
                tp: self.count_sessions_by_type(class_id, &SessionType::Tp)?,
                cours: self.count_cours_sessions(class_id)?,
            },
        })
    }
}

impl<S: GradebookStore + ?Sized> GradebookStore for &S {
    fn load_grade_items(&self, class_id: ClassId) -> Result<Vec<GradeItem>> {
        (**self).load_grade_items(class_id)
    }

    fn load_grade_records(&self, class_id: ClassId) -> Result<Vec<GradeRecord>> {
        (**self).load_grade_records(class_id)
    }

    fn load_students(&self, class_id: ClassId) -> Result<Vec<Student>> {
        (**self).load_students(class_id)
    }

    fn load_attendance_with_type(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<AttendanceRecordWithType>> {
        (**self).load_attendance_with_type(class_id)
    }

    fn load_behavior_records(&self, class_id: ClassId) -> Result<Vec<BehaviorRecord>> {
        (**self).load_behavior_records(class_id)
    }

    fn count_sessions_by_type(&self, class_id: ClassId, session_type: &SessionType) -> Result<u32> {
        (**self).count_sessions_by_type(class_id, session_type)
    }

    fn count_cours_sessions(&self, class_id: ClassId) -> Result<u32> {
        (**self).count_cours_sessions(class_id)
    }

    fn upsert_grade_record(&self, record: GradeRecord) -> Result<()> {
        (**self).upsert_grade_record(record)
    }

    fn load_snapshot(&self, class_id: ClassId) -> Result<ClassSnapshot> {
        (**self).load_snapshot(class_id)
    }
}
