//! In-memory store
//!
//! [`InMemoryStore`] keeps a whole [`Dataset`] behind an `RwLock`. It backs
//! the command-line tool (datasets are read from and written to JSON) and
//! the tests.

use crate::snapshot::ClassSnapshot;
use crate::store::GradebookStore;
use crate::{
    is_lecture_session, normalize_session_type, AttendanceRecordWithType, AttendanceStatus,
    BehaviorRecord, ClassId, Error, GradeItem, GradeItemId, GradeRecord, RecordId, Result,
    SessionTotals, SessionType, Student, StudentId,
};
use ahash::{AHashMap, AHashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// A session held in a class
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    pub id: i64,
    pub class_id: ClassId,
    /// `None` for sessions recorded without a type
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "gradebook_core::attendance::deserialize_session_type"
        )
    )]
    pub session_type: Option<SessionType>,
}

impl Session {
    pub fn new(id: i64, class_id: ClassId, session_type: Option<SessionType>) -> Self {
        Self {
            id,
            class_id,
            session_type: normalize_session_type(session_type),
        }
    }

    /// Lectures and untyped sessions
    pub fn is_lecture(&self) -> bool {
        is_lecture_session(self.session_type.as_ref())
    }
}

/// Attendance of one student at one session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttendanceEntry {
    pub session_id: i64,
    pub student_id: StudentId,
    pub status: AttendanceStatus,
}

/// Every table the engine reads, for any number of classes
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Dataset {
    pub grade_items: Vec<GradeItem>,
    pub grade_records: Vec<GradeRecord>,
    pub students: Vec<Student>,
    pub sessions: Vec<Session>,
    pub attendance: Vec<AttendanceEntry>,
    pub behavior: Vec<BehaviorRecord>,
}

impl Dataset {
    fn class_items(&self, class_id: ClassId) -> impl Iterator<Item = &GradeItem> + '_ {
        self.grade_items
            .iter()
            .filter(move |item| item.class_id == class_id)
    }

    fn class_sessions(&self, class_id: ClassId) -> impl Iterator<Item = &Session> + '_ {
        self.sessions
            .iter()
            .filter(move |session| session.class_id == class_id)
    }

    fn grade_items_of(&self, class_id: ClassId) -> Vec<GradeItem> {
        self.class_items(class_id).cloned().collect()
    }

    fn grade_records_of(&self, class_id: ClassId) -> Vec<GradeRecord> {
        let items: AHashSet<GradeItemId> = self.class_items(class_id).map(|item| item.id).collect();
        self.grade_records
            .iter()
            .filter(|record| items.contains(&record.grade_item_id))
            .cloned()
            .collect()
    }

    fn students_of(&self, class_id: ClassId) -> Vec<Student> {
        self.students
            .iter()
            .filter(|student| student.class_id == class_id)
            .cloned()
            .collect()
    }

    fn attendance_of(&self, class_id: ClassId) -> Vec<AttendanceRecordWithType> {
        let sessions: AHashMap<i64, &Session> = self
            .class_sessions(class_id)
            .map(|session| (session.id, session))
            .collect();
        self.attendance
            .iter()
            .filter_map(|entry| {
                let session = sessions.get(&entry.session_id)?;
                Some(AttendanceRecordWithType {
                    student_id: entry.student_id,
                    session_type: normalize_session_type(session.session_type.clone()),
                    status: entry.status.clone(),
                })
            })
            .collect()
    }

    fn behavior_of(&self, class_id: ClassId) -> Vec<BehaviorRecord> {
        let students: AHashSet<StudentId> = self
            .students
            .iter()
            .filter(|student| student.class_id == class_id)
            .map(|student| student.id)
            .collect();
        self.behavior
            .iter()
            .filter(|record| students.contains(&record.student_id))
            .cloned()
            .collect()
    }

    fn sessions_of_type(&self, class_id: ClassId, session_type: &SessionType) -> u32 {
        count(
            self.class_sessions(class_id)
                .filter(|session| session.session_type.as_ref() == Some(session_type)),
        )
    }

    fn lecture_sessions(&self, class_id: ClassId) -> u32 {
        count(self.class_sessions(class_id).filter(|session| session.is_lecture()))
    }

    fn next_record_id(&self) -> i64 {
        self.grade_records
            .iter()
            .map(|record| record.id.get())
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn count<T>(iter: impl Iterator<Item = T>) -> u32 {
    u32::try_from(iter.count()).unwrap_or(u32::MAX)
}

#[derive(Debug)]
struct Inner {
    dataset: Dataset,
    next_record_id: i64,
}

/// [`GradebookStore`] over an in-memory [`Dataset`]
#[derive(Debug)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Dataset::default())
    }
}

impl InMemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        let next_record_id = dataset.next_record_id();
        Self {
            inner: RwLock::new(Inner {
                dataset,
                next_record_id,
            }),
        }
    }

    /// Copy of the current contents
    pub fn dataset(&self) -> Result<Dataset> {
        Ok(self.read("dataset")?.dataset.clone())
    }

    /// Take the contents back
    pub fn into_dataset(self) -> Result<Dataset> {
        self.inner
            .into_inner()
            .map(|inner| inner.dataset)
            .map_err(|_| Error::store("into_dataset", "store lock poisoned"))
    }

    /// Record stored for a student and item, if any
    pub fn grade_record(
        &self,
        student_id: StudentId,
        item_id: GradeItemId,
    ) -> Result<Option<GradeRecord>> {
        Ok(self
            .read("grade_record")?
            .dataset
            .grade_records
            .iter()
            .find(|record| record.key() == (student_id, item_id))
            .cloned())
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::store(operation, "store lock poisoned"))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::store(operation, "store lock poisoned"))
    }
}

impl GradebookStore for InMemoryStore {
    fn load_grade_items(&self, class_id: ClassId) -> Result<Vec<GradeItem>> {
        Ok(self.read("load_grade_items")?.dataset.grade_items_of(class_id))
    }

    fn load_grade_records(&self, class_id: ClassId) -> Result<Vec<GradeRecord>> {
        Ok(self.read("load_grade_records")?.dataset.grade_records_of(class_id))
    }

    fn load_students(&self, class_id: ClassId) -> Result<Vec<Student>> {
        Ok(self.read("load_students")?.dataset.students_of(class_id))
    }

    fn load_attendance_with_type(
        &self,
        class_id: ClassId,
    ) -> Result<Vec<AttendanceRecordWithType>> {
        Ok(self
            .read("load_attendance_with_type")?
            .dataset
            .attendance_of(class_id))
    }

    fn load_behavior_records(&self, class_id: ClassId) -> Result<Vec<BehaviorRecord>> {
        Ok(self.read("load_behavior_records")?.dataset.behavior_of(class_id))
    }

    fn count_sessions_by_type(&self, class_id: ClassId, session_type: &SessionType) -> Result<u32> {
        Ok(self
            .read("count_sessions_by_type")?
            .dataset
            .sessions_of_type(class_id, session_type))
    }

    fn count_cours_sessions(&self, class_id: ClassId) -> Result<u32> {
        Ok(self.read("count_cours_sessions")?.dataset.lecture_sessions(class_id))
    }

    fn upsert_grade_record(&self, record: GradeRecord) -> Result<()> {
        let mut inner = self.write("upsert_grade_record")?;

        if !inner
            .dataset
            .grade_items
            .iter()
            .any(|item| item.id == record.grade_item_id)
        {
            return Err(Error::GradeItemNotFound(record.grade_item_id));
        }
        if !inner
            .dataset
            .students
            .iter()
            .any(|student| student.id == record.student_id)
        {
            return Err(Error::StudentNotFound(record.student_id));
        }

        let key = record.key();
        if let Some(existing) = inner
            .dataset
            .grade_records
            .iter_mut()
            .find(|existing| existing.key() == key)
        {
            trace!(id = %existing.id, score = record.score, "updating grade record");
            existing.score = record.score;
            return Ok(());
        }

        let id = RecordId(inner.next_record_id);
        inner.next_record_id += 1;
        trace!(%id, score = record.score, "inserting grade record");
        inner.dataset.grade_records.push(GradeRecord { id, ..record });
        Ok(())
    }

    fn load_snapshot(&self, class_id: ClassId) -> Result<ClassSnapshot> {
        let inner = self.read("load_snapshot")?;
        let dataset = &inner.dataset;
        Ok(ClassSnapshot {
            class_id,
            grade_items: dataset.grade_items_of(class_id),
            grade_records: dataset.grade_records_of(class_id),
            students: dataset.students_of(class_id),
            attendance: dataset.attendance_of(class_id),
            behavior: dataset.behavior_of(class_id),
            totals: SessionTotals {
                td: dataset.sessions_of_type(class_id, &SessionType::Td),
                tp: dataset.sessions_of_type(class_id, &SessionType::Tp),
                cours: dataset.lecture_sessions(class_id),
            },
        })
    }
}
