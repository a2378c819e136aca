//! # gradebook
//!
//! Grade recalculation for a class gradebook.
//!
//! Grade items can carry a formula over other items and over attendance and
//! behavior counts. This crate keeps the records of those calculated items in
//! sync with their inputs.
//!
//! ## Features
//!
//! - Formula evaluation with `avg`, `min`, `max`, `sum`, `abs`, `round` and `if`
//! - Dependency ordering between calculated items, with cycle detection
//! - Group-scoped items and per-student attendance/behavior aggregates
//! - Fail-soft evaluation: a bad formula stores a fallback score
//! - Storage behind the [`GradebookStore`] trait, with an in-memory store
//! - Per-class serialization of concurrent recalculations
//!
//! ## Example
//!
//! ```rust
//! use gradebook::prelude::*;
//!
//! let class = ClassId(1);
//! let store = InMemoryStore::new(Dataset {
//!     grade_items: vec![
//!         GradeItem::new(GradeItemId(1), class, "Exam 1"),
//!         GradeItem::new(GradeItemId(2), class, "Exam 2"),
//!         GradeItem::new(GradeItemId(3), class, "Average").with_formula("avg(Exam1, Exam2)"),
//!     ],
//!     grade_records: vec![
//!         GradeRecord::new(StudentId(1), GradeItemId(1), 12.0),
//!         GradeRecord::new(StudentId(1), GradeItemId(2), 16.0),
//!     ],
//!     students: vec![Student::new(StudentId(1), class)],
//!     ..Dataset::default()
//! });
//!
//! let stats = RecalculationEngine::default().recalculate(&store, class).unwrap();
//! assert_eq!(stats.inserted, 1);
//!
//! let average = store.grade_record(StudentId(1), GradeItemId(3)).unwrap().unwrap();
//! assert_eq!(average.score, 14.0);
//! ```

pub mod aggregates;
pub mod locks;
pub mod memory;
pub mod prelude;
pub mod recalculation;
pub mod snapshot;
pub mod store;

// Re-export engine types
pub use aggregates::{ClassAggregates, StudentAggregates, SYSTEM_VARIABLES};
pub use locks::{ClassLocks, Recalculator};
pub use memory::{AttendanceEntry, Dataset, InMemoryStore, Session};
pub use recalculation::{
    PlannedWrite, RecalculationEngine, RecalculationOptions, RecalculationPlan,
    RecalculationStats, WriteKind,
};
pub use snapshot::ClassSnapshot;
pub use store::GradebookStore;

// Re-export core types
pub use gradebook_core::{
    is_lecture_session,
    normalize_session_type,
    variable_key,
    // Attendance and behavior
    AttendanceRecordWithType,
    AttendanceStatus,
    BehaviorKind,
    BehaviorRecord,
    // Ids
    ClassId,
    // Error types
    Error,
    // Grades
    GradeItem,
    GradeItemId,
    GradeRecord,
    GradeStatus,
    GroupId,
    RecordId,
    RecordKey,
    Result,
    SessionTotals,
    SessionType,
    Student,
    StudentId,
};

// Re-export formula types
pub use gradebook_formula::{
    check_formula, evaluate, evaluate_str, parse_formula, DependencyGraph, Environment,
    EvaluationContext, Formula, FormulaCheck, FormulaError, FormulaExpr, FormulaResult,
    TopologicalOrder, VariableSource, Variables,
};
