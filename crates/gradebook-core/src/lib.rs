//! # gradebook-core
//!
//! Core data structures for the gradebook calculation engine.
//!
//! This crate provides the fundamental types used throughout the workspace:
//! - [`GradeItem`] and [`GradeRecord`] - Gradebook columns and per-student scores
//! - [`Student`] - Class membership and group assignment
//! - [`AttendanceRecordWithType`] and [`BehaviorRecord`] - Inputs to the aggregates
//! - [`variable_key`] - The single name normalization used for formula lookups
//!
//! ## Example
//!
//! ```rust
//! use gradebook_core::{ClassId, GradeItem, GradeItemId};
//!
//! let item = GradeItem::new(GradeItemId(1), ClassId(1), " Final Exam ")
//!     .with_formula("avg(Exam1, Exam2)");
//!
//! assert!(item.is_calculated());
//! assert_eq!(item.variable_name(), "finalexam");
//! ```

pub mod attendance;
pub mod behavior;
pub mod error;
pub mod id;
pub mod item;
pub mod name;
pub mod record;
pub mod student;

// Re-exports for convenience
pub use attendance::{
    is_lecture_session, normalize_session_type, AttendanceRecordWithType, AttendanceStatus,
    SessionTotals, SessionType,
};
pub use behavior::{BehaviorKind, BehaviorRecord};
pub use error::{Error, Result};
pub use id::{ClassId, GradeItemId, GroupId, RecordId, StudentId};
pub use item::GradeItem;
pub use name::variable_key;
pub use record::{GradeRecord, GradeStatus, RecordKey};
pub use student::Student;
