//! Prelude module - common imports for gradebook users
//!
//! ```rust
//! use gradebook::prelude::*;
//! ```

pub use crate::{
    // Inputs
    AttendanceRecordWithType,
    AttendanceStatus,
    BehaviorRecord,
    ClassId,
    ClassSnapshot,
    Dataset,

    // Error types
    Error,
    // Formulas
    Formula,
    FormulaError,

    GradeItem,
    GradeItemId,
    GradeRecord,
    GradeStatus,
    // Storage
    GradebookStore,
    GroupId,
    InMemoryStore,

    // Engine
    RecalculationEngine,
    RecalculationOptions,
    RecalculationStats,
    Recalculator,
    Result,

    SessionType,
    Student,
    StudentId,
    Variables,
};
