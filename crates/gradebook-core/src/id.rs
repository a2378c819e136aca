//! Identifier newtypes
//!
//! Every entity is keyed by a 64-bit row id. Wrapping them keeps a student id
//! from being passed where a grade item id is expected.

use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub i64);

        impl $name {
            /// Raw row id
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Class (course section) id
    ClassId
);
id_type!(
    /// Student id
    StudentId
);
id_type!(
    /// Grade item (gradebook column) id
    GradeItemId
);
id_type!(
    /// Student group id (TD/TP group)
    GroupId
);
id_type!(
    /// Grade record id
    RecordId
);

impl RecordId {
    /// Id carried by a record the store has not saved yet
    pub const UNSAVED: RecordId = RecordId(0);

    /// Whether the store has assigned this id
    pub fn is_saved(self) -> bool {
        self != Self::UNSAVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_conversion() {
        assert_eq!(StudentId::from(42).to_string(), "42");
        assert_eq!(ClassId(7).get(), 7);
    }

    #[test]
    fn test_unsaved_record_id() {
        assert!(!RecordId::UNSAVED.is_saved());
        assert!(RecordId(3).is_saved());
        assert_eq!(RecordId::default(), RecordId::UNSAVED);
    }
}
