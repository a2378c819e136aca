//! Attendance records joined with their session type
//!
//! Session types and statuses are stored as short codes (`"TD"`, `"TP"`,
//! `"Cours"`; `"P"`, `"A"`, `"E"`, `"L"`). Codes that are not recognized are
//! kept verbatim so they round-trip, but they never count toward an
//! aggregate.

use crate::id::StudentId;
use std::fmt;

/// Kind of session an attendance record belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum SessionType {
    /// Tutorial (travaux dirigés)
    Td,
    /// Lab (travaux pratiques)
    Tp,
    /// Lecture
    Cours,
    Other(String),
}

impl SessionType {
    /// Parse a session type code. Blank codes mean "untyped" and yield `None`.
    pub fn from_code(code: &str) -> Option<SessionType> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        Some(if code.eq_ignore_ascii_case("TD") {
            SessionType::Td
        } else if code.eq_ignore_ascii_case("TP") {
            SessionType::Tp
        } else if code.eq_ignore_ascii_case("COURS") {
            SessionType::Cours
        } else {
            SessionType::Other(code.to_string())
        })
    }

    /// Whether this is a blank code that slipped past [`SessionType::from_code`]
    pub fn is_untyped(&self) -> bool {
        matches!(self, SessionType::Other(code) if code.trim().is_empty())
    }

    /// Canonical code
    pub fn code(&self) -> &str {
        match self {
            SessionType::Td => "TD",
            SessionType::Tp => "TP",
            SessionType::Cours => "Cours",
            SessionType::Other(code) => code,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for SessionType {
    fn from(code: String) -> Self {
        SessionType::from_code(&code).unwrap_or(SessionType::Other(code))
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        value.code().to_string()
    }
}

/// Drop blank session types, so `Some(Other(""))` and `None` mean the same
pub fn normalize_session_type(session_type: Option<SessionType>) -> Option<SessionType> {
    session_type.filter(|session_type| !session_type.is_untyped())
}

/// Lecture sessions, plus sessions recorded without a type
///
/// Shared by everything that counts lectures, so `pres_c` and `tot_c`
/// agree on which sessions they cover.
pub fn is_lecture_session(session_type: Option<&SessionType>) -> bool {
    match session_type {
        None | Some(SessionType::Cours) => true,
        Some(other) => other.is_untyped(),
    }
}

/// Deserialize an optional session type code, reading blank codes as `None`
#[cfg(feature = "serde")]
pub fn deserialize_session_type<'de, D>(deserializer: D) -> Result<Option<SessionType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code.and_then(|code| SessionType::from_code(&code)))
}

/// Attendance status of a student for one session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum AttendanceStatus {
    Present,
    Absent,
    /// Absent with a valid excuse (justified)
    Excused,
    Late,
    Other(String),
}

impl AttendanceStatus {
    /// Parse a status code
    pub fn from_code(code: &str) -> AttendanceStatus {
        match code.trim().to_ascii_uppercase().as_str() {
            "P" => AttendanceStatus::Present,
            "A" => AttendanceStatus::Absent,
            "E" => AttendanceStatus::Excused,
            "L" => AttendanceStatus::Late,
            _ => AttendanceStatus::Other(code.trim().to_string()),
        }
    }

    /// Canonical code
    pub fn code(&self) -> &str {
        match self {
            AttendanceStatus::Present => "P",
            AttendanceStatus::Absent => "A",
            AttendanceStatus::Excused => "E",
            AttendanceStatus::Late => "L",
            AttendanceStatus::Other(code) => code,
        }
    }

    /// Absent, excused or not
    pub fn is_absence(&self) -> bool {
        matches!(self, AttendanceStatus::Absent | AttendanceStatus::Excused)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for AttendanceStatus {
    fn from(code: String) -> Self {
        AttendanceStatus::from_code(&code)
    }
}

impl From<AttendanceStatus> for String {
    fn from(value: AttendanceStatus) -> Self {
        value.code().to_string()
    }
}

/// One attendance entry with the type of its session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttendanceRecordWithType {
    pub student_id: StudentId,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "deserialize_session_type")
    )]
    pub session_type: Option<SessionType>,
    pub status: AttendanceStatus,
}

impl AttendanceRecordWithType {
    /// Build a record from raw codes
    pub fn from_codes(student_id: StudentId, session_type: &str, status: &str) -> Self {
        Self {
            student_id,
            session_type: SessionType::from_code(session_type),
            status: AttendanceStatus::from_code(status),
        }
    }

    /// Lecture sessions, plus sessions recorded without a type
    pub fn is_lecture(&self) -> bool {
        is_lecture_session(self.session_type.as_ref())
    }
}

/// Number of sessions held in a class, by type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionTotals {
    pub td: u32,
    pub tp: u32,
    pub cours: u32,
}
