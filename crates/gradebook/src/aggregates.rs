//! System variables computed from attendance and behavior
//!
//! Every formula can read ten system variables next to the item names:
//!
//! | name      | meaning                                             |
//! |-----------|-----------------------------------------------------|
//! | `abs_td`  | TD sessions the student missed (status A or E)      |
//! | `abs_tp`  | TP sessions the student missed (status A or E)      |
//! | `just_td` | TD absences that were excused (status E)            |
//! | `just_tp` | TP absences that were excused (status E)            |
//! | `pres_c`  | lectures attended (Cours or untyped, status P)      |
//! | `tot_td`  | TD sessions held in the class                       |
//! | `tot_tp`  | TP sessions held in the class                       |
//! | `tot_c`   | lecture sessions held in the class                  |
//! | `pos`     | positive behavior entries                           |
//! | `neg`     | negative behavior entries                           |

use crate::{
    AttendanceRecordWithType, AttendanceStatus, BehaviorKind, BehaviorRecord, SessionTotals,
    SessionType, StudentId, Variables,
};
use ahash::AHashMap;

pub const ABS_TD: &str = "abs_td";
pub const ABS_TP: &str = "abs_tp";
pub const JUST_TD: &str = "just_td";
pub const JUST_TP: &str = "just_tp";
pub const PRES_C: &str = "pres_c";
pub const TOT_TD: &str = "tot_td";
pub const TOT_TP: &str = "tot_tp";
pub const TOT_C: &str = "tot_c";
pub const POS: &str = "pos";
pub const NEG: &str = "neg";

/// All system variable names
pub const SYSTEM_VARIABLES: [&str; 10] = [
    ABS_TD, ABS_TP, JUST_TD, JUST_TP, PRES_C, TOT_TD, TOT_TP, TOT_C, POS, NEG,
];

/// Whether `name` (after normalization) is a system variable
pub fn is_system_variable(name: &str) -> bool {
    let key = crate::variable_key(name);
    SYSTEM_VARIABLES.contains(&key.as_str())
}

/// Per-student attendance and behavior counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StudentAggregates {
    pub abs_td: u32,
    pub abs_tp: u32,
    pub just_td: u32,
    pub just_tp: u32,
    pub pres_c: u32,
    pub pos: u32,
    pub neg: u32,
}

impl StudentAggregates {
    /// Count one attendance entry
    pub fn add_attendance(&mut self, record: &AttendanceRecordWithType) {
        let excused = record.status == AttendanceStatus::Excused;
        match record.session_type {
            Some(SessionType::Td) => {
                if record.status.is_absence() {
                    self.abs_td += 1;
                }
                if excused {
                    self.just_td += 1;
                }
            }
            Some(SessionType::Tp) => {
                if record.status.is_absence() {
                    self.abs_tp += 1;
                }
                if excused {
                    self.just_tp += 1;
                }
            }
            _ => {
                if record.is_lecture() && record.status == AttendanceStatus::Present {
                    self.pres_c += 1;
                }
            }
        }
    }

    /// Count one behavior entry
    pub fn add_behavior(&mut self, record: &BehaviorRecord) {
        match record.kind {
            BehaviorKind::Positive => self.pos += 1,
            BehaviorKind::Negative => self.neg += 1,
        }
    }

    /// Bind the ten system variables, replacing any item of the same name
    pub fn bind(&self, totals: &SessionTotals, vars: &mut Variables) {
        let values = [
            (ABS_TD, self.abs_td),
            (ABS_TP, self.abs_tp),
            (JUST_TD, self.just_td),
            (JUST_TP, self.just_tp),
            (PRES_C, self.pres_c),
            (TOT_TD, totals.td),
            (TOT_TP, totals.tp),
            (TOT_C, totals.cours),
            (POS, self.pos),
            (NEG, self.neg),
        ];
        for (name, value) in values {
            vars.insert(name, f64::from(value));
        }
    }
}

/// Aggregates of every student of a class, computed in one pass
#[derive(Debug, Clone, Default)]
pub struct ClassAggregates {
    per_student: AHashMap<StudentId, StudentAggregates>,
}

impl ClassAggregates {
    pub fn compute(attendance: &[AttendanceRecordWithType], behavior: &[BehaviorRecord]) -> Self {
        let mut per_student: AHashMap<StudentId, StudentAggregates> = AHashMap::new();
        for record in attendance {
            per_student
                .entry(record.student_id)
                .or_default()
                .add_attendance(record);
        }
        for record in behavior {
            per_student
                .entry(record.student_id)
                .or_default()
                .add_behavior(record);
        }
        Self { per_student }
    }

    /// Counts for one student; all zero if the student has no entries
    pub fn student(&self, student_id: StudentId) -> StudentAggregates {
        self.per_student
            .get(&student_id)
            .copied()
            .unwrap_or_default()
    }
}
