//! End-to-end recalculation against the in-memory store

use gradebook::prelude::*;
use gradebook::{AttendanceEntry, Session};
use pretty_assertions::assert_eq;

const CLASS: ClassId = ClassId(1);

fn raw(id: i64, name: &str) -> GradeItem {
    GradeItem::new(GradeItemId(id), CLASS, name)
}

fn calc(id: i64, name: &str, formula: &str) -> GradeItem {
    raw(id, name).with_formula(formula)
}

fn score(store: &InMemoryStore, student: i64, item: i64) -> Option<f64> {
    store
        .grade_record(StudentId(student), GradeItemId(item))
        .unwrap()
        .map(|record| record.score)
}

fn class_dataset() -> Dataset {
    Dataset {
        grade_items: vec![
            calc(10, "Final", "round(Average * 0.8 + Attendance * 0.2, 2)"),
            raw(1, "Exam 1"),
            raw(2, "Exam 2"),
            calc(11, "Average", "avg(Exam1, Exam2)"),
            calc(12, "Attendance", "if(tot_td > 0, 20 * (tot_td - abs_td + just_td) / tot_td, 20)"),
            calc(13, "Lab", "Exam1 * 2").with_group(GroupId(1)),
        ],
        grade_records: vec![
            GradeRecord::new(StudentId(1), GradeItemId(1), 12.0),
            GradeRecord::new(StudentId(1), GradeItemId(2), 16.0),
            GradeRecord::new(StudentId(2), GradeItemId(1), 8.0),
            GradeRecord::new(StudentId(2), GradeItemId(2), 10.0),
        ],
        students: vec![
            Student::new(StudentId(1), CLASS).with_group(GroupId(1)),
            Student::new(StudentId(2), CLASS).with_group(GroupId(2)),
        ],
        sessions: vec![
            Session::new(1, CLASS, Some(SessionType::Td)),
            Session::new(2, CLASS, Some(SessionType::Td)),
            Session::new(3, CLASS, Some(SessionType::Td)),
            Session::new(4, CLASS, Some(SessionType::Td)),
        ],
        attendance: vec![
            AttendanceEntry {
                session_id: 1,
                student_id: StudentId(2),
                status: AttendanceStatus::Absent,
            },
            AttendanceEntry {
                session_id: 2,
                student_id: StudentId(2),
                status: AttendanceStatus::Excused,
            },
        ],
        behavior: vec![],
    }
}

#[test]
fn test_full_class_recalculation() {
    let store = InMemoryStore::new(class_dataset());
    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    // Student 1: average 14, no absences
    assert_eq!(score(&store, 1, 11), Some(14.0));
    assert_eq!(score(&store, 1, 12), Some(20.0));
    assert_eq!(score(&store, 1, 10), Some(15.2));
    assert_eq!(score(&store, 1, 13), Some(24.0));

    // Student 2: average 9, one unexcused absence out of four sessions
    assert_eq!(score(&store, 2, 11), Some(9.0));
    assert_eq!(score(&store, 2, 12), Some(15.0));
    assert_eq!(score(&store, 2, 10), Some(10.2));
    assert_eq!(score(&store, 2, 13), None);

    assert_eq!(stats.calculated_items, 4);
    assert_eq!(stats.students, 2);
    assert_eq!(stats.evaluations, 7);
    assert_eq!(stats.inserted, 7);
    assert_eq!(stats.fallbacks, 0);
}

#[test]
fn test_recalculation_is_idempotent() {
    let store = InMemoryStore::new(class_dataset());
    let engine = RecalculationEngine::default();

    engine.recalculate(&store, CLASS).unwrap();
    let first = store.dataset().unwrap();

    let stats = engine.recalculate(&store, CLASS).unwrap();
    let second = store.dataset().unwrap();

    assert_eq!(first, second);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.unchanged, 7);
}

#[test]
fn test_no_duplicate_records() {
    let store = InMemoryStore::new(class_dataset());
    let engine = RecalculationEngine::default();
    for _ in 0..3 {
        engine.recalculate(&store, CLASS).unwrap();
    }

    let dataset = store.into_dataset().unwrap();
    let mut keys: Vec<_> = dataset.grade_records.iter().map(|r| r.key()).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_raw_score_change_propagates() {
    let store = InMemoryStore::new(class_dataset());
    let engine = RecalculationEngine::default();
    engine.recalculate(&store, CLASS).unwrap();

    store
        .upsert_grade_record(GradeRecord::new(StudentId(1), GradeItemId(2), 20.0))
        .unwrap();
    let stats = engine.recalculate(&store, CLASS).unwrap();

    assert_eq!(score(&store, 1, 11), Some(16.0));
    assert_eq!(score(&store, 1, 10), Some(16.8));
    assert_eq!(stats.updated, 2);
    assert_eq!(stats.inserted, 0);
}

#[test]
fn test_every_student_gets_a_record() {
    let mut dataset = class_dataset();
    // No raw scores at all for this student
    dataset
        .students
        .push(Student::new(StudentId(3), CLASS).with_group(GroupId(1)));
    let store = InMemoryStore::new(dataset);

    RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(score(&store, 3, 11), Some(0.0));
    assert_eq!(score(&store, 3, 12), Some(20.0));
    assert_eq!(score(&store, 3, 10), Some(4.0));
    assert_eq!(score(&store, 3, 13), Some(0.0));
}

#[test]
fn test_division_by_zero_is_persisted_as_zero() {
    let dataset = Dataset {
        grade_items: vec![calc(1, "Rate", "pres_c / tot_c")],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    };
    let store = InMemoryStore::new(dataset);
    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(score(&store, 1, 1), Some(0.0));
    assert_eq!(stats.fallbacks, 1);
}

#[test]
fn test_parse_failure_only_affects_its_item() {
    let mut dataset = class_dataset();
    dataset.grade_items.push(calc(14, "Broken", "Exam1 +* 2"));
    let store = InMemoryStore::new(dataset);

    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(score(&store, 1, 14), Some(0.0));
    assert_eq!(score(&store, 2, 14), Some(0.0));
    assert_eq!(score(&store, 1, 10), Some(15.2));
    assert_eq!(stats.fallbacks, 2);
}

#[test]
fn test_cycle_leaves_other_items_working() {
    let mut dataset = class_dataset();
    dataset.grade_items.push(calc(20, "Ping", "Pong + 1"));
    dataset.grade_items.push(calc(21, "Pong", "Ping + 1"));
    let store = InMemoryStore::new(dataset);

    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(stats.cyclic_items, 2);
    assert_eq!(score(&store, 1, 20), None);
    assert_eq!(score(&store, 1, 21), None);
    assert_eq!(score(&store, 1, 10), Some(15.2));
}

#[test]
fn test_class_without_formulas_writes_nothing() {
    let dataset = Dataset {
        grade_items: vec![raw(1, "Exam")],
        grade_records: vec![GradeRecord::new(StudentId(1), GradeItemId(1), 10.0)],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    };
    let store = InMemoryStore::new(dataset.clone());

    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(stats, RecalculationStats::default());
    assert_eq!(store.into_dataset().unwrap(), dataset);
}

#[test]
fn test_other_classes_are_untouched() {
    let mut dataset = class_dataset();
    dataset
        .grade_items
        .push(GradeItem::new(GradeItemId(99), ClassId(2), "Other").with_formula("1 + 1"));
    dataset.students.push(Student::new(StudentId(50), ClassId(2)));
    let store = InMemoryStore::new(dataset);

    RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(score(&store, 50, 99), None);
    assert_eq!(score(&store, 1, 99), None);
}

#[test]
fn test_declaration_order_does_not_change_results() {
    for items in [
        vec![calc(1, "A", "B + 1"), calc(2, "B", "10")],
        vec![calc(2, "B", "10"), calc(1, "A", "B + 1")],
    ] {
        let store = InMemoryStore::new(Dataset {
            grade_items: items,
            students: vec![Student::new(StudentId(1), CLASS)],
            ..Dataset::default()
        });
        RecalculationEngine::default()
            .recalculate(&store, CLASS)
            .unwrap();

        assert_eq!(score(&store, 1, 1), Some(11.0));
        assert_eq!(score(&store, 1, 2), Some(10.0));
    }
}

#[test]
fn test_cycle_keeps_stored_values() {
    let store = InMemoryStore::new(Dataset {
        grade_items: vec![calc(1, "A", "B + 1"), calc(2, "B", "A + 1")],
        grade_records: vec![GradeRecord::new(StudentId(1), GradeItemId(1), 7.0)],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    });
    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(stats.evaluations, 0);
    assert_eq!(score(&store, 1, 1), Some(7.0));
    assert_eq!(score(&store, 1, 2), None);
}

#[test]
fn test_non_finite_plan_writes_nothing() {
    let store = InMemoryStore::new(Dataset {
        grade_items: vec![calc(1, "Good", "5"), calc(2, "Bad", "1 / 0")],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    });
    let engine = RecalculationEngine::default();
    let mut plan = engine.plan(&store.load_snapshot(CLASS).unwrap());
    for write in &mut plan.writes {
        if write.record.grade_item_id == GradeItemId(2) {
            write.record.score = f64::NAN;
        }
    }

    assert!(matches!(
        engine.persist(&store, &plan),
        Err(Error::NonFiniteScore { item: GradeItemId(2), .. })
    ));
    assert_eq!(score(&store, 1, 1), None);
    assert_eq!(score(&store, 1, 2), None);
}

#[test]
fn test_nan_fallback_still_writes_every_record() {
    let store = InMemoryStore::new(Dataset {
        grade_items: vec![calc(1, "Good", "5"), calc(2, "Bad", "1 / 0")],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    });
    let engine = RecalculationEngine::new(RecalculationOptions {
        fallback_score: f64::NAN,
        ..RecalculationOptions::default()
    });
    let stats = engine.recalculate(&store, CLASS).unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(score(&store, 1, 1), Some(5.0));
    assert_eq!(score(&store, 1, 2), Some(0.0));
}

#[test]
fn test_deeply_nested_formula_gets_fallback() {
    let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
    let store = InMemoryStore::new(Dataset {
        grade_items: vec![calc(1, "Deep", &deep), calc(2, "Fine", "2 + 2")],
        students: vec![Student::new(StudentId(1), CLASS)],
        ..Dataset::default()
    });
    let stats = RecalculationEngine::default()
        .recalculate(&store, CLASS)
        .unwrap();

    assert_eq!(stats.fallbacks, 1);
    assert_eq!(score(&store, 1, 1), Some(0.0));
    assert_eq!(score(&store, 1, 2), Some(4.0));
}
