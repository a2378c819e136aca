//! Results do not depend on the order items are declared in

use gradebook::prelude::*;
use proptest::prelude::*;

const CLASS: ClassId = ClassId(1);

fn items() -> Vec<GradeItem> {
    vec![
        GradeItem::new(GradeItemId(1), CLASS, "Exam"),
        GradeItem::new(GradeItemId(2), CLASS, "Step A").with_formula("Exam + 1"),
        GradeItem::new(GradeItemId(3), CLASS, "Step B").with_formula("StepA * 2"),
        GradeItem::new(GradeItemId(4), CLASS, "Step C").with_formula("StepB - pos"),
        GradeItem::new(GradeItemId(5), CLASS, "Summary").with_formula("max(StepA, StepB, StepC)"),
        GradeItem::new(GradeItemId(6), CLASS, "Loop 1").with_formula("Loop2"),
        GradeItem::new(GradeItemId(7), CLASS, "Loop 2").with_formula("Loop1"),
    ]
}

fn snapshot(items: Vec<GradeItem>, exam: f64) -> ClassSnapshot {
    let mut snapshot = ClassSnapshot::new(CLASS);
    snapshot.grade_items = items;
    snapshot.students = vec![Student::new(StudentId(1), CLASS)];
    snapshot.grade_records = vec![GradeRecord::new(StudentId(1), GradeItemId(1), exam)];
    snapshot.behavior = vec![BehaviorRecord::positive(StudentId(1))];
    snapshot
}

fn scores(snapshot: &ClassSnapshot) -> Vec<(i64, f64)> {
    let plan = RecalculationEngine::default().plan(snapshot);
    let mut scores: Vec<(i64, f64)> = plan
        .writes
        .iter()
        .map(|write| (write.record.grade_item_id.get(), write.record.score))
        .collect();
    scores.sort_by_key(|(item, _)| *item);
    scores
}

proptest! {
    #[test]
    fn declaration_order_does_not_matter(
        shuffled in Just(items()).prop_shuffle(),
        exam in 0.0f64..20.0,
    ) {
        let expected = scores(&snapshot(items(), exam));
        prop_assert_eq!(scores(&snapshot(shuffled, exam)), expected);
    }

    #[test]
    fn chain_values_follow_dependencies(exam in 0u32..=20) {
        let exam = f64::from(exam);
        let a = exam + 1.0;
        let b = a * 2.0;
        let c = b - 1.0;
        prop_assert_eq!(
            scores(&snapshot(items(), exam)),
            vec![(2, a), (3, b), (4, c), (5, b)]
        );
    }
}
