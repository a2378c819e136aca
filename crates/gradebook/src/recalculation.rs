//! Grade recalculation engine
//!
//! Derives every calculated grade item of a class from the raw grades,
//! attendance and behavior of its students.
//!
//! A run has three phases:
//!
//! 1. **Load** a [`ClassSnapshot`] from the store.
//! 2. **Plan** ([`RecalculationEngine::plan`]): parse the formulas once,
//!    order calculated items by their references (Kahn's algorithm), then
//!    evaluate every applicable item for every student. This phase is pure.
//! 3. **Persist** the planned inserts and updates through
//!    [`GradebookStore::upsert_grade_record`].
//!
//! Evaluation never aborts a run. A formula that does not parse, references
//! an unknown name or divides by zero stores the fallback score for that
//! student and item; items caught in a reference cycle are skipped.
//!
//! # Example
//!
//! ```rust
//! use gradebook::prelude::*;
//!
//! let class = ClassId(1);
//! let mut snapshot = ClassSnapshot::new(class);
//! snapshot.grade_items = vec![
//!     GradeItem::new(GradeItemId(1), class, "Exam"),
//!     GradeItem::new(GradeItemId(2), class, "Final").with_formula("Exam - abs_td"),
//! ];
//! snapshot.students = vec![Student::new(StudentId(7), class)];
//! snapshot.grade_records = vec![GradeRecord::new(StudentId(7), GradeItemId(1), 15.0)];
//! snapshot.attendance = vec![AttendanceRecordWithType::from_codes(StudentId(7), "TD", "A")];
//!
//! let plan = RecalculationEngine::default().plan(&snapshot);
//! assert_eq!(plan.writes.len(), 1);
//! assert_eq!(plan.writes[0].record.score, 14.0);
//! ```

use crate::aggregates::{is_system_variable, ClassAggregates};
use crate::snapshot::ClassSnapshot;
use crate::store::GradebookStore;
use crate::{
    ClassId, DependencyGraph, Environment, Error, Formula, FormulaError, GradeItem, GradeItemId,
    GradeRecord, RecordKey, Result, Student, Variables,
};
use ahash::AHashMap;
use tracing::{debug, info, warn};

/// Options for a recalculation run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RecalculationOptions {
    /// Score stored when a formula cannot be evaluated (default: 0.0)
    pub fallback_score: f64,
    /// Also write records whose score did not change (default: false)
    pub write_unchanged: bool,
}

impl Default for RecalculationOptions {
    fn default() -> Self {
        Self {
            fallback_score: 0.0,
            write_unchanged: false,
        }
    }
}

/// Statistics from a recalculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecalculationStats {
    /// Number of items carrying a formula
    pub calculated_items: usize,
    /// Number of calculated items that could be ordered
    pub ordered_items: usize,
    /// Number of calculated items skipped because of a reference cycle
    pub cyclic_items: usize,
    /// Number of students processed
    pub students: usize,
    /// Number of (student, item) evaluations
    pub evaluations: usize,
    /// Evaluations that stored the fallback score
    pub fallbacks: usize,
    /// Records created
    pub inserted: usize,
    /// Records whose score changed
    pub updated: usize,
    /// Records left as they were
    pub unchanged: usize,
}

/// What a planned write does to the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteKind {
    /// No record existed for the key
    Insert,
    /// The stored score differs
    Update { previous: f64 },
    /// The stored score is already correct (only planned with `write_unchanged`)
    Unchanged,
}

/// One record to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    pub record: GradeRecord,
    pub kind: WriteKind,
}

/// Outcome of the planning phase
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalculationPlan {
    pub class_id: ClassId,
    /// Calculated items in evaluation order
    pub order: Vec<GradeItemId>,
    /// Calculated items skipped because of a reference cycle
    pub cyclic: Vec<GradeItemId>,
    /// Writes in (student, evaluation order) order
    pub writes: Vec<PlannedWrite>,
    pub stats: RecalculationStats,
}

impl RecalculationPlan {
    /// Whether the plan writes nothing
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A calculated item with its formula parsed once for the whole class
struct CompiledItem<'a> {
    item: &'a GradeItem,
    formula: std::result::Result<Formula, FormulaError>,
}

/// The recalculation engine
#[derive(Debug, Clone, Default)]
pub struct RecalculationEngine {
    options: RecalculationOptions,
}

impl RecalculationEngine {
    /// Create an engine. A non-finite fallback score is replaced by 0.
    pub fn new(mut options: RecalculationOptions) -> Self {
        if !options.fallback_score.is_finite() {
            warn!(
                fallback_score = options.fallback_score,
                "fallback score is not finite; using 0"
            );
            options.fallback_score = 0.0;
        }
        Self { options }
    }

    pub fn options(&self) -> &RecalculationOptions {
        &self.options
    }

    /// Load, plan and persist one class
    pub fn recalculate<S>(&self, store: &S, class_id: ClassId) -> Result<RecalculationStats>
    where
        S: GradebookStore + ?Sized,
    {
        debug!(class = %class_id, "loading class snapshot");
        let snapshot = store.load_snapshot(class_id)?;

        let plan = self.plan(&snapshot);
        if plan.is_empty() {
            debug!(class = %class_id, "nothing to write");
        } else {
            self.persist(store, &plan)?;
        }

        let stats = plan.stats;
        info!(
            class = %class_id,
            items = stats.calculated_items,
            cyclic = stats.cyclic_items,
            students = stats.students,
            fallbacks = stats.fallbacks,
            inserted = stats.inserted,
            updated = stats.updated,
            unchanged = stats.unchanged,
            "recalculation finished"
        );
        Ok(stats)
    }

    /// Compute every write of a run without touching a store
    pub fn plan(&self, snapshot: &ClassSnapshot) -> RecalculationPlan {
        let mut plan = RecalculationPlan {
            class_id: snapshot.class_id,
            ..RecalculationPlan::default()
        };

        // Phase 1: Parse formulas
        let compiled = compile_items(snapshot);
        plan.stats.calculated_items = compiled.len();
        if compiled.is_empty() {
            debug!(class = %snapshot.class_id, "class has no calculated items");
            return plan;
        }

        // Phase 2: Order by references
        let sorted = dependency_graph(&compiled).topological_order();
        if !sorted.cyclic.is_empty() {
            warn!(
                class = %snapshot.class_id,
                items = ?sorted.cyclic,
                "circular references between calculated items; skipping them"
            );
        }
        plan.stats.ordered_items = sorted.order.len();
        plan.stats.cyclic_items = sorted.cyclic.len();

        let by_id: AHashMap<GradeItemId, &CompiledItem<'_>> = compiled
            .iter()
            .map(|compiled| (compiled.item.id, compiled))
            .collect();
        let ordered: Vec<&CompiledItem<'_>> = sorted
            .order
            .iter()
            .filter_map(|id| by_id.get(id).copied())
            .collect();
        plan.order = sorted.order;
        plan.cyclic = sorted.cyclic;

        // Phase 3: Evaluate per student
        let mut records: AHashMap<RecordKey, &GradeRecord> = AHashMap::new();
        for record in &snapshot.grade_records {
            records.entry(record.key()).or_insert(record);
        }
        for item in &snapshot.grade_items {
            if is_system_variable(&item.name) {
                warn!(
                    item = %item.id,
                    name = %item.name,
                    "item name is hidden by the system variable of the same name"
                );
            }
        }
        let aggregates = ClassAggregates::compute(&snapshot.attendance, &snapshot.behavior);

        for student in &snapshot.students {
            plan.stats.students += 1;

            let mut seed = seed_variables(student, &snapshot.grade_items, &records);
            aggregates
                .student(student.id)
                .bind(&snapshot.totals, &mut seed);
            let mut env = Environment::new(seed);

            for compiled in &ordered {
                let item = compiled.item;
                if !item.applies_to(student.group_id) {
                    continue;
                }

                let score = self.evaluate_item(compiled, student, &env, &mut plan.stats);
                env = env.with_value(&item.name, score);

                if let Some(write) = self.reconcile(student, item, score, &records, &mut plan.stats)
                {
                    plan.writes.push(write);
                }
            }
        }

        plan
    }

    /// Apply the planned writes
    ///
    /// The whole plan is checked before the first write, so a plan holding a
    /// non-finite score leaves the store untouched.
    pub fn persist<S>(&self, store: &S, plan: &RecalculationPlan) -> Result<()>
    where
        S: GradebookStore + ?Sized,
    {
        if let Some(write) = plan.writes.iter().find(|w| !w.record.score.is_finite()) {
            let record = &write.record;
            return Err(Error::NonFiniteScore {
                student: record.student_id,
                item: record.grade_item_id,
                score: record.score,
            });
        }

        debug!(class = %plan.class_id, writes = plan.writes.len(), "persisting grade records");
        for write in &plan.writes {
            store.upsert_grade_record(write.record.clone())?;
        }
        Ok(())
    }

    fn evaluate_item(
        &self,
        compiled: &CompiledItem<'_>,
        student: &Student,
        env: &Environment,
        stats: &mut RecalculationStats,
    ) -> f64 {
        stats.evaluations += 1;
        let item = compiled.item;

        let result = match &compiled.formula {
            Ok(formula) => formula.evaluate(env),
            Err(e) => Err(e.clone()),
        };

        match result {
            Ok(value) => value,
            Err(e) => {
                stats.fallbacks += 1;
                if e.is_syntax() {
                    debug!(
                        student = %student.id,
                        item = %item.id,
                        "formula does not parse; using fallback score"
                    );
                } else {
                    warn!(
                        student = %student.id,
                        item = %item.id,
                        name = %item.name,
                        error = %e,
                        "formula evaluation failed; using fallback score"
                    );
                }
                self.options.fallback_score
            }
        }
    }

    fn reconcile(
        &self,
        student: &Student,
        item: &GradeItem,
        score: f64,
        records: &AHashMap<RecordKey, &GradeRecord>,
        stats: &mut RecalculationStats,
    ) -> Option<PlannedWrite> {
        match records.get(&(student.id, item.id)) {
            None => {
                stats.inserted += 1;
                Some(PlannedWrite {
                    record: GradeRecord::new(student.id, item.id, score),
                    kind: WriteKind::Insert,
                })
            }
            Some(existing) if existing.score != score => {
                stats.updated += 1;
                let mut record = (*existing).clone();
                record.score = score;
                Some(PlannedWrite {
                    record,
                    kind: WriteKind::Update {
                        previous: existing.score,
                    },
                })
            }
            Some(existing) => {
                stats.unchanged += 1;
                self.options.write_unchanged.then(|| PlannedWrite {
                    record: (*existing).clone(),
                    kind: WriteKind::Unchanged,
                })
            }
        }
    }
}

fn compile_items(snapshot: &ClassSnapshot) -> Vec<CompiledItem<'_>> {
    snapshot
        .calculated_items()
        .map(|item| {
            let formula = Formula::parse(item.formula().unwrap_or_default());
            if let Err(e) = &formula {
                warn!(item = %item.id, name = %item.name, error = %e, "invalid formula");
            }
            CompiledItem { item, formula }
        })
        .collect()
}

/// Item A depends on item B when A's formula references B's variable name
fn dependency_graph(compiled: &[CompiledItem<'_>]) -> DependencyGraph<GradeItemId> {
    let mut by_name: AHashMap<String, Vec<GradeItemId>> = AHashMap::new();
    for compiled in compiled {
        by_name
            .entry(compiled.item.variable_name())
            .or_default()
            .push(compiled.item.id);
    }

    let mut graph = DependencyGraph::new();
    for compiled in compiled {
        graph.add_node(compiled.item.id);
    }
    for compiled in compiled {
        let Ok(formula) = &compiled.formula else {
            continue;
        };
        for name in formula.variables() {
            for &precedent in by_name.get(name).into_iter().flatten() {
                graph.add_dependency(precedent, compiled.item.id);
            }
        }
    }
    graph
}

/// Stored scores of the items that apply to the student.
///
/// When two items normalize to the same name the first one keeps it.
fn seed_variables(
    student: &Student,
    items: &[GradeItem],
    records: &AHashMap<RecordKey, &GradeRecord>,
) -> Variables {
    let mut vars = Variables::new();
    for item in items.iter().filter(|item| item.applies_to(student.group_id)) {
        if let Some(record) = records.get(&(student.id, item.id)) {
            vars.insert_if_absent(&item.name, record.score);
        }
    }
    vars
}
