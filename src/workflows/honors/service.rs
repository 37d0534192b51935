use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::domain::{
    AcademicLevel, BatchScope, GradingPeriod, GradingPeriodId, PriorStanding,
    QualificationResult, SchoolYear, StudentId,
};
use super::evaluation::{EvaluationEngine, EvaluationError, EvaluationOptions, StudentGrades};
use super::repository::{CriteriaRepository, GradeSource, ResultWriter, SourceError};
use super::snapshot::CriteriaSnapshot;

const DEFAULT_WORKERS: usize = 4;

/// Batch runner composing the grade source, criteria repository, result writer and
/// evaluation engine.
pub struct HonorRollService<G, C, W> {
    grades: Arc<G>,
    criteria: Arc<C>,
    results: Arc<W>,
    engine: Arc<EvaluationEngine>,
    workers: usize,
}

/// Counts reported for a batch. Every active student lands in exactly one of
/// `qualified`, `not_qualified` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub qualified: usize,
    pub not_qualified: usize,
    pub failed: usize,
}

/// A student whose data could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentFailure {
    pub student: StudentId,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub scope: BatchScope,
    pub summary: BatchSummary,
    pub results: Vec<QualificationResult>,
    pub failures: Vec<StudentFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Failures outside per-student work. These abort the batch before anything is written.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to load honor criteria: {0}")]
    Criteria(#[source] SourceError),
    #[error("failed to list active students: {0}")]
    Students(#[source] SourceError),
    #[error("failed to load grading periods: {0}")]
    Calendar(#[source] SourceError),
    #[error("no grading periods configured for {level} {school_year}")]
    MissingCalendar {
        level: AcademicLevel,
        school_year: SchoolYear,
    },
    #[error("grading period {0} is not part of the school calendar")]
    UnknownPeriod(GradingPeriodId),
    #[error("failed to write results: {0}")]
    Write(#[source] SourceError),
    #[error("worker pool failure: {0}")]
    Worker(String),
}

/// Error raised while evaluating a single student.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("evaluation panicked: {0}")]
    Panicked(String),
}

fn panic_message(err: JoinError) -> String {
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

/// Everything a worker needs that is shared by the whole batch.
struct BatchPlan {
    scope: BatchScope,
    snapshot: CriteriaSnapshot,
    periods: Vec<GradingPeriod>,
}

impl BatchPlan {
    fn rank(&self, period: Option<&GradingPeriodId>) -> usize {
        match period {
            None => 0,
            Some(id) => self
                .periods
                .iter()
                .position(|candidate| &candidate.id == id)
                .map_or(usize::MAX, |position| position + 1),
        }
    }

    fn prior_year_standing<W>(
        &self,
        writer: &W,
        student: &StudentId,
    ) -> Result<PriorStanding, SourceError>
    where
        W: ResultWriter + ?Sized,
    {
        if !self.snapshot.requires_history() {
            return Ok(PriorStanding::NoRecord);
        }
        match self.scope.school_year.previous() {
            Some(previous) => writer.prior_standing(student, previous, None),
            None => Ok(PriorStanding::NoRecord),
        }
    }

    /// Comparison scope for a single-scope evaluation: the preceding period of the same
    /// year when one exists, otherwise the previous school year.
    fn prior_standing<W>(&self, writer: &W, student: &StudentId) -> Result<PriorStanding, SourceError>
    where
        W: ResultWriter + ?Sized,
    {
        if !self.snapshot.requires_history() {
            return Ok(PriorStanding::NoRecord);
        }
        if let Some(period) = &self.scope.grading_period {
            let position = self
                .periods
                .iter()
                .position(|candidate| &candidate.id == period);
            if let Some(position) = position.filter(|position| *position > 0) {
                let previous = &self.periods[position - 1].id;
                return writer.prior_standing(student, self.scope.school_year, Some(previous));
            }
        }
        self.prior_year_standing(writer, student)
    }
}

fn evaluate_student<G, W>(
    engine: &EvaluationEngine,
    plan: &BatchPlan,
    grades: &G,
    writer: &W,
    student: &StudentId,
) -> Result<Vec<QualificationResult>, StudentError>
where
    G: GradeSource + ?Sized,
    W: ResultWriter + ?Sized,
{
    let scope = &plan.scope;
    let records = grades.grades(student, scope.level, scope.school_year)?;
    let student_grades = StudentGrades {
        student: student.clone(),
        records,
    };

    if scope.level.is_sequential() {
        let prior = plan.prior_year_standing(writer, student)?;
        let results = engine.evaluate_sequential(
            &plan.snapshot,
            scope.school_year,
            &student_grades,
            &plan.periods,
            scope.grading_period.as_ref(),
            prior,
        )?;
        Ok(results)
    } else {
        let prior = plan.prior_standing(writer, student)?;
        let result = engine.evaluate(
            &plan.snapshot,
            scope.school_year,
            &student_grades,
            scope.grading_period.as_ref(),
            prior,
        )?;
        Ok(vec![result])
    }
}

async fn blocking<T, F>(task: F) -> Result<T, BatchError>
where
    F: FnOnce() -> Result<T, BatchError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| BatchError::Worker(err.to_string()))?
}

impl<G, C, W> HonorRollService<G, C, W>
where
    G: GradeSource + 'static,
    C: CriteriaRepository + 'static,
    W: ResultWriter + 'static,
{
    pub fn new(grades: Arc<G>, criteria: Arc<C>, results: Arc<W>, options: EvaluationOptions) -> Self {
        Self {
            grades,
            criteria,
            results,
            engine: Arc::new(EvaluationEngine::new(options)),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Bounds how many students are evaluated at once.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Snapshot of the criteria a batch for `level` would use, in tier order.
    pub async fn criteria_snapshot(&self, level: AcademicLevel) -> Result<CriteriaSnapshot, BatchError> {
        let criteria = self.criteria.clone();
        let selection = self.engine.options().tier_selection;
        blocking(move || {
            CriteriaSnapshot::capture(criteria.as_ref(), level, selection).map_err(BatchError::Criteria)
        })
        .await
    }

    async fn plan(&self, scope: &BatchScope) -> Result<BatchPlan, BatchError> {
        let snapshot = self.criteria_snapshot(scope.level).await?;

        let level = scope.level;
        let school_year = scope.school_year;
        let needs_calendar = level.is_sequential() || scope.grading_period.is_some();
        let mut periods = if needs_calendar {
            let grades = self.grades.clone();
            blocking(move || {
                grades
                    .grading_periods(level, school_year)
                    .map_err(BatchError::Calendar)
            })
            .await?
        } else {
            Vec::new()
        };
        periods.sort_by_key(|period| period.sequence());

        if level.is_sequential() {
            if periods.is_empty() {
                return Err(BatchError::MissingCalendar { level, school_year });
            }
            if let Some(period) = &scope.grading_period {
                if !periods.iter().any(|candidate| &candidate.id == period) {
                    return Err(BatchError::UnknownPeriod(period.clone()));
                }
            }
        }

        Ok(BatchPlan {
            scope: scope.clone(),
            snapshot,
            periods,
        })
    }

    /// Evaluates every active student in `scope` and replaces the stored results for it.
    /// Students whose evaluation fails, panics included, are reported in `failures` and
    /// keep whatever rows they already had.
    pub async fn run(&self, scope: BatchScope) -> Result<BatchReport, BatchError> {
        let started_at = Utc::now();
        info!(
            level = %scope.level,
            school_year = %scope.school_year,
            period = ?scope.grading_period,
            workers = self.workers,
            "honor batch started"
        );

        let plan = Arc::new(self.plan(&scope).await?);
        if plan.snapshot.is_empty() {
            warn!(level = %scope.level, "no active honor criteria configured");
        }

        let students = {
            let grades = self.grades.clone();
            let level = scope.level;
            let school_year = scope.school_year;
            blocking(move || {
                grades
                    .active_students(level, school_year)
                    .map_err(BatchError::Students)
            })
            .await?
        };

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut assigned: HashMap<Id, StudentId> = HashMap::new();
        for student in students {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|err| BatchError::Worker(err.to_string()))?;
            let engine = self.engine.clone();
            let grades = self.grades.clone();
            let writer = self.results.clone();
            let plan = plan.clone();
            let worker_student = student.clone();
            let handle = tasks.spawn_blocking(move || {
                let _permit = permit;
                evaluate_student(&engine, &plan, grades.as_ref(), writer.as_ref(), &worker_student)
            });
            assigned.insert(handle.id(), student);
        }

        let mut summary = BatchSummary::default();
        let mut results = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(err) if err.is_panic() => {
                    let id = err.id();
                    (id, Err(StudentError::Panicked(panic_message(err))))
                }
                Err(err) => return Err(BatchError::Worker(err.to_string())),
            };
            let student = assigned
                .remove(&id)
                .ok_or_else(|| BatchError::Worker(format!("no student assigned to task {id}")))?;
            summary.processed += 1;
            match outcome {
                Ok(student_results) => {
                    if student_results.iter().any(|result| result.qualified) {
                        summary.qualified += 1;
                    } else {
                        summary.not_qualified += 1;
                    }
                    for result in &student_results {
                        debug!(student = %student, period = ?result.grading_period, "{}", result.summary());
                    }
                    results.extend(student_results);
                }
                Err(err) => {
                    warn!(student = %student, error = %err, "student evaluation failed");
                    summary.failed += 1;
                    failures.push(StudentFailure {
                        student,
                        error: err.to_string(),
                    });
                }
            }
        }

        results.sort_by(|a, b| {
            a.student.cmp(&b.student).then_with(|| {
                plan.rank(a.grading_period.as_ref())
                    .cmp(&plan.rank(b.grading_period.as_ref()))
            })
        });
        failures.sort_by(|a, b| a.student.cmp(&b.student));

        {
            let writer = self.results.clone();
            let scope = scope.clone();
            let rows = results.clone();
            let retained: Vec<StudentId> =
                failures.iter().map(|failure| failure.student.clone()).collect();
            blocking(move || {
                writer
                    .replace_scope(&scope, &rows, &retained)
                    .map_err(BatchError::Write)
            })
            .await?;
        }

        let finished_at = Utc::now();
        info!(
            processed = summary.processed,
            qualified = summary.qualified,
            not_qualified = summary.not_qualified,
            failed = summary.failed,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "honor batch finished"
        );

        Ok(BatchReport {
            scope,
            summary,
            results,
            failures,
            started_at,
            finished_at,
        })
    }
}
