//! In-process collaborators backing the CLI demo and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    AcademicLevel, BatchScope, GradeRecord, GradingPeriod, GradingPeriodId, HonorCriterion,
    HonorScope, HonorType, PriorStanding, QualificationResult, ResultKey, SchoolYear, StudentId,
};
use super::repository::{CriteriaRepository, GradeSource, ResultWriter, SourceError};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, SourceError> {
    mutex
        .lock()
        .map_err(|_| SourceError::Unavailable("in-memory store lock poisoned".to_string()))
}

type Roster = BTreeMap<(AcademicLevel, SchoolYear), Vec<StudentId>>;
type Calendar = BTreeMap<(AcademicLevel, SchoolYear), Vec<GradingPeriod>>;

#[derive(Debug, Default)]
pub struct InMemoryGradeSource {
    roster: Mutex<Roster>,
    records: Mutex<Vec<GradeRecord>>,
    calendar: Mutex<Calendar>,
}

impl InMemoryGradeSource {
    pub fn enroll(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
        student: &str,
    ) -> Result<(), SourceError> {
        let mut roster = lock(&self.roster)?;
        let students = roster.entry((level, school_year)).or_default();
        let student = StudentId(student.to_string());
        if !students.contains(&student) {
            students.push(student);
        }
        Ok(())
    }

    pub fn record(&self, record: GradeRecord) -> Result<(), SourceError> {
        lock(&self.records)?.push(record);
        Ok(())
    }

    pub fn record_all<I>(&self, records: I) -> Result<(), SourceError>
    where
        I: IntoIterator<Item = GradeRecord>,
    {
        lock(&self.records)?.extend(records);
        Ok(())
    }

    pub fn set_periods(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
        periods: Vec<GradingPeriod>,
    ) -> Result<(), SourceError> {
        lock(&self.calendar)?.insert((level, school_year), periods);
        Ok(())
    }
}

impl GradeSource for InMemoryGradeSource {
    fn active_students(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<StudentId>, SourceError> {
        Ok(lock(&self.roster)?
            .get(&(level, school_year))
            .cloned()
            .unwrap_or_default())
    }

    fn grades(
        &self,
        student: &StudentId,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradeRecord>, SourceError> {
        Ok(lock(&self.records)?
            .iter()
            .filter(|record| {
                &record.student == student
                    && record.level == level
                    && record.school_year == school_year
            })
            .cloned()
            .collect())
    }

    fn grading_periods(
        &self,
        level: AcademicLevel,
        school_year: SchoolYear,
    ) -> Result<Vec<GradingPeriod>, SourceError> {
        Ok(lock(&self.calendar)?
            .get(&(level, school_year))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCriteriaRepository {
    honor_types: Mutex<Vec<HonorType>>,
    criteria: Mutex<Vec<HonorCriterion>>,
}

impl InMemoryCriteriaRepository {
    pub fn add_honor_type(&self, honor_type: HonorType) -> Result<(), SourceError> {
        lock(&self.honor_types)?.push(honor_type);
        Ok(())
    }

    pub fn add_criterion(&self, criterion: HonorCriterion) -> Result<(), SourceError> {
        lock(&self.criteria)?.push(criterion);
        Ok(())
    }

    /// Replaces the active criterion for the same level and honor type, mirroring an
    /// administrator editing thresholds in place.
    pub fn update_criterion(&self, criterion: HonorCriterion) -> Result<(), SourceError> {
        let mut criteria = lock(&self.criteria)?;
        match criteria.iter_mut().find(|existing| {
            existing.active
                && existing.level == criterion.level
                && existing.honor_type == criterion.honor_type
        }) {
            Some(existing) => {
                *existing = criterion;
                Ok(())
            }
            None => Err(SourceError::NotFound(format!(
                "{} criterion for {}",
                criterion.level, criterion.honor_type
            ))),
        }
    }
}

impl CriteriaRepository for InMemoryCriteriaRepository {
    fn honor_types(&self, scope: HonorScope) -> Result<Vec<HonorType>, SourceError> {
        Ok(lock(&self.honor_types)?
            .iter()
            .filter(|honor_type| honor_type.scope == scope)
            .cloned()
            .collect())
    }

    fn criteria(&self, level: AcademicLevel) -> Result<Vec<HonorCriterion>, SourceError> {
        Ok(lock(&self.criteria)?
            .iter()
            .filter(|criterion| criterion.level == level)
            .cloned()
            .collect())
    }
}

/// Result table keyed by level and [`ResultKey`].
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    rows: Mutex<BTreeMap<(AcademicLevel, ResultKey), QualificationResult>>,
}

impl InMemoryResultStore {
    pub fn insert(&self, result: QualificationResult) -> Result<(), SourceError> {
        lock(&self.rows)?.insert((result.level, result.key()), result);
        Ok(())
    }

    pub fn rows(&self) -> Result<Vec<QualificationResult>, SourceError> {
        Ok(lock(&self.rows)?.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, SourceError> {
        Ok(lock(&self.rows)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SourceError> {
        Ok(lock(&self.rows)?.is_empty())
    }
}

impl ResultWriter for InMemoryResultStore {
    fn replace_scope(
        &self,
        scope: &BatchScope,
        results: &[QualificationResult],
        retained: &[StudentId],
    ) -> Result<(), SourceError> {
        let mut rows = lock(&self.rows)?;
        let mut replaced = BTreeMap::new();
        rows.retain(|key, existing| {
            if !scope.covers(existing) || retained.contains(&existing.student) {
                return true;
            }
            replaced.insert(key.clone(), (existing.qualified, existing.approval));
            false
        });
        for result in results {
            let key = (result.level, result.key());
            let mut row = result.clone();
            if let Some((qualified, approval)) = replaced.get(&key) {
                if *qualified == row.qualified {
                    row.approval = *approval;
                }
            }
            rows.insert(key, row);
        }
        Ok(())
    }

    fn prior_standing(
        &self,
        student: &StudentId,
        school_year: SchoolYear,
        period: Option<&GradingPeriodId>,
    ) -> Result<PriorStanding, SourceError> {
        let rows = lock(&self.rows)?;
        let mut standing = PriorStanding::NoRecord;
        for result in rows.values().filter(|result| {
            &result.student == student
                && result.school_year == school_year
                && period.map_or(true, |id| result.grading_period.as_ref() == Some(id))
        }) {
            if result.qualified {
                return Ok(PriorStanding::Qualified);
            }
            standing = PriorStanding::NotQualified;
        }
        Ok(standing)
    }
}
