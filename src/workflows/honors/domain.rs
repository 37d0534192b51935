use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rules::{self, AdditionalRule};

/// Identifier wrapper for enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for configured honor tiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HonorTypeId(pub String);

/// Identifier wrapper for grading periods (quarters, midterms, pre-finals).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GradingPeriodId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for HonorTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for GradingPeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validation errors for identifiers and option names supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("school year '{0}' must look like 2024-2025")]
    InvalidSchoolYear(String),
    #[error("unknown academic level '{0}'")]
    UnknownAcademicLevel(String),
    #[error("unknown {option} '{value}'")]
    UnknownOption { option: &'static str, value: String },
}

/// Academic year written as `YYYY-YYYY`, where the second year follows the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchoolYear {
    start: u16,
}

impl SchoolYear {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidSchoolYear(raw.to_string());
        let (first, second) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if first.len() != 4 || second.len() != 4 {
            return Err(invalid());
        }
        let start: u16 = first.parse().map_err(|_| invalid())?;
        let end: u16 = second.parse().map_err(|_| invalid())?;
        if start.checked_add(1) != Some(end) {
            return Err(invalid());
        }
        Ok(Self { start })
    }

    pub const fn start_year(self) -> u16 {
        self.start
    }

    /// The school year immediately before this one, used for consistency checks.
    pub fn previous(self) -> Option<Self> {
        let start = self.start.checked_sub(1)?;
        (start >= 1000).then_some(Self { start })
    }
}

impl fmt::Display for SchoolYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

impl FromStr for SchoolYear {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SchoolYear {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchoolYear> for String {
    fn from(value: SchoolYear) -> Self {
        value.to_string()
    }
}

/// Scope an honor tier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HonorScope {
    Basic,
    College,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    Elementary,
    JuniorHigh,
    SeniorHigh,
    College,
}

impl AcademicLevel {
    pub const ALL: [AcademicLevel; 4] = [
        AcademicLevel::Elementary,
        AcademicLevel::JuniorHigh,
        AcademicLevel::SeniorHigh,
        AcademicLevel::College,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AcademicLevel::Elementary => "elementary",
            AcademicLevel::JuniorHigh => "junior_high",
            AcademicLevel::SeniorHigh => "senior_high",
            AcademicLevel::College => "college",
        }
    }

    pub const fn scope(self) -> HonorScope {
        match self {
            AcademicLevel::College => HonorScope::College,
            _ => HonorScope::Basic,
        }
    }

    pub const fn default_scale(self) -> GradeScale {
        match self {
            AcademicLevel::College => GradeScale::CollegePoint,
            _ => GradeScale::Percentage,
        }
    }

    /// Senior high walks its grading periods in order and cascades floor violations.
    pub const fn is_sequential(self) -> bool {
        matches!(self, AcademicLevel::SeniorHigh)
    }
}

impl fmt::Display for AcademicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AcademicLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "elementary" | "elem" => Ok(AcademicLevel::Elementary),
            "junior_high" | "jhs" => Ok(AcademicLevel::JuniorHigh),
            "senior_high" | "shs" => Ok(AcademicLevel::SeniorHigh),
            "college" => Ok(AcademicLevel::College),
            _ => Err(DomainError::UnknownAcademicLevel(s.to_string())),
        }
    }
}

/// Numeric grading scale. Percentage grades improve upward, college point grades improve
/// downward (1.0 is the top mark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeScale {
    Percentage,
    CollegePoint,
}

impl GradeScale {
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            GradeScale::Percentage => (0.0, 100.0),
            GradeScale::CollegePoint => (1.0, 5.0),
        }
    }

    pub fn contains(self, value: f64) -> bool {
        let (low, high) = self.bounds();
        value.is_finite() && value >= low && value <= high
    }

    /// True when `value` is at least as good as `threshold`.
    pub fn meets(self, value: f64, threshold: f64) -> bool {
        match self {
            GradeScale::Percentage => value >= threshold,
            GradeScale::CollegePoint => value <= threshold,
        }
    }

    /// True when `value` is strictly better than `bound`.
    pub fn exceeds(self, value: f64, bound: f64) -> bool {
        match self {
            GradeScale::Percentage => value > bound,
            GradeScale::CollegePoint => value < bound,
        }
    }

    pub fn worst(self, a: f64, b: f64) -> f64 {
        match self {
            GradeScale::Percentage => a.min(b),
            GradeScale::CollegePoint => a.max(b),
        }
    }

    /// Maps a threshold onto an axis where larger always means harder to reach.
    pub fn strictness(self, threshold: f64) -> f64 {
        match self {
            GradeScale::Percentage => threshold,
            GradeScale::CollegePoint => -threshold,
        }
    }
}

/// A named recognition tier such as "With High Honors" or "Dean's List".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HonorType {
    pub id: HonorTypeId,
    pub name: String,
    pub scope: HonorScope,
}

impl HonorType {
    pub fn new(id: &str, name: &str, scope: HonorScope) -> Self {
        Self {
            id: HonorTypeId(id.to_string()),
            name: name.to_string(),
            scope,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Eligibility thresholds for one honor tier at one academic level. `None` leaves a
/// threshold unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HonorCriterion {
    pub level: AcademicLevel,
    pub honor_type: HonorTypeId,
    pub scale: GradeScale,
    #[serde(default)]
    pub min_gpa: Option<f64>,
    #[serde(default)]
    pub max_gpa: Option<f64>,
    #[serde(default)]
    pub min_grade: Option<f64>,
    #[serde(default)]
    pub min_grade_all: Option<f64>,
    #[serde(default)]
    pub min_year: Option<u8>,
    #[serde(default)]
    pub max_year: Option<u8>,
    #[serde(default)]
    pub require_consistent_honor: bool,
    #[serde(
        default,
        deserialize_with = "rules::deserialize_bag",
        serialize_with = "rules::serialize_bag"
    )]
    pub additional_rules: Vec<AdditionalRule>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl HonorCriterion {
    pub fn new(level: AcademicLevel, honor_type: &str) -> Self {
        Self {
            level,
            honor_type: HonorTypeId(honor_type.to_string()),
            scale: level.default_scale(),
            min_gpa: None,
            max_gpa: None,
            min_grade: None,
            min_grade_all: None,
            min_year: None,
            max_year: None,
            require_consistent_honor: false,
            additional_rules: Vec::new(),
            active: true,
        }
    }

    pub fn with_min_gpa(mut self, value: f64) -> Self {
        self.min_gpa = Some(value);
        self
    }

    pub fn with_max_gpa(mut self, value: f64) -> Self {
        self.max_gpa = Some(value);
        self
    }

    pub fn with_min_grade(mut self, value: f64) -> Self {
        self.min_grade = Some(value);
        self
    }

    pub fn with_min_grade_all(mut self, value: f64) -> Self {
        self.min_grade_all = Some(value);
        self
    }

    pub fn with_year_range(mut self, min_year: Option<u8>, max_year: Option<u8>) -> Self {
        self.min_year = min_year;
        self.max_year = max_year;
        self
    }

    pub fn requiring_consistent_honor(mut self) -> Self {
        self.require_consistent_honor = true;
        self
    }

    pub fn with_rule(mut self, rule: AdditionalRule) -> Self {
        self.additional_rules.push(rule);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Effective floor for this criterion: the stricter of `min_grade` and `min_grade_all`.
    pub fn grade_floor(&self) -> Option<f64> {
        match (self.min_grade, self.min_grade_all) {
            (Some(a), Some(b)) => {
                if self.scale.strictness(a) >= self.scale.strictness(b) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (floor, None) | (None, floor) => floor,
        }
    }
}

/// Bounded subdivision of a school year. Chronological order is `(semester, term)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingPeriod {
    pub id: GradingPeriodId,
    pub semester: u8,
    pub term: u8,
}

impl GradingPeriod {
    pub fn new(id: &str, semester: u8, term: u8) -> Self {
        Self {
            id: GradingPeriodId(id.to_string()),
            semester,
            term,
        }
    }

    pub const fn sequence(&self) -> (u8, u8) {
        (self.semester, self.term)
    }
}

/// One subject grade as reported by the grade source. `grade: None` is a placeholder row
/// for a grade that has not been encoded yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student: StudentId,
    pub subject: String,
    pub level: AcademicLevel,
    pub school_year: SchoolYear,
    #[serde(default)]
    pub grading_period: Option<GradingPeriodId>,
    pub grade: Option<f64>,
    pub year_of_study: u8,
}

/// Whether a student held an honor in the comparison period used by consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorStanding {
    Qualified,
    NotQualified,
    NoRecord,
}

/// Approval state owned by the external review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Verdict for one student, level, school year and (optionally) grading period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationResult {
    pub student: StudentId,
    pub honor_type: Option<HonorTypeId>,
    pub level: AcademicLevel,
    pub school_year: SchoolYear,
    pub grading_period: Option<GradingPeriodId>,
    pub average: Option<f64>,
    pub qualified: bool,
    pub reason: Option<String>,
    pub approval: ApprovalStatus,
}

impl QualificationResult {
    pub fn key(&self) -> ResultKey {
        ResultKey {
            student: self.student.clone(),
            honor_type: self.honor_type.clone(),
            school_year: self.school_year,
            grading_period: self.grading_period.clone(),
        }
    }

    pub fn summary(&self) -> String {
        match (&self.honor_type, self.qualified, &self.reason) {
            (Some(honor), true, _) => format!("qualified for {honor}"),
            (_, _, Some(reason)) => format!("not qualified: {reason}"),
            _ => "not qualified".to_string(),
        }
    }
}

/// Uniqueness key for persisted results.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub student: StudentId,
    pub honor_type: Option<HonorTypeId>,
    pub school_year: SchoolYear,
    pub grading_period: Option<GradingPeriodId>,
}

/// Level, school year and optional grading period processed by one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchScope {
    pub level: AcademicLevel,
    pub school_year: SchoolYear,
    pub grading_period: Option<GradingPeriodId>,
}

impl BatchScope {
    pub fn new(level: AcademicLevel, school_year: SchoolYear) -> Self {
        Self {
            level,
            school_year,
            grading_period: None,
        }
    }

    pub fn for_period(mut self, period: &str) -> Self {
        self.grading_period = Some(GradingPeriodId(period.to_string()));
        self
    }

    /// True when `result` belongs to the rows this scope replaces. A whole-year scope
    /// covers every period row only for sequential levels, whose whole-year run re-emits
    /// each period; elsewhere it covers just the whole-year row.
    pub fn covers(&self, result: &QualificationResult) -> bool {
        result.level == self.level
            && result.school_year == self.school_year
            && match &self.grading_period {
                Some(period) => result.grading_period.as_ref() == Some(period),
                None if self.level.is_sequential() => true,
                None => result.grading_period.is_none(),
            }
    }
}
