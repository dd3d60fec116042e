//! Timetable solving, materialized results and independent validation

pub mod problem;
pub mod solution;
pub mod validator;

pub use problem::{FeasibilityReport, Finding, MappingDomain, SolveReport, SolveStatus, TimetableProblem, Verdict};
pub use solution::{ScheduledSession, Timetable, TimetableMetadata, TimetableSummary, View};
pub use validator::{TimetableValidator, ValidationResult, Violation, ViolationKind};
