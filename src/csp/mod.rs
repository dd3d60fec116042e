//! Domain-agnostic constraint satisfaction engine

pub mod domain;
pub mod problem;
pub mod solver;

pub use domain::{DomainStore, TrailMark};
pub use problem::{CspError, CspProblem};
pub use solver::{
    AbortReason, Assignment, BacktrackingSolver, SearchLimits, SearchOutcome, SearchReport,
    SearchStatistics,
};
