//! Weekly school timetabling as a constraint satisfaction problem
//!
//! Sessions (class x subject x teacher x repetition) are placed into
//! (timeslot, room) pairs by a backtracking search with MRV, LCV and
//! forward checking, so that no teacher, class or room is double-booked.

pub mod config;
pub mod csp;
pub mod schedule;
pub mod timetable;
pub mod utils;

pub use config::Settings;
pub use schedule::{SolveReport, SolveStatus, Timetable, TimetableProblem};

use anyhow::Result;

/// Main entry point: load the configured snapshot and search for a timetable
pub fn solve_timetable(settings: Settings) -> Result<SolveReport> {
    let problem = TimetableProblem::new(settings)?;
    problem.solve()
}
