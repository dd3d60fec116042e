//! Timetable entities and their formulation as a constraint satisfaction problem

pub mod builder;
pub mod entities;
pub mod error;
pub mod io;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{consistent, ProblemBuilder};
pub use entities::{
    ClassGroup, ClassId, ClassSubject, Day, Placement, Room, RoomId, RoomType, Session, Snapshot,
    Subject, SubjectId, Teacher, TeacherId, Timeslot, TimeslotId,
};
pub use error::{BuildError, SnapshotIssue};
pub use io::{create_sample_snapshots, load_snapshot_from_file, sample_snapshot, save_snapshot_to_file};
