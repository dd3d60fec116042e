//! Errors raised while turning a snapshot into a CSP

use super::entities::{ClassId, RoomType, SubjectId, TeacherId};
use itertools::Itertools;
use thiserror::Error;

/// A single configuration problem found in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotIssue {
    #[error("duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: u32 },

    #[error("mapping #{mapping} references unknown class {class_id}")]
    UnknownClass { mapping: usize, class_id: ClassId },

    #[error("mapping #{mapping} references unknown subject {subject_id}")]
    UnknownSubject { mapping: usize, subject_id: SubjectId },

    #[error("mapping #{mapping} references unknown teacher {teacher_id}")]
    UnknownTeacher { mapping: usize, teacher_id: TeacherId },

    #[error("mapping #{mapping} repeats class {class_id} / subject {subject_id} / teacher {teacher_id}")]
    DuplicateMapping {
        mapping: usize,
        class_id: ClassId,
        subject_id: SubjectId,
        teacher_id: TeacherId,
    },

    #[error("subject {subject_id} needs a {kind} room but the snapshot has none")]
    NoRoomOfType { subject_id: SubjectId, kind: RoomType },

    #[error("class {class_id} (size {size}) fits in no {kind} room for subject {subject_id}")]
    NoRoomWithCapacity {
        class_id: ClassId,
        subject_id: SubjectId,
        kind: RoomType,
        size: u32,
    },

    #[error("snapshot has no non-lunch timeslots")]
    NoTeachingTimeslots,
}

impl SnapshotIssue {
    /// Whether the issue leaves some session with an empty domain, as opposed to a broken reference
    pub fn empties_domain(&self) -> bool {
        matches!(
            self,
            SnapshotIssue::NoRoomOfType { .. }
                | SnapshotIssue::NoRoomWithCapacity { .. }
                | SnapshotIssue::NoTeachingTimeslots
        )
    }
}

/// Malformed input, reported before any search starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("snapshot is not referentially valid: {}", .0.iter().join("; "))]
    Malformed(Vec<SnapshotIssue>),

    #[error("snapshot leaves sessions without any placement: {}", .0.iter().join("; "))]
    EmptyDomains(Vec<SnapshotIssue>),

    #[error(transparent)]
    Csp(#[from] crate::csp::CspError),
}

impl BuildError {
    pub fn issues(&self) -> &[SnapshotIssue] {
        match self {
            BuildError::Malformed(issues) | BuildError::EmptyDomains(issues) => issues,
            BuildError::Csp(_) => &[],
        }
    }
}
