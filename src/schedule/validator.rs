//! Independent verification of timetables against a snapshot

use super::solution::{ScheduledSession, Timetable};
use crate::timetable::{
    ClassGroup, ClassId, ProblemBuilder, Room, RoomId, Session, Snapshot, Subject, SubjectId, Timeslot,
    TimeslotId,
};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::HashMap;

/// Validates timetables against the snapshot they were built from
pub struct TimetableValidator<'a> {
    snapshot: &'a Snapshot,
    classes: HashMap<ClassId, &'a ClassGroup>,
    subjects: HashMap<SubjectId, &'a Subject>,
    rooms: HashMap<RoomId, &'a Room>,
    timeslots: HashMap<TimeslotId, &'a Timeslot>,
}

/// Result of timetable validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub error_message: Option<String>,
    pub details: ValidationDetails,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationDetails {
    pub sessions_expected: usize,
    pub sessions_checked: usize,
    pub timeslots_checked: usize,
    pub validation_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    TeacherDoubleBooked,
    ClassDoubleBooked,
    RoomDoubleBooked,
    RoomTypeMismatch,
    RoomTooSmall,
    LunchPlacement,
    UnknownTimeslot,
    UnknownRoom,
    MissingSession,
    UnexpectedSession,
    DuplicateSession,
}

/// A broken hard constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

impl Violation {
    fn new(kind: ViolationKind, description: String) -> Self {
        Self { kind, description }
    }
}

impl<'a> TimetableValidator<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            classes: snapshot.classes.iter().map(|c| (c.id, c)).collect(),
            subjects: snapshot.subjects.iter().map(|s| (s.id, s)).collect(),
            rooms: snapshot.rooms.iter().map(|r| (r.id, r)).collect(),
            timeslots: snapshot.timeslots.iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Check completeness, room compatibility, lunch exclusion and double booking
    pub fn validate(&self, timetable: &Timetable) -> Result<ValidationResult> {
        let start_time = std::time::Instant::now();

        let expected = ProblemBuilder::new(self.snapshot)
            .context("Cannot validate against a malformed snapshot")?
            .build_variables();

        let mut violations = self.check_completeness(timetable, &expected);
        violations.extend(self.check_placements(timetable));
        violations.extend(self.check_double_booking(timetable));

        let details = ValidationDetails {
            sessions_expected: expected.len(),
            sessions_checked: timetable.entries.len(),
            timeslots_checked: timetable.entries.iter().map(|e| e.timeslot_id).unique().count(),
            validation_time_ms: start_time.elapsed().as_millis() as u64,
        };

        let is_valid = violations.is_empty();
        let error_message = if is_valid {
            None
        } else {
            Some(Self::generate_error_message(&violations))
        };

        Ok(ValidationResult {
            is_valid,
            violations,
            error_message,
            details,
        })
    }

    fn check_completeness(&self, timetable: &Timetable, expected: &[Session]) -> Vec<Violation> {
        let mut violations = Vec::new();
        let placed = timetable.entries.iter().map(ScheduledSession::session).counts();

        for session in expected {
            if !placed.contains_key(session) {
                violations.push(Violation::new(
                    ViolationKind::MissingSession,
                    format!("Session {} is not placed", session),
                ));
            }
        }

        for (session, count) in placed.iter().sorted() {
            if !expected.contains(session) {
                violations.push(Violation::new(
                    ViolationKind::UnexpectedSession,
                    format!("Session {} does not correspond to any mapping", session),
                ));
            }
            if *count > 1 {
                violations.push(Violation::new(
                    ViolationKind::DuplicateSession,
                    format!("Session {} is placed {} times", session, count),
                ));
            }
        }

        violations
    }

    fn check_placements(&self, timetable: &Timetable) -> Vec<Violation> {
        let mut violations = Vec::new();

        for entry in &timetable.entries {
            let session = entry.session();

            match self.timeslots.get(&entry.timeslot_id) {
                None => violations.push(Violation::new(
                    ViolationKind::UnknownTimeslot,
                    format!("Session {} uses unknown timeslot {}", session, entry.timeslot_id),
                )),
                Some(slot) if slot.is_lunch => violations.push(Violation::new(
                    ViolationKind::LunchPlacement,
                    format!("Session {} is placed in lunch slot {} {}", session, slot.day, slot.slot_index),
                )),
                Some(_) => {}
            }

            let Some(room) = self.rooms.get(&entry.room_id) else {
                violations.push(Violation::new(
                    ViolationKind::UnknownRoom,
                    format!("Session {} uses unknown room {}", session, entry.room_id),
                ));
                continue;
            };

            if let Some(subject) = self.subjects.get(&entry.subject_id) {
                if subject.kind != room.kind {
                    violations.push(Violation::new(
                        ViolationKind::RoomTypeMismatch,
                        format!(
                            "Session {} needs a {} room but room {} is {}",
                            session, subject.kind, room.id, room.kind
                        ),
                    ));
                }
            }

            if let Some(class) = self.classes.get(&entry.class_id) {
                if room.capacity < class.size {
                    violations.push(Violation::new(
                        ViolationKind::RoomTooSmall,
                        format!(
                            "Room {} (capacity {}) is too small for class {} (size {})",
                            room.id, room.capacity, class.id, class.size
                        ),
                    ));
                }
            }
        }

        violations
    }

    fn check_double_booking(&self, timetable: &Timetable) -> Vec<Violation> {
        let mut violations = Vec::new();
        let by_timeslot = timetable.entries.iter().into_group_map_by(|e| e.timeslot_id);

        for (timeslot_id, group) in by_timeslot.iter().sorted_by_key(|(id, _)| **id) {
            for (a, b) in group.iter().tuple_combinations() {
                if a.teacher_id == b.teacher_id {
                    violations.push(Violation::new(
                        ViolationKind::TeacherDoubleBooked,
                        format!(
                            "Teacher {} is booked twice in timeslot {} ({} and {})",
                            a.teacher_id,
                            timeslot_id,
                            a.session(),
                            b.session()
                        ),
                    ));
                }
                if a.class_id == b.class_id {
                    violations.push(Violation::new(
                        ViolationKind::ClassDoubleBooked,
                        format!("Class {} is booked twice in timeslot {}", a.class_id, timeslot_id),
                    ));
                }
                if a.room_id == b.room_id {
                    violations.push(Violation::new(
                        ViolationKind::RoomDoubleBooked,
                        format!("Room {} is booked twice in timeslot {}", a.room_id, timeslot_id),
                    ));
                }
            }
        }

        violations
    }

    /// Generate a descriptive error message from the violations
    fn generate_error_message(violations: &[Violation]) -> String {
        let mut message = format!("Found {} violations. ", violations.len());

        for (i, violation) in violations.iter().take(3).enumerate() {
            if i == 0 {
                message.push_str("Examples: ");
            }
            message.push_str(&format!("{}; ", violation.description));
        }

        if violations.len() > 3 {
            message.push_str(&format!("... and {} more", violations.len() - 3));
        }

        message
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result:")?;
        writeln!(f, "  Valid: {}", self.is_valid)?;
        writeln!(
            f,
            "  Sessions: {} placed / {} expected",
            self.details.sessions_checked, self.details.sessions_expected
        )?;
        writeln!(f, "  Timeslots used: {}", self.details.timeslots_checked)?;
        if !self.violations.is_empty() {
            writeln!(f, "  Violations:")?;
            for violation in &self.violations {
                writeln!(f, "    - [{:?}] {}", violation.kind, violation.description)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::fixtures::*;
    use crate::timetable::{Day, RoomType};
    use std::time::Duration;

    fn placed(class_id: ClassId, teacher_id: u32, timeslot_id: TimeslotId, room_id: RoomId) -> ScheduledSession {
        ScheduledSession {
            class_id,
            subject_id: 1,
            teacher_id,
            session_index: 0,
            timeslot_id,
            room_id,
            is_double: false,
        }
    }

    fn kinds(result: &ValidationResult) -> Vec<ViolationKind> {
        result.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_valid_timetable() {
        let snapshot = shared_teacher();
        let timetable = Timetable::new(vec![placed(1, 1, 1, 1), placed(2, 1, 2, 1)], Duration::ZERO);

        let result = TimetableValidator::new(&snapshot).validate(&timetable).unwrap();
        assert!(result.is_valid, "{}", result);
        assert_eq!(result.details.sessions_expected, 2);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn test_teacher_and_room_clash() {
        let mut snapshot = shared_teacher();
        snapshot.rooms.push(room(2, RoomType::Theory, 40));
        let validator = TimetableValidator::new(&snapshot);

        let same_room = Timetable::new(vec![placed(1, 1, 1, 1), placed(2, 1, 1, 1)], Duration::ZERO);
        let result = validator.validate(&same_room).unwrap();
        assert_eq!(
            kinds(&result),
            vec![ViolationKind::TeacherDoubleBooked, ViolationKind::RoomDoubleBooked]
        );

        let other_room = Timetable::new(vec![placed(1, 1, 1, 1), placed(2, 1, 1, 2)], Duration::ZERO);
        let result = validator.validate(&other_room).unwrap();
        assert_eq!(kinds(&result), vec![ViolationKind::TeacherDoubleBooked]);
        assert!(result.error_message.unwrap().starts_with("Found 1 violations"));
    }

    #[test]
    fn test_room_compatibility_and_lunch() {
        let mut snapshot = shared_teacher();
        snapshot.rooms.push(room(2, RoomType::Lab, 40));
        snapshot.rooms.push(room(3, RoomType::Theory, 10));
        snapshot.timeslots.push(slot(3, Day::Mon, 3, true));
        let validator = TimetableValidator::new(&snapshot);

        let timetable = Timetable::new(vec![placed(1, 1, 1, 2), placed(2, 1, 3, 3)], Duration::ZERO);
        let result = validator.validate(&timetable).unwrap();
        assert_eq!(
            kinds(&result),
            vec![
                ViolationKind::RoomTypeMismatch,
                ViolationKind::LunchPlacement,
                ViolationKind::RoomTooSmall
            ]
        );
    }

    #[test]
    fn test_partial_timetable_is_incomplete() {
        let snapshot = shared_teacher();
        let validator = TimetableValidator::new(&snapshot);

        let timetable = Timetable::new(vec![placed(1, 1, 1, 1), placed(1, 1, 2, 9)], Duration::ZERO);
        let result = validator.validate(&timetable).unwrap();
        assert_eq!(
            kinds(&result),
            vec![
                ViolationKind::MissingSession,
                ViolationKind::DuplicateSession,
                ViolationKind::UnknownRoom
            ]
        );
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        let mut snapshot = shared_teacher();
        snapshot.mappings.push(mapping(1, 7, 1));
        let timetable = Timetable::new(Vec::new(), Duration::ZERO);

        assert!(TimetableValidator::new(&snapshot).validate(&timetable).is_err());
    }
}
