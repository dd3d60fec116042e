//! Timetable entities supplied by the caller, and the CSP variable/value types built from them

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ClassId = u32;
pub type SubjectId = u32;
pub type TeacherId = u32;
pub type RoomId = u32;
pub type TimeslotId = u32;

/// Kind of teaching a subject needs and a room provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Theory,
    Lab,
}

/// A group of students taught together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: ClassId,
    #[serde(default)]
    pub name: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: RoomType,
    pub hours_per_week: u32,
    /// Accepted but every session is still placed as a single period
    #[serde(default)]
    pub allow_double_period: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    /// Informational; not consulted when placing sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_load: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RoomType,
    pub capacity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    #[serde(alias = "Monday")]
    Mon,
    #[serde(alias = "Tuesday")]
    Tue,
    #[serde(alias = "Wednesday")]
    Wed,
    #[serde(alias = "Thursday")]
    Thu,
    #[serde(alias = "Friday")]
    Fri,
    #[serde(alias = "Saturday")]
    Sat,
    #[serde(alias = "Sunday")]
    Sun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: TimeslotId,
    pub day: Day,
    pub slot_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_lunch: bool,
}

/// Assignment of a teacher to teach a subject to a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSubject {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    /// Overrides the subject's weekly hours when set
    #[serde(default)]
    pub required_hours: Option<u32>,
}

/// Read-only view of every entity needed for one solve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub classes: Vec<ClassGroup>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub timeslots: Vec<Timeslot>,
    #[serde(default)]
    pub mappings: Vec<ClassSubject>,
}

impl Snapshot {
    pub fn class(&self, id: ClassId) -> Option<&ClassGroup> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn timeslot(&self, id: TimeslotId) -> Option<&Timeslot> {
        self.timeslots.iter().find(|t| t.id == id)
    }

    /// Non-lunch timeslots ordered by day, then slot index
    pub fn teaching_timeslots(&self) -> Vec<&Timeslot> {
        let mut slots: Vec<&Timeslot> = self.timeslots.iter().filter(|t| !t.is_lunch).collect();
        slots.sort_by_key(|t| (t.day, t.slot_index));
        slots
    }
}

/// One required teaching session: the CSP variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Session {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub session_index: u32,
}

/// A candidate placement of a session: the CSP value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub timeslot_id: TimeslotId,
    pub room_id: RoomId,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Theory => write!(f, "theory"),
            RoomType::Lab => write!(f, "lab"),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} / subject {} / teacher {} #{}",
            self.class_id, self.subject_id, self.teacher_id, self.session_index
        )
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} in room {}", self.timeslot_id, self.room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "classes": [{"id": 1, "name": "CSE-2A", "size": 48}],
            "subjects": [{"id": 3, "type": "lab", "hours_per_week": 2, "allow_double_period": true}],
            "rooms": [{"id": 9, "type": "theory", "capacity": 60}],
            "timeslots": [{"id": 4, "day": "Monday", "slot_index": 4, "is_lunch": true}],
            "mappings": [{"class_id": 1, "subject_id": 3, "teacher_id": 2, "required_hours": null}]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.subject(3).unwrap().kind, RoomType::Lab);
        assert_eq!(snapshot.timeslot(4).unwrap().day, Day::Mon);
        assert!(snapshot.teachers.is_empty());
        assert_eq!(snapshot.mappings[0].required_hours, None);
    }

    #[test]
    fn test_teaching_timeslots_skip_lunch_and_sort() {
        let slot = |id, day, slot_index, is_lunch| Timeslot {
            id,
            day,
            slot_index,
            start_time: None,
            end_time: None,
            is_lunch,
        };
        let snapshot = Snapshot {
            timeslots: vec![
                slot(1, Day::Tue, 1, false),
                slot(2, Day::Mon, 2, false),
                slot(3, Day::Mon, 1, true),
                slot(4, Day::Mon, 3, false),
            ],
            ..Snapshot::default()
        };

        let ids: Vec<TimeslotId> = snapshot.teaching_timeslots().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 1]);
    }
}
