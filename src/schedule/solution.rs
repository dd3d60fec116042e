//! Materialized timetables

use crate::csp::{Assignment, SearchStatistics};
use crate::timetable::{ClassId, Placement, RoomId, Session, SubjectId, TeacherId, TimeslotId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// One session placed in a timeslot and room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledSession {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub session_index: u32,
    pub timeslot_id: TimeslotId,
    pub room_id: RoomId,
    /// Always false: double periods are not formed
    #[serde(default)]
    pub is_double: bool,
}

impl ScheduledSession {
    pub fn session(&self) -> Session {
        Session {
            class_id: self.class_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            session_index: self.session_index,
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            timeslot_id: self.timeslot_id,
            room_id: self.room_id,
        }
    }
}

/// Which slice of a timetable to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Class(ClassId),
    Teacher(TeacherId),
    Room(RoomId),
}

impl View {
    pub fn matches(&self, entry: &ScheduledSession) -> bool {
        match *self {
            View::Class(id) => entry.class_id == id,
            View::Teacher(id) => entry.teacher_id == id,
            View::Room(id) => entry.room_id == id,
        }
    }
}

/// A complete weekly timetable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    /// One entry per generated session, in generation order
    pub entries: Vec<ScheduledSession>,
    pub variable_count: usize,
    /// Time taken by the search
    #[serde(skip)]
    pub solve_time: Duration,
    pub metadata: TimetableMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableMetadata {
    /// Stable identifier derived from the placements
    pub id: String,
    pub timeslots_used: usize,
    pub rooms_used: usize,
    pub search_nodes: u64,
    pub backtracks: u64,
}

/// Compact description of a timetable for listings
#[derive(Debug, Clone, Serialize)]
pub struct TimetableSummary {
    pub id: String,
    pub sessions: usize,
    pub classes: usize,
    pub teachers: usize,
    pub timeslots_used: usize,
    pub rooms_used: usize,
    pub solve_time_ms: u64,
}

impl Timetable {
    /// Build a timetable from a complete assignment
    pub fn from_assignment(
        assignment: &Assignment<Session, Placement>,
        statistics: &SearchStatistics,
    ) -> Self {
        let entries = assignment
            .iter()
            .map(|(session, placement)| ScheduledSession {
                class_id: session.class_id,
                subject_id: session.subject_id,
                teacher_id: session.teacher_id,
                session_index: session.session_index,
                timeslot_id: placement.timeslot_id,
                room_id: placement.room_id,
                is_double: false,
            })
            .collect();

        let mut timetable = Self::new(entries, statistics.elapsed);
        timetable.variable_count = statistics.variable_count;
        timetable.metadata.search_nodes = statistics.nodes;
        timetable.metadata.backtracks = statistics.backtracks;
        log::debug!(
            "Materialized timetable {} with {} sessions",
            timetable.metadata.id,
            timetable.entries.len()
        );
        timetable
    }

    /// Build a timetable from explicit entries
    pub fn new(entries: Vec<ScheduledSession>, solve_time: Duration) -> Self {
        let metadata = TimetableMetadata {
            id: Self::generate_id(&entries),
            timeslots_used: entries.iter().map(|e| e.timeslot_id).unique().count(),
            rooms_used: entries.iter().map(|e| e.room_id).unique().count(),
            search_nodes: 0,
            backtracks: 0,
        };

        Self {
            variable_count: entries.len(),
            entries,
            solve_time,
            metadata,
        }
    }

    /// Entries matching a view, ordered as generated
    pub fn view(&self, view: View) -> Vec<&ScheduledSession> {
        self.entries.iter().filter(|e| view.matches(e)).collect()
    }

    /// Entries placed in a given timeslot
    pub fn at_timeslot(&self, timeslot_id: TimeslotId) -> impl Iterator<Item = &ScheduledSession> {
        self.entries.iter().filter(move |e| e.timeslot_id == timeslot_id)
    }

    /// Whether two timetables place every session identically
    pub fn is_equivalent_to(&self, other: &Timetable) -> bool {
        let mine: HashSet<&ScheduledSession> = self.entries.iter().collect();
        let theirs: HashSet<&ScheduledSession> = other.entries.iter().collect();
        mine == theirs
    }

    pub fn summary(&self) -> TimetableSummary {
        TimetableSummary {
            id: self.metadata.id.clone(),
            sessions: self.entries.len(),
            classes: self.entries.iter().map(|e| e.class_id).unique().count(),
            teachers: self.entries.iter().map(|e| e.teacher_id).unique().count(),
            timeslots_used: self.metadata.timeslots_used,
            rooms_used: self.metadata.rooms_used,
            solve_time_ms: self.solve_time.as_millis() as u64,
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    fn generate_id(entries: &[ScheduledSession]) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        for entry in entries.iter().sorted_by_key(|e| (e.session(), e.placement())) {
            entry.hash(&mut hasher);
        }

        format!("tt_{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(class_id: ClassId, teacher_id: TeacherId, timeslot_id: TimeslotId, room_id: RoomId) -> ScheduledSession {
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

    #[test]
    fn test_timetable_creation() {
        let timetable = Timetable::new(
            vec![entry(1, 1, 1, 1), entry(2, 1, 2, 1), entry(2, 2, 1, 2)],
            Duration::from_millis(12),
        );

        assert!(timetable.metadata.id.starts_with("tt_"));
        assert_eq!(timetable.metadata.timeslots_used, 2);
        assert_eq!(timetable.metadata.rooms_used, 2);
        assert_eq!(timetable.summary().classes, 2);
        assert_eq!(timetable.summary().solve_time_ms, 12);
    }

    #[test]
    fn test_views() {
        let timetable = Timetable::new(
            vec![entry(1, 1, 1, 1), entry(2, 1, 2, 1), entry(2, 2, 1, 2)],
            Duration::ZERO,
        );

        assert_eq!(timetable.view(View::Class(2)).len(), 2);
        assert_eq!(timetable.view(View::Teacher(1)).len(), 2);
        assert_eq!(timetable.view(View::Room(2)), vec![&entry(2, 2, 1, 2)]);
        assert_eq!(timetable.at_timeslot(1).count(), 2);
    }

    #[test]
    fn test_id_ignores_entry_order() {
        let a = Timetable::new(vec![entry(1, 1, 1, 1), entry(2, 2, 1, 2)], Duration::ZERO);
        let b = Timetable::new(vec![entry(2, 2, 1, 2), entry(1, 1, 1, 1)], Duration::ZERO);
        let c = Timetable::new(vec![entry(1, 1, 2, 1), entry(2, 2, 1, 2)], Duration::ZERO);

        assert_eq!(a.metadata.id, b.metadata.id);
        assert!(a.is_equivalent_to(&b));
        assert_ne!(a.metadata.id, c.metadata.id);
        assert!(!a.is_equivalent_to(&c));
    }

    #[test]
    fn test_json_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        let timetable = Timetable::new(vec![entry(1, 1, 1, 1)], Duration::from_secs(1));

        timetable.save_to_file(&path).unwrap();
        let loaded = Timetable::load_from_file(&path).unwrap();

        assert_eq!(loaded.entries, timetable.entries);
        assert_eq!(loaded.metadata.id, timetable.metadata.id);
        assert_eq!(loaded.solve_time, Duration::ZERO);
    }
}
