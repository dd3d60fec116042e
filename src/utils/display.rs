//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::schedule::{ScheduledSession, SolveReport, SolveStatus, Timetable, View};
use crate::timetable::{Day, Snapshot};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::path::{Path, PathBuf};

const CELL_WIDTH: usize = 16;

/// Format timetables for display
pub struct TimetableFormatter;

impl TimetableFormatter {
    /// Format a timetable as a chronological listing
    pub fn format_timetable(timetable: &Timetable, snapshot: &Snapshot) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== Timetable {} ===\n", timetable.metadata.id));
        output.push_str(&format!("Sessions: {}\n", timetable.entries.len()));
        output.push_str(&format!(
            "Timeslots used: {}, rooms used: {}\n",
            timetable.metadata.timeslots_used, timetable.metadata.rooms_used
        ));
        output.push_str(&format!(
            "Search: {} nodes, {} backtracks, {:.3}s\n",
            timetable.metadata.search_nodes,
            timetable.metadata.backtracks,
            timetable.solve_time.as_secs_f64()
        ));
        output.push('\n');

        let rows = timetable.entries.iter().sorted_by_key(|e| {
            let slot = snapshot.timeslot(e.timeslot_id);
            (slot.map(|s| (s.day, s.slot_index)), e.class_id, e.subject_id, e.session_index)
        });

        for entry in rows {
            let when = match snapshot.timeslot(entry.timeslot_id) {
                Some(slot) => match (&slot.start_time, &slot.end_time) {
                    (Some(start), Some(end)) => format!("{} {} {}-{}", slot.day, slot.slot_index, start, end),
                    _ => format!("{} {}", slot.day, slot.slot_index),
                },
                None => format!("slot {}", entry.timeslot_id),
            };
            output.push_str(&format!(
                "{:<20} {:<10} {:<18} {:<14} {}\n",
                when,
                Self::class_name(snapshot, entry),
                Self::subject_name(snapshot, entry),
                Self::teacher_name(snapshot, entry),
                Self::room_name(snapshot, entry)
            ));
        }

        output
    }

    /// Format one view as a grid: periods down, days across
    pub fn format_grid(timetable: &Timetable, snapshot: &Snapshot, view: View) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", Self::view_title(snapshot, view)));

        let days: Vec<Day> = snapshot.timeslots.iter().map(|t| t.day).unique().sorted().collect();
        let periods: Vec<u32> = snapshot
            .timeslots
            .iter()
            .map(|t| t.slot_index)
            .unique()
            .sorted()
            .collect();

        output.push_str(&format!("{:>6} |", ""));
        for day in &days {
            output.push_str(&format!(" {:<width$}|", day.to_string(), width = CELL_WIDTH));
        }
        output.push('\n');
        output.push_str(&format!("{}\n", "-".repeat(8 + days.len() * (CELL_WIDTH + 2))));

        let entries = timetable.view(view);
        for period in periods {
            output.push_str(&format!("{:>6} |", period));
            for day in &days {
                let slot = snapshot
                    .timeslots
                    .iter()
                    .find(|t| t.day == *day && t.slot_index == period);
                let cell = match slot {
                    None => String::new(),
                    Some(slot) if slot.is_lunch => "LUNCH".to_string(),
                    Some(slot) => entries
                        .iter()
                        .filter(|e| e.timeslot_id == slot.id)
                        .map(|e| Self::cell_label(snapshot, e, view))
                        .join(","),
                };
                let cell = if cell.is_empty() { "-".to_string() } else { cell };
                output.push_str(&format!(" {:<width$}|", truncate(&cell, CELL_WIDTH), width = CELL_WIDTH));
            }
            output.push('\n');
        }

        output
    }

    /// Format a solve report for console output
    pub fn format_summary(report: &SolveReport) -> String {
        let mut output = String::new();

        let status = match report.status {
            SolveStatus::Feasible => ColorOutput::success("FEASIBLE"),
            SolveStatus::Infeasible => ColorOutput::error("INFEASIBLE"),
            SolveStatus::Aborted => ColorOutput::warning("ABORTED"),
        };
        output.push_str(&format!("Status: {}\n", status));
        output.push_str(&format!("Sessions generated: {}\n", report.variables));
        if let Some(reason) = &report.abort_reason {
            output.push_str(&format!("Reason: {}\n", reason));
        }
        output.push_str(&report.statistics.to_string());

        output
    }

    /// Save a timetable to the output directory according to the output format
    pub fn save_timetable<P: AsRef<Path>>(
        timetable: &Timetable,
        snapshot: &Snapshot,
        output_dir: P,
        format: OutputFormat,
    ) -> Result<Vec<PathBuf>> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

        let mut written = Vec::new();
        match format {
            OutputFormat::Text => {
                let path = output_dir.join(format!("{}.txt", timetable.metadata.id));
                std::fs::write(&path, Self::format_timetable(timetable, snapshot))?;
                written.push(path);
            }
            OutputFormat::Json => {
                let path = output_dir.join(format!("{}.json", timetable.metadata.id));
                timetable.save_to_file(&path)?;
                written.push(path);

                let summary_path = output_dir.join("timetable_summary.json");
                let summary_json = serde_json::to_string_pretty(&timetable.summary())?;
                std::fs::write(&summary_path, summary_json)?;
                written.push(summary_path);
            }
            OutputFormat::Grid => {
                for view in Self::all_views(snapshot) {
                    let path = output_dir.join(format!("{}_{}.txt", timetable.metadata.id, Self::view_slug(view)));
                    std::fs::write(&path, Self::format_grid(timetable, snapshot, view))?;
                    written.push(path);
                }
            }
        }

        Ok(written)
    }

    fn all_views(snapshot: &Snapshot) -> Vec<View> {
        let classes = snapshot.classes.iter().map(|c| View::Class(c.id));
        let teachers = snapshot.teachers.iter().map(|t| View::Teacher(t.id));
        let rooms = snapshot.rooms.iter().map(|r| View::Room(r.id));
        classes.chain(teachers).chain(rooms).collect()
    }

    fn view_slug(view: View) -> String {
        match view {
            View::Class(id) => format!("class_{}", id),
            View::Teacher(id) => format!("teacher_{}", id),
            View::Room(id) => format!("room_{}", id),
        }
    }

    fn view_title(snapshot: &Snapshot, view: View) -> String {
        match view {
            View::Class(id) => match snapshot.class(id) {
                Some(class) => format!("Class {} (size {})", class.name, class.size),
                None => format!("Class {}", id),
            },
            View::Teacher(id) => match snapshot.teacher(id) {
                Some(teacher) => format!("Teacher {} ({})", teacher.name, teacher.code),
                None => format!("Teacher {}", id),
            },
            View::Room(id) => match snapshot.room(id) {
                Some(room) => format!("Room {} ({}, capacity {})", room.name, room.kind, room.capacity),
                None => format!("Room {}", id),
            },
        }
    }

    /// What a grid cell shows depends on which dimension the view fixes
    fn cell_label(snapshot: &Snapshot, entry: &ScheduledSession, view: View) -> String {
        let subject = snapshot
            .subject(entry.subject_id)
            .map_or_else(|| entry.subject_id.to_string(), |s| s.code.clone());
        match view {
            View::Class(_) => format!("{} {}", subject, Self::room_name(snapshot, entry)),
            View::Teacher(_) => format!("{} {}", Self::class_name(snapshot, entry), subject),
            View::Room(_) => format!("{} {}", Self::class_name(snapshot, entry), subject),
        }
    }

    fn class_name(snapshot: &Snapshot, entry: &ScheduledSession) -> String {
        snapshot
            .class(entry.class_id)
            .map_or_else(|| entry.class_id.to_string(), |c| c.name.clone())
    }

    fn subject_name(snapshot: &Snapshot, entry: &ScheduledSession) -> String {
        snapshot
            .subject(entry.subject_id)
            .map_or_else(|| entry.subject_id.to_string(), |s| s.name.clone())
    }

    fn teacher_name(snapshot: &Snapshot, entry: &ScheduledSession) -> String {
        snapshot
            .teacher(entry.teacher_id)
            .map_or_else(|| entry.teacher_id.to_string(), |t| t.name.clone())
    }

    fn room_name(snapshot: &Snapshot, entry: &ScheduledSession) -> String {
        snapshot
            .room(entry.room_id)
            .map_or_else(|| entry.room_id.to_string(), |r| r.name.clone())
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('~');
        cut
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::sample_snapshot;
    use std::time::Duration;

    fn scheduled(class_id: u32, subject_id: u32, timeslot_id: u32, room_id: u32) -> ScheduledSession {
        ScheduledSession {
            class_id,
            subject_id,
            teacher_id: subject_id,
            session_index: 0,
            timeslot_id,
            room_id,
            is_double: false,
        }
    }

    fn small_timetable() -> Timetable {
        // Mon period 1 and Tue period 2 of the sample week
        Timetable::new(vec![scheduled(1, 1, 1, 1), scheduled(2, 5, 8, 3)], Duration::ZERO)
    }

    #[test]
    fn test_listing_uses_entity_names() {
        let text = TimetableFormatter::format_timetable(&small_timetable(), &sample_snapshot());

        assert!(text.contains("Mon 1 09:00-10:00"));
        assert!(text.contains("CSE-2A"));
        assert!(text.contains("Dr. Sharma"));
        assert!(text.contains("LAB-A"));
        assert!(text.find("Mathematics").unwrap() < text.find("DS Lab").unwrap());
    }

    #[test]
    fn test_class_grid() {
        let grid = TimetableFormatter::format_grid(&small_timetable(), &sample_snapshot(), View::Class(2));
        let lines: Vec<&str> = grid.lines().collect();

        assert_eq!(lines[0], "Class CSE-2B (size 52)");
        assert!(lines[1].contains("Mon") && lines[1].contains("Fri"));
        // header, rule and six periods
        assert_eq!(lines.len(), 9);
        assert!(lines[4].contains("DSLAB LAB-A"));
        assert!(lines[6].contains("LUNCH"));
        assert!(!grid.contains("MATH"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 8), "short");
        assert_eq!(truncate("much too long", 8), "much to~");
    }

    #[test]
    fn test_save_grid_writes_one_file_per_view() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = sample_snapshot();

        let written =
            TimetableFormatter::save_timetable(&small_timetable(), &snapshot, dir.path(), OutputFormat::Grid).unwrap();
        assert_eq!(
            written.len(),
            snapshot.classes.len() + snapshot.teachers.len() + snapshot.rooms.len()
        );
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_save_json_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let timetable = small_timetable();

        let written =
            TimetableFormatter::save_timetable(&timetable, &sample_snapshot(), dir.path(), OutputFormat::Json).unwrap();
        let loaded = Timetable::load_from_file(&written[0]).unwrap();
        assert!(loaded.is_equivalent_to(&timetable));
        assert!(dir.path().join("timetable_summary.json").exists());
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        assert!(colored.contains("test"));
        assert!(ColorOutput::success("OK").contains("OK"));
    }
}
