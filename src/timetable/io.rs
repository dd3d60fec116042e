//! Snapshot file I/O and sample data

use super::entities::*;
use anyhow::{Context, Result};
use std::path::Path;

/// On-disk encodings of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SnapshotFormat::Yaml
            }
            _ => SnapshotFormat::Json,
        }
    }
}

/// Load a snapshot from a JSON or YAML file
pub fn load_snapshot_from_file<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.as_ref().display()))?;

    parse_snapshot(&content, SnapshotFormat::from_path(&path))
        .with_context(|| format!("Failed to parse snapshot from file: {}", path.as_ref().display()))
}

/// Parse a snapshot from a string
pub fn parse_snapshot(content: &str, format: SnapshotFormat) -> Result<Snapshot> {
    let snapshot: Snapshot = match format {
        SnapshotFormat::Json => serde_json::from_str(content).context("Invalid snapshot JSON")?,
        SnapshotFormat::Yaml => serde_yaml::from_str(content).context("Invalid snapshot YAML")?,
    };
    Ok(snapshot)
}

/// Save a snapshot, encoding chosen by file extension
pub fn save_snapshot_to_file<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<()> {
    let content = match SnapshotFormat::from_path(&path) {
        SnapshotFormat::Json => serde_json::to_string_pretty(snapshot)?,
        SnapshotFormat::Yaml => serde_yaml::to_string(snapshot)?,
    };

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write snapshot to file: {}", path.as_ref().display()))?;

    Ok(())
}

/// A small department: two classes, five subjects, a Mon-Fri week of six periods with lunch in period 4
pub fn sample_snapshot() -> Snapshot {
    let teacher = |id, name: &str, code: &str, load| Teacher {
        id,
        name: name.to_string(),
        code: code.to_string(),
        max_daily_load: Some(load),
    };
    let subject = |id, name: &str, code: &str, kind, hours_per_week, allow_double_period| Subject {
        id,
        name: name.to_string(),
        code: code.to_string(),
        kind,
        hours_per_week,
        allow_double_period,
    };
    let room = |id, name: &str, kind, capacity| Room {
        id,
        name: name.to_string(),
        kind,
        capacity,
    };

    let teachers = vec![
        teacher(1, "Dr. Sharma", "T-MATH", 5),
        teacher(2, "Ms. Rao", "T-DS", 5),
        teacher(3, "Mr. Khan", "T-OS", 5),
        teacher(4, "Mrs. Patel", "T-ENG", 5),
        teacher(5, "Lab Incharge", "T-LAB1", 6),
    ];
    let subjects = vec![
        subject(1, "Mathematics", "MATH", RoomType::Theory, 4, false),
        subject(2, "Data Structures", "DS", RoomType::Theory, 4, false),
        subject(3, "Operating Systems", "OS", RoomType::Theory, 4, false),
        subject(4, "English", "ENG", RoomType::Theory, 2, false),
        subject(5, "DS Lab", "DSLAB", RoomType::Lab, 2, true),
    ];
    let classes = vec![
        ClassGroup {
            id: 1,
            name: "CSE-2A".to_string(),
            size: 48,
        },
        ClassGroup {
            id: 2,
            name: "CSE-2B".to_string(),
            size: 52,
        },
    ];
    let rooms = vec![
        room(1, "R101", RoomType::Theory, 60),
        room(2, "R102", RoomType::Theory, 60),
        room(3, "LAB-A", RoomType::Lab, 60),
        room(4, "LAB-B", RoomType::Lab, 60),
    ];

    let hours = [
        ("09:00", "10:00"),
        ("10:00", "11:00"),
        ("11:00", "12:00"),
        ("12:00", "13:00"),
        ("13:00", "14:00"),
        ("14:00", "15:00"),
    ];
    let mut timeslots = Vec::new();
    for day in [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri] {
        for (i, (start, end)) in hours.iter().enumerate() {
            let slot_index = i as u32 + 1;
            timeslots.push(Timeslot {
                id: timeslots.len() as u32 + 1,
                day,
                slot_index,
                start_time: Some(start.to_string()),
                end_time: Some(end.to_string()),
                is_lunch: slot_index == 4,
            });
        }
    }

    let mut mappings = Vec::new();
    for class in &classes {
        for subject in &subjects {
            mappings.push(ClassSubject {
                class_id: class.id,
                subject_id: subject.id,
                // one teacher per subject, shared by both classes
                teacher_id: subject.id,
                required_hours: None,
            });
        }
    }

    Snapshot {
        classes,
        subjects,
        teachers,
        rooms,
        timeslots,
        mappings,
    }
}

/// Write the sample snapshot as JSON and YAML into a directory
pub fn create_sample_snapshots<P: AsRef<Path>>(dir_path: P) -> Result<()> {
    let dir_path = dir_path.as_ref();
    std::fs::create_dir_all(dir_path)
        .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;

    let sample = sample_snapshot();
    save_snapshot_to_file(&sample, dir_path.join("snapshot.json"))?;
    save_snapshot_to_file(&sample, dir_path.join("snapshot.yaml"))?;

    Ok(())
}
