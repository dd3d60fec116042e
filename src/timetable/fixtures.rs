//! Small snapshots shared by unit tests

use super::entities::*;

pub(crate) fn class(id: ClassId, size: u32) -> ClassGroup {
    ClassGroup {
        id,
        name: format!("C{}", id),
        size,
    }
}

pub(crate) fn subject(id: SubjectId, kind: RoomType, hours_per_week: u32) -> Subject {
    Subject {
        id,
        name: format!("S{}", id),
        code: format!("S{}", id),
        kind,
        hours_per_week,
        allow_double_period: false,
    }
}

pub(crate) fn teacher(id: TeacherId) -> Teacher {
    Teacher {
        id,
        name: format!("T{}", id),
        code: format!("T{}", id),
        max_daily_load: None,
    }
}

pub(crate) fn room(id: RoomId, kind: RoomType, capacity: u32) -> Room {
    Room {
        id,
        name: format!("R{}", id),
        kind,
        capacity,
    }
}

pub(crate) fn slot(id: TimeslotId, day: Day, slot_index: u32, is_lunch: bool) -> Timeslot {
    Timeslot {
        id,
        day,
        slot_index,
        start_time: None,
        end_time: None,
        is_lunch,
    }
}

pub(crate) fn mapping(class_id: ClassId, subject_id: SubjectId, teacher_id: TeacherId) -> ClassSubject {
    ClassSubject {
        class_id,
        subject_id,
        teacher_id,
        required_hours: None,
    }
}

/// Consecutive slot ids on Monday, none of them lunch
pub(crate) fn monday(count: u32) -> Vec<Timeslot> {
    (1..=count).map(|i| slot(i, Day::Mon, i, false)).collect()
}

/// Two classes sharing one teacher for a one-hour subject, two slots, one room
pub(crate) fn shared_teacher() -> Snapshot {
    Snapshot {
        classes: vec![class(1, 30), class(2, 30)],
        subjects: vec![subject(1, RoomType::Theory, 1)],
        teachers: vec![teacher(1)],
        rooms: vec![room(1, RoomType::Theory, 40)],
        timeslots: monday(2),
        mappings: vec![mapping(1, 1, 1), mapping(2, 1, 1)],
    }
}

/// One class needing three sessions with only two teaching slots
pub(crate) fn oversubscribed() -> Snapshot {
    Snapshot {
        classes: vec![class(1, 30)],
        subjects: vec![subject(1, RoomType::Theory, 3)],
        teachers: vec![teacher(1)],
        rooms: vec![room(1, RoomType::Theory, 40)],
        timeslots: vec![slot(1, Day::Mon, 1, false), slot(2, Day::Mon, 2, true), slot(3, Day::Mon, 3, false)],
        mappings: vec![mapping(1, 1, 1)],
    }
}

/// A lab subject with only theory rooms available
pub(crate) fn missing_lab() -> Snapshot {
    Snapshot {
        classes: vec![class(1, 30)],
        subjects: vec![subject(1, RoomType::Lab, 2)],
        teachers: vec![teacher(1)],
        rooms: vec![room(1, RoomType::Theory, 40)],
        timeslots: monday(4),
        mappings: vec![mapping(1, 1, 1)],
    }
}

/// Two classes with nothing in common and plenty of space
pub(crate) fn independent() -> Snapshot {
    Snapshot {
        classes: vec![class(1, 25), class(2, 25)],
        subjects: vec![subject(1, RoomType::Theory, 2), subject(2, RoomType::Lab, 2)],
        teachers: vec![teacher(1), teacher(2)],
        rooms: vec![room(1, RoomType::Theory, 30), room(2, RoomType::Lab, 30)],
        timeslots: monday(6),
        mappings: vec![mapping(1, 1, 1), mapping(2, 2, 2)],
    }
}
