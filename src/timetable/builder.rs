//! Turns a timetable snapshot into CSP variables, domains, neighbors and a consistency predicate

use super::entities::*;
use super::error::{BuildError, SnapshotIssue};
use crate::config::NeighborStrategy;
use crate::csp::CspProblem;
use itertools::Itertools;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Two placements are consistent unless they share a timeslot and also a teacher, class or room
pub fn consistent(session: &Session, placement: &Placement, other: &Session, other_placement: &Placement) -> bool {
    if placement.timeslot_id != other_placement.timeslot_id {
        return true;
    }
    session.teacher_id != other.teacher_id
        && session.class_id != other.class_id
        && placement.room_id != other_placement.room_id
}

/// Builds CSP primitives from a referentially valid snapshot
pub struct ProblemBuilder<'a> {
    snapshot: &'a Snapshot,
    classes: HashMap<ClassId, &'a ClassGroup>,
    subjects: HashMap<SubjectId, &'a Subject>,
    strategy: NeighborStrategy,
}

impl<'a> ProblemBuilder<'a> {
    /// Create a builder, rejecting duplicate ids and dangling mapping references
    pub fn new(snapshot: &'a Snapshot) -> Result<Self, BuildError> {
        let issues = referential_issues(snapshot);
        if !issues.is_empty() {
            return Err(BuildError::Malformed(issues));
        }

        Ok(Self {
            snapshot,
            classes: snapshot.classes.iter().map(|c| (c.id, c)).collect(),
            subjects: snapshot.subjects.iter().map(|s| (s.id, s)).collect(),
            strategy: NeighborStrategy::Complete,
        })
    }

    pub fn with_neighbor_strategy(mut self, strategy: NeighborStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Weekly sessions a mapping requires; an unset or zero override falls back to the subject's hours
    pub fn sessions_needed(&self, mapping: &ClassSubject) -> u32 {
        match mapping.required_hours {
            Some(hours) if hours > 0 => hours,
            _ => self
                .subjects
                .get(&mapping.subject_id)
                .map_or(0, |subject| subject.hours_per_week),
        }
    }

    /// One variable per mapping and session, in mapping order then session index
    pub fn build_variables(&self) -> Vec<Session> {
        self.snapshot
            .mappings
            .iter()
            .flat_map(|mapping| {
                (0..self.sessions_needed(mapping)).map(move |session_index| Session {
                    class_id: mapping.class_id,
                    subject_id: mapping.subject_id,
                    teacher_id: mapping.teacher_id,
                    session_index,
                })
            })
            .collect()
    }

    /// Placements admissible for one session, ordered by timeslot then room
    pub fn domain_for(&self, session: &Session, slots: &[&Timeslot]) -> Vec<Placement> {
        let (Some(class), Some(subject)) = (
            self.classes.get(&session.class_id),
            self.subjects.get(&session.subject_id),
        ) else {
            return Vec::new();
        };

        let rooms: Vec<&Room> = self
            .snapshot
            .rooms
            .iter()
            .filter(|room| room.kind == subject.kind && room.capacity >= class.size)
            .collect();

        slots
            .iter()
            .filter(|slot| !slot.is_lunch)
            .flat_map(|slot| {
                rooms.iter().map(move |room| Placement {
                    timeslot_id: slot.id,
                    room_id: room.id,
                })
            })
            .collect()
    }

    /// Domains for every variable
    pub fn build_domains(&self, variables: &[Session]) -> HashMap<Session, Vec<Placement>> {
        let slots = self.snapshot.teaching_timeslots();
        variables
            .par_iter()
            .map(|session| (*session, self.domain_for(session, &slots)))
            .collect()
    }

    /// Neighbor relation according to the configured strategy
    pub fn build_neighbors(
        &self,
        variables: &[Session],
        domains: &HashMap<Session, Vec<Placement>>,
    ) -> HashMap<Session, HashSet<Session>> {
        match self.strategy {
            NeighborStrategy::Complete => variables
                .iter()
                .map(|v| {
                    let others = variables.iter().filter(|u| *u != v).copied();
                    (*v, others.collect::<HashSet<_>>())
                })
                .collect(),
            NeighborStrategy::SharedTimeslot => {
                let mut by_slot: BTreeMap<TimeslotId, Vec<Session>> = BTreeMap::new();
                for session in variables {
                    let slots = domains
                        .get(session)
                        .into_iter()
                        .flatten()
                        .map(|placement| placement.timeslot_id)
                        .unique();
                    for slot in slots {
                        by_slot.entry(slot).or_default().push(*session);
                    }
                }

                let mut neighbors: HashMap<Session, HashSet<Session>> =
                    variables.iter().map(|v| (*v, HashSet::new())).collect();
                for group in by_slot.values() {
                    for (a, b) in group.iter().tuple_combinations() {
                        neighbors.entry(*a).or_default().insert(*b);
                        neighbors.entry(*b).or_default().insert(*a);
                    }
                }
                neighbors
            }
        }
    }

    /// Assemble the full CSP
    pub fn build(&self) -> Result<CspProblem<Session, Placement>, BuildError> {
        let variables = self.build_variables();
        let domains = self.build_domains(&variables);
        let neighbors = self.build_neighbors(&variables, &domains);

        let empty = domains.values().filter(|d| d.is_empty()).count();
        if empty > 0 {
            warn!("{} of {} sessions have no admissible placement", empty, variables.len());
        }

        let problem = CspProblem::new(variables, domains, &neighbors)?;
        debug!(
            "Built CSP with {} variables and {} neighbor pairs ({:?} strategy)",
            problem.len(),
            problem.edge_count(),
            self.strategy
        );
        Ok(problem)
    }

    /// Configuration problems that leave some session with an empty domain
    pub fn domain_issues(&self) -> Vec<SnapshotIssue> {
        let mut issues = Vec::new();
        if self.snapshot.mappings.is_empty() {
            return issues;
        }

        if self.snapshot.teaching_timeslots().is_empty() {
            issues.push(SnapshotIssue::NoTeachingTimeslots);
        }

        for mapping in self.snapshot.mappings.iter().filter(|m| self.sessions_needed(m) > 0) {
            let (Some(class), Some(subject)) = (
                self.classes.get(&mapping.class_id),
                self.subjects.get(&mapping.subject_id),
            ) else {
                continue;
            };

            let mut of_kind = self.snapshot.rooms.iter().filter(|r| r.kind == subject.kind).peekable();
            let issue = if of_kind.peek().is_none() {
                SnapshotIssue::NoRoomOfType {
                    subject_id: subject.id,
                    kind: subject.kind,
                }
            } else if of_kind.all(|r| r.capacity < class.size) {
                SnapshotIssue::NoRoomWithCapacity {
                    class_id: class.id,
                    subject_id: subject.id,
                    kind: subject.kind,
                    size: class.size,
                }
            } else {
                continue;
            };

            if !issues.contains(&issue) {
                issues.push(issue);
            }
        }

        issues
    }

    /// Fail if any session would be left without a placement
    pub fn check_domains(&self) -> Result<(), BuildError> {
        let issues = self.domain_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(BuildError::EmptyDomains(issues))
        }
    }
}

fn referential_issues(snapshot: &Snapshot) -> Vec<SnapshotIssue> {
    let mut issues = Vec::new();

    let mut duplicates = |entity: &'static str, ids: Vec<u32>| {
        for id in ids.into_iter().duplicates() {
            issues.push(SnapshotIssue::DuplicateId { entity, id });
        }
    };
    duplicates("class", snapshot.classes.iter().map(|c| c.id).collect());
    duplicates("subject", snapshot.subjects.iter().map(|s| s.id).collect());
    duplicates("teacher", snapshot.teachers.iter().map(|t| t.id).collect());
    duplicates("room", snapshot.rooms.iter().map(|r| r.id).collect());
    duplicates("timeslot", snapshot.timeslots.iter().map(|t| t.id).collect());

    let class_ids: HashSet<ClassId> = snapshot.classes.iter().map(|c| c.id).collect();
    let subject_ids: HashSet<SubjectId> = snapshot.subjects.iter().map(|s| s.id).collect();
    let teacher_ids: HashSet<TeacherId> = snapshot.teachers.iter().map(|t| t.id).collect();

    let mut seen = HashSet::new();
    for (i, mapping) in snapshot.mappings.iter().enumerate() {
        if !class_ids.contains(&mapping.class_id) {
            issues.push(SnapshotIssue::UnknownClass {
                mapping: i,
                class_id: mapping.class_id,
            });
        }
        if !subject_ids.contains(&mapping.subject_id) {
            issues.push(SnapshotIssue::UnknownSubject {
                mapping: i,
                subject_id: mapping.subject_id,
            });
        }
        if !teacher_ids.contains(&mapping.teacher_id) {
            issues.push(SnapshotIssue::UnknownTeacher {
                mapping: i,
                teacher_id: mapping.teacher_id,
            });
        }
        if !seen.insert((mapping.class_id, mapping.subject_id, mapping.teacher_id)) {
            issues.push(SnapshotIssue::DuplicateMapping {
                mapping: i,
                class_id: mapping.class_id,
                subject_id: mapping.subject_id,
                teacher_id: mapping.teacher_id,
            });
        }
    }

    issues
}
