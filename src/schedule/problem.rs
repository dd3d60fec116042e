//! Timetable problem definition: snapshot checks, search orchestration and feasibility analysis

use super::{Timetable, TimetableValidator};
use crate::config::Settings;
use crate::csp::{AbortReason, BacktrackingSolver, SearchOutcome, SearchStatistics};
use crate::timetable::{
    consistent, load_snapshot_from_file, BuildError, ClassId, ProblemBuilder, RoomType, Session, Snapshot,
    SnapshotIssue, SubjectId, TeacherId,
};
use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Share of a resource above which a snapshot is reported as tight
const TIGHT_LOAD: f64 = 0.9;

/// A timetable problem over one snapshot
pub struct TimetableProblem {
    settings: Settings,
    snapshot: Snapshot,
}

/// How a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Feasible,
    /// The search tree was exhausted
    Infeasible,
    /// A step or time limit stopped the search; feasibility is unknown
    Aborted,
}

/// Result of [`TimetableProblem::solve`]
#[derive(Debug, Clone)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// Number of generated sessions
    pub variables: usize,
    pub timetable: Option<Timetable>,
    pub abort_reason: Option<AbortReason>,
    pub statistics: SearchStatistics,
}

impl SolveReport {
    pub fn is_feasible(&self) -> bool {
        self.status == SolveStatus::Feasible
    }
}

impl TimetableProblem {
    /// Create a problem, loading the snapshot named in the settings
    pub fn new(settings: Settings) -> Result<Self> {
        let snapshot = load_snapshot_from_file(&settings.input.snapshot_file)
            .context("Failed to load snapshot file")?;

        Ok(Self { settings, snapshot })
    }

    /// Create a problem with an explicit snapshot
    pub fn with_snapshot(settings: Settings, snapshot: Snapshot) -> Self {
        Self { settings, snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reject malformed snapshots before any search.
    ///
    /// Findings that leave sessions without placements are errors when
    /// `strict_domains` is set; otherwise they are logged and returned.
    pub fn check_snapshot(&self) -> Result<Vec<SnapshotIssue>, BuildError> {
        let builder = ProblemBuilder::new(&self.snapshot)?;
        if self.settings.builder.strict_domains {
            builder.check_domains()?;
            return Ok(Vec::new());
        }

        let issues = builder.domain_issues();
        for issue in &issues {
            warn!("Likely configuration problem: {}", issue);
        }
        Ok(issues)
    }

    /// Build the CSP, search it and validate the result
    pub fn solve(&self) -> Result<SolveReport> {
        info!(
            "Solving timetable: {} classes, {} mappings, {} teaching timeslots, {} rooms",
            self.snapshot.classes.len(),
            self.snapshot.mappings.len(),
            self.snapshot.teaching_timeslots().len(),
            self.snapshot.rooms.len()
        );

        self.check_snapshot()?;
        let builder = ProblemBuilder::new(&self.snapshot)?
            .with_neighbor_strategy(self.settings.builder.neighbor_strategy);
        let problem = builder.build()?;
        info!("Generated {} sessions", problem.len());

        let report = BacktrackingSolver::new(&problem, consistent)
            .with_limits(self.settings.search_limits())
            .solve();
        debug!("{}", report.statistics);

        let variables = problem.len();
        let statistics = report.statistics;

        match report.outcome {
            SearchOutcome::Solved(assignment) => {
                let timetable = Timetable::from_assignment(&assignment, &statistics);
                let validation = TimetableValidator::new(&self.snapshot).validate(&timetable)?;
                if !validation.is_valid {
                    anyhow::bail!(
                        "Search returned an invalid timetable: {}",
                        validation.error_message.unwrap_or_default()
                    );
                }

                info!(
                    "Found timetable {} in {:.3}s ({} backtracks)",
                    timetable.metadata.id,
                    statistics.elapsed.as_secs_f64(),
                    statistics.backtracks
                );
                Ok(SolveReport {
                    status: SolveStatus::Feasible,
                    variables,
                    timetable: Some(timetable),
                    abort_reason: None,
                    statistics,
                })
            }
            SearchOutcome::Infeasible => {
                info!("No timetable exists for this snapshot ({} sessions)", variables);
                Ok(SolveReport {
                    status: SolveStatus::Infeasible,
                    variables,
                    timetable: None,
                    abort_reason: None,
                    statistics,
                })
            }
            SearchOutcome::Aborted(reason) => {
                warn!("Search aborted: {}", reason);
                Ok(SolveReport {
                    status: SolveStatus::Aborted,
                    variables,
                    timetable: None,
                    abort_reason: Some(reason),
                    statistics,
                })
            }
        }
    }

    /// Cheap necessary-condition checks that run without searching
    pub fn analyze(&self) -> Result<FeasibilityReport, BuildError> {
        let builder = ProblemBuilder::new(&self.snapshot)?;
        let slots = self.snapshot.teaching_timeslots();
        let slot_count = slots.len();

        let mut findings: Vec<Finding> = builder.domain_issues().into_iter().map(Finding::Domain).collect();
        let mut peak_load: f64 = 0.0;

        let mapping_domains: Vec<MappingDomain> = self
            .snapshot
            .mappings
            .iter()
            .map(|mapping| {
                let first = Session {
                    class_id: mapping.class_id,
                    subject_id: mapping.subject_id,
                    teacher_id: mapping.teacher_id,
                    session_index: 0,
                };
                MappingDomain {
                    class_id: mapping.class_id,
                    subject_id: mapping.subject_id,
                    teacher_id: mapping.teacher_id,
                    sessions: builder.sessions_needed(mapping) as usize,
                    domain_size: builder.domain_for(&first, &slots).len(),
                }
            })
            .collect();

        let class_load: BTreeMap<ClassId, usize> = mapping_domains
            .iter()
            .map(|m| (m.class_id, m.sessions))
            .into_grouping_map()
            .sum()
            .into_iter()
            .collect();
        for (&class_id, &sessions) in &class_load {
            peak_load = peak_load.max(load(sessions, slot_count));
            if sessions > slot_count {
                findings.push(Finding::ClassOverloaded {
                    class_id,
                    sessions,
                    slots: slot_count,
                });
            }
        }

        let teacher_load: BTreeMap<TeacherId, usize> = mapping_domains
            .iter()
            .map(|m| (m.teacher_id, m.sessions))
            .into_grouping_map()
            .sum()
            .into_iter()
            .collect();
        for (&teacher_id, &sessions) in &teacher_load {
            peak_load = peak_load.max(load(sessions, slot_count));
            if sessions > slot_count {
                findings.push(Finding::TeacherOverloaded {
                    teacher_id,
                    sessions,
                    slots: slot_count,
                });
            }
        }

        for kind in [RoomType::Theory, RoomType::Lab] {
            let sessions: usize = mapping_domains
                .iter()
                .filter(|m| self.snapshot.subject(m.subject_id).is_some_and(|s| s.kind == kind))
                .map(|m| m.sessions)
                .sum();
            let rooms = self.snapshot.rooms.iter().filter(|r| r.kind == kind).count();
            let capacity = rooms * slot_count;

            // a type without rooms is already a domain finding
            if sessions == 0 || capacity == 0 {
                continue;
            }
            peak_load = peak_load.max(load(sessions, capacity));
            if sessions > capacity {
                findings.push(Finding::RoomTypeOverloaded {
                    kind,
                    sessions,
                    capacity,
                });
            }
        }

        let verdict = if !findings.is_empty() {
            Verdict::Infeasible
        } else if peak_load >= TIGHT_LOAD {
            Verdict::Tight
        } else {
            Verdict::Plausible
        };

        Ok(FeasibilityReport {
            sessions: mapping_domains.iter().map(|m| m.sessions).sum(),
            teaching_timeslots: slot_count,
            mapping_domains,
            findings,
            peak_load,
            verdict,
        })
    }
}

fn load(sessions: usize, available: usize) -> f64 {
    if available == 0 {
        return f64::INFINITY;
    }
    sessions as f64 / available as f64
}

/// Domain size of the sessions generated for one mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDomain {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub sessions: usize,
    pub domain_size: usize,
}

/// A reason the snapshot cannot be scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    Domain(SnapshotIssue),
    ClassOverloaded {
        class_id: ClassId,
        sessions: usize,
        slots: usize,
    },
    TeacherOverloaded {
        teacher_id: TeacherId,
        sessions: usize,
        slots: usize,
    },
    RoomTypeOverloaded {
        kind: RoomType,
        sessions: usize,
        capacity: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Passes every check with room to spare
    Plausible,
    /// Passes every check but some resource is nearly full
    Tight,
    /// Fails a necessary condition; search cannot succeed
    Infeasible,
}

/// Outcome of [`TimetableProblem::analyze`]
#[derive(Debug, Clone)]
pub struct FeasibilityReport {
    pub sessions: usize,
    pub teaching_timeslots: usize,
    pub mapping_domains: Vec<MappingDomain>,
    pub findings: Vec<Finding>,
    /// Highest sessions-to-capacity ratio over classes, teachers and room types
    pub peak_load: f64,
    pub verdict: Verdict,
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Feasible => write!(f, "feasible"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::Domain(issue) => write!(f, "{}", issue),
            Finding::ClassOverloaded {
                class_id,
                sessions,
                slots,
            } => write!(
                f,
                "class {} needs {} sessions but only {} teaching slots exist",
                class_id, sessions, slots
            ),
            Finding::TeacherOverloaded {
                teacher_id,
                sessions,
                slots,
            } => write!(
                f,
                "teacher {} has {} sessions but only {} teaching slots exist",
                teacher_id, sessions, slots
            ),
            Finding::RoomTypeOverloaded {
                kind,
                sessions,
                capacity,
            } => write!(
                f,
                "{} subjects need {} sessions but {} rooms offer {} room-slots",
                kind, sessions, kind, capacity
            ),
        }
    }
}

impl std::fmt::Display for FeasibilityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Feasibility Analysis:")?;
        writeln!(f, "  Verdict: {:?}", self.verdict)?;
        writeln!(f, "  Sessions: {}", self.sessions)?;
        writeln!(f, "  Teaching timeslots: {}", self.teaching_timeslots)?;
        writeln!(f, "  Peak load: {:.1}%", self.peak_load * 100.0)?;
        writeln!(f, "  Domains:")?;
        for m in &self.mapping_domains {
            writeln!(f, "    {}: {} sessions x {} placements", m.key(), m.sessions, m.domain_size)?;
        }
        if !self.findings.is_empty() {
            writeln!(f, "  Findings:")?;
            for finding in &self.findings {
                writeln!(f, "    - {}", finding)?;
            }
        }
        Ok(())
    }
}

impl MappingDomain {
    /// `class/subject/teacher`
    pub fn key(&self) -> String {
        [self.class_id, self.subject_id, self.teacher_id].iter().join("/")
    }
}
