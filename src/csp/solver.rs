//! Backtracking search with MRV variable selection, LCV value ordering and forward checking

use super::domain::DomainStore;
use super::problem::CspProblem;
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Optional budgets checked on every entry into the search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of search nodes (recursive entries)
    pub max_steps: Option<u64>,
    /// Maximum wall-clock time
    pub timeout: Option<Duration>,
}

impl SearchLimits {
    pub fn unlimited() -> Self {
        Self {
            max_steps: None,
            timeout: None,
        }
    }
}

/// Why a search stopped before exhausting the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    StepLimit(u64),
    Timeout(Duration),
}

/// Terminal state of a search.
///
/// `Infeasible` means the whole tree was explored. `Aborted` means a limit was
/// hit and nothing is known about feasibility.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<V, D> {
    Solved(Assignment<V, D>),
    Infeasible,
    Aborted(AbortReason),
}

impl<V, D> SearchOutcome<V, D> {
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchOutcome::Solved(_))
    }

    pub fn assignment(&self) -> Option<&Assignment<V, D>> {
        match self {
            SearchOutcome::Solved(assignment) => Some(assignment),
            _ => None,
        }
    }
}

/// A complete assignment, in variable generation order
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<V, D> {
    pairs: Vec<(V, D)>,
}

impl<V: Eq + Hash, D> Assignment<V, D> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&V, &D)> {
        self.pairs.iter().map(|(var, value)| (var, value))
    }

    pub fn get(&self, var: &V) -> Option<&D> {
        self.pairs.iter().find(|(v, _)| v == var).map(|(_, value)| value)
    }

    pub fn into_map(self) -> HashMap<V, D> {
        self.pairs.into_iter().collect()
    }
}

/// Counters collected during one search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    pub variable_count: usize,
    pub nodes: u64,
    pub assignments_tried: u64,
    pub backtracks: u64,
    pub values_pruned: u64,
    pub max_depth: usize,
    pub elapsed: Duration,
}

/// Outcome of [`BacktrackingSolver::solve`] together with its statistics
#[derive(Debug, Clone)]
pub struct SearchReport<V, D> {
    pub outcome: SearchOutcome<V, D>,
    pub statistics: SearchStatistics,
}

enum Step {
    Found,
    Exhausted,
    Aborted(AbortReason),
}

/// Mutable state owned by one in-flight search
struct SearchState<D> {
    domains: DomainStore<D>,
    assignment: Vec<Option<usize>>,
    stats: SearchStatistics,
    started: Instant,
}

impl<D: Clone> SearchState<D> {
    fn new<V: Clone + Eq + Hash + Debug>(problem: &CspProblem<V, D>) -> Self {
        Self {
            domains: DomainStore::new(problem.domains().to_vec()),
            assignment: vec![None; problem.domains().len()],
            stats: SearchStatistics {
                variable_count: problem.domains().len(),
                ..SearchStatistics::default()
            },
            started: Instant::now(),
        }
    }
}

/// Chronological backtracking solver over a [`CspProblem`].
///
/// The solver is single-threaded and holds no state between calls to
/// [`solve`](Self::solve); concurrent solves each get their own domains,
/// trail and assignment.
pub struct BacktrackingSolver<'p, V, D, C> {
    problem: &'p CspProblem<V, D>,
    consistent: C,
    limits: SearchLimits,
}

impl<'p, V, D, C> BacktrackingSolver<'p, V, D, C>
where
    V: Clone + Eq + Hash + Debug,
    D: Clone + Debug,
    C: Fn(&V, &D, &V, &D) -> bool,
{
    /// Create a solver for `problem` using the binary predicate `consistent`
    pub fn new(problem: &'p CspProblem<V, D>, consistent: C) -> Self {
        Self {
            problem,
            consistent,
            limits: SearchLimits::unlimited(),
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Search for a complete consistent assignment
    pub fn solve(&self) -> SearchReport<V, D> {
        let mut state = SearchState::new(self.problem);
        debug!(
            "Starting search over {} variables and {} neighbor pairs",
            self.problem.len(),
            self.problem.edge_count()
        );

        let step = self.backtrack(&mut state, 0);
        state.stats.elapsed = state.started.elapsed();

        let outcome = match step {
            Step::Found => SearchOutcome::Solved(self.materialize(&state)),
            Step::Exhausted => SearchOutcome::Infeasible,
            Step::Aborted(reason) => SearchOutcome::Aborted(reason),
        };
        debug!(
            "Search finished ({}) after {} nodes and {} backtracks",
            match &outcome {
                SearchOutcome::Solved(_) => "solved",
                SearchOutcome::Infeasible => "infeasible",
                SearchOutcome::Aborted(_) => "aborted",
            },
            state.stats.nodes,
            state.stats.backtracks
        );

        SearchReport {
            outcome,
            statistics: state.stats,
        }
    }

    fn backtrack(&self, state: &mut SearchState<D>, depth: usize) -> Step {
        state.stats.nodes += 1;
        state.stats.max_depth = state.stats.max_depth.max(depth);

        if let Some(reason) = self.limit_reached(state) {
            return Step::Aborted(reason);
        }

        // every variable assigned
        let Some(var) = self.select_unassigned_variable(state) else {
            return Step::Found;
        };

        for value in self.order_domain_values(var, state) {
            if !self.consistent_with_assigned(var, value, state) {
                continue;
            }

            state.stats.assignments_tried += 1;
            let mark = state.domains.mark();
            state.assignment[var] = Some(value);
            trace!("depth {}: trying {:?} = {:?}", depth, self.problem.variable(var), self.problem.domain(var)[value]);

            let step = if self.forward_check(var, value, state) {
                self.backtrack(state, depth + 1)
            } else {
                Step::Exhausted
            };
            if !matches!(step, Step::Exhausted) {
                return step;
            }

            state.assignment[var] = None;
            state.domains.restore_to(mark);
            state.stats.backtracks += 1;
        }

        Step::Exhausted
    }

    /// MRV: the unassigned variable with the fewest live values
    fn select_unassigned_variable(&self, state: &SearchState<D>) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for var in (0..self.problem.len()).filter(|&v| state.assignment[v].is_none()) {
            let remaining = state.domains.remaining(var);
            // strict comparison keeps the earliest variable on ties
            if best.map_or(true, |(_, fewest)| remaining < fewest) {
                best = Some((var, remaining));
            }
        }
        best.map(|(var, _)| var)
    }

    /// LCV: live values of `var`, fewest induced neighbor conflicts first
    fn order_domain_values(&self, var: usize, state: &SearchState<D>) -> Vec<usize> {
        let mut scored: Vec<(usize, usize)> = state
            .domains
            .live(var)
            .map(|value| (value, self.conflicts(var, value, state)))
            .collect();
        scored.sort_by_key(|&(_, conflicts)| conflicts);
        scored.into_iter().map(|(value, _)| value).collect()
    }

    fn conflicts(&self, var: usize, value: usize, state: &SearchState<D>) -> usize {
        self.problem
            .neighbors(var)
            .iter()
            .map(|&other| match state.assignment[other] {
                Some(assigned) => usize::from(!self.check(var, value, other, assigned)),
                None => state
                    .domains
                    .live(other)
                    .filter(|&candidate| !self.check(var, value, other, candidate))
                    .count(),
            })
            .sum()
    }

    fn consistent_with_assigned(&self, var: usize, value: usize, state: &SearchState<D>) -> bool {
        self.problem.neighbors(var).iter().all(|&other| {
            state.assignment[other].map_or(true, |assigned| self.check(var, value, other, assigned))
        })
    }

    /// Prune neighbor values inconsistent with `var = value`; false if a domain empties
    fn forward_check(&self, var: usize, value: usize, state: &mut SearchState<D>) -> bool {
        for &other in self.problem.neighbors(var) {
            if state.assignment[other].is_some() {
                continue;
            }

            let doomed: Vec<usize> = state
                .domains
                .live(other)
                .filter(|&candidate| !self.check(var, value, other, candidate))
                .collect();
            if doomed.is_empty() {
                continue;
            }

            for &candidate in &doomed {
                state.domains.prune(other, candidate);
            }
            state.stats.values_pruned += doomed.len() as u64;

            if state.domains.is_empty(other) {
                trace!("forward check wiped out the domain of {:?}", self.problem.variable(other));
                return false;
            }
        }
        true
    }

    fn check(&self, var: usize, value: usize, other: usize, other_value: usize) -> bool {
        (self.consistent)(
            self.problem.variable(var),
            &self.problem.domain(var)[value],
            self.problem.variable(other),
            &self.problem.domain(other)[other_value],
        )
    }

    fn limit_reached(&self, state: &SearchState<D>) -> Option<AbortReason> {
        if let Some(max_steps) = self.limits.max_steps {
            if state.stats.nodes > max_steps {
                return Some(AbortReason::StepLimit(max_steps));
            }
        }
        if let Some(timeout) = self.limits.timeout {
            if state.started.elapsed() >= timeout {
                return Some(AbortReason::Timeout(timeout));
            }
        }
        None
    }

    fn materialize(&self, state: &SearchState<D>) -> Assignment<V, D> {
        let pairs = self
            .problem
            .variables()
            .iter()
            .enumerate()
            .zip(&state.assignment)
            .filter_map(|((var, variable), value)| {
                value.map(|value| (variable.clone(), self.problem.domain(var)[value].clone()))
            })
            .collect();
        Assignment { pairs }
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::StepLimit(steps) => write!(f, "step limit of {} nodes reached", steps),
            AbortReason::Timeout(timeout) => write!(f, "timeout of {:.3}s reached", timeout.as_secs_f64()),
        }
    }
}

impl std::fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Search Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Assignments tried: {}", self.assignments_tried)?;
        writeln!(f, "  Backtracks: {}", self.backtracks)?;
        writeln!(f, "  Values pruned: {}", self.values_pruned)?;
        writeln!(f, "  Max depth: {}", self.max_depth)?;
        writeln!(f, "  Search time: {:.3}s", self.elapsed.as_secs_f64())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn different(_: &&str, a: &char, _: &&str, b: &char) -> bool {
        a != b
    }

    fn problem(
        variables: &[&'static str],
        colors: &[char],
        edges: &[(&'static str, &'static str)],
    ) -> CspProblem<&'static str, char> {
        let domains = variables.iter().map(|&v| (v, colors.to_vec())).collect();
        let mut neighbors: HashMap<&str, HashSet<&str>> = HashMap::new();
        for &(a, b) in edges {
            neighbors.entry(a).or_default().insert(b);
        }
        CspProblem::new(variables.to_vec(), domains, &neighbors).unwrap()
    }

    fn australia() -> CspProblem<&'static str, char> {
        problem(
            &["WA", "NT", "SA", "Q", "NSW", "V", "T"],
            &['r', 'g', 'b'],
            &[
                ("WA", "NT"),
                ("WA", "SA"),
                ("NT", "SA"),
                ("NT", "Q"),
                ("SA", "Q"),
                ("SA", "NSW"),
                ("SA", "V"),
                ("Q", "NSW"),
                ("NSW", "V"),
            ],
        )
    }

    #[test]
    fn test_map_coloring_is_solved() {
        let csp = australia();
        let report = BacktrackingSolver::new(&csp, different).solve();

        let assignment = report.outcome.assignment().unwrap();
        assert_eq!(assignment.len(), 7);
        for var in 0..csp.len() {
            for &other in csp.neighbors(var) {
                assert_ne!(
                    assignment.get(csp.variable(var)),
                    assignment.get(csp.variable(other))
                );
            }
        }
        assert_eq!(report.statistics.variable_count, 7);
        assert_eq!(assignment.clone().into_map()[&"T"], *assignment.get(&"T").unwrap());
    }

    #[test]
    fn test_triangle_with_two_colors_is_infeasible() {
        let csp = problem(&["A", "B", "C"], &['r', 'g'], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let report = BacktrackingSolver::new(&csp, different).solve();

        assert_eq!(report.outcome, SearchOutcome::Infeasible);
        assert!(report.statistics.backtracks > 0);
    }

    #[test]
    fn test_empty_domain_is_infeasible() {
        let csp = problem(&["A", "B"], &[], &[("A", "B")]);
        let report = BacktrackingSolver::new(&csp, different).solve();
        assert_eq!(report.outcome, SearchOutcome::Infeasible);
    }

    #[test]
    fn test_empty_problem_is_solved() {
        let csp = problem(&[], &['r'], &[]);
        let report = BacktrackingSolver::new(&csp, different).solve();
        assert!(report.outcome.is_solved());
        assert!(report.outcome.assignment().unwrap().is_empty());
    }

    #[test]
    fn test_step_limit_aborts_instead_of_failing() {
        let csp = problem(&["A", "B", "C"], &['r', 'g'], &[("A", "B"), ("B", "C"), ("A", "C")]);
        let limits = SearchLimits {
            max_steps: Some(1),
            timeout: None,
        };
        let report = BacktrackingSolver::new(&csp, different).with_limits(limits).solve();

        assert_eq!(report.outcome, SearchOutcome::Aborted(AbortReason::StepLimit(1)));
    }

    #[test]
    fn test_mrv_prefers_smallest_domain_then_generation_order() {
        let mut domains = HashMap::new();
        domains.insert("X", vec!['r', 'g']);
        domains.insert("Y", vec!['r']);
        domains.insert("Z", vec!['r']);
        let neighbors = HashMap::from([("X", HashSet::from(["Y", "Z"]))]);
        let csp = CspProblem::new(vec!["X", "Y", "Z"], domains, &neighbors).unwrap();

        let solver = BacktrackingSolver::new(&csp, different);
        let state = SearchState::new(&csp);
        assert_eq!(solver.select_unassigned_variable(&state), Some(1));

        let tied = australia();
        let solver = BacktrackingSolver::new(&tied, different);
        assert_eq!(solver.select_unassigned_variable(&SearchState::new(&tied)), Some(0));
    }

    #[test]
    fn test_lcv_orders_by_induced_conflicts() {
        let mut domains = HashMap::new();
        domains.insert("X", vec!['r', 'g', 'b']);
        domains.insert("Y", vec!['r', 'b']);
        let neighbors = HashMap::from([("X", HashSet::from(["Y"]))]);
        let csp = CspProblem::new(vec!["X", "Y"], domains, &neighbors).unwrap();

        let solver = BacktrackingSolver::new(&csp, different);
        let state = SearchState::new(&csp);
        // 'g' conflicts with nothing; 'r' and 'b' tie and keep domain order
        assert_eq!(solver.order_domain_values(0, &state), vec![1, 0, 2]);
    }

    #[test]
    fn test_lcv_counts_assigned_neighbor_clash_once() {
        let mut domains = HashMap::new();
        domains.insert("X", vec!['r', 'g']);
        domains.insert("Y", vec!['r']);
        let neighbors = HashMap::from([("X", HashSet::from(["Y"]))]);
        let csp = CspProblem::new(vec!["X", "Y"], domains, &neighbors).unwrap();

        let solver = BacktrackingSolver::new(&csp, different);
        let mut state = SearchState::new(&csp);
        state.assignment[1] = Some(0);
        assert_eq!(solver.conflicts(0, 0, &state), 1);
        assert_eq!(solver.conflicts(0, 1, &state), 0);
        // 'r' clashes with the assigned Y and drops behind 'g'
        assert_eq!(solver.order_domain_values(0, &state), vec![1, 0]);
    }

    #[test]
    fn test_default_solver_is_unlimited() {
        assert_eq!(SearchLimits::unlimited(), SearchLimits::default());

        let csp = australia();
        let solver = BacktrackingSolver::new(&csp, different);
        assert_eq!(solver.limits, SearchLimits::unlimited());
        assert!(solver.solve().outcome.is_solved());
    }

    #[test]
    fn test_forward_check_restoration_is_exact() {
        let csp = australia();
        let solver = BacktrackingSolver::new(&csp, different);
        let mut state = SearchState::new(&csp);
        let before: Vec<Vec<char>> = (0..csp.len()).map(|v| state.domains.current(v)).collect();

        let sa = csp.index_of(&"SA").unwrap();
        let mark = state.domains.mark();
        state.assignment[sa] = Some(0);
        assert!(solver.forward_check(sa, 0, &mut state));
        assert_eq!(state.domains.current(csp.index_of(&"WA").unwrap()), vec!['g', 'b']);
        assert_eq!(state.domains.current(csp.index_of(&"T").unwrap()), vec!['r', 'g', 'b']);

        state.assignment[sa] = None;
        state.domains.restore_to(mark);
        let after: Vec<Vec<char>> = (0..csp.len()).map(|v| state.domains.current(v)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_forward_check_fails_on_wipeout() {
        let mut domains = HashMap::new();
        domains.insert("X", vec!['r']);
        domains.insert("Y", vec!['r']);
        let neighbors = HashMap::from([("X", HashSet::from(["Y"]))]);
        let csp = CspProblem::new(vec!["X", "Y"], domains, &neighbors).unwrap();

        let solver = BacktrackingSolver::new(&csp, different);
        let mut state = SearchState::new(&csp);
        state.assignment[0] = Some(0);
        assert!(!solver.forward_check(0, 0, &mut state));
        assert!(state.domains.is_empty(1));
    }

    #[test]
    fn test_repeated_solves_are_identical() {
        let csp = australia();
        let solver = BacktrackingSolver::new(&csp, different);
        let first = solver.solve().outcome;
        let second = solver.solve().outcome;
        assert_eq!(first, second);
    }
}
