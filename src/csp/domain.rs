//! Prunable domains with a removal trail

/// Position in the trail; restoring to a mark undoes every later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailMark(usize);

/// Per-variable candidate values that shrink during forward checking.
///
/// Values are never moved. A removal only flags the value as pruned and
/// pushes `(variable, value)` onto the trail, so restoring brings back the
/// exact domain, order included.
#[derive(Debug, Clone)]
pub struct DomainStore<D> {
    values: Vec<Vec<D>>,
    pruned: Vec<Vec<bool>>,
    remaining: Vec<usize>,
    trail: Vec<(usize, usize)>,
}

impl<D: Clone> DomainStore<D> {
    /// Create a store where every value starts live
    pub fn new(domains: Vec<Vec<D>>) -> Self {
        let pruned = domains.iter().map(|d| vec![false; d.len()]).collect();
        let remaining = domains.iter().map(Vec::len).collect();
        Self {
            values: domains,
            pruned,
            remaining,
            trail: Vec::new(),
        }
    }

    /// Number of live values left for a variable
    pub fn remaining(&self, var: usize) -> usize {
        self.remaining[var]
    }

    pub fn is_empty(&self, var: usize) -> bool {
        self.remaining[var] == 0
    }

    pub fn is_live(&self, var: usize, value: usize) -> bool {
        !self.pruned[var][value]
    }

    /// Live value indices of a variable, in domain order
    pub fn live(&self, var: usize) -> impl Iterator<Item = usize> + '_ {
        self.pruned[var]
            .iter()
            .enumerate()
            .filter(|(_, pruned)| !**pruned)
            .map(|(i, _)| i)
    }

    /// Copy of the live values of a variable, in domain order
    pub fn current(&self, var: usize) -> Vec<D> {
        self.live(var).map(|i| self.values[var][i].clone()).collect()
    }

    pub fn mark(&self) -> TrailMark {
        TrailMark(self.trail.len())
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Remove a live value and record the removal
    pub fn prune(&mut self, var: usize, value: usize) {
        debug_assert!(!self.pruned[var][value], "value pruned twice");
        self.pruned[var][value] = true;
        self.remaining[var] -= 1;
        self.trail.push((var, value));
    }

    /// Undo every removal made after `mark`
    pub fn restore_to(&mut self, mark: TrailMark) {
        while self.trail.len() > mark.0 {
            if let Some((var, value)) = self.trail.pop() {
                self.pruned[var][value] = false;
                self.remaining[var] += 1;
                debug_assert!(
                    self.remaining[var] <= self.values[var].len(),
                    "restored domain larger than its original"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_and_restore_keeps_order() {
        let mut store = DomainStore::new(vec![vec!['a', 'b', 'c', 'd'], vec!['x']]);

        let mark = store.mark();
        store.prune(0, 1);
        store.prune(0, 3);
        store.prune(1, 0);

        assert_eq!(store.current(0), vec!['a', 'c']);
        assert_eq!(store.remaining(0), 2);
        assert!(store.is_empty(1));
        assert_eq!(store.trail_len(), 3);

        store.restore_to(mark);
        assert_eq!(store.current(0), vec!['a', 'b', 'c', 'd']);
        assert_eq!(store.current(1), vec!['x']);
        assert_eq!(store.trail_len(), 0);
    }

    #[test]
    fn test_nested_marks() {
        let mut store = DomainStore::new(vec![vec![1, 2, 3]]);

        store.prune(0, 0);
        let inner = store.mark();
        store.prune(0, 2);
        assert_eq!(store.current(0), vec![2]);

        store.restore_to(inner);
        assert_eq!(store.current(0), vec![2, 3]);
        assert!(!store.is_live(0, 0));
        assert_eq!(store.live(0).collect::<Vec<_>>(), vec![1, 2]);
    }
}
