use crate::types::{Candidate, CandidateId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Arena of every candidate created during a run, keyed by id.
///
/// Lineage is a DAG: mutations have one parent, crossovers two. Edges are the
/// `parent_ids` stored on each candidate.
#[derive(Debug, Default, Clone)]
pub struct Lineage {
    nodes: HashMap<CandidateId, Candidate>,
}

impl Lineage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a candidate record.
    pub fn record(&mut self, candidate: &Candidate) {
        self.nodes.insert(candidate.id, candidate.clone());
    }

    pub fn get(&self, id: &CandidateId) -> Option<&Candidate> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parents(&self, id: &CandidateId) -> Vec<&Candidate> {
        self.nodes
            .get(id)
            .map(|c| c.parent_ids.iter().filter_map(|p| self.nodes.get(p)).collect())
            .unwrap_or_default()
    }

    /// All known ancestors, nearest first. Shared ancestors appear once.
    pub fn ancestors(&self, id: &CandidateId) -> Vec<CandidateId> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<CandidateId> = VecDeque::new();
        let mut out = Vec::new();

        if let Some(c) = self.nodes.get(id) {
            queue.extend(c.parent_ids.iter().copied());
        }
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(c) = self.nodes.get(&next) {
                queue.extend(c.parent_ids.iter().copied());
            }
        }
        out
    }

    /// Length of the longest known parent chain; seeds are at depth 0.
    pub fn depth(&self, id: &CandidateId) -> usize {
        let mut memo = HashMap::new();
        self.depth_of(id, &mut memo, &mut HashSet::new())
    }

    fn depth_of(
        &self,
        id: &CandidateId,
        memo: &mut HashMap<CandidateId, usize>,
        visiting: &mut HashSet<CandidateId>,
    ) -> usize {
        if let Some(d) = memo.get(id) {
            return *d;
        }
        if !visiting.insert(*id) {
            return 0;
        }
        let depth = self
            .nodes
            .get(id)
            .map(|c| {
                c.parent_ids
                    .iter()
                    .filter(|p| self.nodes.contains_key(p))
                    .map(|p| self.depth_of(p, memo, visiting) + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        visiting.remove(id);
        memo.insert(*id, depth);
        depth
    }

    /// Drop every record that is neither live nor an ancestor of a live id.
    pub fn retain_reachable(&mut self, live: &[CandidateId]) -> usize {
        let mut keep: HashSet<CandidateId> = live.iter().copied().collect();
        for id in live {
            keep.extend(self.ancestors(id));
        }
        let before = self.nodes.len();
        self.nodes.retain(|id, _| keep.contains(id));
        before - self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Parameters;

    fn node(parents: &[CandidateId]) -> Candidate {
        Candidate::new(0, "code", "node", Parameters::new()).with_parents(parents)
    }

    #[test]
    fn test_ancestors_of_diamond() {
        let root = node(&[]);
        let left = node(&[root.id]);
        let right = node(&[root.id]);
        let child = node(&[left.id, right.id]);

        let mut lineage = Lineage::new();
        for c in [&root, &left, &right, &child] {
            lineage.record(c);
        }

        let ancestors = lineage.ancestors(&child.id);
        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors.last(), Some(&root.id));
        assert_eq!(lineage.parents(&child.id).len(), 2);
        assert_eq!(lineage.depth(&child.id), 2);
        assert_eq!(lineage.depth(&root.id), 0);
    }

    #[test]
    fn test_retain_reachable_drops_dead_branches() {
        let root = node(&[]);
        let dead = node(&[]);
        let child = node(&[root.id]);

        let mut lineage = Lineage::new();
        for c in [&root, &dead, &child] {
            lineage.record(c);
        }

        assert_eq!(lineage.retain_reachable(&[child.id]), 1);
        assert!(lineage.get(&dead.id).is_none());
        assert!(lineage.get(&root.id).is_some());
    }
}
