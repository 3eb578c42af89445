use tracing::debug;

use crate::matching::strategy::{Edge, MatchingProblem, MatchingStrategy, SolverError};

/// Heuristic strategy: forced edges first, then the heaviest adjacency edges
/// whose nodes are both still free, then any leftover free nodes in ascending
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMatching;

impl MatchingStrategy for GreedyMatching {
    fn name(&self) -> &str {
        "greedy"
    }

    fn solve(&self, problem: &MatchingProblem) -> Result<Vec<Edge>, SolverError> {
        let (mut matched, mut chosen) = problem.seed()?;

        let free = matched.iter().filter(|&&m| !m).count();
        if free % 2 != 0 {
            return Err(SolverError::OddFreeNodes(free));
        }

        // Heaviest first; ties broken by node ids so runs are reproducible
        let mut candidates = problem.adjacency_edges.clone();
        candidates.sort_by(|x, y| y.weight.cmp(&x.weight).then(x.edge.cmp(&y.edge)));

        let mut voted = 0usize;
        for candidate in candidates {
            let Edge { a, b } = candidate.edge;
            if a >= problem.node_count || b >= problem.node_count {
                return Err(SolverError::NodeOutOfRange {
                    node: a.max(b),
                    node_count: problem.node_count,
                });
            }
            if a == b || matched[a] || matched[b] {
                continue;
            }
            matched[a] = true;
            matched[b] = true;
            chosen.push(candidate.edge);
            voted += 1;
        }

        let leftovers: Vec<usize> = (0..problem.node_count).filter(|&n| !matched[n]).collect();
        for pair in leftovers.chunks_exact(2) {
            chosen.push(Edge::new(pair[0], pair[1]));
        }

        debug!(
            forced = problem.chain_edges.len() + problem.stub_edges.len(),
            voted,
            arbitrary = leftovers.len() / 2,
            "Greedy matching chosen"
        );
        Ok(chosen)
    }
}
