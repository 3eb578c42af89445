use tracing::debug;

use crate::matching::strategy::{Edge, MatchingProblem, MatchingStrategy, SolverError};

/// Default cap on the number of free nodes the exact strategy accepts
pub const DEFAULT_MAX_EXACT_NODES: usize = 20;

/// Upper bound regardless of configuration: the table has 2^n entries
const HARD_LIMIT: usize = 24;

/// Maximum-weight perfect matching of the free nodes by dynamic programming
/// over subsets. Exponential in the number of free nodes, so problems above
/// `max_free_nodes` are refused rather than attempted.
#[derive(Debug, Clone, Copy)]
pub struct ExactMatching {
    pub max_free_nodes: usize,
}

impl Default for ExactMatching {
    fn default() -> Self {
        Self {
            max_free_nodes: DEFAULT_MAX_EXACT_NODES,
        }
    }
}

impl MatchingStrategy for ExactMatching {
    fn name(&self) -> &str {
        "exact"
    }

    fn solve(&self, problem: &MatchingProblem) -> Result<Vec<Edge>, SolverError> {
        let (matched, mut chosen) = problem.seed()?;

        let free: Vec<usize> = (0..problem.node_count).filter(|&n| !matched[n]).collect();
        if free.len() % 2 != 0 {
            return Err(SolverError::OddFreeNodes(free.len()));
        }
        let limit = self.max_free_nodes.min(HARD_LIMIT);
        if free.len() > limit {
            return Err(SolverError::TooLarge {
                free: free.len(),
                limit,
            });
        }
        if free.is_empty() {
            return Ok(chosen);
        }

        let k = free.len();
        let mut slot = vec![usize::MAX; problem.node_count];
        for (i, &node) in free.iter().enumerate() {
            slot[node] = i;
        }
        let mut weights = vec![0u64; k * k];
        for candidate in &problem.adjacency_edges {
            let Edge { a, b } = candidate.edge;
            if a >= problem.node_count || b >= problem.node_count {
                return Err(SolverError::NodeOutOfRange {
                    node: a.max(b),
                    node_count: problem.node_count,
                });
            }
            let (i, j) = (slot[a], slot[b]);
            if a == b || i == usize::MAX || j == usize::MAX {
                continue;
            }
            weights[i * k + j] += u64::from(candidate.weight);
            weights[j * k + i] += u64::from(candidate.weight);
        }

        // best[mask]: heaviest perfect matching of the free nodes in `mask`;
        // partner[mask]: who the lowest node of `mask` is paired with
        let full: u32 = (1u32 << k) - 1;
        let size = full as usize + 1;
        let mut best = vec![0u64; size];
        let mut partner = vec![0u8; size];
        for mask in 1..=full {
            if mask.count_ones() % 2 != 0 {
                continue;
            }
            let i = mask.trailing_zeros() as usize;
            let rest = mask & !(1 << i);
            let mut found = false;
            let mut bits = rest;
            while bits != 0 {
                let j = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                let score = best[(rest & !(1 << j)) as usize] + weights[i * k + j];
                if !found || score > best[mask as usize] {
                    best[mask as usize] = score;
                    #[allow(clippy::cast_possible_truncation)] // j < HARD_LIMIT
                    {
                        partner[mask as usize] = j as u8;
                    }
                    found = true;
                }
            }
        }

        let mut mask = full;
        while mask != 0 {
            let i = mask.trailing_zeros() as usize;
            let j = partner[mask as usize] as usize;
            chosen.push(Edge::new(free[i], free[j]));
            mask &= !(1 << i);
            mask &= !(1 << j);
        }

        debug!(
            free = k,
            weight = best[full as usize],
            "Exact matching chosen"
        );
        Ok(chosen)
    }
}
