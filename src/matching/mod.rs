//! Matching strategies for choosing reference adjacencies.
//!
//! The core reduces each flower to a [`MatchingProblem`] over dense node ids
//! and hands it to a [`MatchingStrategy`]:
//!
//! - **Forced edges** (chain and stub edges) must appear in the answer
//! - **Adjacency edges** are soft, weighted by how many genomes support them
//! - **Pinned nodes** are already paired outside the problem and stay unmatched
//!
//! Every other node must be covered exactly once.
//!
//! ## Strategies
//!
//! - [`GreedyMatching`]: heaviest adjacency edges first; fast, approximate
//! - [`ExactMatching`]: maximum-weight matching over subsets; small problems only
//! - Any closure `Fn(&MatchingProblem) -> Result<Vec<Edge>, SolverError>`
//!
//! ## Example
//!
//! ```rust
//! use ref_threader::matching::{Edge, GreedyMatching, MatchingProblem, MatchingStrategy};
//!
//! let problem = MatchingProblem {
//!     node_count: 4,
//!     chain_edges: vec![Edge::new(0, 1)],
//!     stub_edges: vec![Edge::new(2, 3)],
//!     is_root: true,
//!     ..Default::default()
//! };
//! let chosen = GreedyMatching.solve(&problem).unwrap();
//! assert!(problem.validate(&chosen).is_ok());
//! ```

pub mod exact;
pub mod greedy;
pub mod strategy;

pub use exact::{ExactMatching, DEFAULT_MAX_EXACT_NODES};
pub use greedy::GreedyMatching;
pub use strategy::{Edge, MatchingProblem, MatchingStrategy, NodeId, SolverError, WeightedEdge};
