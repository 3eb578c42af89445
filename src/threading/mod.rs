//! Reference-path construction.
//!
//! Threads a synthetic reference genome through the tangles of each flower,
//! one hierarchy level at a time:
//!
//! 1. **Normalize** ([`normalize`]): import attached stubs missing from the
//!    parent group, give single-end tangle groups a second block
//! 2. **Map** ([`nodes`]): number the tangle ends `0..n`
//! 3. **Extract** ([`edges`]): forced chain edges, forced stub edges (arbitrary
//!    at the root, read from the parent's reference thread below it), and
//!    weighted adjacency edges voted by the embedded genomes
//! 4. **Solve**: hand the [`MatchingProblem`](crate::matching::MatchingProblem)
//!    to a [`MatchingStrategy`](crate::matching::MatchingStrategy)
//! 5. **Materialize** ([`materialize`]): bridge blocks across groups, link
//!    edges, reference caps and adjacencies, groups for imported ends
//!
//! Every failure is fatal and reported as a [`ThreadError`]. Reference
//! adjacencies of a flower are committed all at once, after validation, so a
//! flower failing before the commit never carries half a thread. Debug builds
//! then re-check the committed flower with [`check_flower`]; a failure there
//! is reported with the thread already written.
//!
//! ## Example
//!
//! ```rust
//! use ref_threader::core::{GenomeGraph, Side};
//! use ref_threader::matching::GreedyMatching;
//! use ref_threader::threading::build_reference;
//!
//! let mut graph = GenomeGraph::new();
//! let flower = graph.add_root_flower();
//! let group = graph.add_tangle_group(flower);
//! for side in [Side::FivePrime, Side::ThreePrime] {
//!     let end = graph.add_stub_end(flower, true, side);
//!     graph.set_end_group(end, group).unwrap();
//! }
//!
//! let report = build_reference(&mut graph, flower, "reference", &GreedyMatching).unwrap();
//! assert_eq!(report.adjacencies, 1);
//! ```

pub mod check;
pub mod driver;
pub mod edges;
pub mod error;
pub mod materialize;
pub mod nodes;
pub mod normalize;

pub use check::check_flower;
pub use driver::{
    build_reference, reference_event, thread_hierarchy, SolverKind, ThreadReport,
    ThreadingConfig, DEFAULT_REFERENCE_HEADER, REFERENCE_BRANCH_LENGTH,
};
pub use error::ThreadError;
pub use nodes::NodeMap;
