//! # ref-threader
//!
//! A library for threading a reference genome path through a nested
//! multiple-genome alignment graph.
//!
//! The graph is a hierarchy of flowers. Each flower holds ends (connection
//! points at aligned blocks or at unaligned sequence boundaries) partitioned
//! into groups; tangle groups are the regions whose adjacencies are still
//! open. At every level, the ends of the tangles must be paired into a single
//! consistent path for a synthetic reference genome, honoring the pairings
//! fixed by the parent level and by already aligned chains.
//!
//! `ref-threader` reduces each flower to a perfect matching problem, solves it
//! with a pluggable strategy and commits the result back into the graph as
//! reference caps and adjacencies.
//!
//! ## Features
//!
//! - **Arena graph model**: flowers, groups, ends, blocks, caps, chains and
//!   events addressed by `Copy` handles, with JSON snapshots
//! - **Forced structure**: chain and parent-level pairings are always kept
//! - **Weighted voting**: free ends pair to agree with the embedded genomes
//! - **Pluggable solvers**: greedy and exact strategies, or any closure
//! - **Fail fast**: inconsistencies abort before a flower's thread is written
//! - **Aligned-pair cursor**: replays upstream aligned base pairs as
//!   one-column pairwise alignments ([`alignment::AlignedPairCursor`])
//!
//! ## Example
//!
//! ```rust
//! use ref_threader::core::{GenomeGraph, Side};
//! use ref_threader::threading::{thread_hierarchy, ThreadingConfig};
//!
//! let mut graph = GenomeGraph::new();
//! let root = graph.add_root_flower();
//! let group = graph.add_tangle_group(root);
//! for side in [Side::FivePrime, Side::ThreePrime, Side::FivePrime, Side::ThreePrime] {
//!     let end = graph.add_stub_end(root, true, side);
//!     graph.set_end_group(end, group).unwrap();
//! }
//!
//! let reports = thread_hierarchy(&mut graph, root, &ThreadingConfig::default()).unwrap();
//! assert_eq!(reports[0].adjacencies, 2);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Graph model and JSON snapshots
//! - [`threading`]: Reference-path construction, one flower at a time
//! - [`matching`]: Matching problem and strategies
//! - [`alignment`]: Aligned-pair cursor for streaming alignment columns
//! - [`cli`]: Command-line interface implementation

pub mod alignment;
pub mod cli;
pub mod core;
pub mod matching;
pub mod threading;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::graph::GenomeGraph;
pub use crate::core::types::*;
pub use crate::matching::strategy::{Edge, MatchingProblem, MatchingStrategy};
pub use crate::threading::{
    build_reference, thread_hierarchy, ThreadError, ThreadReport, ThreadingConfig,
};
