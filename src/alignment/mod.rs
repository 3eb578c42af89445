//! Aligned-pair streaming.
//!
//! Upstream alignment produces a set of aligned base pairs for a flower. The
//! [`AlignedPairCursor`] replays that set as one-column
//! [`PairwiseAlignment`]s, and is passed explicitly to whoever consumes it so
//! several flowers can be streamed independently.

pub mod cursor;

pub use cursor::{
    AlignedPair, AlignedPairCursor, AlignedSide, AlignmentOperation, OperationKind,
    PairwiseAlignment, Strand,
};
