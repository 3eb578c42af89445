use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::Name;

/// Strand of a sequence position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strand {
    Positive,
    Negative,
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

/// One side of an aligned pair: a base of a sequence on a strand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlignedSide {
    pub sequence: Name,
    pub position: i64,
    pub strand: Strand,
}

impl AlignedSide {
    /// Zero-width interval boundaries around the base, in traversal order:
    /// `(p, p + 1)` on the positive strand, `(p + 1, p)` on the negative one
    #[must_use]
    pub fn interval(&self) -> (i64, i64) {
        match self.strand {
            Strand::Positive => (self.position, self.position + 1),
            Strand::Negative => (self.position + 1, self.position),
        }
    }
}

/// Two bases placed in the same alignment column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AlignedPair {
    pub sequence: Name,
    pub position: i64,
    pub strand: Strand,
    pub reverse: AlignedSide,
}

impl AlignedPair {
    #[must_use]
    pub fn new(side: AlignedSide, reverse: AlignedSide) -> Self {
        Self {
            sequence: side.sequence,
            position: side.position,
            strand: side.strand,
            reverse,
        }
    }

    #[must_use]
    pub fn side(&self) -> AlignedSide {
        AlignedSide {
            sequence: self.sequence,
            position: self.position,
            strand: self.strand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Match,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentOperation {
    pub kind: OperationKind,
    pub length: u64,
    pub score: f64,
}

/// A gapless pairwise alignment between two sequence intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseAlignment {
    pub contig1: String,
    pub start1: i64,
    pub end1: i64,
    pub strand1: Strand,
    pub contig2: String,
    pub start2: i64,
    pub end2: i64,
    pub strand2: Strand,
    pub score: f64,
    pub operations: Vec<AlignmentOperation>,
}

impl From<&AlignedPair> for PairwiseAlignment {
    fn from(pair: &AlignedPair) -> Self {
        let (start1, end1) = pair.side().interval();
        let (start2, end2) = pair.reverse.interval();
        Self {
            contig1: pair.sequence.to_string(),
            start1,
            end1,
            strand1: pair.strand,
            contig2: pair.reverse.sequence.to_string(),
            start2,
            end2,
            strand2: pair.reverse.strand,
            score: 1.0,
            operations: vec![AlignmentOperation {
                kind: OperationKind::Match,
                length: 1,
                score: 0.0,
            }],
        }
    }
}

/// Streams a set of aligned pairs, in sorted order, as one-column pairwise
/// alignments. Consumers that need several passes call [`rewind`](Self::rewind).
#[derive(Debug, Clone, Default)]
pub struct AlignedPairCursor {
    pairs: Vec<AlignedPair>,
    position: usize,
}

impl AlignedPairCursor {
    /// Build a cursor over `pairs`; duplicates are dropped
    pub fn new(pairs: impl IntoIterator<Item = AlignedPair>) -> Self {
        let sorted: BTreeSet<AlignedPair> = pairs.into_iter().collect();
        Self {
            pairs: sorted.into_iter().collect(),
            position: 0,
        }
    }

    /// Restart from the first pair
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Iterator for AlignedPairCursor {
    type Item = PairwiseAlignment;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.pairs.get(self.position)?;
        self.position += 1;
        Some(PairwiseAlignment::from(pair))
    }
}
