use serde::{Deserialize, Serialize};

/// Identity of an end or event that is shared by its copies at every level
/// of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name(pub u64);

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the record in its arena table
            #[must_use]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle to a flower (one level of the hierarchy)
    FlowerId,
    "flower#"
);
handle!(
    /// Handle to a group of ends
    GroupId,
    "group#"
);
handle!(
    /// Handle to an end
    EndId,
    "end#"
);
handle!(
    /// Handle to a block (aligned column)
    BlockId,
    "block#"
);
handle!(
    /// Handle to a segment (one event's instance of a block)
    SegmentId,
    "segment#"
);
handle!(
    /// Handle to a cap (one event's instance of an end)
    CapId,
    "cap#"
);
handle!(
    /// Handle to a chain
    ChainId,
    "chain#"
);
handle!(
    /// Handle to a link of a chain
    LinkId,
    "link#"
);
handle!(
    /// Handle to an event
    EventId,
    "event#"
);
handle!(
    /// Handle to a per-flower event tree
    EventTreeId,
    "tree#"
);

/// Which side of a sequence an end (and its caps) sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    FivePrime,
    ThreePrime,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::FivePrime => Self::ThreePrime,
            Self::ThreePrime => Self::FivePrime,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FivePrime => write!(f, "5'"),
            Self::ThreePrime => write!(f, "3'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(EndId(3).to_string(), "end#3");
        assert_eq!(FlowerId(0).to_string(), "flower#0");
        assert_eq!(Name(42).to_string(), "42");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::FivePrime.opposite(), Side::ThreePrime);
        assert_eq!(Side::ThreePrime.opposite(), Side::FivePrime);
    }
}
