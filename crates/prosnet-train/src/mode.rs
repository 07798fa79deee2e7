//! Update modes.
//!
//! A mode fixes which space the target vectors are read from and which side
//! of a training pair receives gradient:
//!
//! | mode | targets from | updates |
//! |------|--------------|---------|
//! | 0 | context space | source only |
//! | 1 | context space | targets only |
//! | 2 | source space | both (first-order proximity) |
//! | 3 | context space | both (second-order proximity) |

use std::fmt;

/// Which embedding space a vector lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Source,
    Context,
}

/// One of the four per-segment update modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Source vectors learn against frozen context vectors.
    SourceOnly,
    /// Context vectors learn against frozen source vectors.
    ContextOnly,
    /// Source against source.
    FirstOrder,
    /// Source against context, both updated.
    SecondOrder,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::SourceOnly,
        Mode::ContextOnly,
        Mode::FirstOrder,
        Mode::SecondOrder,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Mode::SourceOnly => 0,
            Mode::ContextOnly => 1,
            Mode::FirstOrder => 2,
            Mode::SecondOrder => 3,
        }
    }

    /// Space the positive and negative targets are read from.
    #[inline]
    pub fn target_space(self) -> Space {
        match self {
            Mode::FirstOrder => Space::Source,
            _ => Space::Context,
        }
    }

    #[inline]
    pub fn updates_source(self) -> bool {
        !matches!(self, Mode::ContextOnly)
    }

    #[inline]
    pub fn updates_targets(self) -> bool {
        !matches!(self, Mode::SourceOnly)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
