//! Funding-source strategies and their priority ordering.
//!
//! A [`FundingSource`] describes one address/key-set the caller controls and
//! how its cells may be consumed. Sources are read-only selectors: the
//! engine never mutates them, it only orders and expands them.

use tessera_core::types::Script;

/// A height or timestamp threshold after which a time-locked cell is
/// claimable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Since {
    /// Claimable at or after this block height.
    Height(u64),
    /// Claimable at or after this Unix timestamp (seconds).
    Timestamp(u64),
}

impl Since {
    /// Top bit of the raw `since` field distinguishes timestamps from
    /// heights.
    const TIMESTAMP_FLAG: u64 = 1 << 63;

    /// Raw encoding carried in a [`CellInput`](tessera_core::types::CellInput).
    pub fn raw(&self) -> u64 {
        match self {
            Self::Height(h) => *h,
            Self::Timestamp(t) => *t | Self::TIMESTAMP_FLAG,
        }
    }

    /// Whether the threshold has been reached at the given tip.
    pub fn is_reached(&self, tip: &TipContext) -> bool {
        match self {
            Self::Height(h) => tip.height >= *h,
            Self::Timestamp(t) => tip.timestamp >= *t,
        }
    }
}

/// Finality context gating time-locked sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TipContext {
    /// Current chain tip height.
    pub height: u64,
    /// Timestamp of the tip block (Unix seconds).
    pub timestamp: u64,
}

/// How a lock script's cells may be consumed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FundingSource {
    /// Plain single-signature cells; fully drainable.
    Simple {
        /// Owner lock script.
        lock: Script,
    },
    /// Multi-signature cells; fully drainable, lower priority than simple.
    Multisig {
        /// Owner lock script.
        lock: Script,
    },
    /// Self-paying (anyone-can-pay style) cells: merge-on-touch.
    SelfPaying {
        /// Owner lock script.
        lock: Script,
        /// If true the cell may be fully drained like a normal cell; if
        /// false it must retain its own minimal capacity and receive its
        /// surplus back.
        destroyable: bool,
    },
    /// Cells claimable only after a height/timestamp threshold. Skipped
    /// entirely unless a [`TipContext`] is supplied and the threshold is
    /// reached.
    TimeLocked {
        /// Owner lock script.
        lock: Script,
        /// Claim threshold.
        unlock: Since,
    },
}

impl FundingSource {
    /// The lock script this source selects cells by.
    pub fn lock(&self) -> &Script {
        match self {
            Self::Simple { lock }
            | Self::Multisig { lock }
            | Self::SelfPaying { lock, .. }
            | Self::TimeLocked { lock, .. } => lock,
        }
    }

    /// `since` value asserted by inputs consumed from this source.
    pub(crate) fn since_value(&self) -> u64 {
        match self {
            Self::TimeLocked { unlock, .. } => unlock.raw(),
            _ => 0,
        }
    }

    /// Priority tier, lower is consumed first.
    fn tier(&self) -> u8 {
        match self {
            Self::TimeLocked { .. } => 0,
            Self::Simple { .. } => 1,
            Self::Multisig { .. } => 2,
            Self::SelfPaying { .. } => 3,
        }
    }
}

/// Order sources by priority tier, keeping caller order within a tier.
///
/// Time-locked sources are dropped unless the tip context is present and
/// their threshold is reached.
pub(crate) fn ordered<'a>(
    sources: &'a [FundingSource],
    tip: Option<&TipContext>,
) -> Vec<&'a FundingSource> {
    let mut eligible: Vec<&FundingSource> = sources
        .iter()
        .filter(|s| match s {
            FundingSource::TimeLocked { unlock, .. } => {
                tip.is_some_and(|t| unlock.is_reached(t))
            }
            _ => true,
        })
        .collect();
    // stable sort preserves caller order within a tier
    eligible.sort_by_key(|s| s.tier());
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::types::{Hash256, HashType};

    fn lock(tag: u8) -> Script {
        Script {
            code_hash: Hash256([tag; 32]),
            hash_type: HashType::Type,
            args: vec![tag; 20],
        }
    }

    #[test]
    fn since_raw_tags_timestamps() {
        assert_eq!(Since::Height(100).raw(), 100);
        assert_eq!(Since::Timestamp(100).raw(), 100 | (1 << 63));
    }

    #[test]
    fn since_reached_by_height_and_timestamp() {
        let tip = TipContext { height: 50, timestamp: 1_700_000_000 };
        assert!(Since::Height(50).is_reached(&tip));
        assert!(!Since::Height(51).is_reached(&tip));
        assert!(Since::Timestamp(1_699_999_999).is_reached(&tip));
        assert!(!Since::Timestamp(1_700_000_001).is_reached(&tip));
    }

    #[test]
    fn ordering_puts_time_locked_first_with_tip() {
        let sources = vec![
            FundingSource::SelfPaying { lock: lock(1), destroyable: false },
            FundingSource::Multisig { lock: lock(2) },
            FundingSource::TimeLocked { lock: lock(3), unlock: Since::Height(10) },
            FundingSource::Simple { lock: lock(4) },
        ];
        let tip = TipContext { height: 100, timestamp: 0 };
        let order = ordered(&sources, Some(&tip));
        assert_eq!(order.len(), 4);
        assert!(matches!(order[0], FundingSource::TimeLocked { .. }));
        assert!(matches!(order[1], FundingSource::Simple { .. }));
        assert!(matches!(order[2], FundingSource::Multisig { .. }));
        assert!(matches!(order[3], FundingSource::SelfPaying { .. }));
    }

    #[test]
    fn time_locked_skipped_without_tip() {
        let sources = vec![
            FundingSource::TimeLocked { lock: lock(3), unlock: Since::Height(10) },
            FundingSource::Simple { lock: lock(4) },
        ];
        let order = ordered(&sources, None);
        assert_eq!(order.len(), 1);
        assert!(matches!(order[0], FundingSource::Simple { .. }));
    }

    #[test]
    fn time_locked_skipped_before_threshold() {
        let sources = vec![
            FundingSource::TimeLocked { lock: lock(3), unlock: Since::Height(200) },
        ];
        let tip = TipContext { height: 100, timestamp: 0 };
        assert!(ordered(&sources, Some(&tip)).is_empty());
    }

    #[test]
    fn caller_order_kept_within_tier() {
        let sources = vec![
            FundingSource::Simple { lock: lock(1) },
            FundingSource::Simple { lock: lock(2) },
            FundingSource::Simple { lock: lock(3) },
        ];
        let order = ordered(&sources, None);
        let tags: Vec<u8> = order.iter().map(|s| s.lock().args[0]).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }
}
