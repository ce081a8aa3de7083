//! # Pool Statistics
//!
//! Read-only snapshots for HUDs, logs and tests.

use crate::handle::SegmentId;
use crate::segment::Segment;

/// Occupancy of one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentStats {
    /// Segment identity.
    pub id: SegmentId,
    /// Slot count.
    pub size: usize,
    /// Slots ready to hand out.
    pub available: usize,
}

/// Occupancy of the whole pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of live segments.
    pub segment_count: usize,
    /// Per-segment occupancy, in creation order.
    pub segments: Vec<SegmentStats>,
    /// Sum of segment sizes.
    pub total: usize,
    /// Sum of available slots.
    pub available: usize,
    /// `total - available`.
    pub used: usize,
}

impl SegmentStats {
    pub(crate) fn of(segment: &Segment) -> Self {
        Self {
            id: segment.id(),
            size: segment.size(),
            available: segment.available(),
        }
    }

    /// Slots currently handed out.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.size - self.available
    }

    /// No slot is live.
    #[inline]
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.available == self.size
    }
}

impl PoolStats {
    pub(crate) fn collect<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Self {
        let segments: Vec<SegmentStats> = segments.into_iter().map(SegmentStats::of).collect();
        let total = segments.iter().map(|s| s.size).sum();
        let available = segments.iter().map(|s| s.available).sum();

        Self {
            segment_count: segments.len(),
            segments,
            total,
            available,
            used: total - available,
        }
    }

    /// Fraction of capacity in use, `0.0` for an empty pool.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64
        }
    }
}
