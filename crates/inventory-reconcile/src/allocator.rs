//! Sequence-code allocation within a lifecycle band.

use std::collections::BTreeSet;

use inventory_model::{Band, SequenceCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("no free sequence codes left in the {} band", band.label())]
    Exhausted { band: Band },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocationStrategy {
    /// Continue after the highest code seen in the band.
    HighWater,
    /// Hand out the smallest unused code at or above the band floor.
    GapFilling,
}

/// Allocator for one band, seeded from the codes already present in a sheet.
///
/// Every allocated code is reserved, so one allocator never hands out the same
/// code twice.
#[derive(Debug, Clone)]
pub struct BandAllocator {
    band: Band,
    strategy: AllocationStrategy,
    next: SequenceCode,
    used: BTreeSet<SequenceCode>,
}

impl BandAllocator {
    /// `next = max(existing in band) + 1`, or the band floor.
    pub fn high_water(band: Band, existing: impl IntoIterator<Item = SequenceCode>) -> Self {
        let used: BTreeSet<SequenceCode> = in_band(band, existing).collect();
        let next = used
            .last()
            .map(|max| max + 1)
            .unwrap_or_else(|| band.floor());
        Self {
            band,
            strategy: AllocationStrategy::HighWater,
            next,
            used,
        }
    }

    /// Smallest unused code `>= floor`, reusing gaps.
    pub fn gap_filling(band: Band, existing: impl IntoIterator<Item = SequenceCode>) -> Self {
        Self {
            band,
            strategy: AllocationStrategy::GapFilling,
            next: band.floor(),
            used: in_band(band, existing).collect(),
        }
    }

    pub fn allocate(&mut self) -> Result<SequenceCode, AllocationError> {
        if self.strategy == AllocationStrategy::GapFilling {
            while self.used.contains(&self.next) {
                self.next += 1;
            }
        }
        let code = self.next;
        if code >= self.band.allocation_range().end {
            return Err(AllocationError::Exhausted { band: self.band });
        }
        self.used.insert(code);
        self.next = code + 1;
        Ok(code)
    }
}

fn in_band(
    band: Band,
    codes: impl IntoIterator<Item = SequenceCode>,
) -> impl Iterator<Item = SequenceCode> {
    let range = band.allocation_range();
    codes.into_iter().filter(move |code| range.contains(code))
}
