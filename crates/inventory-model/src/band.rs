use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Primary key of an inventory row. Encodes both ordering and lifecycle band.
pub type SequenceCode = i64;

/// Reserved numeric range of [`SequenceCode`] denoting a row's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// `< 50000`: a normal, currently-expected item.
    Active,
    /// `[50000, 51000)`: not found in the latest authoritative roster.
    PendingRemoval,
    /// `[51000, 52000)`: a repeated scan of an already-resolved identifier.
    DuplicateFlag,
}

impl Band {
    pub const PENDING_REMOVAL_FLOOR: SequenceCode = 50_000;
    pub const DUPLICATE_FLAG_FLOOR: SequenceCode = 51_000;
    pub const DUPLICATE_FLAG_CEILING: SequenceCode = 52_000;

    /// The band a code falls into. Codes at or above `52000` belong to no band.
    pub const fn of(code: SequenceCode) -> Option<Band> {
        if code < Self::PENDING_REMOVAL_FLOOR {
            Some(Band::Active)
        } else if code < Self::DUPLICATE_FLAG_FLOOR {
            Some(Band::PendingRemoval)
        } else if code < Self::DUPLICATE_FLAG_CEILING {
            Some(Band::DuplicateFlag)
        } else {
            None
        }
    }

    /// Half-open code range reserved for allocation in this band.
    ///
    /// The active band is allocated from `1`; codes at or below zero are still
    /// classified as active by [`Band::of`].
    pub const fn allocation_range(self) -> Range<SequenceCode> {
        match self {
            Band::Active => 1..Self::PENDING_REMOVAL_FLOOR,
            Band::PendingRemoval => Self::PENDING_REMOVAL_FLOOR..Self::DUPLICATE_FLAG_FLOOR,
            Band::DuplicateFlag => Self::DUPLICATE_FLAG_FLOOR..Self::DUPLICATE_FLAG_CEILING,
        }
    }

    pub const fn floor(self) -> SequenceCode {
        self.allocation_range().start
    }

    pub const fn contains(self, code: SequenceCode) -> bool {
        matches!(Band::of(code), Some(band) if band as u8 == self as u8)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Band::Active => "active",
            Band::PendingRemoval => "pending-removal",
            Band::DuplicateFlag => "duplicate-flag",
        }
    }
}
