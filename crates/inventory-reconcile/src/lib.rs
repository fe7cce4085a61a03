//! Row-reconciliation engine for the asset inventory sheet.
//!
//! Three workflows share one engine:
//! - [`ScanSession`] in [`ScanMode::ScanIn`]: stamp scanned items as seen
//! - [`ScanSession`] in [`ScanMode::ScanOut`]: also mark them `Out` at a location
//! - [`RosterImport`]: renumber the inventory against the authoritative roster
//!
//! Sessions work against an [`inventory_io::InventoryStore`]. Nothing reaches
//! the store's backing file until `finish` succeeds.

pub mod allocator;
pub mod duplicates;
mod error;
pub mod finalize;
pub mod import;
pub mod index;
pub mod location;
pub mod normalize;
pub mod report;
pub mod scan;

pub use allocator::{AllocationError, BandAllocator};
pub use duplicates::{detect_duplicates, DuplicateGroup, DuplicateReport};
pub use error::{InputError, ReconcileError, SessionWarning};
pub use import::{ImportOutcome, ImportRow, RosterImport};
pub use normalize::NormalizedKey;
pub use report::{Classification, RowSummary, RunMode, SessionReport};
pub use scan::{is_finish_sentinel, ScanMode, ScanOutcome, ScanRecord, ScanSession};
