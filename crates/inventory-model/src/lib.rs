//! `inventory-model` defines the data structures shared by the inventory crates.
//!
//! The crate is intentionally free of I/O so it can be reused by:
//! - the spreadsheet store (`inventory-io`)
//! - the reconciliation engine (`inventory-reconcile`)
//! - the command-line front-end, which deserializes [`InventoryConfig`] from JSON

mod address;
mod band;
pub mod config;
mod layout;
mod row;
mod serde_defaults;
mod value;

pub use address::{Column, ColumnParseError};
pub use band::{Band, SequenceCode};
pub use config::InventoryConfig;
pub use layout::{ImportLayout, SheetLayout, DATA_START_ROW, HEADER_ROW};
pub use row::{Disposition, Row};
pub use value::CellValue;
