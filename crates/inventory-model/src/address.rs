use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A worksheet column.
///
/// Columns are **1-based**, matching the spreadsheet convention the inventory
/// layout is written in:
/// - `Column::new(1)` is column `A`
/// - `Column::new(27)` is column `AA`
///
/// Serialized as its letter name so configuration files read like the sheet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column(u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnParseError {
    #[error("empty column name")]
    Empty,
    #[error("invalid column name `{0}`")]
    Invalid(String),
}

impl Column {
    /// Construct a column from its 1-based index.
    ///
    /// Index `0` is clamped to `1`; there is no column before `A`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        if index == 0 {
            Self(1)
        } else {
            Self(index)
        }
    }

    /// 1-based index of the column.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Column letters (e.g. `A`, `AA`).
    pub fn name(self) -> String {
        col_to_name(self.0)
    }

    /// Parse column letters (`"c"`, `"AA"`). Surrounding whitespace and `$` are ignored.
    pub fn from_name(name: &str) -> Result<Self, ColumnParseError> {
        let s = name.trim().trim_start_matches('$');
        if s.is_empty() {
            return Err(ColumnParseError::Empty);
        }
        name_to_col(s)
            .map(Self)
            .ok_or_else(|| ColumnParseError::Invalid(name.to_string()))
    }

    /// The column `offset` places to the right.
    #[inline]
    pub const fn shifted(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::from_name(s)
    }
}

impl TryFrom<String> for Column {
    type Error = ColumnParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Column::from_name(&value)
    }
}

impl From<Column> for String {
    fn from(value: Column) -> Self {
        value.name()
    }
}

fn col_to_name(col: u32) -> String {
    let mut n = col;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn name_to_col(s: &str) -> Option<u32> {
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(v)?;
    }
    (col > 0).then_some(col)
}
