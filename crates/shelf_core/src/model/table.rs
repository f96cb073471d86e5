//! Table selector shared by every layer.
//!
//! # Invariants
//! - The mapping from console codes and names to `TableKind` is total over the
//!   three catalog tables and injective.
//! - Unknown selectors are reported as `UnknownTableKind`, never guessed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Closed set of catalog tables.
///
/// Ordering follows parent-before-child so sorted sets of `(TableKind, id)`
/// list parent tables first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Author,
    Genre,
    Book,
}

/// Console code for the `books` table.
pub const TABLE_CODE_BOOK: i64 = 7;
/// Console code for the `authors` table.
pub const TABLE_CODE_AUTHOR: i64 = 8;
/// Console code for the `genres` table.
pub const TABLE_CODE_GENRE: i64 = 9;

impl TableKind {
    /// Every table, parents first.
    pub const ALL: [TableKind; 3] = [TableKind::Author, TableKind::Genre, TableKind::Book];

    /// Maps a numeric console selector onto a table.
    pub fn from_code(code: i64) -> Result<Self, UnknownTableKind> {
        match code {
            TABLE_CODE_BOOK => Ok(Self::Book),
            TABLE_CODE_AUTHOR => Ok(Self::Author),
            TABLE_CODE_GENRE => Ok(Self::Genre),
            other => Err(UnknownTableKind(other.to_string())),
        }
    }

    /// Numeric console selector for this table.
    pub fn code(self) -> i64 {
        match self {
            Self::Book => TABLE_CODE_BOOK,
            Self::Author => TABLE_CODE_AUTHOR,
            Self::Genre => TABLE_CODE_GENRE,
        }
    }

    /// Stable storage name, also used in log events.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Author => "authors",
            Self::Genre => "genres",
            Self::Book => "books",
        }
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for TableKind {
    type Err = UnknownTableKind;

    /// Accepts singular/plural names (case-insensitive) and console codes.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "author" | "authors" => Ok(Self::Author),
            "genre" | "genres" => Ok(Self::Genre),
            "book" | "books" => Ok(Self::Book),
            other => match other.parse::<i64>() {
                Ok(code) => Self::from_code(code),
                Err(_) => Err(UnknownTableKind(value.trim().to_string())),
            },
        }
    }
}

/// Caller supplied a table selector outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTableKind(pub String);

impl Display for UnknownTableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown table `{}`; expected {}|{}|{} or books|authors|genres",
            self.0, TABLE_CODE_BOOK, TABLE_CODE_AUTHOR, TABLE_CODE_GENRE
        )
    }
}

impl Error for UnknownTableKind {}

#[cfg(test)]
mod tests {
    use super::{TableKind, UnknownTableKind};

    #[test]
    fn console_codes_map_to_tables() {
        assert_eq!(TableKind::from_code(7), Ok(TableKind::Book));
        assert_eq!(TableKind::from_code(8), Ok(TableKind::Author));
        assert_eq!(TableKind::from_code(9), Ok(TableKind::Genre));
        assert_eq!(
            TableKind::from_code(6),
            Err(UnknownTableKind("6".to_string()))
        );
    }

    #[test]
    fn codes_round_trip_for_every_table() {
        for kind in TableKind::ALL {
            assert_eq!(TableKind::from_code(kind.code()), Ok(kind));
        }
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(" Authors ".parse::<TableKind>(), Ok(TableKind::Author));
        assert_eq!("genre".parse::<TableKind>(), Ok(TableKind::Genre));
        assert_eq!("7".parse::<TableKind>(), Ok(TableKind::Book));
        assert!("shelves".parse::<TableKind>().is_err());
    }
}
