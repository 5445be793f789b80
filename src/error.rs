//! The error type used throughout the crate.

use std::error::Error;
use std::fmt;
use std::num::TryFromIntError;

/// Errors that can occur when reading font data.
///
/// Every fallible operation in the crate surfaces one of these variants.
/// Lookups that merely miss (an unmapped code point, an absent optional
/// record) are not errors and are reported as `None` or glyph 0 instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A read extended past the end of the font buffer or an internally
    /// computed span.
    OutOfBounds,
    /// A structural invariant of the font data was violated.
    InvalidFontData,
    /// The data was recognised but uses a format this crate does not handle.
    UnsupportedFormat,
    /// A required table is not present in the font.
    TableNotFound,
    /// A glyph index outside `[0, num_glyphs)` was supplied.
    InvalidGlyph,
    /// An allocation could not be satisfied.
    OutOfMemory,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OutOfBounds => write!(f, "read past the end of the data"),
            ParseError::InvalidFontData => write!(f, "invalid font data"),
            ParseError::UnsupportedFormat => write!(f, "unsupported format"),
            ParseError::TableNotFound => write!(f, "required table not found"),
            ParseError::InvalidGlyph => write!(f, "glyph index out of range"),
            ParseError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl Error for ParseError {}

impl From<TryFromIntError> for ParseError {
    fn from(_error: TryFromIntError) -> Self {
        ParseError::InvalidFontData
    }
}
