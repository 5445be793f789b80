//! Tracery is a parser for TrueType and OpenType fonts that decodes glyph
//! descriptions into vector outlines: closed contours of line segments and
//! quadratic Bézier curves, ready for rasterization or distance-field
//! generation.
//!
//! The parser is zero-copy — every table is a borrowed view of the font
//! buffer and glyphs are decoded on demand — and read-only: it does not
//! execute hinting programs, apply layout, or write fonts.
//!
//! ```no_run
//! use tracery::binary::read::ReadScope;
//! use tracery::Font;
//!
//! # fn main() -> Result<(), tracery::ParseError> {
//! let buffer = std::fs::read("some.ttf").expect("unable to read font");
//! let font = Font::new(ReadScope::new(&buffer))?;
//! let shape = font.shape_for_char(u32::from('a'))?;
//! for contour in &shape.contours {
//!     println!("contour with {} edges", contour.edges.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod error;
pub mod font;
pub mod outline;
pub mod tables;
pub mod tag;

#[cfg(test)]
pub mod tests;

pub use crate::error::ParseError;
pub use crate::font::Font;
pub use crate::outline::{Contour, EdgeSegment, Shape, Vec2};
