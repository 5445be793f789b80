//! Reading of the `loca` table: byte offsets of each glyph within `glyf`.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use std::convert::TryFrom;
use std::ops::Range;

use crate::binary::read::{ReadArray, ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table: `num_glyphs + 1` offsets, the extra entry terminating the
/// last glyph.
pub struct LocaTable<'a> {
    pub offsets: LocaOffsets<'a>,
}

/// The offset array in its on-disk format.
///
/// Short offsets are stored divided by two.
pub enum LocaOffsets<'a> {
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

impl<'a> ReadBinaryDep<'a> for LocaTable<'a> {
    type Args = (usize, IndexToLocFormat); // num_glyphs, index_to_loc_format
    type HostType = Self;

    fn read_dep(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): Self::Args,
    ) -> Result<Self, ParseError> {
        let entries = num_glyphs
            .checked_add(1)
            .ok_or(ParseError::InvalidFontData)?;
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => LocaOffsets::Short(ctxt.read_array::<U16Be>(entries)?),
            IndexToLocFormat::Long => LocaOffsets::Long(ctxt.read_array::<U32Be>(entries)?),
        };
        Ok(LocaTable { offsets })
    }
}

impl<'a> LocaTable<'a> {
    pub fn num_glyphs(&self) -> usize {
        self.offsets.len() - 1
    }

    /// The byte range of `glyph_id` relative to the start of the `glyf`
    /// table.
    ///
    /// An empty range is legal and denotes a glyph with no outline, such as
    /// a space. Offsets that decrease indicate a corrupted index.
    pub fn glyph_range(&self, glyph_id: u16) -> Result<Range<usize>, ParseError> {
        let index = usize::from(glyph_id);
        if index >= self.num_glyphs() {
            return Err(ParseError::InvalidGlyph);
        }
        let start = self.offsets.read_offset(index)?;
        let end = self.offsets.read_offset(index + 1)?;
        if end < start {
            return Err(ParseError::InvalidFontData);
        }
        Ok(start..end)
    }
}

impl<'a> LocaOffsets<'a> {
    fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(array) => array.len(),
            LocaOffsets::Long(array) => array.len(),
        }
    }

    fn read_offset(&self, index: usize) -> Result<usize, ParseError> {
        match self {
            LocaOffsets::Short(array) => array.read_item(index).map(|v| 2 * usize::from(v)),
            LocaOffsets::Long(array) => array
                .read_item(index)
                .and_then(|v| usize::try_from(v).map_err(ParseError::from)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::tests::BeBuffer;

    #[test]
    fn test_short_offsets() {
        // Stored offsets {0x0000, 0x0005, 0x000F} are doubled when decoded.
        let mut data = BeBuffer::new();
        data.u16(0x0000).u16(0x0005).u16(0x000F);
        let loca = ReadScope::new(data.data())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Short))
            .unwrap();
        assert_eq!(loca.num_glyphs(), 2);
        assert_eq!(loca.glyph_range(0), Ok(0..10));
        assert_eq!(loca.glyph_range(1), Ok(10..30));

        // Relative to a glyf table at offset 100 that is glyphs at 100 and
        // 110, of 10 and 20 bytes.
        let glyf_offset = 100;
        let range = loca.glyph_range(0).unwrap();
        assert_eq!((glyf_offset + range.start, range.len()), (100, 10));
        let range = loca.glyph_range(1).unwrap();
        assert_eq!((glyf_offset + range.start, range.len()), (110, 20));
    }

    #[test]
    fn test_long_offsets() {
        let mut data = BeBuffer::new();
        data.u32(0).u32(50).u32(150);
        let loca = ReadScope::new(data.data())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Long))
            .unwrap();
        assert_eq!(loca.glyph_range(0), Ok(0..50));
        assert_eq!(loca.glyph_range(1), Ok(50..150));
    }

    #[test]
    fn test_empty_glyph_range() {
        let mut data = BeBuffer::new();
        data.u32(40).u32(40).u32(64);
        let loca = ReadScope::new(data.data())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Long))
            .unwrap();
        let range = loca.glyph_range(0).unwrap();
        assert!(range.is_empty());
    }

    #[test]
    fn test_glyph_index_out_of_range() {
        let mut data = BeBuffer::new();
        data.u16(0).u16(4).u16(8);
        let loca = ReadScope::new(data.data())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Short))
            .unwrap();
        assert_eq!(loca.glyph_range(2), Err(ParseError::InvalidGlyph));
        assert_eq!(loca.glyph_range(u16::max_value()), Err(ParseError::InvalidGlyph));
    }

    #[test]
    fn test_decreasing_offsets() {
        let mut data = BeBuffer::new();
        data.u16(8).u16(4).u16(8);
        let loca = ReadScope::new(data.data())
            .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Short))
            .unwrap();
        assert_eq!(loca.glyph_range(0), Err(ParseError::InvalidFontData));
    }

    #[test]
    fn test_truncated_table() {
        let mut data = BeBuffer::new();
        data.u16(0).u16(4);
        assert_eq!(
            ReadScope::new(data.data())
                .read_dep::<LocaTable<'_>>((2, IndexToLocFormat::Short))
                .err(),
            Some(ParseError::OutOfBounds)
        );
    }
}
