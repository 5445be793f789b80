//! Reading of the sfnt table directory and the fixed-layout tables.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/otff>

pub mod cmap;
pub mod glyf;
pub mod loca;

use std::convert::TryFrom;

use crate::binary::read::{
    ReadArray, ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope,
};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;
use crate::tag;

/// sfnt version for fonts with TrueType outlines.
pub const TTF_MAGIC: u32 = 0x0001_0000;

/// `magicNumber` of the `head` table.
const HEAD_MAGIC: u32 = 0x5F0F_3CF5;

/// An OpenType font file: the table directory plus the scope it indexes into.
pub struct OpenTypeFile<'a> {
    /// Scope of the whole font, for dereferencing table records.
    pub scope: ReadScope<'a>,
    /// The table directory.
    pub offset_table: OffsetTable<'a>,
}

/// The sfnt header and table directory.
#[derive(Debug, PartialEq)]
pub struct OffsetTable<'a> {
    pub sfnt_version: u32,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
    pub table_records: ReadArray<'a, TableRecord>,
}

/// An entry in the table directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub table_tag: u32,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// `head` table.
///
/// — <https://docs.microsoft.com/en-us/typography/opentype/spec/head>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: u32,
    pub check_sum_adjustment: u32,
    pub flags: u16,
    pub units_per_em: u16,
    pub created: i64,
    pub modified: i64,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: i16,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: i16,
}

/// The format of the offsets in the `loca` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexToLocFormat {
    /// Offsets are 16-bit, stored divided by 2.
    Short,
    /// Offsets are 32-bit.
    Long,
}

/// `maxp` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxpTable {
    pub version: u32,
    pub num_glyphs: u16,
}

/// `hhea` table.
///
/// — <https://docs.microsoft.com/en-us/typography/opentype/spec/hhea>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HheaTable {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub num_h_metrics: u16,
}

/// `hmtx` table.
///
/// The table holds `num_h_metrics` full metric records; glyphs beyond that
/// reuse the last advance width and take their left side bearing from a
/// trailing array.
pub struct HmtxTable<'a> {
    pub h_metrics: ReadArray<'a, LongHorMetric>,
    pub left_side_bearings: ReadArray<'a, I16Be>,
}

/// A `(advance width, left side bearing)` record in the `hmtx` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongHorMetric {
    pub advance_width: u16,
    pub lsb: i16,
}

impl<'a> ReadBinary<'a> for OpenTypeFile<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let offset_table = ctxt.read::<OffsetTable<'_>>()?;
        Ok(OpenTypeFile {
            scope,
            offset_table,
        })
    }
}

impl<'a> ReadBinary<'a> for OffsetTable<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let sfnt_version = ctxt.read_u32be()?;
        match sfnt_version {
            TTF_MAGIC | tag::TRUE | tag::OTTO => {}
            _ => return Err(ParseError::UnsupportedFormat),
        }
        let num_tables = ctxt.read_u16be()?;
        let search_range = ctxt.read_u16be()?;
        let entry_selector = ctxt.read_u16be()?;
        let range_shift = ctxt.read_u16be()?;
        let table_records = ctxt.read_array::<TableRecord>(usize::from(num_tables))?;
        Ok(OffsetTable {
            sfnt_version,
            search_range,
            entry_selector,
            range_shift,
            table_records,
        })
    }
}

impl<'a> OpenTypeFile<'a> {
    /// Find a table in the directory and dereference it.
    pub fn read_table(&self, tag: u32) -> Result<Option<ReadScope<'a>>, ParseError> {
        self.offset_table.read_table(&self.scope, tag)
    }
}

impl<'a> OffsetTable<'a> {
    /// The first record with the given tag, in file order.
    ///
    /// Duplicate tags and zero-length tables are tolerated; validation of a
    /// record's byte span is deferred until the table is dereferenced.
    pub fn find_table_record(&self, tag: u32) -> Option<TableRecord> {
        self.table_records
            .iter()
            .find(|record| record.table_tag == tag)
    }

    /// Dereference the table with the given tag, checking its span against
    /// the font buffer.
    pub fn read_table(
        &self,
        scope: &ReadScope<'a>,
        tag: u32,
    ) -> Result<Option<ReadScope<'a>>, ParseError> {
        match self.find_table_record(tag) {
            Some(record) => record.read_table(scope).map(Some),
            None => Ok(None),
        }
    }
}

impl TableRecord {
    /// The table's bytes within `scope`, or `OutOfBounds` if the record's
    /// span escapes it.
    pub fn read_table<'a>(&self, scope: &ReadScope<'a>) -> Result<ReadScope<'a>, ParseError> {
        let offset = usize::try_from(self.offset)?;
        let length = usize::try_from(self.length)?;
        scope.offset_length(offset, length)
    }
}

impl<'a> ReadFrom<'a> for TableRecord {
    type ReadType = ((U32Be, U32Be), (U32Be, U32Be));

    fn from(((table_tag, checksum), (offset, length)): ((u32, u32), (u32, u32))) -> Self {
        TableRecord {
            table_tag,
            checksum,
            offset,
            length,
        }
    }
}

impl<'a> ReadBinary<'a> for HeadTable {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let minor_version = ctxt.read_u16be()?;
        let font_revision = ctxt.read_u32be()?;
        let check_sum_adjustment = ctxt.read_u32be()?;
        let magic_number = ctxt.read_u32be()?;
        if magic_number != HEAD_MAGIC {
            return Err(ParseError::InvalidFontData);
        }
        let flags = ctxt.read_u16be()?;
        let units_per_em = ctxt.read_u16be()?;
        let created = ctxt.read_i64be()?;
        let modified = ctxt.read_i64be()?;
        let x_min = ctxt.read_i16be()?;
        let y_min = ctxt.read_i16be()?;
        let x_max = ctxt.read_i16be()?;
        let y_max = ctxt.read_i16be()?;
        let mac_style = ctxt.read_u16be()?;
        let lowest_rec_ppem = ctxt.read_u16be()?;
        let font_direction_hint = ctxt.read_i16be()?;
        let index_to_loc_format = match ctxt.read_i16be()? {
            0 => IndexToLocFormat::Short,
            1 => IndexToLocFormat::Long,
            _ => return Err(ParseError::InvalidFontData),
        };
        let glyph_data_format = ctxt.read_i16be()?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            check_sum_adjustment,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }
}

impl<'a> ReadBinary<'a> for MaxpTable {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_u32be()?;
        let num_glyphs = ctxt.read_u16be()?;
        // Version 1.0 tables carry a further 13 fields of limits that only a
        // hinting interpreter needs; they are left unread.
        Ok(MaxpTable {
            version,
            num_glyphs,
        })
    }
}

impl<'a> ReadBinary<'a> for HheaTable {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let major_version = ctxt.read_u16be()?;
        let _minor_version = ctxt.read_u16be()?;
        if major_version != 1 {
            return Err(ParseError::UnsupportedFormat);
        }
        let ascender = ctxt.read_i16be()?;
        let descender = ctxt.read_i16be()?;
        let line_gap = ctxt.read_i16be()?;
        let advance_width_max = ctxt.read_u16be()?;
        let min_left_side_bearing = ctxt.read_i16be()?;
        let min_right_side_bearing = ctxt.read_i16be()?;
        let x_max_extent = ctxt.read_i16be()?;
        let caret_slope_rise = ctxt.read_i16be()?;
        let caret_slope_run = ctxt.read_i16be()?;
        let caret_offset = ctxt.read_i16be()?;
        for _ in 0..4 {
            let _reserved = ctxt.read_i16be()?;
        }
        let metric_data_format = ctxt.read_i16be()?;
        if metric_data_format != 0 {
            return Err(ParseError::InvalidFontData);
        }
        let num_h_metrics = ctxt.read_u16be()?;

        Ok(HheaTable {
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            num_h_metrics,
        })
    }
}

impl<'a> ReadBinaryDep<'a> for HmtxTable<'a> {
    type Args = (usize, usize); // num_glyphs, num_h_metrics
    type HostType = Self;

    fn read_dep(ctxt: &mut ReadCtxt<'a>, (num_glyphs, num_h_metrics): Self::Args) -> Result<Self, ParseError> {
        let h_metrics = ctxt.read_array::<LongHorMetric>(num_h_metrics)?;
        let left_side_bearings =
            ctxt.read_array::<I16Be>(num_glyphs.saturating_sub(num_h_metrics))?;
        Ok(HmtxTable {
            h_metrics,
            left_side_bearings,
        })
    }
}

impl<'a> HmtxTable<'a> {
    fn num_glyphs(&self) -> usize {
        self.h_metrics.len() + self.left_side_bearings.len()
    }

    /// The advance width of `glyph_id` in font units.
    pub fn horizontal_advance(&self, glyph_id: u16) -> Result<u16, ParseError> {
        let index = usize::from(glyph_id);
        if index >= self.num_glyphs() {
            return Err(ParseError::InvalidGlyph);
        }
        if index < self.h_metrics.len() {
            self.h_metrics.read_item(index).map(|metric| metric.advance_width)
        } else {
            // Glyphs past numOfLongHorMetrics reuse the last advance width.
            self.h_metrics.last().map(|metric| metric.advance_width)
        }
    }

    /// The left side bearing of `glyph_id` in font units.
    pub fn left_side_bearing(&self, glyph_id: u16) -> Result<i16, ParseError> {
        let index = usize::from(glyph_id);
        if index >= self.num_glyphs() {
            return Err(ParseError::InvalidGlyph);
        }
        if index < self.h_metrics.len() {
            self.h_metrics.read_item(index).map(|metric| metric.lsb)
        } else {
            self.left_side_bearings.read_item(index - self.h_metrics.len())
        }
    }
}

impl<'a> ReadFrom<'a> for LongHorMetric {
    type ReadType = (U16Be, I16Be);

    fn from((advance_width, lsb): (u16, i16)) -> Self {
        LongHorMetric { advance_width, lsb }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::BeBuffer;

    fn head_table_data() -> BeBuffer {
        let mut head = BeBuffer::new();
        head.u16(1).u16(0); // version
        head.u32(0x00010000); // fontRevision
        head.u32(0); // checkSumAdjustment
        head.u32(super::HEAD_MAGIC);
        head.u16(0); // flags
        head.u16(1000); // unitsPerEm
        head.i64(0).i64(0); // created, modified
        head.i16(-100).i16(-200).i16(800).i16(900); // bounding box
        head.u16(0); // macStyle
        head.u16(8); // lowestRecPPEM
        head.i16(2); // fontDirectionHint
        head.i16(0); // indexToLocFormat
        head.i16(0); // glyphDataFormat
        head
    }

    #[test]
    fn test_read_head() {
        let data = head_table_data();
        let head = ReadScope::new(data.data()).read::<HeadTable>().unwrap();
        assert_eq!(head.units_per_em, 1000);
        assert_eq!(head.index_to_loc_format, IndexToLocFormat::Short);
        assert_eq!(head.x_min, -100);
        assert_eq!(head.y_max, 900);
    }

    #[test]
    fn test_head_bad_magic() {
        let mut data = head_table_data();
        data.set_u32(12, 0xDEADBEEF);
        assert_eq!(
            ReadScope::new(data.data()).read::<HeadTable>(),
            Err(ParseError::InvalidFontData)
        );
    }

    #[test]
    fn test_head_bad_loc_format() {
        let mut data = head_table_data();
        data.set_u16(50, 2); // indexToLocFormat
        assert_eq!(
            ReadScope::new(data.data()).read::<HeadTable>(),
            Err(ParseError::InvalidFontData)
        );
    }

    #[test]
    fn test_read_offset_table() {
        let mut data = BeBuffer::new();
        data.u32(TTF_MAGIC);
        data.u16(2).u16(16).u16(0).u16(16);
        data.u32(crate::tag::GLYF).u32(0).u32(44).u32(4);
        data.u32(crate::tag::LOCA).u32(0).u32(48).u32(6);
        data.extend(&[0u8; 10]);
        let offset_table = ReadScope::new(data.data()).read::<OffsetTable<'_>>().unwrap();
        assert_eq!(offset_table.table_records.len(), 2);
        let record = offset_table.find_table_record(crate::tag::LOCA).unwrap();
        assert_eq!(record.offset, 48);
        assert_eq!(record.length, 6);
        assert!(offset_table.find_table_record(crate::tag::CMAP).is_none());
    }

    #[test]
    fn test_offset_table_duplicate_tags() {
        let mut data = BeBuffer::new();
        data.u32(TTF_MAGIC);
        data.u16(2).u16(16).u16(0).u16(16);
        data.u32(crate::tag::GLYF).u32(0).u32(44).u32(1);
        data.u32(crate::tag::GLYF).u32(0).u32(45).u32(1);
        data.extend(&[0u8; 2]);
        let offset_table = ReadScope::new(data.data()).read::<OffsetTable<'_>>().unwrap();
        let record = offset_table.find_table_record(crate::tag::GLYF).unwrap();
        assert_eq!(record.offset, 44);
    }

    #[test]
    fn test_offset_table_bad_version() {
        let mut data = BeBuffer::new();
        data.u32(0x00020000);
        data.u16(0).u16(0).u16(0).u16(0);
        assert_eq!(
            ReadScope::new(data.data()).read::<OffsetTable<'_>>(),
            Err(ParseError::UnsupportedFormat)
        );
    }

    #[test]
    fn test_offset_table_truncated() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(
            ReadScope::new(&data).read::<OffsetTable<'_>>(),
            Err(ParseError::OutOfBounds)
        );
    }

    #[test]
    fn test_offset_table_records_do_not_fit() {
        let mut data = BeBuffer::new();
        data.u32(TTF_MAGIC);
        data.u16(4).u16(64).u16(2).u16(0);
        data.u32(crate::tag::GLYF).u32(0).u32(0).u32(0);
        // 3 more records claimed but absent
        assert_eq!(
            ReadScope::new(data.data()).read::<OffsetTable<'_>>(),
            Err(ParseError::OutOfBounds)
        );
    }

    #[test]
    fn test_read_table_span_out_of_bounds() {
        let mut data = BeBuffer::new();
        data.u32(TTF_MAGIC);
        data.u16(1).u16(16).u16(0).u16(0);
        data.u32(crate::tag::GLYF).u32(0).u32(28).u32(100);
        let file = ReadScope::new(data.data()).read::<OpenTypeFile<'_>>().unwrap();
        assert_eq!(file.read_table(crate::tag::GLYF), Err(ParseError::OutOfBounds));
    }

    #[test]
    fn test_hmtx_metrics() {
        let mut data = BeBuffer::new();
        // 2 long metrics, 4 glyphs
        data.u16(500).i16(10);
        data.u16(600).i16(20);
        data.i16(30).i16(40);
        let hmtx = ReadScope::new(data.data())
            .read_dep::<HmtxTable<'_>>((4, 2))
            .unwrap();
        assert_eq!(hmtx.horizontal_advance(0), Ok(500));
        assert_eq!(hmtx.horizontal_advance(1), Ok(600));
        assert_eq!(hmtx.horizontal_advance(2), Ok(600));
        assert_eq!(hmtx.horizontal_advance(3), Ok(600));
        assert_eq!(hmtx.left_side_bearing(0), Ok(10));
        assert_eq!(hmtx.left_side_bearing(2), Ok(30));
        assert_eq!(hmtx.left_side_bearing(3), Ok(40));
        assert_eq!(hmtx.horizontal_advance(4), Err(ParseError::InvalidGlyph));
        assert_eq!(hmtx.left_side_bearing(4), Err(ParseError::InvalidGlyph));
    }

    #[test]
    fn test_read_hhea() {
        let mut data = BeBuffer::new();
        data.u16(1).u16(0); // version
        data.i16(800).i16(-200).i16(90); // ascender, descender, lineGap
        data.u16(1200); // advanceWidthMax
        data.i16(10).i16(12).i16(1100); // bearings, xMaxExtent
        data.i16(1).i16(0).i16(0); // caret
        data.i16(0).i16(0).i16(0).i16(0); // reserved
        data.i16(0); // metricDataFormat
        data.u16(7); // numberOfHMetrics
        let hhea = ReadScope::new(data.data()).read::<HheaTable>().unwrap();
        assert_eq!(hhea.ascender, 800);
        assert_eq!(hhea.descender, -200);
        assert_eq!(hhea.line_gap, 90);
        assert_eq!(hhea.num_h_metrics, 7);
    }

    #[test]
    fn test_read_maxp() {
        let mut data = BeBuffer::new();
        data.u32(0x00010000).u16(42);
        let maxp = ReadScope::new(data.data()).read::<MaxpTable>().unwrap();
        assert_eq!(maxp.num_glyphs, 42);
    }
}
