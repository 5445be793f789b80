//! Reading of the `cmap` table: mapping code points to glyph indices.
//!
//! > The 'cmap' table maps character codes to glyph indices. The choice of
//! > encoding for a particular font is dependent upon the conventions used by
//! > the intended platform.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/cmap>
//!
//! Only the two Unicode subtable layouts are handled: format 4
//! (segment-delta mapping of the Basic Multilingual Plane) and format 12
//! (sequential groups covering all of Unicode).

use log::{debug, warn};

use std::convert::TryFrom;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be, U32Be};
use crate::error::ParseError;

/// `cmap` table: the encoding records plus the scope their offsets index
/// into.
pub struct Cmap<'a> {
    scope: ReadScope<'a>,
    pub encoding_records: ReadArray<'a, EncodingRecord>,
}

/// An encoding record in the `cmap` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: PlatformId,
    pub encoding_id: EncodingId,
    pub offset: u32,
}

/// Platform of an encoding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformId(pub u16);

/// Platform-specific encoding of an encoding record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

impl EncodingId {
    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);
}

/// A parsed Unicode cmap subtable.
///
/// The variants borrow the subtable bytes and answer lookups by re-reading
/// them; nothing is decoded up front.
pub enum CmapSubtable<'a> {
    Format4(CmapSubtableFormat4<'a>),
    Format12(CmapSubtableFormat12<'a>),
}

/// Format 4: segment mapping to delta values. BMP only.
pub struct CmapSubtableFormat4<'a> {
    pub language: u16,
    seg_count: usize,
    end_codes: ReadArray<'a, U16Be>,
    start_codes: ReadArray<'a, U16Be>,
    id_deltas: ReadArray<'a, I16Be>,
    id_range_offsets: ReadArray<'a, U16Be>,
    /// Scope starting at `idRangeOffset[0]`. Non-zero range offsets are byte
    /// offsets from the entry's own position, so resolution is pointer
    /// arithmetic within this scope.
    id_range_scope: ReadScope<'a>,
}

/// Format 12: segmented coverage by sequential groups.
pub struct CmapSubtableFormat12<'a> {
    pub language: u32,
    groups: ReadArray<'a, SequentialMapGroup>,
}

/// A group of consecutive code points mapping to consecutive glyph ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl<'a> ReadBinary<'a> for Cmap<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        if version != 0 {
            return Err(ParseError::InvalidFontData);
        }
        let num_tables = ctxt.read_u16be()?;
        let encoding_records = ctxt.read_array::<EncodingRecord>(usize::from(num_tables))?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl<'a> Cmap<'a> {
    /// Select and parse the best Unicode subtable.
    ///
    /// Format 12 is preferred over format 4 regardless of encoding record
    /// order; records that are not Unicode-capable, use another subtable
    /// format, or cannot be dereferenced are passed over. If nothing usable
    /// remains the font cannot be mapped and `UnsupportedFormat` is
    /// returned.
    pub fn read_unicode_subtable(&self) -> Result<CmapSubtable<'a>, ParseError> {
        let mut format4: Option<EncodingRecord> = None;
        let mut format12: Option<EncodingRecord> = None;
        for record in self.encoding_records.iter() {
            if !record.is_unicode() {
                continue;
            }
            let subtable_scope = self.scope.offset(usize::try_from(record.offset)?);
            let format = match subtable_scope.ctxt().read_u16be() {
                Ok(format) => format,
                Err(_) => {
                    warn!(
                        "cmap encoding record ({}, {}) points outside the table",
                        record.platform_id.0, record.encoding_id.0
                    );
                    continue;
                }
            };
            match format {
                4 if format4.is_none() => format4 = Some(record),
                12 if format12.is_none() => format12 = Some(record),
                4 | 12 => {}
                _ => debug!("skipping cmap subtable format {}", format),
            }
        }

        let record = format12
            .or(format4)
            .ok_or(ParseError::UnsupportedFormat)?;
        debug!(
            "selected cmap subtable for platform {} encoding {}",
            record.platform_id.0, record.encoding_id.0
        );
        self.scope
            .offset(usize::try_from(record.offset)?)
            .read::<CmapSubtable<'_>>()
    }
}

impl EncodingRecord {
    /// Whether this record's platform and encoding identify a Unicode
    /// character map.
    pub fn is_unicode(&self) -> bool {
        match (self.platform_id, self.encoding_id) {
            (PlatformId::UNICODE, EncodingId(0..=4)) => true,
            (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP) => true,
            (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4) => true,
            _ => false,
        }
    }
}

impl<'a> ReadFrom<'a> for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id: PlatformId(platform_id),
            encoding_id: EncodingId(encoding_id),
            offset,
        }
    }
}

impl<'a> ReadBinary<'a> for CmapSubtable<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        match ctxt.read_u16be()? {
            4 => Ok(CmapSubtable::Format4(ctxt.read::<CmapSubtableFormat4<'_>>()?)),
            12 => Ok(CmapSubtable::Format12(ctxt.read::<CmapSubtableFormat12<'_>>()?)),
            _ => Err(ParseError::UnsupportedFormat),
        }
    }
}

impl<'a> CmapSubtable<'a> {
    /// Map a code point to a glyph index.
    ///
    /// `None` means the font does not map the code point; callers fall back
    /// to glyph 0, `.notdef`.
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        match self {
            CmapSubtable::Format4(subtable) => subtable.map_glyph(ch),
            CmapSubtable::Format12(subtable) => subtable.map_glyph(ch),
        }
    }
}

impl<'a> ReadBinary<'a> for CmapSubtableFormat4<'a> {
    type HostType = Self;

    /// Reads the body of a format 4 subtable, the format field having been
    /// consumed by the dispatch in `CmapSubtable`.
    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let _length = ctxt.read_u16be()?;
        let language = ctxt.read_u16be()?;
        let seg_count_x2 = ctxt.read_u16be()?;
        if seg_count_x2 == 0 || seg_count_x2 % 2 != 0 {
            return Err(ParseError::InvalidFontData);
        }
        let seg_count = usize::from(seg_count_x2 / 2);
        let _search_range = ctxt.read_u16be()?;
        let _entry_selector = ctxt.read_u16be()?;
        let _range_shift = ctxt.read_u16be()?;
        let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let _reserved_pad = ctxt.read_u16be()?;
        let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
        let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
        let id_range_scope = ctxt.scope();
        let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
        Ok(CmapSubtableFormat4 {
            language,
            seg_count,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            id_range_scope,
        })
    }
}

impl<'a> CmapSubtableFormat4<'a> {
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        // Format 4 only covers the Basic Multilingual Plane.
        let ch = match u16::try_from(ch) {
            Ok(ch) => ch,
            Err(_) => return Ok(None),
        };

        // The smallest segment whose end code is >= ch.
        let mut lo = 0;
        let mut hi = self.seg_count;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.end_codes.read_item(mid)? < ch {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == self.seg_count {
            return Ok(None);
        }
        let segment = lo;
        let start_code = self.start_codes.read_item(segment)?;
        if ch < start_code {
            return Ok(None);
        }
        let id_delta = self.id_deltas.read_item(segment)?;
        let id_range_offset = self.id_range_offsets.read_item(segment)?;

        if id_range_offset == 0 {
            Ok(glyph_id(ch.wrapping_add(id_delta as u16)))
        } else {
            // The range offset is relative to the position of the
            // idRangeOffset entry itself: the glyph id lives at
            // &idRangeOffset[segment] + idRangeOffset[segment]
            //                         + 2 * (ch - startCode).
            let entry = 2 * segment;
            let offset = entry
                + usize::from(id_range_offset)
                + 2 * usize::from(ch - start_code);
            let glyph = self.id_range_scope.offset(offset).ctxt().read_u16be()?;
            if glyph == 0 {
                Ok(None)
            } else {
                Ok(glyph_id(glyph.wrapping_add(id_delta as u16)))
            }
        }
    }
}

impl<'a> ReadBinary<'a> for CmapSubtableFormat12<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let _reserved = ctxt.read_u16be()?;
        let _length = ctxt.read_u32be()?;
        let language = ctxt.read_u32be()?;
        let num_groups = ctxt.read_u32be()?;
        let groups = ctxt.read_array::<SequentialMapGroup>(usize::try_from(num_groups)?)?;
        Ok(CmapSubtableFormat12 { language, groups })
    }
}

impl<'a> CmapSubtableFormat12<'a> {
    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        // The smallest group whose end char code is >= ch; groups are sorted
        // by start char code.
        let mut lo = 0;
        let mut hi = self.groups.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.groups.read_item(mid)?.end_char_code < ch {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == self.groups.len() {
            return Ok(None);
        }
        let group = self.groups.read_item(lo)?;
        if ch < group.start_char_code {
            return Ok(None);
        }
        let glyph = group.start_glyph_id + (ch - group.start_char_code);
        // Glyph ids are 16-bit even though this format stores them as u32.
        match u16::try_from(glyph) {
            Ok(glyph) => Ok(glyph_id(glyph)),
            Err(_) => Ok(None),
        }
    }
}

impl<'a> ReadFrom<'a> for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);

    fn from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

fn glyph_id(glyph: u16) -> Option<u16> {
    if glyph == 0 {
        None
    } else {
        Some(glyph)
    }
}
