//! Top level access to a font: code point → glyph index → outline.

use log::warn;
use rustc_hash::FxHashSet;

use crate::binary::read::ReadScope;
use crate::error::ParseError;
use crate::outline::{Contour, Shape};
use crate::tables::cmap::{Cmap, CmapSubtable};
use crate::tables::glyf::{CompositeGlyphFlag, GlyfTable, GlyphData};
use crate::tables::loca::LocaTable;
use crate::tables::{
    HeadTable, HheaTable, HmtxTable, MaxpTable, OpenTypeFile,
};
use crate::tag;

/// Composite glyphs nested deeper than this are rejected as malformed.
const MAX_COMPONENT_DEPTH: u8 = 16;

/// A parsed font, borrowing the buffer it was read from.
///
/// The required tables (`head`, `maxp`, `cmap`, `loca`, `glyf`) are located
/// when the font is created; glyph outlines are decoded on demand. `hhea`
/// and `hmtx` are optional collaborators and metrics calls fail with
/// `TableNotFound` when a font omits them.
pub struct Font<'a> {
    pub head: HeadTable,
    pub maxp: MaxpTable,
    pub hhea: Option<HheaTable>,
    hmtx: Option<HmtxTable<'a>>,
    cmap_subtable: CmapSubtable<'a>,
    loca: LocaTable<'a>,
    glyf: GlyfTable<'a>,
}

impl<'a> Font<'a> {
    /// Read a font from the scope of a whole font file.
    pub fn new(scope: ReadScope<'a>) -> Result<Font<'a>, ParseError> {
        let file = scope.read::<OpenTypeFile<'_>>()?;

        let head = read_required(&file, tag::HEAD)?.read::<HeadTable>()?;
        let maxp = read_required(&file, tag::MAXP)?.read::<MaxpTable>()?;
        let num_glyphs = usize::from(maxp.num_glyphs);

        let cmap = read_required(&file, tag::CMAP)?.read::<Cmap<'_>>()?;
        let cmap_subtable = cmap.read_unicode_subtable()?;

        let loca = read_required(&file, tag::LOCA)?
            .read_dep::<LocaTable<'_>>((num_glyphs, head.index_to_loc_format))?;
        let glyf = match file.read_table(tag::GLYF)? {
            Some(glyf_scope) => GlyfTable::new(glyf_scope),
            // A CFF font carries its outlines as charstrings, which this
            // crate does not decode.
            None if file.offset_table.find_table_record(tag::CFF).is_some() => {
                return Err(ParseError::UnsupportedFormat);
            }
            None => return Err(ParseError::TableNotFound),
        };

        let hhea = match file.read_table(tag::HHEA)? {
            Some(hhea_scope) => Some(hhea_scope.read::<HheaTable>()?),
            None => None,
        };
        let hmtx = match (hhea, file.read_table(tag::HMTX)?) {
            (Some(hhea), Some(hmtx_scope)) => Some(hmtx_scope.read_dep::<HmtxTable<'_>>((
                num_glyphs,
                usize::from(hhea.num_h_metrics),
            ))?),
            _ => None,
        };

        Ok(Font {
            head,
            maxp,
            hhea,
            hmtx,
            cmap_subtable,
            loca,
            glyf,
        })
    }

    pub fn num_glyphs(&self) -> u16 {
        self.maxp.num_glyphs
    }

    pub fn units_per_em(&self) -> u16 {
        self.head.units_per_em
    }

    /// Map a code point to a glyph index.
    ///
    /// Unmapped code points resolve to glyph 0, `.notdef`, as does a mapping
    /// that points beyond the font's glyph count.
    pub fn lookup_glyph_index(&self, ch: u32) -> Result<u16, ParseError> {
        match self.cmap_subtable.map_glyph(ch)? {
            Some(glyph_index) if glyph_index < self.maxp.num_glyphs => Ok(glyph_index),
            _ => Ok(0),
        }
    }

    /// Decode the outline of a glyph into a shape.
    ///
    /// Composite glyphs are resolved recursively with each component's
    /// transform applied, so the result is flat. An empty shape means the
    /// glyph has no outline.
    pub fn glyph_shape(&self, glyph_index: u16) -> Result<Shape, ParseError> {
        let mut visiting = FxHashSet::default();
        self.decode_glyph(glyph_index, 0, &mut visiting)
    }

    /// The outline for a code point: `cmap` lookup followed by glyph decode,
    /// falling back to the `.notdef` outline for unmapped code points.
    pub fn shape_for_char(&self, ch: u32) -> Result<Shape, ParseError> {
        let glyph_index = self.lookup_glyph_index(ch)?;
        self.glyph_shape(glyph_index)
    }

    /// The advance width of a glyph in font units.
    pub fn horizontal_advance(&self, glyph_index: u16) -> Result<u16, ParseError> {
        self.hmtx
            .as_ref()
            .ok_or(ParseError::TableNotFound)?
            .horizontal_advance(glyph_index)
    }

    /// The left side bearing of a glyph in font units.
    pub fn left_side_bearing(&self, glyph_index: u16) -> Result<i16, ParseError> {
        self.hmtx
            .as_ref()
            .ok_or(ParseError::TableNotFound)?
            .left_side_bearing(glyph_index)
    }

    pub fn ascender(&self) -> Result<i16, ParseError> {
        self.hhea.map(|hhea| hhea.ascender).ok_or(ParseError::TableNotFound)
    }

    pub fn descender(&self) -> Result<i16, ParseError> {
        self.hhea.map(|hhea| hhea.descender).ok_or(ParseError::TableNotFound)
    }

    pub fn line_gap(&self) -> Result<i16, ParseError> {
        self.hhea.map(|hhea| hhea.line_gap).ok_or(ParseError::TableNotFound)
    }

    fn decode_glyph(
        &self,
        glyph_index: u16,
        depth: u8,
        visiting: &mut FxHashSet<u16>,
    ) -> Result<Shape, ParseError> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(ParseError::InvalidFontData);
        }
        let glyph = match self.glyf.glyph(&self.loca, glyph_index)? {
            Some(glyph) => glyph,
            None => return Ok(Shape::empty()),
        };
        match glyph.data {
            GlyphData::Simple(simple) => Ok(Shape::new(simple.contours()?)),
            GlyphData::Composite { glyphs, .. } => {
                // `visiting` holds the chain of ancestors, so a component may
                // legitimately appear twice as a sibling but never as its own
                // ancestor.
                if !visiting.insert(glyph_index) {
                    return Err(ParseError::InvalidFontData);
                }
                let mut contours: Vec<Contour> = Vec::new();
                for component in &glyphs {
                    if !component.flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES) {
                        warn!(
                            "component {} of glyph {} uses point matching; placing untranslated",
                            component.glyph_index, glyph_index
                        );
                    }
                    let child = self.decode_glyph(component.glyph_index, depth + 1, visiting)?;
                    let transform = component.transform();
                    contours.extend(
                        child
                            .contours
                            .into_iter()
                            .map(|contour| contour.transform(&transform)),
                    );
                }
                visiting.remove(&glyph_index);
                Ok(Shape::new(contours))
            }
        }
    }
}

fn read_required<'a>(file: &OpenTypeFile<'a>, table_tag: u32) -> Result<ReadScope<'a>, ParseError> {
    file.read_table(table_tag)?.ok_or(ParseError::TableNotFound)
}
