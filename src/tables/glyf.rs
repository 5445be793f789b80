//! Reading of the `glyf` table: TrueType glyph descriptions.
//!
//! > Each glyph begins with a header that gives the number of contours and
//! > the glyph's bounding box, followed by either a simple glyph description
//! > or a composite glyph description.
//!
//! — <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>
//!
//! Glyphs are parsed lazily: [`GlyfTable`](struct.GlyfTable.html) holds the
//! raw table bytes and decodes a single glyph on request, using the byte
//! range supplied by the `loca` table.

use bitflags::bitflags;
use itertools::izip;

use std::convert::TryFrom;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::{I16Be, U16Be};
use crate::error::ParseError;
use crate::outline::{build_contour, Contour, GlyphPoint, Transform, Vec2};
use crate::tables::loca::LocaTable;

bitflags! {
    /// Per-point flags of a simple glyph.
    ///
    /// The two `SAME_OR_POSITIVE` bits change meaning depending on the
    /// matching `SHORT_VECTOR` bit, so the flags are kept as an opaque word
    /// and interrogated through the methods below.
    pub struct SimpleGlyphFlag: u8 {
        const ON_CURVE_POINT = 0x01;
        const X_SHORT_VECTOR = 0x02;
        const Y_SHORT_VECTOR = 0x04;
        const REPEAT_FLAG = 0x08;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0x10;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0x20;
        const OVERLAP_SIMPLE = 0x40;
    }
}

bitflags! {
    /// Flags of a composite glyph component record.
    pub struct CompositeGlyphFlag: u16 {
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        const WE_HAVE_A_SCALE = 0x0008;
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// `glyf` table.
pub struct GlyfTable<'a> {
    scope: ReadScope<'a>,
}

/// A single parsed glyph.
pub struct Glyph<'a> {
    pub number_of_contours: i16,
    pub bounding_box: BoundingBox,
    pub data: GlyphData<'a>,
}

/// The body of a glyph description.
pub enum GlyphData<'a> {
    Simple(SimpleGlyph<'a>),
    Composite {
        glyphs: Vec<CompositeGlyph>,
        instructions: &'a [u8],
    },
}

/// A simple glyph: contours described directly by points.
///
/// Coordinates have been delta-decoded to absolute font units; the flags are
/// retained per point with the repeat compression undone.
pub struct SimpleGlyph<'a> {
    pub end_pts_of_contours: ReadArray<'a, U16Be>,
    pub instructions: &'a [u8],
    pub flags: Vec<SimpleGlyphFlag>,
    pub coordinates: Vec<Point>,
}

/// An absolute point in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point(pub i16, pub i16);

/// One component of a composite glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeGlyph {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    pub argument1: CompositeGlyphArgument,
    pub argument2: CompositeGlyphArgument,
    pub scale: Option<CompositeGlyphScale>,
}

/// A component argument: an offset or a point-matching index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeGlyphArgument {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
}

/// The optional scale of a composite component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompositeGlyphScale {
    Scale(F2Dot14),
    XY { x_scale: F2Dot14, y_scale: F2Dot14 },
    Matrix([[F2Dot14; 2]; 2]),
}

/// A signed fixed-point number with 2 integer and 14 fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F2Dot14(i16);

/// The glyph bounding box from the glyph header.
///
/// Stored as written; decoding does not verify the points stay within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i16,
    pub x_max: i16,
    pub y_min: i16,
    pub y_max: i16,
}

impl<'a> GlyfTable<'a> {
    pub fn new(scope: ReadScope<'a>) -> GlyfTable<'a> {
        GlyfTable { scope }
    }

    /// Parse the glyph with the given index.
    ///
    /// `Ok(None)` is an empty glyph: `loca` assigns it a zero-length range
    /// and there is no outline, as for a space.
    pub fn glyph(
        &self,
        loca: &LocaTable<'a>,
        glyph_index: u16,
    ) -> Result<Option<Glyph<'a>>, ParseError> {
        let range = loca.glyph_range(glyph_index)?;
        if range.start == range.end {
            return Ok(None);
        }
        let glyph_scope = self.scope.offset_length(range.start, range.end - range.start)?;
        glyph_scope.read::<Glyph<'_>>().map(Some)
    }
}

impl<'a> ReadBinary<'a> for Glyph<'a> {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        let bounding_box = ctxt.read::<BoundingBox>()?;
        let data = if number_of_contours >= 0 {
            let num_contours = u16::try_from(number_of_contours)?;
            GlyphData::Simple(read_simple_glyph(ctxt, num_contours)?)
        } else if number_of_contours == -1 {
            let (glyphs, instructions) = read_composite_glyph(ctxt)?;
            GlyphData::Composite {
                glyphs,
                instructions,
            }
        } else {
            return Err(ParseError::InvalidFontData);
        };
        Ok(Glyph {
            number_of_contours,
            bounding_box,
            data,
        })
    }
}

fn read_simple_glyph<'a>(
    ctxt: &mut ReadCtxt<'a>,
    number_of_contours: u16,
) -> Result<SimpleGlyph<'a>, ParseError> {
    let end_pts_of_contours = ctxt.read_array::<U16Be>(usize::from(number_of_contours))?;
    let num_points = match number_of_contours {
        0 => 0,
        _ => usize::from(end_pts_of_contours.last()?) + 1,
    };

    let instruction_length = ctxt.read_u16be()?;
    let instructions = ctxt.read_slice(usize::from(instruction_length))?;

    // Flags are run-length compressed: a flag with REPEAT_FLAG set is
    // followed by a byte giving the number of additional copies.
    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = SimpleGlyphFlag::from_bits_truncate(ctxt.read_u8()?);
        if flag.contains(SimpleGlyphFlag::REPEAT_FLAG) {
            let count = ctxt.read_u8()?;
            for _ in 0..usize::from(count) + 1 {
                flags.push(flag);
            }
        } else {
            flags.push(flag);
        }
    }
    if flags.len() != num_points {
        return Err(ParseError::InvalidFontData);
    }

    let x_coordinates = read_coordinates(ctxt, &flags, CoordinateAxis::X)?;
    let y_coordinates = read_coordinates(ctxt, &flags, CoordinateAxis::Y)?;
    let coordinates = izip!(x_coordinates, y_coordinates)
        .map(|(x, y)| Point(x, y))
        .collect();

    Ok(SimpleGlyph {
        end_pts_of_contours,
        instructions,
        flags,
        coordinates,
    })
}

#[derive(Clone, Copy)]
enum CoordinateAxis {
    X,
    Y,
}

/// Decode one axis of the coordinate streams.
///
/// Each value in the stream is a delta from the previous point, with the
/// encoding of each delta chosen per point by its flags; an absent field
/// means the coordinate repeats.
fn read_coordinates<'a>(
    ctxt: &mut ReadCtxt<'a>,
    flags: &[SimpleGlyphFlag],
    axis: CoordinateAxis,
) -> Result<Vec<i16>, ParseError> {
    let mut coordinates = Vec::with_capacity(flags.len());
    let mut accumulator = 0i32;
    for flag in flags {
        let (short, same_or_positive) = match axis {
            CoordinateAxis::X => (
                flag.contains(SimpleGlyphFlag::X_SHORT_VECTOR),
                flag.contains(SimpleGlyphFlag::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR),
            ),
            CoordinateAxis::Y => (
                flag.contains(SimpleGlyphFlag::Y_SHORT_VECTOR),
                flag.contains(SimpleGlyphFlag::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR),
            ),
        };
        let delta = match (short, same_or_positive) {
            (true, true) => i32::from(ctxt.read_u8()?),
            (true, false) => -i32::from(ctxt.read_u8()?),
            (false, true) => 0,
            (false, false) => i32::from(ctxt.read_i16be()?),
        };
        accumulator += delta;
        coordinates.push(i16::try_from(accumulator)?);
    }
    Ok(coordinates)
}

fn read_composite_glyph<'a>(
    ctxt: &mut ReadCtxt<'a>,
) -> Result<(Vec<CompositeGlyph>, &'a [u8]), ParseError> {
    let mut glyphs = Vec::new();
    let mut have_instructions = false;
    loop {
        let composite_glyph = ctxt.read::<CompositeGlyph>()?;
        let flags = composite_glyph.flags;
        glyphs.push(composite_glyph);
        if flags.contains(CompositeGlyphFlag::WE_HAVE_INSTRUCTIONS) {
            have_instructions = true;
        }
        if !flags.contains(CompositeGlyphFlag::MORE_COMPONENTS) {
            break;
        }
    }
    // An instruction block trails the last component; it must be consumed
    // here so it is not mistaken for another component record.
    let instructions = if have_instructions {
        let instruction_length = ctxt.read_u16be()?;
        ctxt.read_slice(usize::from(instruction_length))?
    } else {
        &[]
    };
    Ok((glyphs, instructions))
}

impl<'a> ReadBinary<'a> for CompositeGlyph {
    type HostType = Self;

    fn read(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let flags = CompositeGlyphFlag::from_bits_truncate(ctxt.read_u16be()?);
        let glyph_index = ctxt.read_u16be()?;
        let words = flags.contains(CompositeGlyphFlag::ARG_1_AND_2_ARE_WORDS);
        let signed = flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES);
        let (argument1, argument2) = match (words, signed) {
            (true, true) => (
                CompositeGlyphArgument::I16(ctxt.read_i16be()?),
                CompositeGlyphArgument::I16(ctxt.read_i16be()?),
            ),
            (true, false) => (
                CompositeGlyphArgument::U16(ctxt.read_u16be()?),
                CompositeGlyphArgument::U16(ctxt.read_u16be()?),
            ),
            (false, true) => (
                CompositeGlyphArgument::I8(ctxt.read_i8()?),
                CompositeGlyphArgument::I8(ctxt.read_i8()?),
            ),
            (false, false) => (
                CompositeGlyphArgument::U8(ctxt.read_u8()?),
                CompositeGlyphArgument::U8(ctxt.read_u8()?),
            ),
        };
        let scale = if flags.contains(CompositeGlyphFlag::WE_HAVE_A_SCALE) {
            Some(CompositeGlyphScale::Scale(ctxt.read::<F2Dot14>()?))
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_AN_X_AND_Y_SCALE) {
            Some(CompositeGlyphScale::XY {
                x_scale: ctxt.read::<F2Dot14>()?,
                y_scale: ctxt.read::<F2Dot14>()?,
            })
        } else if flags.contains(CompositeGlyphFlag::WE_HAVE_A_TWO_BY_TWO) {
            let matrix = [
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
                [ctxt.read::<F2Dot14>()?, ctxt.read::<F2Dot14>()?],
            ];
            Some(CompositeGlyphScale::Matrix(matrix))
        } else {
            None
        };

        Ok(CompositeGlyph {
            flags,
            glyph_index,
            argument1,
            argument2,
            scale,
        })
    }
}

impl<'a> SimpleGlyph<'a> {
    /// The contours of the glyph, assembled from the point stream.
    ///
    /// A degenerate contour (all points coincident) stays in the output as
    /// an empty contour so contour indices remain meaningful.
    pub fn contours(&self) -> Result<Vec<Contour>, ParseError> {
        let mut contours = Vec::with_capacity(self.end_pts_of_contours.len());
        let mut workspace = Vec::new();
        let mut begin = 0;
        for end in self.end_pts_of_contours.iter() {
            let end = usize::from(end);
            if end < begin {
                return Err(ParseError::InvalidFontData);
            }
            let points = self
                .coordinates
                .get(begin..=end)
                .ok_or(ParseError::InvalidFontData)?;
            let flags = &self.flags[begin..=end];
            workspace.clear();
            workspace.extend(izip!(points, flags).map(|(point, flag)| {
                GlyphPoint::new(
                    Vec2::new(f64::from(point.0), f64::from(point.1)),
                    flag.is_on_curve(),
                )
            }));
            contours.push(build_contour(&workspace));
            begin = end + 1;
        }
        Ok(contours)
    }
}

impl SimpleGlyphFlag {
    pub fn is_on_curve(self) -> bool {
        self.contains(SimpleGlyphFlag::ON_CURVE_POINT)
    }
}

impl CompositeGlyph {
    /// The affine transform this component applies to the glyph it places.
    ///
    /// When `ARGS_ARE_XY_VALUES` is clear the arguments are point-matching
    /// indices; point matching is not performed, so such components are
    /// placed untranslated.
    pub fn transform(&self) -> Transform {
        let (dx, dy) = if self.flags.contains(CompositeGlyphFlag::ARGS_ARE_XY_VALUES) {
            (
                f64::from(self.argument1.to_i32()),
                f64::from(self.argument2.to_i32()),
            )
        } else {
            (0.0, 0.0)
        };
        let (a, b, c, d) = match self.scale {
            None => (1.0, 0.0, 0.0, 1.0),
            Some(CompositeGlyphScale::Scale(scale)) => {
                let scale = scale.to_f64();
                (scale, 0.0, 0.0, scale)
            }
            Some(CompositeGlyphScale::XY { x_scale, y_scale }) => {
                (x_scale.to_f64(), 0.0, 0.0, y_scale.to_f64())
            }
            Some(CompositeGlyphScale::Matrix(matrix)) => (
                matrix[0][0].to_f64(),
                matrix[0][1].to_f64(),
                matrix[1][0].to_f64(),
                matrix[1][1].to_f64(),
            ),
        };
        Transform { a, b, c, d, dx, dy }
    }
}

impl CompositeGlyphArgument {
    pub fn to_i32(self) -> i32 {
        match self {
            CompositeGlyphArgument::U8(value) => i32::from(value),
            CompositeGlyphArgument::I8(value) => i32::from(value),
            CompositeGlyphArgument::U16(value) => i32::from(value),
            CompositeGlyphArgument::I16(value) => i32::from(value),
        }
    }
}

impl F2Dot14 {
    pub fn new(value: i16) -> F2Dot14 {
        F2Dot14(value)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 16384.0
    }
}

impl<'a> ReadFrom<'a> for F2Dot14 {
    type ReadType = I16Be;

    fn from(value: i16) -> Self {
        F2Dot14(value)
    }
}

impl<'a> ReadFrom<'a> for BoundingBox {
    type ReadType = ((I16Be, I16Be), (I16Be, I16Be));

    fn from(((x_min, y_min), (x_max, y_max)): ((i16, i16), (i16, i16))) -> Self {
        BoundingBox {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}
