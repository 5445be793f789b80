use criterion::{criterion_group, criterion_main, Criterion};

use tracery::binary::read::ReadScope;
use tracery::Font;

/// Fabricate a small TrueType font in memory: an S-like glyph of quadratic
/// arcs, plus a composite that places it twice.
fn build_font() -> Vec<u8> {
    let mut glyf = Vec::new();
    let simple = simple_glyph();
    let composite = composite_glyph();
    let mut loca = Vec::new();
    push_u32(&mut loca, 0);
    glyf.extend_from_slice(&simple);
    push_u32(&mut loca, glyf.len() as u32);
    glyf.extend_from_slice(&composite);
    push_u32(&mut loca, glyf.len() as u32);

    let mut head = Vec::new();
    push_u16(&mut head, 1);
    push_u16(&mut head, 0);
    push_u32(&mut head, 0x00010000);
    push_u32(&mut head, 0);
    push_u32(&mut head, 0x5F0F3CF5);
    push_u16(&mut head, 0);
    push_u16(&mut head, 1000); // unitsPerEm
    head.extend_from_slice(&[0; 16]); // created, modified
    push_i16(&mut head, 0);
    push_i16(&mut head, 0);
    push_i16(&mut head, 1000);
    push_i16(&mut head, 1000);
    push_u16(&mut head, 0);
    push_u16(&mut head, 8);
    push_i16(&mut head, 2);
    push_i16(&mut head, 1); // long loca
    push_i16(&mut head, 0);

    let mut maxp = Vec::new();
    push_u32(&mut maxp, 0x00010000);
    push_u16(&mut maxp, 2);

    let mut cmap = Vec::new();
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 1);
    push_u16(&mut cmap, 3);
    push_u16(&mut cmap, 1);
    push_u32(&mut cmap, 12);
    push_u16(&mut cmap, 4); // format
    push_u16(&mut cmap, 32);
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 4); // segCountX2
    push_u16(&mut cmap, 4);
    push_u16(&mut cmap, 1);
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 0x43); // endCode: 'A'..='C'
    push_u16(&mut cmap, 0xFFFF);
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 0x41); // startCode
    push_u16(&mut cmap, 0xFFFF);
    push_i16(&mut cmap, -0x41); // 'A' -> glyph 0, 'B' -> glyph 1
    push_i16(&mut cmap, 1);
    push_u16(&mut cmap, 0);
    push_u16(&mut cmap, 0);

    let tables = [
        (u32::from_be_bytes(*b"head"), head),
        (u32::from_be_bytes(*b"maxp"), maxp),
        (u32::from_be_bytes(*b"cmap"), cmap),
        (u32::from_be_bytes(*b"loca"), loca),
        (u32::from_be_bytes(*b"glyf"), glyf),
    ];

    let mut font = Vec::new();
    push_u32(&mut font, 0x00010000);
    push_u16(&mut font, tables.len() as u16);
    push_u16(&mut font, 0);
    push_u16(&mut font, 0);
    push_u16(&mut font, 0);
    let mut offset = 12 + 16 * tables.len();
    for (tag, table) in &tables {
        push_u32(&mut font, *tag);
        push_u32(&mut font, 0);
        push_u32(&mut font, offset as u32);
        push_u32(&mut font, table.len() as u32);
        offset += table.len();
    }
    for (_, table) in &tables {
        font.extend_from_slice(table);
    }
    font
}

fn simple_glyph() -> Vec<u8> {
    // A ring of 16 points alternating on- and off-curve.
    let points: Vec<(i16, i16, bool)> = (0..16)
        .map(|i| {
            let angle = f64::from(i) * std::f64::consts::PI / 8.0;
            let radius = if i % 2 == 0 { 400.0 } else { 520.0 };
            (
                (500.0 + radius * angle.cos()) as i16,
                (500.0 + radius * angle.sin()) as i16,
                i % 2 == 0,
            )
        })
        .collect();

    let mut glyph = Vec::new();
    push_i16(&mut glyph, 1);
    push_i16(&mut glyph, 0);
    push_i16(&mut glyph, 0);
    push_i16(&mut glyph, 1000);
    push_i16(&mut glyph, 1000);
    push_u16(&mut glyph, points.len() as u16 - 1);
    push_u16(&mut glyph, 0);
    for &(_, _, on_curve) in &points {
        glyph.push(if on_curve { 0x01 } else { 0x00 });
    }
    let mut prev = 0;
    for &(x, _, _) in &points {
        push_i16(&mut glyph, x - prev);
        prev = x;
    }
    let mut prev = 0;
    for &(_, y, _) in &points {
        push_i16(&mut glyph, y - prev);
        prev = y;
    }
    glyph
}

fn composite_glyph() -> Vec<u8> {
    let mut glyph = Vec::new();
    push_i16(&mut glyph, -1);
    push_i16(&mut glyph, 0);
    push_i16(&mut glyph, 0);
    push_i16(&mut glyph, 1000);
    push_i16(&mut glyph, 1000);
    // Two translated copies of glyph 0.
    push_u16(&mut glyph, 0x0001 | 0x0002 | 0x0020);
    push_u16(&mut glyph, 0);
    push_i16(&mut glyph, -120);
    push_i16(&mut glyph, 0);
    push_u16(&mut glyph, 0x0001 | 0x0002);
    push_u16(&mut glyph, 0);
    push_i16(&mut glyph, 120);
    push_i16(&mut glyph, 0);
    glyph
}

fn push_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(buffer: &mut Vec<u8>, value: i16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn criterion_benchmark(c: &mut Criterion) {
    let buffer = build_font();

    c.bench_function("parse font", |b| {
        b.iter(|| Font::new(ReadScope::new(&buffer)).unwrap())
    });

    let font = Font::new(ReadScope::new(&buffer)).unwrap();
    c.bench_function("decode simple glyph", |b| {
        b.iter(|| font.glyph_shape(0).unwrap())
    });
    c.bench_function("decode composite glyph", |b| {
        b.iter(|| font.glyph_shape(1).unwrap())
    });
    c.bench_function("lookup glyph index", |b| {
        b.iter(|| font.lookup_glyph_index(u32::from('B')).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
