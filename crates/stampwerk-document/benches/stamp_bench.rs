// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the stampwerk-document crate: vector label
// compositing and raster label burn-in, the two per-file hot paths.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{Document, Object, Stream, content::Content, content::Operation, dictionary};

use stampwerk_core::config::RasterStampStyle;
use stampwerk_core::{PageBox, StampLabel};
use stampwerk_document::{LabelFont, RasterStamper, VectorStamper};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One A4 page with a line of Helvetica text.
fn text_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal("Invoice")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap_or_default()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Render a label overlay and composite it onto an A4 text page.
fn bench_vector_stamp(c: &mut Criterion) {
    let source = text_document();
    let page_id = source.get_pages()[&1];
    let stamper = VectorStamper::default();
    let label = StampLabel::for_index("Lasku", 0, 0).unwrap();

    c.bench_function("vector_stamp (A4)", |b| {
        b.iter(|| {
            let mut doc = source.clone();
            stamper.stamp(&mut doc, page_id, black_box(&label)).ok();
            black_box(doc);
        });
    });
}

/// Burn a label into a 200 DPI A4 page and wrap it as a PDF page.
fn bench_raster_stamp(c: &mut Criterion) {
    let page_box = PageBox::from_size(595.0, 842.0);
    let (width, height) = page_box.pixel_size(200);
    let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([250, 250, 250])));
    let font = LabelFont::bundled().unwrap();
    let stamper = RasterStamper::with_font(RasterStampStyle::default(), font);
    let label = StampLabel::for_index("Lasku", 0, 0).unwrap();

    c.bench_function("raster_stamp (A4 @ 200 DPI)", |b| {
        b.iter(|| {
            let bytes = stamper.stamp_page(black_box(page.clone()), &label, page_box);
            black_box(bytes.ok());
        });
    });
}

criterion_group!(benches, bench_vector_stamp, bench_raster_stamp);
criterion_main!(benches);
