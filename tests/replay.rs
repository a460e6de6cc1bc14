use std::io::Cursor;

use oralmark::{
    AnnotationRecord, ArrowRecord, BaseImage, CLINICAL_PALETTE, CircleRecord, Color, LiveCanvas,
    PenRecord, Point, RectangleRecord, Surface, Tool, ViewAnnotations, render,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn base_image(width: u32, height: u32) -> BaseImage {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 44, 52, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    oralmark::decode_base_image(&buf).unwrap()
}

fn clinic_markup() -> Vec<AnnotationRecord> {
    vec![
        AnnotationRecord::Pen(PenRecord {
            points: vec![
                Point::new(4.0, 4.0),
                Point::new(20.0, 10.0),
                Point::new(30.0, 24.0),
            ],
            color: CLINICAL_PALETTE[0].color,
            line_width: 7.0,
        }),
        AnnotationRecord::Rectangle(RectangleRecord {
            start_x: 8.0,
            start_y: 8.0,
            width: 20.0,
            height: 12.0,
            color: CLINICAL_PALETTE[1].color,
            line_width: 7.0,
        }),
        AnnotationRecord::Circle(CircleRecord {
            center_x: 40.0,
            center_y: 24.0,
            radius: 10.0,
            color: CLINICAL_PALETTE[3].color,
            line_width: 7.0,
        }),
        AnnotationRecord::Arrow(ArrowRecord {
            start_x: 10.0,
            start_y: 40.0,
            end_x: 50.0,
            end_y: 12.0,
            color: CLINICAL_PALETTE[4].color,
            line_width: 5.0,
        }),
    ]
}

#[test]
fn replay_is_deterministic_and_nonempty() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();
    let records = clinic_markup();

    let a = render(&base, surface, &records).unwrap();
    let b = render(&base, surface, &records).unwrap();

    assert_eq!((a.width, a.height), (64, 48));
    assert!(a.premultiplied);
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
    assert!(a.data.iter().any(|&x| x != 0));

    // Opaque base, opaque palette: the flattened frame has no translucency.
    assert!(a.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn empty_list_yields_the_bare_base() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();

    let bare = render(&base, surface, &[]).unwrap();
    let fresh = LiveCanvas::new(&base, surface).unwrap().snapshot();
    assert_eq!(digest_u64(&bare.data), digest_u64(&fresh.data));

    let marked = render(&base, surface, &clinic_markup()).unwrap();
    assert_ne!(digest_u64(&bare.data), digest_u64(&marked.data));
}

#[test]
fn out_of_bounds_geometry_clips_silently() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();
    let bare = render(&base, surface, &[]).unwrap();

    let far_away = vec![AnnotationRecord::Rectangle(RectangleRecord {
        start_x: 1000.0,
        start_y: 1000.0,
        width: 40.0,
        height: 40.0,
        color: Color::from_rgb8(255, 0, 0),
        line_width: 7.0,
    })];
    let clipped = render(&base, surface, &far_away).unwrap();
    assert_eq!(digest_u64(&bare.data), digest_u64(&clipped.data));

    // Partially outside still renders, and touches the visible region.
    let straddling = vec![AnnotationRecord::Arrow(ArrowRecord {
        start_x: -30.0,
        start_y: 24.0,
        end_x: 30.0,
        end_y: 24.0,
        color: Color::from_rgb8(255, 0, 0),
        line_width: 5.0,
    })];
    let partial = render(&base, surface, &straddling).unwrap();
    assert_ne!(digest_u64(&bare.data), digest_u64(&partial.data));
}

#[test]
fn document_round_trip_replays_identically() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();

    let mut doc = ViewAnnotations::new();
    for record in clinic_markup() {
        doc.append(oralmark::View::Front, record);
    }

    let json = serde_json::to_string(&doc).unwrap();
    let restored: ViewAnnotations = serde_json::from_str(&json).unwrap();

    let a = render(&base, surface, doc.get(oralmark::View::Front)).unwrap();
    let b = render(&base, surface, restored.get(oralmark::View::Front)).unwrap();
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn arrow_direction_is_visible_in_the_pixels() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();

    let forward = vec![AnnotationRecord::Arrow(ArrowRecord {
        start_x: 8.0,
        start_y: 24.0,
        end_x: 56.0,
        end_y: 24.0,
        color: Color::from_rgb8(255, 0, 0),
        line_width: 5.0,
    })];
    let reverse = vec![AnnotationRecord::Arrow(ArrowRecord {
        start_x: 56.0,
        start_y: 24.0,
        end_x: 8.0,
        end_y: 24.0,
        color: Color::from_rgb8(255, 0, 0),
        line_width: 5.0,
    })];

    let a = render(&base, surface, &forward).unwrap();
    let b = render(&base, surface, &reverse).unwrap();
    assert_ne!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn shape_preview_matches_the_finalized_record() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();

    let records = vec![clinic_markup().swap_remove(0)];
    let preview = AnnotationRecord::Rectangle(RectangleRecord {
        start_x: 12.0,
        start_y: 6.0,
        width: 30.0,
        height: 18.0,
        color: CLINICAL_PALETTE[2].color,
        line_width: 7.0,
    });

    let mut canvas = LiveCanvas::new(&base, surface).unwrap();
    canvas.replay_with_preview(&records, &preview).unwrap();
    let live = canvas.snapshot();

    let mut finalized = records.clone();
    finalized.push(preview);
    let committed = render(&base, surface, &finalized).unwrap();

    assert_eq!(digest_u64(&live.data), digest_u64(&committed.data));
}

#[test]
fn fitted_surface_downscales_large_bases() {
    let base = base_image(64, 48);
    let max = Surface::new(32, 24).unwrap();
    let surface = Surface::fit(base.width, base.height, max).unwrap();
    assert_eq!((surface.width, surface.height), (32, 24));

    let frame = render(&base, surface, &clinic_markup()).unwrap();
    assert_eq!((frame.width, frame.height), (32, 24));
    assert!(frame.data.iter().any(|&x| x != 0));
}

#[test]
fn session_gesture_flows_into_the_replay() {
    let base = base_image(64, 48);
    let surface = Surface::fit(base.width, base.height, Surface::DEFAULT_MAX).unwrap();
    let mut canvas = LiveCanvas::new(&base, surface).unwrap();
    let bare = canvas.snapshot();

    let mut session = oralmark::DrawingSession::new();
    session.set_tool(Tool::Rectangle);
    session.set_color(CLINICAL_PALETTE[1].color);

    let mut doc = ViewAnnotations::new();
    let stored = doc.get(oralmark::View::Front).to_vec();

    session.begin(Point::new(10.0, 10.0));
    let paint = session.update(Point::new(34.0, 28.0)).unwrap();
    canvas.apply(&stored, &paint).unwrap();

    let record = session.end(Point::new(34.0, 28.0)).unwrap();
    doc.append(oralmark::View::Front, record);
    canvas.replay(doc.get(oralmark::View::Front)).unwrap();

    let marked = canvas.snapshot();
    assert_ne!(digest_u64(&bare.data), digest_u64(&marked.data));
    assert_eq!(doc.len(oralmark::View::Front), 1);
}
