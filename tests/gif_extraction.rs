//! GIF frame extraction tests
//!
//! Streams are built byte by byte so that disposal, transparency,
//! interlacing and truncation can be checked against exact pixels.

mod common;

use std::io::Cursor;

use common::{FrameSpec, GifBuilder, BLUE, GREEN, RED, WHITE};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, Rgba, RgbaImage};
use mksprite::decode::{extract, DisposalMethod, FrameRect, FrameStream};
use mksprite::ErrorKind;

const PALETTE: [[u8; 3]; 4] = [RED, GREEN, BLUE, WHITE];

fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

#[test]
fn test_restore_background_clears_previous_rect() {
    let bytes = GifBuilder::new(10, 10, &PALETTE)
        .frame(&FrameSpec::filled(10, 10, 0).disposal(2))
        .frame(&FrameSpec::filled(4, 4, 1).at(3, 3))
        .build();

    let animation = extract(&bytes).unwrap();
    assert_eq!((animation.width, animation.height), (10, 10));
    assert_eq!(animation.frames.len(), 2);
    assert!(animation.truncated.is_none());

    let first = &animation.frames[0];
    assert_eq!(first.frame.disposal, DisposalMethod::RestoreBackground);
    assert!(first.canvas.pixels().all(|p| *p == rgba(RED)));

    let second = &animation.frames[1].canvas;
    assert_eq!(second.get_pixel(0, 0)[3], 0);
    assert_eq!(second.get_pixel(9, 9)[3], 0);
    assert_eq!(*second.get_pixel(3, 3), rgba(GREEN));
    assert_eq!(*second.get_pixel(6, 6), rgba(GREEN));
    assert_eq!(second.get_pixel(7, 7)[3], 0);
}

#[test]
fn test_do_not_dispose_keeps_previous_pixels() {
    let bytes = GifBuilder::new(10, 10, &PALETTE)
        .frame(&FrameSpec::filled(10, 10, 0).disposal(1))
        .frame(&FrameSpec::filled(4, 4, 1).at(3, 3))
        .build();

    let animation = extract(&bytes).unwrap();
    let second = &animation.frames[1].canvas;
    assert_eq!(*second.get_pixel(0, 0), rgba(RED));
    assert_eq!(*second.get_pixel(4, 4), rgba(GREEN));
    assert_eq!(*second.get_pixel(9, 9), rgba(RED));
}

#[test]
fn test_restore_previous_returns_to_earlier_canvas() {
    let bytes = GifBuilder::new(10, 10, &PALETTE)
        .frame(&FrameSpec::filled(10, 10, 0).disposal(1))
        .frame(&FrameSpec::filled(4, 4, 2).disposal(3))
        .frame(&FrameSpec::filled(2, 2, 1).at(8, 8))
        .build();

    let animation = extract(&bytes).unwrap();
    assert_eq!(animation.frames.len(), 3);

    assert_eq!(*animation.frames[1].canvas.get_pixel(0, 0), rgba(BLUE));

    let third = &animation.frames[2].canvas;
    assert_eq!(*third.get_pixel(0, 0), rgba(RED));
    assert_eq!(*third.get_pixel(3, 3), rgba(RED));
    assert_eq!(*third.get_pixel(8, 8), rgba(GREEN));
}

#[test]
fn test_transparent_index_shows_canvas_beneath() {
    let mut overlay = FrameSpec::filled(10, 10, 3).transparent(3);
    overlay.indices[0] = 2;

    let bytes = GifBuilder::new(10, 10, &PALETTE)
        .frame(&FrameSpec::filled(10, 10, 0).disposal(1))
        .frame(&overlay)
        .build();

    let animation = extract(&bytes).unwrap();
    let frame = &animation.frames[1];
    assert_eq!(frame.frame.transparent_index, Some(3));
    assert_eq!(*frame.canvas.get_pixel(0, 0), rgba(BLUE));
    assert_eq!(*frame.canvas.get_pixel(5, 5), rgba(RED));
}

#[test]
fn test_interlaced_frame_matches_progressive() {
    let indices: Vec<u8> = (0..10u8).flat_map(|row| std::iter::repeat(row % 4).take(6)).collect();
    let mut progressive = FrameSpec::filled(6, 10, 0);
    progressive.indices = indices;
    let interlaced = progressive.clone().interlaced();

    let a = extract(&GifBuilder::new(6, 10, &PALETTE).frame(&progressive).build()).unwrap();
    let b = extract(&GifBuilder::new(6, 10, &PALETTE).frame(&interlaced).build()).unwrap();

    assert!(b.frames[0].frame.interlaced);
    assert_eq!(a.frames[0].canvas, b.frames[0].canvas);
    assert_eq!(*b.frames[0].canvas.get_pixel(0, 5), rgba(GREEN));
    assert_eq!(*b.frames[0].canvas.get_pixel(0, 7), rgba(WHITE));
}

#[test]
fn test_zero_delay_inherits_smallest_nonzero() {
    let bytes = GifBuilder::new(2, 2, &PALETTE)
        .frame(&FrameSpec::filled(2, 2, 0).delay(0))
        .frame(&FrameSpec::filled(2, 2, 1).delay(5))
        .frame(&FrameSpec::filled(2, 2, 2).delay(20))
        .build();

    let animation = extract(&bytes).unwrap();
    assert_eq!(animation.delays_ms(), vec![50, 50, 200]);
    let stats = animation.delay_stats().unwrap();
    assert_eq!((stats.min_ms, stats.max_ms, stats.total_ms), (50, 200, 300));
}

#[test]
fn test_all_zero_delays_become_one_millisecond() {
    let bytes = GifBuilder::new(2, 2, &PALETTE)
        .frame(&FrameSpec::filled(2, 2, 0).delay(0))
        .frame(&FrameSpec::filled(2, 2, 1).delay(0))
        .build();
    assert_eq!(extract(&bytes).unwrap().delays_ms(), vec![1, 1]);
}

#[test]
fn test_frame_clipped_to_screen() {
    let bytes = GifBuilder::new(4, 4, &PALETTE)
        .frame(&FrameSpec::filled(4, 4, 0).at(2, 2))
        .build();

    let animation = extract(&bytes).unwrap();
    let frame = &animation.frames[0];
    assert_eq!(frame.frame.rect, FrameRect { left: 2, top: 2, width: 2, height: 2 });
    assert_eq!(frame.frame.patch.dimensions(), (2, 2));
    let canvas = &frame.canvas;
    assert_eq!(canvas.dimensions(), (4, 4));
    assert_eq!(*canvas.get_pixel(3, 3), rgba(RED));
    assert_eq!(canvas.get_pixel(1, 1)[3], 0);
}

#[test]
fn test_comment_extension_is_skipped() {
    let bytes = GifBuilder::new(2, 2, &PALETTE)
        .comment("made by hand")
        .frame(&FrameSpec::filled(2, 2, 1))
        .build();

    let animation = extract(&bytes).unwrap();
    assert_eq!(animation.frames.len(), 1);
    assert_eq!(*animation.frames[0].canvas.get_pixel(1, 1), rgba(GREEN));
}

#[test]
fn test_truncation_after_first_frame_keeps_completed_frames() {
    let one_frame = GifBuilder::new(4, 4, &PALETTE)
        .frame(&FrameSpec::filled(4, 4, 0))
        .build_unterminated();
    let two_frames = GifBuilder::new(4, 4, &PALETTE)
        .frame(&FrameSpec::filled(4, 4, 0))
        .frame(&FrameSpec::filled(4, 4, 1))
        .build_unterminated();

    // Cut inside the second image descriptor
    let cut = &two_frames[..one_frame.len() + 8 + 5];
    let animation = extract(cut).unwrap();
    assert_eq!(animation.frames.len(), 1);
    let err = animation.truncated.expect("truncation should be reported");
    assert_eq!(err.kind(), ErrorKind::MalformedGifStream);
}

#[test]
fn test_missing_trailer_after_frames_is_truncation() {
    let bytes = GifBuilder::new(2, 2, &PALETTE)
        .frame(&FrameSpec::filled(2, 2, 0))
        .frame(&FrameSpec::filled(2, 2, 1))
        .build_unterminated();

    let animation = extract(&bytes).unwrap();
    assert_eq!(animation.frames.len(), 2);
    assert!(animation.truncated.is_some());
}

#[test]
fn test_error_before_first_frame_fails() {
    let full = GifBuilder::new(4, 4, &PALETTE).frame(&FrameSpec::filled(4, 4, 0)).build();
    let err = extract(&full[..20]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedGifStream);
}

#[test]
fn test_oversized_frame_is_clipped_before_decoding() {
    // Declares 60000x60000 on a 4x4 screen but carries one short row
    let bytes = GifBuilder::new(4, 4, &PALETTE)
        .frame(&FrameSpec::declared(60000, 60000, &[0, 1, 0, 1, 0, 1]).at(1, 1))
        .build();

    let animation = extract(&bytes).unwrap();
    assert!(animation.truncated.is_none());
    let frame = &animation.frames[0];
    assert_eq!(frame.frame.rect, FrameRect { left: 1, top: 1, width: 3, height: 3 });
    assert_eq!(frame.frame.patch.dimensions(), (3, 3));

    let canvas = &frame.canvas;
    assert_eq!(*canvas.get_pixel(1, 1), rgba(RED));
    assert_eq!(*canvas.get_pixel(2, 1), rgba(GREEN));
    assert_eq!(*canvas.get_pixel(3, 1), rgba(RED));
    assert_eq!(canvas.get_pixel(1, 2)[3], 0);
    assert_eq!(canvas.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_frame_wider_than_screen_drops_overflow_columns() {
    let mut wide = FrameSpec::filled(6, 2, 2);
    for row in 0..2 {
        wide.indices[row * 6] = 1;
    }
    let bytes = GifBuilder::new(3, 2, &PALETTE).frame(&wide).build();

    let animation = extract(&bytes).unwrap();
    let canvas = &animation.frames[0].canvas;
    // Row starts stay aligned even though three columns per row are dropped
    for y in 0..2 {
        assert_eq!(*canvas.get_pixel(0, y), rgba(GREEN));
        assert_eq!(*canvas.get_pixel(2, y), rgba(BLUE));
    }
}

/// Deterministic many-colour noise with a solid band to force long runs.
fn noisy_frame(width: u32, height: u32, seed: u32) -> RgbaImage {
    let mut state = seed;
    RgbaImage::from_fn(width, height, |_, y| {
        if y < 4 {
            return Rgba([10, 200, 30, 255]);
        }
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let v = state >> 8;
        Rgba([v as u8, (v >> 8) as u8, (v >> 16) as u8, 255])
    })
}

#[test]
fn test_encoder_output_matches_image_crate_decoder() {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for seed in [1, 7] {
            let frame = Frame::from_parts(noisy_frame(97, 61, seed), 0, 0, Delay::from_numer_denom_ms(80, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }

    let expected: Vec<RgbaImage> = GifDecoder::new(Cursor::new(&bytes))
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
        .into_iter()
        .map(Frame::into_buffer)
        .collect();

    let animation = extract(&bytes).unwrap();
    assert!(animation.truncated.is_none());
    assert_eq!(animation.frames.len(), expected.len());
    for (composed, reference) in animation.frames.iter().zip(&expected) {
        assert_eq!(composed.canvas.dimensions(), (97, 61));
        let differing = composed
            .canvas
            .pixels()
            .zip(reference.pixels())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(differing, 0);
    }
    assert_eq!(animation.delays_ms(), vec![80, 80]);
}

#[test]
fn test_frame_stream_yields_one_screen_at_a_time() {
    let bytes = GifBuilder::new(2, 2, &PALETTE)
        .frame(&FrameSpec::filled(2, 2, 0).disposal(1))
        .frame(&FrameSpec::filled(1, 1, 2).delay(30))
        .build_unterminated();

    let mut stream = FrameStream::new(Cursor::new(&bytes[..])).unwrap();
    assert_eq!((stream.width(), stream.height()), (2, 2));

    let (frame, canvas) = stream.next_frame().unwrap().expect("first frame");
    assert_eq!(frame.delay_cs, 10);
    assert!(canvas.pixels().all(|p| *p == rgba(RED)));

    let (frame, canvas) = stream.next_frame().unwrap().expect("second frame");
    assert_eq!(frame.delay_ms(), 300);
    assert_eq!(*canvas.get_pixel(0, 0), rgba(BLUE));
    assert_eq!(*canvas.get_pixel(1, 1), rgba(RED));

    // The missing trailer ends the stream without discarding frames
    assert!(stream.next_frame().unwrap().is_none());
    assert_eq!(stream.frames_read(), 2);
    assert_eq!(stream.truncated().map(|e| e.kind()), Some(ErrorKind::MalformedGifStream));
    assert!(stream.next_frame().unwrap().is_none());
}
