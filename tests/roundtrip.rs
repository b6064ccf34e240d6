//! Round-trip and disposal-compositing properties over real GIF byte streams.

use smudge::{CancelToken, Disposal, extract_frames, reconstruct_gif};

/// Builds an indexed GIF frame with an explicit local palette so test inputs
/// are quantization-free.
fn indexed_frame(
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    color_index: u8,
    palette: &[u8],
    delay_cs: u16,
    dispose: gif::DisposalMethod,
) -> gif::Frame<'static> {
    let mut frame = gif::Frame::default();
    frame.left = left;
    frame.top = top;
    frame.width = width;
    frame.height = height;
    frame.delay = delay_cs;
    frame.dispose = dispose;
    frame.palette = Some(palette.to_vec());
    frame.buffer = vec![color_index; usize::from(width) * usize::from(height)].into();
    frame
}

fn encode(screen: (u16, u16), frames: Vec<gif::Frame<'static>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, screen.0, screen.1, &[]).unwrap();
        encoder.set_repeat(gif::Repeat::Infinite).unwrap();
        for frame in &frames {
            encoder.write_frame(frame).unwrap();
        }
    }
    bytes
}

const PALETTE: &[u8] = &[
    200, 0, 0, // index 0: red
    0, 200, 0, // index 1: green
    0, 0, 200, // index 2: blue
];

#[test]
fn unedited_round_trip_preserves_structure_and_pixels() {
    let bytes = encode(
        (8, 8),
        vec![
            indexed_frame(0, 0, 8, 8, 0, PALETTE, 10, gif::DisposalMethod::Keep),
            indexed_frame(0, 0, 8, 8, 1, PALETTE, 20, gif::DisposalMethod::Keep),
            indexed_frame(0, 0, 8, 8, 2, PALETTE, 30, gif::DisposalMethod::Keep),
        ],
    );

    let cancel = CancelToken::new();
    let (frames, metadata) = extract_frames(&bytes, None, &cancel).unwrap();
    let rebuilt = reconstruct_gif(&frames, &metadata, &cancel).unwrap();
    let (frames2, metadata2) = extract_frames(&rebuilt, None, &cancel).unwrap();

    assert_eq!(frames2.len(), frames.len());
    assert_eq!(metadata2.screen_width, 8);
    assert_eq!(metadata2.screen_height, 8);
    for (a, b) in metadata.frames.iter().zip(&metadata2.frames) {
        assert_eq!(a.delay_cs, b.delay_cs);
        assert_eq!(a.disposal, b.disposal);
        assert_eq!(a.region, b.region);
    }
    // Disposal is Keep throughout, so pixel content must match exactly.
    for (a, b) in frames.iter().zip(&frames2) {
        assert_eq!(a, b);
    }
}

#[test]
fn background_disposal_clears_the_sub_rectangle_for_the_next_frame() {
    // frame 0: full red canvas, keep
    // frame 1: green 4x4 at (2,2), restore-to-background
    // frame 2: blue 1x1 at (0,0), keep
    let bytes = encode(
        (8, 8),
        vec![
            indexed_frame(0, 0, 8, 8, 0, PALETTE, 10, gif::DisposalMethod::Keep),
            indexed_frame(2, 2, 4, 4, 1, PALETTE, 10, gif::DisposalMethod::Background),
            indexed_frame(0, 0, 1, 1, 2, PALETTE, 10, gif::DisposalMethod::Keep),
        ],
    );

    let (frames, _) = extract_frames(&bytes, None, &CancelToken::new()).unwrap();
    assert_eq!(frames.len(), 3);

    // While frame 1 is shown, its region is green over red.
    assert_eq!(frames[1].pixel(3, 3), [0, 200, 0, 255]);
    assert_eq!(frames[1].pixel(0, 7), [200, 0, 0, 255]);

    // Frame 2 composites over a canvas where frame 1's region was cleared —
    // not over frame 1's green content, and not over a fully cleared canvas.
    assert_eq!(frames[2].pixel(0, 0), [0, 0, 200, 255]);
    assert_eq!(frames[2].pixel(3, 3), [0, 0, 0, 0]);
    assert_eq!(frames[2].pixel(0, 7), [200, 0, 0, 255]);
}

#[test]
fn background_disposal_survives_a_round_trip() {
    let bytes = encode(
        (8, 8),
        vec![
            indexed_frame(0, 0, 8, 8, 0, PALETTE, 10, gif::DisposalMethod::Keep),
            indexed_frame(2, 2, 4, 4, 1, PALETTE, 10, gif::DisposalMethod::Background),
            indexed_frame(0, 0, 1, 1, 2, PALETTE, 10, gif::DisposalMethod::Keep),
        ],
    );

    let cancel = CancelToken::new();
    let (frames, metadata) = extract_frames(&bytes, None, &cancel).unwrap();
    assert_eq!(metadata.frames[1].disposal, Disposal::Background);

    let rebuilt = reconstruct_gif(&frames, &metadata, &cancel).unwrap();
    let (frames2, metadata2) = extract_frames(&rebuilt, None, &cancel).unwrap();

    assert_eq!(metadata2.frames[1].disposal, Disposal::Background);
    assert_eq!(frames2[2].pixel(3, 3), [0, 0, 0, 0]);
    assert_eq!(frames2[2].pixel(0, 7), [200, 0, 0, 255]);
}

#[test]
fn sub_region_frames_keep_their_offsets() {
    let bytes = encode(
        (10, 10),
        vec![
            indexed_frame(0, 0, 10, 10, 0, PALETTE, 10, gif::DisposalMethod::Keep),
            indexed_frame(4, 6, 3, 2, 1, PALETTE, 10, gif::DisposalMethod::Keep),
        ],
    );

    let cancel = CancelToken::new();
    let (frames, metadata) = extract_frames(&bytes, None, &cancel).unwrap();
    assert_eq!(metadata.frames[1].region.left, 4);
    assert_eq!(metadata.frames[1].region.top, 6);

    let rebuilt = reconstruct_gif(&frames, &metadata, &cancel).unwrap();
    let (_, metadata2) = extract_frames(&rebuilt, None, &cancel).unwrap();

    // Reconstruction crops the sub-region back out instead of re-encoding
    // full canvases, so the frame keeps its original geometry.
    assert_eq!(metadata2.frames[1].region, metadata.frames[1].region);
}

#[test]
fn cancelled_extraction_discards_partial_output() {
    let bytes = encode(
        (8, 8),
        vec![indexed_frame(0, 0, 8, 8, 0, PALETTE, 10, gif::DisposalMethod::Keep)],
    );

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        extract_frames(&bytes, None, &cancel),
        Err(smudge::SmudgeError::Cancelled)
    ));
}
