//! BMP decoding tests over hand-assembled files: every header family,
//! indexed and packed depths, RLE, bit masks, and ICO payloads.

use zenargb::*;

fn file_header(total: u32, offset: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(14);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&offset.to_le_bytes());
    out
}

/// 40-byte BITMAPINFOHEADER.
fn info_header_v1(width: i32, height: i32, bpp: u16, compression: u32, num_colors: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(40);
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&bpp.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&[0u8; 12]); // image size + resolution
    out.extend_from_slice(&num_colors.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // important colors
    assert_eq!(out.len(), 40);
    out
}

/// 108-byte BITMAPV4HEADER with explicit channel masks.
fn info_header_v4(width: i32, height: i32, bpp: u16, compression: u32, masks: [u32; 4]) -> Vec<u8> {
    let mut out = info_header_v1(width, height, bpp, compression, 0);
    out[0..4].copy_from_slice(&108u32.to_le_bytes());
    for mask in masks {
        out.extend_from_slice(&mask.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 52]); // colorspace, endpoints, gamma
    assert_eq!(out.len(), 108);
    out
}

/// 4-byte-per-entry palette from (B, G, R) triples, alpha byte zero.
fn palette4(entries: &[(u8, u8, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    for &(b, g, r) in entries {
        out.extend_from_slice(&[b, g, r, 0]);
    }
    out
}

// ── Standard path ────────────────────────────────────────────────────

#[test]
fn bottom_up_24bit() {
    let mut data = file_header(70, 54);
    data.extend_from_slice(&info_header_v1(2, 2, 24, 0, 0));
    // Bottom row first: green, blue; then red, white. Two pad bytes per row.
    data.extend_from_slice(&[0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00, 0, 0]);
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.width(), 2);
    assert_eq!(image.height(), 2);
    assert_eq!(image.info().alpha_type, AlphaType::Opaque);
    assert_eq!(
        image.pixels(),
        &[0xFFFF0000, 0xFFFFFFFF, 0xFF00FF00, 0xFF0000FF]
    );
}

#[test]
fn negated_height_reverses_rows() {
    let rows: &[u8] = &[
        0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00, 0, 0, // row A
        0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, // row B
    ];
    let mut bottom_up = file_header(70, 54);
    bottom_up.extend_from_slice(&info_header_v1(2, 2, 24, 0, 0));
    bottom_up.extend_from_slice(rows);

    let mut top_down = file_header(70, 54);
    top_down.extend_from_slice(&info_header_v1(2, -2, 24, 0, 0));
    top_down.extend_from_slice(rows);

    let a = decode_bmp(&bottom_up).unwrap();
    let b = decode_bmp(&top_down).unwrap();
    assert_eq!(a.pixels()[0..2], b.pixels()[2..4]);
    assert_eq!(a.pixels()[2..4], b.pixels()[0..2]);
}

#[test]
fn indexed_4bit_partial_byte() {
    // Width 3: the second source byte only uses its high nibble.
    let palette = palette4(&[(0, 0, 0xFF), (0, 0xFF, 0), (0xFF, 0, 0)]);
    let offset = 14 + 40 + palette.len() as u32;
    let mut data = file_header(offset + 4, offset);
    data.extend_from_slice(&info_header_v1(3, 1, 4, 0, 3));
    data.extend_from_slice(&palette);
    data.extend_from_slice(&[0x01, 0x20, 0, 0]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFFFF0000, 0xFF00FF00, 0xFF0000FF]);
}

#[test]
fn indexed_1bit() {
    let palette = palette4(&[(0, 0, 0), (0xFF, 0xFF, 0xFF)]);
    let offset = 14 + 40 + palette.len() as u32;
    let mut data = file_header(offset + 4, offset);
    data.extend_from_slice(&info_header_v1(10, 1, 1, 0, 2));
    data.extend_from_slice(&palette);
    // Pixels 0 and 9 set.
    data.extend_from_slice(&[0x80, 0x40, 0, 0]);

    let image = decode_bmp(&data).unwrap();
    let px = image.pixels();
    assert_eq!(px[0], 0xFFFFFFFF);
    assert_eq!(px[9], 0xFFFFFFFF);
    assert!(px[1..9].iter().all(|&p| p == 0xFF000000));
}

#[test]
fn os2_v1_header_with_3_byte_palette() {
    let mut data = file_header(798, 794);
    data.extend_from_slice(&12u32.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes()); // width
    data.extend_from_slice(&1u16.to_le_bytes()); // height
    data.extend_from_slice(&1u16.to_le_bytes()); // planes
    data.extend_from_slice(&8u16.to_le_bytes()); // bpp
    // OS/2 v1 has no color count field; a full 256-entry table follows.
    let mut palette = vec![0u8; 256 * 3];
    palette[0..3].copy_from_slice(&[0xFF, 0x00, 0x00]); // blue
    palette[3..6].copy_from_slice(&[0x00, 0xFF, 0x00]); // green
    data.extend_from_slice(&palette);
    data.extend_from_slice(&[0, 1, 0, 0]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFF0000FF, 0xFF00FF00]);
}

#[test]
fn unknown_header_size_parsed_leniently() {
    let mut data = file_header(66, 58);
    let mut header = info_header_v1(2, 1, 24, 0, 0);
    header[0..4].copy_from_slice(&44u32.to_le_bytes());
    header.extend_from_slice(&[0u8; 4]);
    data.extend_from_slice(&header);
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0, 0]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFFFF0000, 0xFF00FF00]);
}

#[test]
fn truncated_pixels_keep_partial_rows() {
    let mut data = file_header(70, 54);
    data.extend_from_slice(&info_header_v1(2, 2, 24, 0, 0));
    // Only the bottom row is present.
    data.extend_from_slice(&[0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00, 0, 0]);

    let mut decoder = BmpDecoder::new(&data).unwrap();
    let info = decoder.info();
    let mut pixels = [0xDEADBEEFu32; 4];
    let result = decoder.get_pixels(&info, &mut pixels, 2, &DecodeOptions::default());
    assert!(matches!(result, Err(DecodeError::Incomplete)));
    // The decoded bottom row landed in destination row 1; row 0 is untouched.
    assert_eq!(&pixels[2..4], &[0xFF00FF00, 0xFF0000FF]);
    assert_eq!(&pixels[0..2], &[0xDEADBEEF, 0xDEADBEEF]);
}

// ── Bit-masked path ──────────────────────────────────────────────────

#[test]
fn canonical_555_masks_for_16bit() {
    let mut data = file_header(58, 54);
    data.extend_from_slice(&info_header_v1(1, 1, 16, 0, 0));
    data.extend_from_slice(&0x7C00u16.to_le_bytes());
    data.extend_from_slice(&[0, 0]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFFFF0000]);
}

#[test]
fn v1_header_with_trailing_565_masks() {
    // BITFIELDS on a 40-byte header: the three masks follow the header.
    let mut data = file_header(70, 66);
    data.extend_from_slice(&info_header_v1(2, 1, 16, 3, 0));
    data.extend_from_slice(&0xF800u32.to_le_bytes());
    data.extend_from_slice(&0x07E0u32.to_le_bytes());
    data.extend_from_slice(&0x001Fu32.to_le_bytes());
    data.extend_from_slice(&0xF800u16.to_le_bytes());
    data.extend_from_slice(&0x07E0u16.to_le_bytes());

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFFFF0000, 0xFF00FF00]);
}

#[test]
fn all_zero_alpha_rescued_as_opaque() {
    let mut data = file_header(130, 122);
    data.extend_from_slice(&info_header_v4(
        2,
        1,
        32,
        3,
        [0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000],
    ));
    // Red and green pixels whose alpha bytes are all zero.
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0x00]);
    data.extend_from_slice(&[0x00, 0xFF, 0x00, 0x00]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.info().alpha_type, AlphaType::Unpremul);
    assert_eq!(image.pixels(), &[0xFFFF0000, 0xFF00FF00]);
}

#[test]
fn partial_alpha_is_preserved() {
    let mut data = file_header(130, 122);
    data.extend_from_slice(&info_header_v4(
        2,
        1,
        32,
        3,
        [0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000],
    ));
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0x80]);
    data.extend_from_slice(&[0x00, 0xFF, 0x00, 0x00]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0x80FF0000, 0x0000FF00]);
}

#[test]
fn premultiplied_destination() {
    let mut data = file_header(126, 122);
    data.extend_from_slice(&info_header_v4(
        1,
        1,
        32,
        3,
        [0x00FF0000, 0x0000FF00, 0x000000FF, 0xFF000000],
    ));
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0x80]);

    let mut decoder = BmpDecoder::new(&data).unwrap();
    let dst_info = decoder.info().with_alpha_type(AlphaType::Premul);
    let mut pixels = [0u32; 1];
    decoder
        .get_pixels(&dst_info, &mut pixels, 1, &DecodeOptions::default())
        .unwrap();
    assert_eq!(pixels[0], 0x80800000);
}

// ── RLE path ─────────────────────────────────────────────────────────

#[test]
fn rle8_run_and_untouched_tail() {
    let mut palette_entries = vec![(0u8, 0u8, 0u8); 16];
    palette_entries[5] = (0x00, 0x00, 0xFF); // red
    let palette = palette4(&palette_entries);
    let offset = 14 + 40 + palette.len() as u32;
    let mut data = file_header(offset + 6, offset);
    data.extend_from_slice(&info_header_v1(4, 1, 8, 1, 16));
    data.extend_from_slice(&palette);
    // Run of 3 of index 5, end of line, end of file.
    data.extend_from_slice(&[0x03, 0x05, 0x00, 0x00, 0x00, 0x01]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(
        image.pixels(),
        &[0xFFFF0000, 0xFFFF0000, 0xFFFF0000, 0x00000000]
    );
}

#[test]
fn rle4_absolute_delta_and_run() {
    let mut palette_entries = vec![(0u8, 0u8, 0u8); 16];
    palette_entries[1] = (0x00, 0x00, 0xFF); // red
    palette_entries[2] = (0x00, 0xFF, 0x00); // green
    palette_entries[3] = (0xFF, 0x00, 0x00); // blue
    palette_entries[4] = (0xFF, 0xFF, 0xFF); // white
    let palette = palette4(&palette_entries);
    let offset = 14 + 40 + palette.len() as u32;
    let stream: &[u8] = &[
        0x00, 0x04, 0x12, 0x34, // absolute: indices 1,2,3,4
        0x00, 0x02, 0x01, 0x00, // delta: skip one pixel
        0x01, 0x11, // run of 1 of index 1
        0x00, 0x00, // end of line
        0x00, 0x01, // end of file
    ];
    let mut data = file_header(offset + stream.len() as u32, offset);
    data.extend_from_slice(&info_header_v1(6, 1, 4, 2, 16));
    data.extend_from_slice(&palette);
    data.extend_from_slice(stream);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(
        image.pixels(),
        &[
            0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF, 0x00000000, 0xFFFF0000
        ]
    );
}

#[test]
fn rle24_via_jpeg_compression_marker() {
    let mut data = file_header(60, 54);
    data.extend_from_slice(&info_header_v1(2, 1, 24, 4, 0));
    // Run of 2 of B=0x10 G=0x20 R=0x30, then end of file.
    data.extend_from_slice(&[0x02, 0x10, 0x20, 0x30, 0x00, 0x01]);

    let image = decode_bmp(&data).unwrap();
    assert_eq!(image.pixels(), &[0xFF302010, 0xFF302010]);
}

#[test]
fn rle_command_past_last_row_is_incomplete() {
    let mut palette_entries = vec![(0u8, 0u8, 0u8); 16];
    palette_entries[5] = (0x00, 0x00, 0xFF);
    let palette = palette4(&palette_entries);
    let offset = 14 + 40 + palette.len() as u32;
    let stream: &[u8] = &[0x02, 0x05, 0x00, 0x00, 0x02, 0x05];
    let mut data = file_header(offset + stream.len() as u32, offset);
    data.extend_from_slice(&info_header_v1(2, 1, 8, 1, 16));
    data.extend_from_slice(&palette);
    data.extend_from_slice(stream);

    let mut decoder = BmpDecoder::new(&data).unwrap();
    let info = decoder.info();
    let mut pixels = [0u32; 2];
    let result = decoder.get_pixels(&info, &mut pixels, 2, &DecodeOptions::default());
    assert!(matches!(result, Err(DecodeError::Incomplete)));
    assert_eq!(pixels, [0xFFFF0000, 0xFFFF0000]);
}

#[test]
fn rle_requires_total_file_size() {
    // ICO payloads have no total size, so RLE inside ICO is always invalid;
    // same for a standalone file whose size field is zero.
    let mut data = file_header(0, 118);
    data.extend_from_slice(&info_header_v1(4, 1, 8, 1, 16));
    assert!(BmpDecoder::new(&data).is_err());
}

// ── ICO payloads ─────────────────────────────────────────────────────

#[test]
fn ico_and_mask_clears_pixels() {
    // Height field is doubled: XOR plane plus AND plane.
    let mut data = info_header_v1(2, 4, 32, 0, 0);
    // XOR rows, bottom-up: blue, white / red, green. All alpha 0xFF.
    data.extend_from_slice(&[0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    data.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF, 0x00, 0xFF, 0x00, 0xFF]);
    // AND rows (4-byte aligned): keep the bottom row, clear pixel (0, 0).
    data.extend_from_slice(&[0x00, 0, 0, 0]);
    data.extend_from_slice(&[0x80, 0, 0, 0]);

    let image = decode_bmp_in_ico(&data).unwrap();
    assert_eq!(image.width(), 2);
    assert_eq!(image.height(), 2);
    assert_eq!(image.info().alpha_type, AlphaType::Unpremul);
    assert_eq!(
        image.pixels(),
        &[0x00000000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF]
    );
}

#[test]
fn ico_8bit_palette_payload() {
    // Palette data follows the header directly; no offset field exists.
    let mut data = info_header_v1(2, 2, 8, 0, 2);
    data.extend_from_slice(&palette4(&[(0xFF, 0x00, 0x00), (0x00, 0xFF, 0x00)]));
    data.extend_from_slice(&[0, 1, 0, 0]); // XOR row
    data.extend_from_slice(&[0x00, 0, 0, 0]); // AND row

    let image = decode_bmp_in_ico(&data).unwrap();
    assert_eq!(image.width(), 2);
    assert_eq!(image.height(), 1);
    assert_eq!(image.pixels(), &[0xFF0000FF, 0xFF00FF00]);
}

// ── Rejection and contract checks ────────────────────────────────────

#[test]
fn rejects_bad_magic() {
    assert!(matches!(
        decode(b"XXlooks nothing like an image"),
        Err(DecodeError::UnrecognizedFormat)
    ));
    assert!(BmpDecoder::new(b"PM\x00\x00").is_err());
}

#[test]
fn rejects_offset_inside_headers() {
    let mut data = file_header(100, 20);
    data.extend_from_slice(&info_header_v1(1, 1, 24, 0, 0));
    assert!(BmpDecoder::new(&data).is_err());
}

#[test]
fn rejects_unsupported_compressions() {
    for (compression, bpp) in [(5u32, 24u16), (11, 24), (12, 24), (13, 24), (4, 32)] {
        let mut data = file_header(100, 54);
        data.extend_from_slice(&info_header_v1(1, 1, bpp, compression, 0));
        assert!(
            matches!(BmpDecoder::new(&data), Err(DecodeError::Unsupported(_))),
            "compression {compression} at {bpp} bpp"
        );
    }
}

#[test]
fn rejects_os2_huffman() {
    let mut data = file_header(100, 88);
    let mut header = info_header_v1(1, 1, 1, 3, 0);
    header[0..4].copy_from_slice(&64u32.to_le_bytes());
    header.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&header);
    assert!(matches!(
        BmpDecoder::new(&data),
        Err(DecodeError::Unsupported(_))
    ));
}

#[test]
fn rejects_oversized_dimensions() {
    let mut data = file_header(100, 54);
    data.extend_from_slice(&info_header_v1(70000, 1, 24, 0, 0));
    assert!(BmpDecoder::new(&data).is_err());

    let mut data = file_header(100, 54);
    data.extend_from_slice(&info_header_v1(1, 70000, 24, 0, 0));
    assert!(BmpDecoder::new(&data).is_err());
}

#[test]
fn scale_and_conversion_preconditions() {
    let mut data = file_header(70, 54);
    data.extend_from_slice(&info_header_v1(2, 2, 24, 0, 0));
    data.extend_from_slice(&[0u8; 16]);
    let mut decoder = BmpDecoder::new(&data).unwrap();

    let mut pixels = [0u32; 4];
    let wrong_dims = ImageInfo::new(1, 1, AlphaType::Opaque);
    assert!(matches!(
        decoder.get_pixels(&wrong_dims, &mut pixels, 2, &DecodeOptions::default()),
        Err(DecodeError::InvalidScale)
    ));

    // An opaque source cannot produce an unpremultiplied destination.
    let bad_alpha = decoder.info().with_alpha_type(AlphaType::Unpremul);
    assert!(matches!(
        decoder.get_pixels(&bad_alpha, &mut pixels, 2, &DecodeOptions::default()),
        Err(DecodeError::InvalidConversion)
    ));

    let info = decoder.info();
    let mut small = [0u32; 3];
    assert!(matches!(
        decoder.get_pixels(&info, &mut small, 2, &DecodeOptions::default()),
        Err(DecodeError::BufferTooSmall { .. })
    ));
}

#[test]
fn decoder_is_reusable() {
    let mut data = file_header(58, 54);
    data.extend_from_slice(&info_header_v1(1, 1, 16, 0, 0));
    data.extend_from_slice(&0x7C00u16.to_le_bytes());
    data.extend_from_slice(&[0, 0]);

    let mut decoder = BmpDecoder::new(&data).unwrap();
    let info = decoder.info();
    let mut first = [0u32; 1];
    let mut second = [0u32; 1];
    decoder
        .get_pixels(&info, &mut first, 1, &DecodeOptions::default())
        .unwrap();
    decoder
        .get_pixels(&info, &mut second, 1, &DecodeOptions::default())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn limits_are_enforced() {
    let mut data = file_header(70, 54);
    data.extend_from_slice(&info_header_v1(2, 2, 24, 0, 0));
    data.extend_from_slice(&[0u8; 16]);

    let limits = Limits {
        max_pixels: Some(2),
        ..Limits::default()
    };
    assert!(matches!(
        decode_with_limits(&data, &limits),
        Err(DecodeError::LimitExceeded(_))
    ));
}

#[test]
fn probe_detects_formats() {
    assert_eq!(probe(b"BM\x00\x00\x00\x00"), Some(ImageFormat::Bmp));
    assert_eq!(probe(b"\x89PNG\r\n\x1a\n"), Some(ImageFormat::Png));
    assert_eq!(probe(b"GIF89a"), None);
    assert_eq!(probe(b"B"), None);
}
