//! BMP file and info header parsing.
//!
//! The format sprawls across seven documented header versions plus unknown
//! vendor sizes. Everything is normalized into one [`BmpHeader`] consumed by
//! a single decode engine, instead of a decoder per header type.

use log::warn;

use crate::color::AlphaType;
use crate::mask::Masks;
use crate::reader::{get_i32_le, get_u16_le, get_u32_le, ByteReader};
use crate::DecodeError;

/// Which second (info) header layout the file declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HeaderKind {
    InfoV1,
    InfoV2,
    InfoV3,
    InfoV4,
    InfoV5,
    Os2V1,
    Os2V2,
    Unknown,
}

/// How the pixel payload is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Encoding {
    /// Fixed-layout rows (indexed or packed BGR).
    Standard,
    /// Rows of bit-masked 16/32-bit samples.
    Masked,
    /// Run-length encoded payload (4, 8, or 24 bits per pixel).
    Rle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RowOrder {
    BottomUp,
    TopDown,
}

/// Normalized decode plan produced by header parsing.
#[derive(Clone, Debug)]
pub(crate) struct BmpHeader {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub encoding: Encoding,
    pub row_order: RowOrder,
    pub masks: Masks,
    pub num_colors: u32,
    pub bytes_per_color: u32,
    /// Bytes between the end of the parsed headers and the pixel data,
    /// including the color table. Zero for ICO-embedded images, whose pixel
    /// data always follows the color table directly.
    pub pixel_data_padding: u32,
    /// Total RLE payload size; only meaningful for [`Encoding::Rle`].
    pub rle_bytes: u32,
    pub is_ico: bool,
    pub alpha_type: AlphaType,
}

const FILE_HEADER_BYTES: u32 = 14;
const OS2_V1_BYTES: u32 = 12;
const MASK_BYTES: usize = 12;
const MAX_DIM: i32 = 1 << 16;

fn invalid(msg: impl Into<String>) -> DecodeError {
    DecodeError::InvalidInput(msg.into())
}

/// Parse the BMP headers from the current reader position.
///
/// For plain files the reader is at the start of the 14-byte file header;
/// for BMP-in-ICO it is at the info-header size field (ICO containers carry
/// no file header).
pub(crate) fn parse(reader: &mut ByteReader<'_>, is_ico: bool) -> Result<BmpHeader, DecodeError> {
    let total_bytes;
    let offset;
    let info_bytes;

    if !is_ico {
        let header: [u8; 18] = reader
            .read_fixed()
            .map_err(|_| invalid("truncated file header"))?;
        if &header[0..2] != b"BM" {
            return Err(DecodeError::UnrecognizedFormat);
        }
        total_bytes = get_u32_le(&header, 2);
        offset = get_u32_le(&header, 10);
        if offset < FILE_HEADER_BYTES + OS2_V1_BYTES {
            return Err(invalid("pixel data offset inside the headers"));
        }
        info_bytes = get_u32_le(&header, 14);
    } else {
        // ICO payloads cannot use RLE (no total size) and cannot specify a
        // pixel data offset; data begins right after the color table.
        total_bytes = 0;
        offset = 0;
        info_bytes = reader
            .u32_le()
            .map_err(|_| invalid("truncated info header size"))?;
    }

    if info_bytes < OS2_V1_BYTES {
        return Err(invalid(format!("impossible info header size {info_bytes}")));
    }
    let info_remaining = (info_bytes - 4) as usize;
    if info_remaining > reader.remaining() {
        return Err(invalid("truncated info header"));
    }
    let mut ib = vec![0u8; info_remaining];
    reader
        .read_exact(&mut ib)
        .map_err(|_| invalid("truncated info header"))?;

    let kind;
    let width_field: i32;
    let height_field: i32;
    let mut bits_per_pixel: u16;
    let mut compression = 0u32;
    let mut num_colors = 0u32;
    let bytes_per_color;

    if info_bytes >= 16 {
        kind = match info_bytes {
            40 => HeaderKind::InfoV1,
            52 => HeaderKind::InfoV2,
            56 => HeaderKind::InfoV3,
            108 => HeaderKind::InfoV4,
            124 => HeaderKind::InfoV5,
            16 | 20 | 24 | 28 | 32 | 36 | 42 | 46 | 48 | 60 | 64 => HeaderKind::Os2V2,
            _ => {
                // New or undocumented sizes keep appearing; most build on the
                // older layouts, so parse the fixed prefix and carry on.
                warn!("unknown BMP info header size {info_bytes}");
                HeaderKind::Unknown
            }
        };
        width_field = get_i32_le(&ib, 0);
        height_field = get_i32_le(&ib, 4);
        bits_per_pixel = get_u16_le(&ib, 10);
        if info_remaining >= 16 {
            compression = get_u32_le(&ib, 12);
            if info_remaining >= 32 {
                num_colors = get_u32_le(&ib, 28);
            }
        }
        bytes_per_color = 4;
    } else {
        kind = HeaderKind::Os2V1;
        width_field = i32::from(get_u16_le(&ib, 0));
        height_field = i32::from(get_u16_le(&ib, 2));
        bits_per_pixel = get_u16_le(&ib, 6);
        bytes_per_color = 3;
    }

    let mut row_order = RowOrder::BottomUp;
    let mut height = height_field;
    if height < 0 {
        height = height
            .checked_neg()
            .ok_or_else(|| invalid("invalid bitmap height"))?;
        row_order = RowOrder::TopDown;
    }
    // ICO doubles the stored height: an XOR color plane is followed by a
    // 1-bit AND transparency plane of the same logical height.
    if is_ico {
        height /= 2;
    }
    if width_field < 0 || width_field >= MAX_DIM || height >= MAX_DIM {
        return Err(invalid(format!(
            "invalid bitmap dimensions {width_field}x{height_field}"
        )));
    }
    let width = width_field as u32;
    let height = height as u32;

    let mut mask_bytes = 0usize;
    let (mut mask_r, mut mask_g, mut mask_b, mut mask_a) = (0u32, 0u32, 0u32, 0u32);

    let mut encoding = match compression {
        0 => Encoding::Standard,
        1 => {
            if bits_per_pixel != 8 {
                warn!("RLE8 with bit depth {bits_per_pixel}, correcting to 8");
                bits_per_pixel = 8;
            }
            Encoding::Rle
        }
        2 => {
            if bits_per_pixel != 4 {
                warn!("RLE4 with bit depth {bits_per_pixel}, correcting to 4");
                bits_per_pixel = 4;
            }
            Encoding::Rle
        }
        3 | 6 => {
            match kind {
                HeaderKind::InfoV1 => {
                    // V1 stores the three masks after the header.
                    let buf: [u8; MASK_BYTES] = reader
                        .read_fixed()
                        .map_err(|_| invalid("truncated bit masks"))?;
                    mask_bytes = MASK_BYTES;
                    mask_r = get_u32_le(&buf, 0);
                    mask_g = get_u32_le(&buf, 4);
                    mask_b = get_u32_le(&buf, 8);
                }
                HeaderKind::InfoV2
                | HeaderKind::InfoV3
                | HeaderKind::InfoV4
                | HeaderKind::InfoV5 => {
                    mask_r = get_u32_le(&ib, 36);
                    mask_g = get_u32_le(&ib, 40);
                    mask_b = get_u32_le(&ib, 44);
                }
                HeaderKind::Os2V2 => {
                    return Err(DecodeError::Unsupported(
                        "OS/2 Huffman 1D compression".into(),
                    ));
                }
                HeaderKind::Os2V1 | HeaderKind::Unknown => {
                    return Err(invalid("bit masks with a maskless header layout"));
                }
            }
            Encoding::Masked
        }
        // An embedded-JPEG marker on a 24-bit image is how RLE24 appears in
        // the wild; real JPEG payloads are not supported.
        4 if bits_per_pixel == 24 => Encoding::Rle,
        4 => return Err(DecodeError::Unsupported("JPEG-compressed BMP".into())),
        5 => return Err(DecodeError::Unsupported("PNG-compressed BMP".into())),
        11..=13 => return Err(DecodeError::Unsupported("CMYK BMP".into())),
        other => return Err(invalid(format!("invalid compression method {other}"))),
    };

    // Most BMPs render opaque: either there is no alpha channel or writers
    // left it uninitialized. V4+ introduced a dedicated alpha mask, and V3
    // gained one in practice inside ICO containers; only those are honored.
    // A fully transparent result is corrected later by the rescue pass.
    let mut alpha_type = AlphaType::Opaque;
    if (kind == HeaderKind::InfoV3 && is_ico)
        || kind == HeaderKind::InfoV4
        || kind == HeaderKind::InfoV5
    {
        mask_a = get_u32_le(&ib, 48);
        if mask_a != 0 {
            alpha_type = AlphaType::Unpremul;
        }
    }
    // 32-bit ICO payloads use their alpha bytes even without a mask.
    if is_ico && bits_per_pixel == 32 {
        alpha_type = AlphaType::Unpremul;
    }

    match bits_per_pixel {
        // The canonical 16-bit layout is 555 with a dead top bit, which has
        // no fixed-layout unpacker here; route it through the mask engine.
        16 => {
            if encoding != Encoding::Masked {
                mask_r = 0x7C00;
                mask_g = 0x03E0;
                mask_b = 0x001F;
                encoding = Encoding::Masked;
            }
        }
        1 | 2 | 4 | 8 | 24 | 32 => {}
        other => {
            return Err(invalid(format!("invalid bits per pixel {other}")));
        }
    }

    let masks = Masks::new(mask_r, mask_g, mask_b, mask_a, bits_per_pixel)?;

    let rle_bytes = if encoding == Encoding::Rle {
        if total_bytes <= offset {
            return Err(invalid("RLE payload requires a valid total file size"));
        }
        total_bytes - offset
    } else {
        0
    };

    let pixel_data_padding = if is_ico {
        0
    } else {
        let bytes_read = FILE_HEADER_BYTES + info_bytes + mask_bytes as u32;
        if offset < bytes_read {
            return Err(invalid("pixel data offset inside the parsed headers"));
        }
        offset - bytes_read
    };

    Ok(BmpHeader {
        width,
        height,
        bits_per_pixel,
        encoding,
        row_order,
        masks,
        num_colors,
        bytes_per_color,
        pixel_data_padding,
        rle_bytes,
        is_ico,
        alpha_type,
    })
}
