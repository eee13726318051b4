//! Row-loop decode paths for standard and bit-masked BMP payloads, plus the
//! trailing ICO AND-mask plane.

use log::warn;

use crate::bmp::header::{BmpHeader, RowOrder};
use crate::color::{AlphaType, ColorTable, RowAlpha};
use crate::reader::ByteReader;
use crate::swizzle::{SrcFormat, Swizzler};
use crate::DecodeError;

/// BMP rows are padded to four-byte boundaries.
fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn map_row(order: RowOrder, height: usize, y: usize) -> usize {
    match order {
        RowOrder::BottomUp => height - 1 - y,
        RowOrder::TopDown => y,
    }
}

/// Fixed-layout rows: indexed 1/2/4/8 bpp and packed BGR(X/A).
pub(crate) fn standard(
    reader: &mut ByteReader<'_>,
    header: &BmpHeader,
    table: Option<ColorTable>,
    dst: &mut [u32],
    dst_stride: usize,
    dst_alpha: AlphaType,
) -> Result<(), DecodeError> {
    let width = header.width as usize;
    let height = header.height as usize;

    let format = match header.bits_per_pixel {
        1 => SrcFormat::Index1,
        2 => SrcFormat::Index2,
        4 => SrcFormat::Index4,
        8 => SrcFormat::Index8,
        24 => SrcFormat::Bgr,
        32 => {
            if dst_alpha == AlphaType::Opaque {
                SrcFormat::Bgrx
            } else {
                SrcFormat::Bgra
            }
        }
        other => {
            return Err(DecodeError::InvalidInput(format!(
                "invalid bits per pixel {other} for uncompressed data"
            )));
        }
    };

    let row_bytes = align4(format.row_bytes(width));
    let swizzler = Swizzler::new(format, width, dst_alpha, table, None)?;
    let mut row_buf = vec![0u8; row_bytes];

    for y in 0..height {
        if reader.read(&mut row_buf) != row_bytes {
            warn!("incomplete BMP pixel data");
            return Err(DecodeError::Incomplete);
        }
        let row = map_row(header.row_order, height, y);
        swizzler.swizzle_row(&row_buf, &mut dst[row * dst_stride..row * dst_stride + width]);
    }

    if header.is_ico {
        apply_and_mask(reader, header, dst, dst_stride)?;
    }
    Ok(())
}

/// Bit-masked 16/32-bit rows.
///
/// The whole source image is buffered because a second pass may be needed:
/// many V4/V5 writers declare an alpha mask but author every alpha bit as
/// zero while expecting opaque display. If the first pass finds the entire
/// image transparent, it is re-swizzled with an opaque destination.
pub(crate) fn masked(
    reader: &mut ByteReader<'_>,
    header: &BmpHeader,
    dst: &mut [u32],
    dst_stride: usize,
    dst_alpha: AlphaType,
) -> Result<(), DecodeError> {
    let width = header.width as usize;
    let height = header.height as usize;

    let format = match header.bits_per_pixel {
        16 => SrcFormat::Masked16,
        32 => SrcFormat::Masked32,
        other => {
            return Err(DecodeError::InvalidInput(format!(
                "bit masks with {other} bits per pixel"
            )));
        }
    };

    let row_bytes = align4(format.row_bytes(width));
    let total = row_bytes
        .checked_mul(height)
        .ok_or(DecodeError::DimensionsTooLarge {
            width: header.width,
            height: header.height,
        })?;
    let mut src = vec![0u8; total];

    let swizzler = Swizzler::new(format, width, dst_alpha, None, Some(header.masks))?;
    let mut transparent = true;
    for y in 0..height {
        let src_row = &mut src[y * row_bytes..(y + 1) * row_bytes];
        if reader.read(src_row) != row_bytes {
            warn!("incomplete BMP pixel data");
            return Err(DecodeError::Incomplete);
        }
        let row = map_row(header.row_order, height, y);
        let alpha =
            swizzler.swizzle_row(src_row, &mut dst[row * dst_stride..row * dst_stride + width]);
        transparent &= alpha == RowAlpha::Transparent;
    }

    if transparent && height > 0 {
        let opaque = Swizzler::new(format, width, AlphaType::Opaque, None, Some(header.masks))?;
        for y in 0..height {
            let src_row = &src[y * row_bytes..(y + 1) * row_bytes];
            let row = map_row(header.row_order, height, y);
            opaque.swizzle_row(src_row, &mut dst[row * dst_stride..row * dst_stride + width]);
        }
    }

    if header.is_ico {
        apply_and_mask(reader, header, dst, dst_stride)?;
    }
    Ok(())
}

/// The 1-bit AND plane that follows an ICO payload's color plane. A set bit
/// marks a transparent pixel and clears the decoded value; rows are 4-byte
/// aligned and follow the same row order as the color plane.
fn apply_and_mask(
    reader: &mut ByteReader<'_>,
    header: &BmpHeader,
    dst: &mut [u32],
    dst_stride: usize,
) -> Result<(), DecodeError> {
    let width = header.width as usize;
    let height = header.height as usize;
    let row_bytes = align4((width + 7) / 8);
    let mut row_buf = vec![0u8; row_bytes];

    for y in 0..height {
        if reader.read(&mut row_buf) != row_bytes {
            warn!("incomplete AND mask for BMP-in-ICO");
            return Err(DecodeError::Incomplete);
        }
        let row = map_row(header.row_order, height, y);
        let dst_row = &mut dst[row * dst_stride..row * dst_stride + width];
        for (x, px) in dst_row.iter_mut().enumerate() {
            let bit = u32::from((row_buf[x >> 3] >> (7 - (x & 7))) & 1);
            *px &= bit.wrapping_sub(1);
        }
    }
    Ok(())
}
