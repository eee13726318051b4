//! # zenargb
//!
//! BMP (including BMP embedded in ICO containers) and PNG decoding into
//! packed 32-bit ARGB pixels.
//!
//! The BMP decoder is written from scratch: every documented info-header
//! version (OS/2 v1/v2, BITMAPINFOHEADER v1–v5, plus lenient handling of
//! unknown sizes), bit depths 1/2/4/8/16/24/32, RLE4/RLE8/RLE24, arbitrary
//! channel bit masks, bottom-up and top-down row order, and the 1-bit AND
//! transparency plane of ICO payloads. PNG chunk and inflate handling is
//! delegated to the `png` crate; this crate drives it, keeps palette
//! lookup on its own side, and swizzles engine rows into the shared
//! destination format.
//!
//! Every decoder writes the same destination: packed `u32` values laid out
//! as `a << 24 | r << 16 | g << 8 | b`, with the caller choosing the alpha
//! convention (opaque, premultiplied, or unpremultiplied).
//!
//! ## Usage
//!
//! ```no_run
//! let data = std::fs::read("image.bmp")?;
//! let image = zenargb::decode(&data)?;
//! println!("{}x{}", image.width(), image.height());
//! let argb: &[u32] = image.pixels();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Callers that manage their own buffers use the decoder types directly:
//!
//! ```no_run
//! use zenargb::{BmpDecoder, DecodeOptions};
//!
//! let data = std::fs::read("image.bmp")?;
//! let mut decoder = BmpDecoder::new(&data)?;
//! let info = decoder.info();
//! let mut pixels = vec![0u32; (info.width * info.height) as usize];
//! decoder.get_pixels(
//!     &info,
//!     &mut pixels,
//!     info.width as usize,
//!     &DecodeOptions { zero_initialized: true },
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod color;
mod decode;
mod error;
mod limits;
mod mask;
mod reader;
mod swizzle;

pub mod bmp;
pub mod png;

pub use crate::bmp::BmpDecoder;
pub use color::{pack_argb, premultiply_argb, AlphaType, ColorTable, ImageInfo, RowAlpha};
pub use decode::{DecodeOptions, DecodedImage};
pub use error::DecodeError;
pub use limits::Limits;
pub use mask::Masks;
pub use crate::png::{PngDecoder, PngScanlineDecoder};
pub use swizzle::{SrcFormat, Swizzler};

/// Image format detected from magic bytes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Windows/OS-2 bitmap (`BM`).
    Bmp,
    /// PNG (`\x89PNG`).
    Png,
}

/// Detect the image format from magic bytes.
///
/// Returns `None` if the data matches neither supported format.
pub fn probe(data: &[u8]) -> Option<ImageFormat> {
    if data.len() >= 2 && &data[0..2] == b"BM" {
        return Some(ImageFormat::Bmp);
    }
    if data.len() >= 4 && &data[0..4] == b"\x89PNG" {
        return Some(ImageFormat::Png);
    }
    None
}

/// Decode any supported format (auto-detected from magic bytes) into a
/// freshly allocated buffer, keeping the source's natural alpha convention.
pub fn decode(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_dispatch(data, None)
}

/// Decode any supported format with resource limits.
pub fn decode_with_limits(data: &[u8], limits: &Limits) -> Result<DecodedImage, DecodeError> {
    decode_dispatch(data, Some(limits))
}

fn decode_dispatch(data: &[u8], limits: Option<&Limits>) -> Result<DecodedImage, DecodeError> {
    match probe(data) {
        Some(ImageFormat::Bmp) => decode_bmp_impl(data, false, limits),
        Some(ImageFormat::Png) => decode_png_impl(data, limits),
        None => Err(DecodeError::UnrecognizedFormat),
    }
}

/// Decode a standalone BMP file.
pub fn decode_bmp(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_bmp_impl(data, false, None)
}

/// Decode a BMP payload extracted from an ICO container. `data` must start
/// at the info-header size field.
pub fn decode_bmp_in_ico(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_bmp_impl(data, true, None)
}

/// Decode a PNG file.
pub fn decode_png(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    decode_png_impl(data, None)
}

fn alloc_pixels(info: &ImageInfo, limits: Option<&Limits>) -> Result<Vec<u32>, DecodeError> {
    if let Some(limits) = limits {
        limits.check(info.width, info.height)?;
    }
    let count = (info.width as usize)
        .checked_mul(info.height as usize)
        .ok_or(DecodeError::DimensionsTooLarge {
            width: info.width,
            height: info.height,
        })?;
    let bytes = count
        .checked_mul(4)
        .ok_or(DecodeError::DimensionsTooLarge {
            width: info.width,
            height: info.height,
        })?;
    if let Some(limits) = limits {
        limits.check_memory(bytes)?;
    }
    Ok(vec![0u32; count])
}

fn decode_bmp_impl(
    data: &[u8],
    in_ico: bool,
    limits: Option<&Limits>,
) -> Result<DecodedImage, DecodeError> {
    let mut decoder = if in_ico {
        BmpDecoder::new_in_ico(data)?
    } else {
        BmpDecoder::new(data)?
    };
    let info = decoder.info();
    let mut pixels = alloc_pixels(&info, limits)?;
    decoder.get_pixels(
        &info,
        &mut pixels,
        info.width as usize,
        &DecodeOptions {
            zero_initialized: true,
        },
    )?;
    Ok(DecodedImage::new(info, pixels))
}

fn decode_png_impl(data: &[u8], limits: Option<&Limits>) -> Result<DecodedImage, DecodeError> {
    let mut decoder = PngDecoder::new(data)?;
    let info = decoder.info();
    let mut pixels = alloc_pixels(&info, limits)?;
    decoder.get_pixels(
        &info,
        &mut pixels,
        info.width as usize,
        &DecodeOptions {
            zero_initialized: true,
        },
    )?;
    Ok(DecodedImage::new(info, pixels))
}
