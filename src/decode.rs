use crate::color::ImageInfo;
use crate::DecodeError;

/// Additional options for a pixel decode.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeOptions {
    /// The destination buffer is known to be zeroed already, which lets the
    /// RLE path skip its background fill.
    pub zero_initialized: bool,
}

/// Validate a caller-provided destination against the image dimensions.
/// `dst_stride` is in pixels; the last row needs only `width` of them.
pub(crate) fn check_dst_buffer(
    dst: &[u32],
    dst_stride: usize,
    width: usize,
    height: usize,
) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    if dst_stride < width {
        return Err(DecodeError::InvalidInput(
            "destination row stride smaller than the image width".into(),
        ));
    }
    let needed = dst_stride
        .checked_mul(height - 1)
        .and_then(|n| n.checked_add(width))
        .ok_or(DecodeError::DimensionsTooLarge {
            width: width as u32,
            height: height as u32,
        })?;
    if dst.len() < needed {
        return Err(DecodeError::BufferTooSmall {
            needed,
            actual: dst.len(),
        });
    }
    Ok(())
}

/// A whole decoded image: packed ARGB pixels in row-major order with a row
/// stride equal to the width.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    info: ImageInfo,
    pixels: Vec<u32>,
}

impl DecodedImage {
    pub(crate) fn new(info: ImageInfo, pixels: Vec<u32>) -> Self {
        Self { info, pixels }
    }

    pub fn info(&self) -> ImageInfo {
        self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// The packed ARGB pixel data.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// Unpack to byte-order RGBA pixels.
    #[cfg(feature = "rgb")]
    pub fn to_rgba8(&self) -> Vec<rgb::RGBA8> {
        self.pixels
            .iter()
            .map(|&px| rgb::RGBA8 {
                r: (px >> 16) as u8,
                g: (px >> 8) as u8,
                b: px as u8,
                a: (px >> 24) as u8,
            })
            .collect()
    }

    /// View as an [`imgref::ImgVec`] of packed ARGB pixels.
    #[cfg(feature = "imgref")]
    pub fn into_imgvec(self) -> imgref::ImgVec<u32> {
        let (w, h) = (self.info.width as usize, self.info.height as usize);
        imgref::ImgVec::new(self.pixels, w, h)
    }
}
