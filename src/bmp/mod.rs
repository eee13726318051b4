//! BMP decoding, covering plain `.bmp` files and BMP payloads embedded in
//! ICO containers.
//!
//! All header versions are normalized into one decode plan at construction;
//! `get_pixels` then drives the standard, bit-masked, or RLE path against a
//! caller-provided ARGB destination.

mod decode;
mod header;
mod rle;

use crate::color::{AlphaType, ColorTable, ImageInfo};
use crate::decode::{check_dst_buffer, DecodeOptions};
use crate::reader::ByteReader;
use crate::DecodeError;

use self::header::{BmpHeader, Encoding};

/// Decoder for one BMP image.
///
/// Construction parses every header and fixes the decode plan; pixels are
/// produced by [`get_pixels`](Self::get_pixels). A decoder may be reused for
/// repeated decodes (the input is a slice and can always be repositioned),
/// including with different requested alpha conventions.
pub struct BmpDecoder<'a> {
    reader: ByteReader<'a>,
    header: BmpHeader,
    info: ImageInfo,
    pixel_start: usize,
}

impl<'a> BmpDecoder<'a> {
    /// Parse a standalone BMP file.
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_container(data, false)
    }

    /// Parse a BMP payload embedded in an ICO container. `data` must start
    /// at the info-header size field; ICO payloads carry no file header, and
    /// their stored height covers both the color plane and the trailing
    /// 1-bit AND plane.
    pub fn new_in_ico(data: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_container(data, true)
    }

    fn with_container(data: &'a [u8], is_ico: bool) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(data);
        let header = header::parse(&mut reader, is_ico)?;
        let info = ImageInfo::new(header.width, header.height, header.alpha_type);
        let pixel_start = reader.position();
        Ok(Self {
            reader,
            header,
            info,
            pixel_start,
        })
    }

    /// Dimensions and the source's natural alpha convention.
    pub fn info(&self) -> ImageInfo {
        self.info
    }

    /// Decode the whole image into `dst`.
    ///
    /// `dst_info` must match the source dimensions exactly and request a
    /// reachable alpha convention; `dst_stride` is in pixels and must be at
    /// least the width. On [`DecodeError::Incomplete`] the rows decoded
    /// before the input ran out are left in `dst`.
    pub fn get_pixels(
        &mut self,
        dst_info: &ImageInfo,
        dst: &mut [u32],
        dst_stride: usize,
        options: &DecodeOptions,
    ) -> Result<(), DecodeError> {
        if (dst_info.width, dst_info.height) != (self.info.width, self.info.height) {
            return Err(DecodeError::InvalidScale);
        }
        if !dst_info.supports_conversion(&self.info) {
            return Err(DecodeError::InvalidConversion);
        }
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        check_dst_buffer(dst, dst_stride, width, height)?;

        self.reader.rewind_to(self.pixel_start);
        let table = self.read_color_table(dst_info.alpha_type)?;

        match self.header.encoding {
            Encoding::Standard => decode::standard(
                &mut self.reader,
                &self.header,
                table,
                dst,
                dst_stride,
                dst_info.alpha_type,
            ),
            Encoding::Masked => decode::masked(
                &mut self.reader,
                &self.header,
                dst,
                dst_stride,
                dst_info.alpha_type,
            ),
            Encoding::Rle => rle::decode(
                &mut self.reader,
                &self.header,
                table.as_ref(),
                dst,
                dst_stride,
                options,
            ),
        }
    }

    /// Read the color table (for depths of 8 bits or less) and position the
    /// reader at the first pixel row.
    ///
    /// This happens per decode call: the table's premultiplication depends
    /// on the alpha convention the caller just requested.
    fn read_color_table(
        &mut self,
        dst_alpha: AlphaType,
    ) -> Result<Option<ColorTable>, DecodeError> {
        let h = &self.header;
        let mut color_bytes = 0usize;

        let table = if h.bits_per_pixel <= 8 {
            let max_colors = 1u32 << h.bits_per_pixel;
            let mut num_colors = h.num_colors;
            if num_colors == 0 || num_colors >= max_colors {
                num_colors = max_colors;
            }
            color_bytes = num_colors as usize * h.bytes_per_color as usize;
            let mut raw = vec![0u8; color_bytes];
            self.reader
                .read_exact(&mut raw)
                .map_err(|_| DecodeError::InvalidInput("truncated color table".into()))?;
            Some(ColorTable::from_bmp(
                &raw,
                num_colors as usize,
                h.bytes_per_color as usize,
                h.masks.alpha_mask(),
                dst_alpha,
            ))
        } else {
            None
        };

        // ICO payloads have no pixel-data offset; everything else skips from
        // the end of the color table to the offset the file header declared.
        if !h.is_ico {
            let padding = h.pixel_data_padding as usize;
            if padding < color_bytes {
                // Old OS/2 files sometimes declare a full-size table and then
                // point the pixel offset inside it; guessing the intended
                // table size is not worth it.
                return Err(DecodeError::InvalidInput(
                    "pixel data offset inside the color table".into(),
                ));
            }
            self.reader
                .skip(padding - color_bytes)
                .map_err(|_| DecodeError::InvalidInput("pixel data offset beyond input".into()))?;
        }

        Ok(table)
    }
}
