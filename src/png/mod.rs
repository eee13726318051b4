//! PNG decoding as a thin driver around the `png` crate.
//!
//! The engine owns chunk walking, inflate, unfiltering, and deinterlacing.
//! This wrapper configures its channel expansions, keeps palette handling on
//! this side (the shared color table applies the out-of-range-index
//! workaround), and feeds engine rows through the swizzler into packed ARGB.

use ::png::{BitDepth, ColorType, Decoder, DecodingError, Reader, Transformations};

use crate::color::{AlphaType, ColorTable, ImageInfo, RowAlpha};
use crate::decode::{check_dst_buffer, DecodeOptions};
use crate::swizzle::{SrcFormat, Swizzler};
use crate::DecodeError;

fn map_engine_error(err: DecodingError) -> DecodeError {
    match err {
        DecodingError::IoError(_) => DecodeError::Incomplete,
        DecodingError::LimitsExceeded => {
            DecodeError::LimitExceeded("png decoding limits exceeded".into())
        }
        other => DecodeError::InvalidInput(format!("png: {other}")),
    }
}

fn open_reader(
    data: &[u8],
    transformations: Transformations,
) -> Result<Reader<&[u8]>, DecodeError> {
    let mut decoder = Decoder::new(data);
    decoder.set_transformations(transformations);
    decoder.read_info().map_err(map_engine_error)
}

/// Decoder for one PNG image.
pub struct PngDecoder<'a> {
    data: &'a [u8],
    reader: Reader<&'a [u8]>,
    transformations: Transformations,
    info: ImageInfo,
    src_format: SrcFormat,
    interlaced: bool,
    really_has_alpha: bool,
    started: bool,
}

impl<'a> PngDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        // A first pass reads the header chunks untransformed; palette images
        // keep their indices (palette lookup happens in this crate), all
        // others get engine-side expansion to 8-bit samples.
        let reader = open_reader(data, Transformations::IDENTITY)?;
        let header = reader.info();
        let (width, height) = (header.width, header.height);
        let color_type = header.color_type;
        let trns = header.trns.as_deref().is_some_and(|t| !t.is_empty());

        if u64::from(width) * u64::from(height) > (i32::MAX as u64) / 4 {
            return Err(DecodeError::DimensionsTooLarge { width, height });
        }

        let transformations = if color_type == ColorType::Indexed {
            Transformations::IDENTITY
        } else {
            Transformations::STRIP_16 | Transformations::EXPAND
        };
        let reader = if color_type == ColorType::Indexed {
            reader
        } else {
            open_reader(data, transformations)?
        };

        let alpha_type = match color_type {
            ColorType::Rgba | ColorType::GrayscaleAlpha => AlphaType::Unpremul,
            ColorType::Indexed | ColorType::Rgb | ColorType::Grayscale => {
                if trns {
                    AlphaType::Unpremul
                } else {
                    AlphaType::Opaque
                }
            }
        };

        let src_format = match reader.output_color_type() {
            (ColorType::Indexed, BitDepth::One) => SrcFormat::Index1,
            (ColorType::Indexed, BitDepth::Two) => SrcFormat::Index2,
            (ColorType::Indexed, BitDepth::Four) => SrcFormat::Index4,
            (ColorType::Indexed, BitDepth::Eight) => SrcFormat::Index8,
            (ColorType::Grayscale, BitDepth::Eight) => SrcFormat::Gray,
            (ColorType::GrayscaleAlpha, BitDepth::Eight) => SrcFormat::GrayAlpha,
            (ColorType::Rgb, BitDepth::Eight) => SrcFormat::Rgb,
            (ColorType::Rgba, BitDepth::Eight) => SrcFormat::Rgba,
            (color, depth) => {
                return Err(DecodeError::Unsupported(format!(
                    "PNG sample layout {color:?} at {depth:?} bits"
                )));
            }
        };

        let interlaced = reader.info().interlaced;
        Ok(Self {
            data,
            reader,
            transformations,
            info: ImageInfo::new(width, height, alpha_type),
            src_format,
            interlaced,
            really_has_alpha: false,
            started: false,
        })
    }

    /// Dimensions and the source's natural alpha convention.
    pub fn info(&self) -> ImageInfo {
        self.info
    }

    /// Whether any decoded row actually contained non-opaque alpha. Only
    /// meaningful after a decode.
    pub fn really_has_alpha(&self) -> bool {
        self.really_has_alpha
    }

    /// Decode the whole image into `dst` (`dst_stride` in pixels).
    ///
    /// Interlaced images are accumulated in full by the engine and then
    /// swizzled row by row; everything else streams one row at a time.
    pub fn get_pixels(
        &mut self,
        dst_info: &ImageInfo,
        dst: &mut [u32],
        dst_stride: usize,
        _options: &DecodeOptions,
    ) -> Result<(), DecodeError> {
        let swizzler = self.prepare(dst_info)?;
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        check_dst_buffer(dst, dst_stride, width, height)?;

        if self.interlaced {
            let mut raw = vec![0u8; self.reader.output_buffer_size()];
            self.reader
                .next_frame(&mut raw)
                .map_err(map_engine_error)?;
            let line = self.reader.output_line_size(self.info.width);
            for (y, src_row) in raw.chunks_exact(line).take(height).enumerate() {
                let alpha =
                    swizzler.swizzle_row(src_row, &mut dst[y * dst_stride..y * dst_stride + width]);
                self.really_has_alpha |= alpha != RowAlpha::Opaque;
            }
        } else {
            for y in 0..height {
                let row = match self.reader.next_row() {
                    Ok(Some(row)) => row,
                    Ok(None) => return Err(DecodeError::Incomplete),
                    Err(err) => return Err(map_engine_error(err)),
                };
                let alpha = swizzler
                    .swizzle_row(row.data(), &mut dst[y * dst_stride..y * dst_stride + width]);
                self.really_has_alpha |= alpha != RowAlpha::Opaque;
            }
        }

        // Drain trailing chunks; errors after the last row are not fatal.
        let _ = self.reader.finish();
        Ok(())
    }

    /// Scanline-by-scanline decoding; non-interlaced images only.
    pub fn scanline_decoder(
        &mut self,
        dst_info: &ImageInfo,
    ) -> Result<PngScanlineDecoder<'_, 'a>, DecodeError> {
        if self.interlaced {
            return Err(DecodeError::Unsupported(
                "scanline decoding of interlaced PNG".into(),
            ));
        }
        let swizzler = self.prepare(dst_info)?;
        Ok(PngScanlineDecoder {
            decoder: self,
            swizzler,
            has_alpha: false,
        })
    }

    /// Shared entry checks: identity dimensions, reachable alpha convention,
    /// a rewound engine, and a configured swizzler.
    fn prepare(&mut self, dst_info: &ImageInfo) -> Result<Swizzler, DecodeError> {
        if (dst_info.width, dst_info.height) != (self.info.width, self.info.height) {
            return Err(DecodeError::InvalidScale);
        }
        if !dst_info.supports_conversion(&self.info) {
            return Err(DecodeError::InvalidConversion);
        }
        if self.started {
            // Restart the engine from the slice for a repeated decode.
            self.reader = open_reader(self.data, self.transformations)?;
        }
        self.started = true;

        let table = if matches!(
            self.src_format,
            SrcFormat::Index1 | SrcFormat::Index2 | SrcFormat::Index4 | SrcFormat::Index8
        ) {
            let header = self.reader.info();
            let plte = header.palette.as_deref().ok_or_else(|| {
                DecodeError::InvalidInput("indexed PNG without a palette".into())
            })?;
            let trns = header.trns.as_deref().unwrap_or(&[]);
            let (table, has_alpha) =
                ColorTable::from_png_palette(plte, trns, dst_info.alpha_type)?;
            self.really_has_alpha |= has_alpha;
            Some(table)
        } else {
            None
        };

        Swizzler::new(
            self.src_format,
            self.info.width as usize,
            dst_info.alpha_type,
            table,
            None,
        )
    }
}

/// Incremental row access over a non-interlaced PNG.
pub struct PngScanlineDecoder<'d, 'a> {
    decoder: &'d mut PngDecoder<'a>,
    swizzler: Swizzler,
    has_alpha: bool,
}

impl PngScanlineDecoder<'_, '_> {
    /// Decode the next `count` rows into `dst` (`dst_stride` in pixels).
    pub fn get_scanlines(
        &mut self,
        dst: &mut [u32],
        count: usize,
        dst_stride: usize,
    ) -> Result<(), DecodeError> {
        let width = self.decoder.info.width as usize;
        check_dst_buffer(dst, dst_stride, width, count)?;
        for y in 0..count {
            let row = match self.decoder.reader.next_row() {
                Ok(Some(row)) => row,
                Ok(None) => return Err(DecodeError::Incomplete),
                Err(err) => return Err(map_engine_error(err)),
            };
            let alpha = self
                .swizzler
                .swizzle_row(row.data(), &mut dst[y * dst_stride..y * dst_stride + width]);
            self.has_alpha |= alpha != RowAlpha::Opaque;
        }
        Ok(())
    }

    /// Read and discard the next `count` rows.
    pub fn skip_scanlines(&mut self, count: usize) -> Result<(), DecodeError> {
        for _ in 0..count {
            match self.decoder.reader.next_row() {
                Ok(Some(_)) => {}
                Ok(None) => return Err(DecodeError::Incomplete),
                Err(err) => return Err(map_engine_error(err)),
            }
        }
        Ok(())
    }

    /// Whether any decoded row contained non-opaque alpha.
    pub fn really_has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Drain the engine's trailing chunks and fold the alpha signal back
    /// into the decoder.
    pub fn finish(self) {
        self.decoder.really_has_alpha |= self.has_alpha;
        let _ = self.decoder.reader.finish();
    }
}
