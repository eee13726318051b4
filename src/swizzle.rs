//! Per-scanline conversion from source packings to packed 32-bit ARGB.
//!
//! The swizzler knows packing strides; the mask engine knows bit layouts.
//! Indexed, byte-packed, and bit-masked sources all share the same
//! destination writer, and every row reports an alpha summary so decoders
//! can infer whole-image opacity.

use crate::color::{mul_alpha, pack_argb, AlphaType, ColorTable, RowAlpha};
use crate::mask::Masks;
use crate::reader::get_u16_le;
use crate::DecodeError;

/// Recognized source row packings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrcFormat {
    /// Palette indices, 1 bit per pixel, most significant bit first.
    Index1,
    /// Palette indices, 2 bits per pixel.
    Index2,
    /// Palette indices, 4 bits per pixel, high nibble first.
    Index4,
    /// Palette indices, one byte per pixel.
    Index8,
    /// One gray byte per pixel, replicated to R, G, and B.
    Gray,
    /// Gray byte followed by an alpha byte.
    GrayAlpha,
    /// R,G,B bytes, tightly packed.
    Rgb,
    /// R,G,B followed by a padding byte.
    Rgbx,
    /// R,G,B,A bytes.
    Rgba,
    /// B,G,R bytes, tightly packed.
    Bgr,
    /// B,G,R followed by a padding byte.
    Bgrx,
    /// B,G,R,A bytes.
    Bgra,
    /// Little-endian 16-bit samples decomposed by the mask engine.
    Masked16,
    /// Little-endian 32-bit samples decomposed by the mask engine.
    Masked32,
}

impl SrcFormat {
    pub fn bits_per_pixel(self) -> usize {
        match self {
            SrcFormat::Index1 => 1,
            SrcFormat::Index2 => 2,
            SrcFormat::Index4 => 4,
            SrcFormat::Index8 | SrcFormat::Gray => 8,
            SrcFormat::GrayAlpha | SrcFormat::Masked16 => 16,
            SrcFormat::Rgb | SrcFormat::Bgr => 24,
            SrcFormat::Rgbx | SrcFormat::Rgba | SrcFormat::Bgrx | SrcFormat::Bgra => 32,
            SrcFormat::Masked32 => 32,
        }
    }

    /// Tightly packed byte length of one source row.
    pub fn row_bytes(self, width: usize) -> usize {
        (width * self.bits_per_pixel() + 7) / 8
    }

    fn is_indexed(self) -> bool {
        matches!(
            self,
            SrcFormat::Index1 | SrcFormat::Index2 | SrcFormat::Index4 | SrcFormat::Index8
        )
    }

    fn is_masked(self) -> bool {
        matches!(self, SrcFormat::Masked16 | SrcFormat::Masked32)
    }
}

/// Converts source rows into destination ARGB rows.
///
/// Owns the color table and mask engine it was configured with; the caller
/// supplies the destination row slice, so no pointer or stride state lives
/// here.
pub struct Swizzler {
    format: SrcFormat,
    width: usize,
    dst_alpha: AlphaType,
    table: Option<ColorTable>,
    masks: Option<Masks>,
}

impl Swizzler {
    pub fn new(
        format: SrcFormat,
        width: usize,
        dst_alpha: AlphaType,
        table: Option<ColorTable>,
        masks: Option<Masks>,
    ) -> Result<Self, DecodeError> {
        if format.is_indexed() && table.is_none() {
            return Err(DecodeError::InvalidInput(
                "indexed source requires a color table".into(),
            ));
        }
        if format.is_masked() && masks.is_none() {
            return Err(DecodeError::InvalidInput(
                "bit-masked source requires channel masks".into(),
            ));
        }
        Ok(Self {
            format,
            width,
            dst_alpha,
            table,
            masks,
        })
    }

    pub fn src_row_bytes(&self) -> usize {
        self.format.row_bytes(self.width)
    }

    /// Convert one source row into `dst`, which must hold at least `width`
    /// pixels. Never reads source bits past the final pixel and never writes
    /// past `width`.
    pub fn swizzle_row(&self, src: &[u8], dst: &mut [u32]) -> RowAlpha {
        let w = self.width;
        let dst = &mut dst[..w];
        if w == 0 {
            return RowAlpha::Opaque;
        }

        let premul = self.dst_alpha == AlphaType::Premul;
        let mut all_opaque = true;
        let mut all_transparent = true;
        let mut track = |a: u8| {
            all_opaque &= a == 0xFF;
            all_transparent &= a == 0;
        };

        match self.format {
            SrcFormat::Index1 => {
                let table = self.table.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let index = (src[x >> 3] >> (7 - (x & 7))) & 0x1;
                    let color = table.color(index);
                    track((color >> 24) as u8);
                    *out = color;
                }
            }
            SrcFormat::Index2 => {
                let table = self.table.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let index = (src[x >> 2] >> (6 - 2 * (x & 3))) & 0x3;
                    let color = table.color(index);
                    track((color >> 24) as u8);
                    *out = color;
                }
            }
            SrcFormat::Index4 => {
                let table = self.table.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let index = (src[x >> 1] >> (4 - 4 * (x & 1))) & 0xF;
                    let color = table.color(index);
                    track((color >> 24) as u8);
                    *out = color;
                }
            }
            SrcFormat::Index8 => {
                let table = self.table.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let color = table.color(src[x]);
                    track((color >> 24) as u8);
                    *out = color;
                }
            }
            SrcFormat::Gray => {
                for (px, out) in src.iter().take(w).zip(dst.iter_mut()) {
                    *out = pack_argb(0xFF, *px, *px, *px);
                }
                return RowAlpha::Opaque;
            }
            SrcFormat::GrayAlpha => {
                for (px, out) in src.chunks_exact(2).take(w).zip(dst.iter_mut()) {
                    let (g, a) = (px[0], px[1]);
                    track(a);
                    *out = pack_alpha_color(premul, a, g, g, g);
                }
            }
            SrcFormat::Rgb => {
                for (px, out) in src.chunks_exact(3).take(w).zip(dst.iter_mut()) {
                    *out = pack_argb(0xFF, px[0], px[1], px[2]);
                }
                return RowAlpha::Opaque;
            }
            SrcFormat::Rgbx => {
                for (px, out) in src.chunks_exact(4).take(w).zip(dst.iter_mut()) {
                    *out = pack_argb(0xFF, px[0], px[1], px[2]);
                }
                return RowAlpha::Opaque;
            }
            SrcFormat::Rgba => {
                for (px, out) in src.chunks_exact(4).take(w).zip(dst.iter_mut()) {
                    let a = px[3];
                    track(a);
                    *out = pack_alpha_color(premul, a, px[0], px[1], px[2]);
                }
            }
            SrcFormat::Bgr => {
                for (px, out) in src.chunks_exact(3).take(w).zip(dst.iter_mut()) {
                    *out = pack_argb(0xFF, px[2], px[1], px[0]);
                }
                return RowAlpha::Opaque;
            }
            SrcFormat::Bgrx => {
                for (px, out) in src.chunks_exact(4).take(w).zip(dst.iter_mut()) {
                    *out = pack_argb(0xFF, px[2], px[1], px[0]);
                }
                return RowAlpha::Opaque;
            }
            SrcFormat::Bgra => {
                for (px, out) in src.chunks_exact(4).take(w).zip(dst.iter_mut()) {
                    let a = px[3];
                    track(a);
                    *out = pack_alpha_color(premul, a, px[2], px[1], px[0]);
                }
            }
            SrcFormat::Masked16 => {
                let masks = self.masks.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let sample = u32::from(get_u16_le(src, x * 2));
                    let a = self.masked_alpha(masks, sample);
                    track(a);
                    *out = pack_alpha_color(
                        premul,
                        a,
                        masks.red(sample),
                        masks.green(sample),
                        masks.blue(sample),
                    );
                }
            }
            SrcFormat::Masked32 => {
                let masks = self.masks.as_ref().unwrap();
                for (x, out) in dst.iter_mut().enumerate() {
                    let sample = crate::reader::get_u32_le(src, x * 4);
                    let a = self.masked_alpha(masks, sample);
                    track(a);
                    *out = pack_alpha_color(
                        premul,
                        a,
                        masks.red(sample),
                        masks.green(sample),
                        masks.blue(sample),
                    );
                }
            }
        }

        RowAlpha::summarize(all_opaque, all_transparent)
    }

    /// Masked sources honor the destination alpha convention: an opaque
    /// destination ignores the source alpha channel entirely. This is what
    /// the transparency-rescue pass relies on.
    #[inline]
    fn masked_alpha(&self, masks: &Masks, sample: u32) -> u8 {
        if self.dst_alpha == AlphaType::Opaque {
            0xFF
        } else {
            masks.alpha(sample)
        }
    }
}

#[inline]
fn pack_alpha_color(premul: bool, a: u8, r: u8, g: u8, b: u8) -> u32 {
    if premul && a != 0xFF {
        pack_argb(a, mul_alpha(r, a), mul_alpha(g, a), mul_alpha(b, a))
    } else {
        pack_argb(a, r, g, b)
    }
}
