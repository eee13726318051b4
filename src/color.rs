//! Packed 32-bit ARGB pixels, alpha conventions, and the palette color table.
//!
//! Every decoder in this crate produces the same destination format: packed
//! `u32` values laid out as `a << 24 | r << 16 | g << 8 | b`.

use crate::DecodeError;

/// How the alpha channel of decoded pixels is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaType {
    /// Every pixel is fully opaque; the alpha byte is always 0xFF.
    Opaque,
    /// Color channels are stored premultiplied by alpha.
    Premul,
    /// Color channels are independent of alpha.
    Unpremul,
}

/// Dimensions and alpha convention of a decoded image.
///
/// The pixel format is always packed 32-bit ARGB; only the alpha convention
/// varies. Callers may request a different alpha type than the source's
/// natural one, subject to [`supports_conversion`](Self::supports_conversion).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub alpha_type: AlphaType,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32, alpha_type: AlphaType) -> Self {
        Self {
            width,
            height,
            alpha_type,
        }
    }

    /// Same dimensions, different alpha convention.
    pub fn with_alpha_type(self, alpha_type: AlphaType) -> Self {
        Self { alpha_type, ..self }
    }

    /// Whether a destination described by `self` can be produced from a
    /// source described by `src`: the alpha type must match, or the
    /// destination may premultiply an unpremultiplied source.
    pub fn supports_conversion(&self, src: &ImageInfo) -> bool {
        self.alpha_type == src.alpha_type
            || (self.alpha_type == AlphaType::Premul && src.alpha_type == AlphaType::Unpremul)
    }
}

/// Summary of one decoded row's alpha content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAlpha {
    /// Every pixel had alpha 0xFF.
    Opaque,
    /// Every pixel had alpha 0.
    Transparent,
    /// Mixed alpha values.
    Translucent,
}

impl RowAlpha {
    pub(crate) fn summarize(all_opaque: bool, all_transparent: bool) -> Self {
        if all_opaque {
            RowAlpha::Opaque
        } else if all_transparent {
            RowAlpha::Transparent
        } else {
            RowAlpha::Translucent
        }
    }
}

/// Pack one ARGB pixel.
#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// `v * a / 255` with rounding.
#[inline]
pub(crate) fn mul_alpha(v: u8, a: u8) -> u8 {
    (((u32::from(v) * u32::from(a) + 128) * 257) >> 16) as u8
}

/// Pack one ARGB pixel with the color channels premultiplied by alpha.
#[inline]
pub fn premultiply_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    if a == 0xFF {
        pack_argb(a, r, g, b)
    } else {
        pack_argb(a, mul_alpha(r, a), mul_alpha(g, a), mul_alpha(b, a))
    }
}

#[inline]
pub(crate) fn pack_for(alpha_type: AlphaType, a: u8, r: u8, g: u8, b: u8) -> u32 {
    match alpha_type {
        AlphaType::Premul => premultiply_argb(a, r, g, b),
        AlphaType::Opaque | AlphaType::Unpremul => pack_argb(a, r, g, b),
    }
}

const OPAQUE_BLACK: u32 = 0xFF00_0000;

/// Up to 256 precomputed destination colors for indexed sources.
///
/// Entries past the supplied count are opaque black so that out-of-range
/// indices from malformed inputs resolve to something harmless instead of
/// reading past the table.
#[derive(Clone)]
pub struct ColorTable {
    colors: Box<[u32; 256]>,
    count: usize,
}

impl ColorTable {
    /// Build from a raw BMP palette.
    ///
    /// Entries are B,G,R with an optional fourth byte. The fourth byte is
    /// only honored as alpha when the header carried an alpha mask and the
    /// destination is not opaque; its top mask byte gates the stored value.
    pub fn from_bmp(
        raw: &[u8],
        num_colors: usize,
        bytes_per_color: usize,
        alpha_mask: u32,
        dst_alpha: AlphaType,
    ) -> Self {
        debug_assert!(bytes_per_color == 3 || bytes_per_color == 4);
        debug_assert!(raw.len() >= num_colors * bytes_per_color);

        let mut colors = Box::new([OPAQUE_BLACK; 256]);
        let count = num_colors.min(256);
        for (i, entry) in raw.chunks_exact(bytes_per_color).take(count).enumerate() {
            let (b, g, r) = (entry[0], entry[1], entry[2]);
            let a = if dst_alpha == AlphaType::Opaque || bytes_per_color < 4 {
                0xFF
            } else {
                ((alpha_mask >> 24) as u8) & entry[3]
            };
            colors[i] = pack_for(dst_alpha, a, r, g, b);
        }
        Self { colors, count }
    }

    /// Build from a PNG `PLTE` chunk (R,G,B triplets) plus optional `tRNS`
    /// alpha bytes. Returns the table and whether any entry is not fully
    /// opaque.
    ///
    /// Some images carry pixel indices equal to the declared palette size.
    /// When the palette has fewer than 256 entries, the logical size grows
    /// by one and the extra slot duplicates the last color, so those indices
    /// resolve to a sane value.
    pub fn from_png_palette(
        plte: &[u8],
        trns: &[u8],
        dst_alpha: AlphaType,
    ) -> Result<(Self, bool), DecodeError> {
        let num = (plte.len() / 3).min(256);
        if num == 0 {
            return Err(DecodeError::InvalidInput("empty PNG palette".into()));
        }
        let num_trans = trns.len().min(num);

        let mut colors = Box::new([OPAQUE_BLACK; 256]);
        let mut has_alpha = false;
        for (i, entry) in plte.chunks_exact(3).take(num).enumerate() {
            let (r, g, b) = (entry[0], entry[1], entry[2]);
            let a = if i < num_trans { trns[i] } else { 0xFF };
            has_alpha |= a < 0xFF;
            colors[i] = pack_for(dst_alpha, a, r, g, b);
        }

        let mut count = num;
        if num < 256 {
            colors[num] = colors[num - 1];
            count += 1;
        }
        Ok((Self { colors, count }, has_alpha))
    }

    /// Number of logical entries.
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn color(&self, index: u8) -> u32 {
        self.colors[usize::from(index)]
    }
}
