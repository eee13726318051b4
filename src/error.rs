/// Errors from BMP/ICO and PNG decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported format variant: {0}")]
    Unsupported(String),

    /// The input ended before the pixel payload did. Destination pixels
    /// decoded so far are left in place and may be displayed.
    #[error("incomplete input, decoded output is partial")]
    Incomplete,

    /// The requested output alpha convention cannot be produced from this
    /// source. Only identity and premultiplied-over-unpremultiplied
    /// conversions are supported.
    #[error("cannot convert to the requested output format")]
    InvalidConversion,

    /// Output dimensions must exactly match the encoded image; the decoders
    /// never scale.
    #[error("output dimensions do not match the encoded image")]
    InvalidScale,

    /// A repeated decode was requested but the input could not be
    /// repositioned to the start of the pixel data.
    #[error("input could not be rewound for another decode")]
    CouldNotRewind,

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("destination buffer too small: need {needed} pixels, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },
}
