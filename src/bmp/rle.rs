//! Run-length decoding for 4-, 8-, and 24-bit BMP payloads.
//!
//! The stream is a sequence of `(flag, task)` byte pairs: a zero flag
//! introduces an escape (end of line, end of file, cursor delta, or a run of
//! literal pixels), a non-zero flag repeats one color. The interpreter keeps
//! an explicit `(x, y)` cursor; rows only advance through escapes, so pixels
//! skipped by deltas keep the destination's zero fill.

use log::warn;

use crate::bmp::header::{BmpHeader, RowOrder};
use crate::color::{pack_argb, ColorTable};
use crate::decode::DecodeOptions;
use crate::reader::ByteReader;
use crate::DecodeError;

const ESCAPE: u8 = 0;
const END_OF_LINE: u8 = 0;
const END_OF_FILE: u8 = 1;
const DELTA: u8 = 2;

struct RleCursor<'t> {
    height: usize,
    stride: usize,
    bottom_up: bool,
    table: Option<&'t ColorTable>,
    x: usize,
    y: usize,
}

impl RleCursor<'_> {
    /// Destination offset of the current cursor, honoring row order.
    fn dst_index(&self) -> usize {
        let row = if self.bottom_up {
            self.height - 1 - self.y
        } else {
            self.y
        };
        row * self.stride + self.x
    }

    fn set_indexed(&mut self, dst: &mut [u32], index: u8) {
        let table = self.table.expect("indexed RLE without a color table");
        dst[self.dst_index()] = table.color(index);
        self.x += 1;
    }

    fn set_bgr(&mut self, dst: &mut [u32], blue: u8, green: u8, red: u8) {
        dst[self.dst_index()] = pack_argb(0xFF, red, green, blue);
        self.x += 1;
    }
}

pub(crate) fn decode(
    reader: &mut ByteReader<'_>,
    header: &BmpHeader,
    table: Option<&ColorTable>,
    dst: &mut [u32],
    dst_stride: usize,
    options: &DecodeOptions,
) -> Result<(), DecodeError> {
    let width = header.width as usize;
    let height = header.height as usize;
    let bpp = header.bits_per_pixel;

    if bpp != 24 && table.is_none() {
        return Err(DecodeError::InvalidInput(
            "indexed RLE without a color table".into(),
        ));
    }

    // The header's payload size can overstate what the stream holds; a short
    // payload is decodable up to where it ends.
    let mut buf = vec![0u8; (header.rle_bytes as usize).min(reader.remaining())];
    let total = reader.read(&mut buf);
    if total < header.rle_bytes as usize {
        warn!("RLE payload shorter than header declared");
    }
    if total == 0 {
        return Err(DecodeError::InvalidInput("no RLE pixel data".into()));
    }

    // Deltas and early EOF skip pixels; those must read back as transparent
    // zeros rather than stale memory.
    if !options.zero_initialized {
        for row in dst.chunks_mut(dst_stride.max(1)).take(height) {
            let n = width.min(row.len());
            row[..n].fill(0);
        }
    }

    let mut cursor = RleCursor {
        height,
        stride: dst_stride,
        bottom_up: header.row_order == RowOrder::BottomUp,
        table,
        x: 0,
        y: 0,
    };
    let mut pos = 0usize;

    loop {
        // Every command is at least a two-byte pair.
        if total - pos < 2 {
            warn!("RLE stream ended without an end-of-file code");
            return Err(DecodeError::Incomplete);
        }
        let flag = buf[pos];
        let task = buf[pos + 1];
        pos += 2;

        // Once the cursor walks off the bottom, only an EOF code is valid.
        if cursor.y >= height && !(flag == ESCAPE && task == END_OF_FILE) {
            warn!("RLE command past the last row");
            return Err(DecodeError::Incomplete);
        }

        if flag == ESCAPE {
            match task {
                END_OF_LINE => {
                    cursor.x = 0;
                    cursor.y += 1;
                }
                END_OF_FILE => return Ok(()),
                DELTA => {
                    if total - pos < 2 {
                        warn!("RLE delta truncated");
                        return Err(DecodeError::Incomplete);
                    }
                    let dx = usize::from(buf[pos]);
                    let dy = usize::from(buf[pos + 1]);
                    pos += 2;
                    cursor.x += dx;
                    cursor.y += dy;
                    if cursor.x > width || cursor.y > height {
                        warn!("RLE delta moved outside the image");
                        return Err(DecodeError::Incomplete);
                    }
                }
                count => {
                    // Absolute mode: `count` literal pixels, padded to a
                    // 16-bit boundary.
                    let num = usize::from(count);
                    let row_bytes = (num * usize::from(bpp) + 7) / 8;
                    if cursor.x + num > width || total - pos < (row_bytes + 1) & !1 {
                        warn!("RLE absolute run truncated or too wide");
                        return Err(DecodeError::Incomplete);
                    }
                    match bpp {
                        4 => {
                            let mut val = 0u8;
                            for i in 0..num {
                                let index = if i & 1 == 0 {
                                    val = buf[pos];
                                    pos += 1;
                                    val >> 4
                                } else {
                                    val & 0xF
                                };
                                cursor.set_indexed(dst, index);
                            }
                        }
                        8 => {
                            for _ in 0..num {
                                cursor.set_indexed(dst, buf[pos]);
                                pos += 1;
                            }
                        }
                        24 => {
                            for _ in 0..num {
                                cursor.set_bgr(dst, buf[pos], buf[pos + 1], buf[pos + 2]);
                                pos += 3;
                            }
                        }
                        _ => {
                            return Err(DecodeError::InvalidInput(format!(
                                "RLE with {bpp} bits per pixel"
                            )));
                        }
                    }
                    if row_bytes & 1 == 1 {
                        pos += 1;
                    }
                }
            }
        } else {
            // A run: repeat one color `flag` times, clipped to the row edge.
            let end_x = (cursor.x + usize::from(flag)).min(width);

            if bpp == 24 {
                // The task byte is already the run color's blue component.
                if total - pos < 2 {
                    warn!("RLE24 run color truncated");
                    return Err(DecodeError::Incomplete);
                }
                let blue = task;
                let green = buf[pos];
                let red = buf[pos + 1];
                pos += 2;
                while cursor.x < end_x {
                    cursor.set_bgr(dst, blue, green, red);
                }
            } else {
                // RLE8 repeats one index; RLE4 alternates the two nibbles.
                let indices = if bpp == 4 {
                    [task >> 4, task & 0xF]
                } else {
                    [task, task]
                };
                let mut which = 0;
                while cursor.x < end_x {
                    cursor.set_indexed(dst, indices[which]);
                    which ^= 1;
                }
            }
        }
    }
}
