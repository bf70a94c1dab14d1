//! Pixel data compression schemes
//!
//! Four schemes are used across the image containers:
//!
//! | Scheme      | Layout                                                                  |
//! |-------------|-------------------------------------------------------------------------|
//! | rows        | `height` rows of `width` bytes, each followed by `stride - width` bytes |
//! | delta       | `u8 transparent, u8 opaque, opaque literal bytes`, repeated             |
//! | row RLE     | `height` row entries `{ u16 offset, u16 encoding }`, rows stored apart  |
//! | classic RLE | `code > 127`: next byte `code - 127` times, else `code + 1` literals    |
//!
//! Every decoder produces exactly the requested number of bytes or fails.

use df_bsa::RecordView;

use crate::error::{Error, Result};

/// Row table flag marking a run length encoded row
pub const ROW_RLE_FLAG: u16 = 0x8000;

/// Palette index written for transparent delta pixels
pub const TRANSPARENT_INDEX: u8 = 0;

const MAX_CLASSIC_RUN: usize = 128;

/// Copy `height` rows of `width` bytes, skipping `stride - width` bytes after every row but the last
pub fn copy_rows(view: &mut RecordView, width: usize, height: usize, stride: usize) -> Result<Vec<u8>> {
    if stride < width {
        return Err(Error::mismatch(format!(
            "row stride {stride} is narrower than width {width}"
        )));
    }

    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        pixels.extend_from_slice(view.read_bytes(width)?);
        if row + 1 < height {
            view.skip(stride - width)?;
        }
    }
    Ok(pixels)
}

/// Decode a transparent/opaque token stream into `width * height` pixels
pub fn decode_delta(view: &mut RecordView, width: usize, height: usize) -> Result<Vec<u8>> {
    let total = width * height;
    let mut pixels = Vec::with_capacity(total);

    while pixels.len() < total {
        let transparent = view.read_u8()? as usize;
        let opaque = view.read_u8()? as usize;

        if pixels.len() + transparent + opaque > total {
            return Err(Error::mismatch(format!(
                "delta run of {} pixels overflows {total} at {}",
                transparent + opaque,
                pixels.len()
            )));
        }

        pixels.resize(pixels.len() + transparent, TRANSPARENT_INDEX);
        pixels.extend_from_slice(view.read_bytes(opaque)?);
    }

    Ok(pixels)
}

/// Decode row RLE data whose row table sits at the view's cursor.
///
/// Row offsets are relative to `base`, a position within the same view. The cursor is left after
/// the row table.
pub fn decode_row_rle(
    view: &mut RecordView,
    base: usize,
    width: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let mut rows = Vec::with_capacity(height);
    for _ in 0..height {
        let offset = view.read_u16()? as usize;
        let encoding = view.read_u16()?;
        rows.push((offset, encoding));
    }

    let mut pixels = Vec::with_capacity(width * height);
    let mut row_view = view.clone();

    for (row, (offset, encoding)) in rows.into_iter().enumerate() {
        row_view.seek(base + offset)?;

        if encoding != ROW_RLE_FLAG {
            pixels.extend_from_slice(row_view.read_bytes(width)?);
            continue;
        }

        let row_end = pixels.len() + width;
        while pixels.len() < row_end {
            let count = row_view.read_i16()?;
            let run = count.unsigned_abs() as usize;

            if count == 0 {
                return Err(Error::mismatch(format!("zero length token in row {row}")));
            }
            if pixels.len() + run > row_end {
                return Err(Error::mismatch(format!(
                    "run of {run} overflows row {row} of width {width}"
                )));
            }

            if count < 0 {
                let value = row_view.read_u8()?;
                pixels.resize(pixels.len() + run, value);
            } else {
                pixels.extend_from_slice(row_view.read_bytes(run)?);
            }
        }
    }

    Ok(pixels)
}

/// Decode classic RLE until `len` bytes are produced
pub fn decode_classic_rle(view: &mut RecordView, len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len);

    while out.len() < len {
        let code = view.read_u8()? as usize;

        if code > 127 {
            let run = code - 127;
            if out.len() + run > len {
                return Err(Error::mismatch(format!(
                    "run of {run} overflows {len} at {}",
                    out.len()
                )));
            }
            let value = view.read_u8()?;
            out.resize(out.len() + run, value);
        } else {
            let run = code + 1;
            if out.len() + run > len {
                return Err(Error::mismatch(format!(
                    "{run} literals overflow {len} at {}",
                    out.len()
                )));
            }
            out.extend_from_slice(view.read_bytes(run)?);
        }
    }

    Ok(out)
}

/// Encode bytes so that [`decode_classic_rle`] reproduces them
pub fn encode_classic_rle(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_CLASSIC_RUN + 1);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let run = data[i..]
            .iter()
            .take(MAX_CLASSIC_RUN)
            .take_while(|&&b| b == data[i])
            .count();

        if run >= 2 {
            flush_literals(&mut out, &data[literal_start..i]);
            out.push((127 + run) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    flush_literals(&mut out, &data[literal_start..]);

    out
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_CLASSIC_RUN) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}
