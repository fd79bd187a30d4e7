use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::error::{Error, Result};

/// Size of the little-endian `i64` record count at the start of a series file.
pub const HEADER_BYTES: usize = 8;
/// Size of one `(i64 timestamp, f32 price)` record.
pub const RECORD_BYTES: usize = 12;

/// A single recorded price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub price: f32,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Local.timestamp_opt(self.timestamp, 0).single() {
            Some(tm) => write!(
                f,
                "{} | {:.2}",
                tm.format("%Y-%m-%d %H:%M:%S"),
                self.price
            ),
            None => write!(f, "@{} | {:.2}", self.timestamp, self.price),
        }
    }
}

/// Immutable, offset-addressed sequence of observations.
///
/// Timestamps and prices are held in parallel vectors so that any window of
/// prices is a contiguous `&[f32]`. A `Series` is built once (from a file or
/// in memory) and only ever read afterwards; share it by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    timestamps: Vec<i64>,
    prices: Vec<f32>,
}

impl Series {
    /// Build a series from parallel timestamp and price vectors.
    pub fn from_parts(timestamps: Vec<i64>, prices: Vec<f32>) -> Result<Self> {
        if timestamps.len() != prices.len() {
            return Err(Error::InvalidArgument(format!(
                "{} timestamps but {} prices",
                timestamps.len(),
                prices.len()
            )));
        }
        Ok(Self { timestamps, prices })
    }

    /// Load a series file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let series = Self::read_from(BufReader::new(file))?;
        tracing::debug!(path = %path.display(), records = series.len(), "series loaded");
        Ok(series)
    }

    /// Parse the binary record stream.
    ///
    /// Layout: `i64` LE record count `N`, then `N` records of `i64` LE
    /// timestamp followed by `f32` LE price. The stream must hold exactly
    /// `8 + 12 * N` bytes; anything else is a [`Error::Format`] and no series
    /// is produced.
    pub fn read_from(mut reader: impl Read) -> Result<Self> {
        let mut header = [0u8; HEADER_BYTES];
        reader.read_exact(&mut header).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::Format("cannot read record count header".into()),
            _ => Error::Io(e),
        })?;
        let declared = i64::from_le_bytes(header);
        let n = usize::try_from(declared)
            .map_err(|_| Error::Format(format!("negative record count {declared}")))?;
        let expected = n
            .checked_mul(RECORD_BYTES)
            .ok_or_else(|| Error::Format(format!("record count {n} is too large")))?;

        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        if body.len() < expected {
            return Err(Error::Format(format!(
                "truncated: {n} records declared, {} complete records present",
                body.len() / RECORD_BYTES
            )));
        }
        if body.len() > expected {
            return Err(Error::Format(format!(
                "{} trailing bytes after {n} records",
                body.len() - expected
            )));
        }

        let mut timestamps = Vec::with_capacity(n);
        let mut prices = Vec::with_capacity(n);
        for rec in body.chunks_exact(RECORD_BYTES) {
            let (ts, px) = rec.split_at(8);
            // chunks_exact guarantees both halves have the exact width
            let mut ts_bytes = [0u8; 8];
            ts_bytes.copy_from_slice(ts);
            let mut px_bytes = [0u8; 4];
            px_bytes.copy_from_slice(px);
            timestamps.push(i64::from_le_bytes(ts_bytes));
            prices.push(f32::from_le_bytes(px_bytes));
        }

        Ok(Self { timestamps, prices })
    }

    /// Write the series in the same layout [`read_from`](Self::read_from) accepts.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(&(self.len() as i64).to_le_bytes())?;
        for (ts, px) in self.timestamps.iter().zip(&self.prices) {
            writer.write_all(&ts.to_le_bytes())?;
            writer.write_all(&px.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the series to a file, replacing any existing content.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// All prices, in order.
    pub fn prices(&self) -> &[f32] {
        &self.prices
    }

    /// Prices in `[offset, offset + length)`.
    pub fn slice(&self, offset: usize, length: usize) -> Result<&[f32]> {
        match offset.checked_add(length) {
            Some(end) if end <= self.len() => Ok(&self.prices[offset..end]),
            _ => Err(Error::range(offset, length, self.len())),
        }
    }

    pub fn timestamp_at(&self, offset: usize) -> Result<i64> {
        self.timestamps
            .get(offset)
            .copied()
            .ok_or_else(|| Error::range(offset, 1, self.len()))
    }

    pub fn observation(&self, offset: usize) -> Result<Observation> {
        Ok(Observation {
            timestamp: self.timestamp_at(offset)?,
            price: self.prices[offset],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Observation> + '_ {
        self.timestamps
            .iter()
            .zip(&self.prices)
            .map(|(&timestamp, &price)| Observation { timestamp, price })
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let (timestamps, prices) = iter
            .into_iter()
            .map(|o| (o.timestamp, o.price))
            .unzip();
        Self { timestamps, prices }
    }
}
