//! # Cursor Reader
//!
//! Bounds-checked big-endian reads at explicit offsets. A [`Reader`] never
//! tracks a position of its own; callers pass the offset of every field, which
//! lets nested decoders resume from wherever their parent left off.
//!
//! A reader may be a bounded view into a larger datagram (see
//! [`Reader::sub`]). Offsets passed to a reader are relative to the view, while
//! offsets reported in errors are absolute.

use bytes::Buf;

use crate::error::DecodeError;

/// Read-only view over a datagram (or a sub-range of one).
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buf: &'a [u8],
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, base: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Absolute offset of `offset` within the top-level datagram.
    #[inline]
    pub fn absolute(&self, offset: usize) -> usize {
        self.base.saturating_add(offset)
    }

    fn window(&self, offset: usize, width: usize) -> Result<&'a [u8], DecodeError> {
        match offset.checked_add(width) {
            Some(end) if end <= self.buf.len() => Ok(&self.buf[offset..end]),
            _ => Err(DecodeError::TruncatedBuffer {
                offset: self.absolute(offset),
                needed: width,
                available: self.buf.len().saturating_sub(offset),
            }),
        }
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8, DecodeError> {
        Ok(self.window(offset, 1)?[0])
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16, DecodeError> {
        Ok(self.window(offset, 2)?.get_u16())
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32, DecodeError> {
        Ok(self.window(offset, 4)?.get_u32())
    }

    pub fn u64_at(&self, offset: usize) -> Result<u64, DecodeError> {
        Ok(self.window(offset, 8)?.get_u64())
    }

    pub fn i64_at(&self, offset: usize) -> Result<i64, DecodeError> {
        Ok(self.window(offset, 8)?.get_i64())
    }

    /// Borrow `len` opaque bytes starting at `offset`.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], DecodeError> {
        self.window(offset, len)
    }

    /// A child reader confined to `[offset, offset + len)`.
    ///
    /// Reads through the child can never see bytes past its end, even when
    /// the parent buffer continues.
    pub fn sub(&self, offset: usize, len: usize) -> Result<Reader<'a>, DecodeError> {
        let buf = self.window(offset, len)?;
        Ok(Reader {
            buf,
            base: self.absolute(offset),
        })
    }

    /// Everything from `offset` to the end of the view.
    pub fn tail(&self, offset: usize) -> Result<&'a [u8], DecodeError> {
        self.window(offset, self.buf.len().saturating_sub(offset))
    }
}
