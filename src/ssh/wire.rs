//! SSH wire primitives (RFC 4251 §5): `uint32`, `string` and `mpint`.

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },
    #[error("negative mpint")]
    NegativeMpint,
    #[error("mpint has a redundant leading zero byte")]
    NonMinimalMpint,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("{0} trailing bytes")]
    TrailingBytes(usize),
}

pub type WireResult<T> = std::result::Result<T, WireError>;

/// Cursor over an SSH-encoded buffer.
pub struct SshReader<'a> {
    buf: &'a [u8],
}

impl<'a> SshReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn read_raw(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if self.buf.len() < len {
            return Err(WireError::Truncated {
                needed: len,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub fn read_u32(&mut self) -> WireResult<u32> {
        let bytes = self.read_raw(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_string(&mut self) -> WireResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.read_raw(len)
    }

    pub fn read_str(&mut self) -> WireResult<&'a str> {
        std::str::from_utf8(self.read_string()?).map_err(|_| WireError::InvalidUtf8)
    }

    /// Non-negative mpint, minimally encoded.
    pub fn read_mpint(&mut self) -> WireResult<BigUint> {
        let bytes = self.read_string()?;
        match bytes {
            [] => Ok(BigUint::zero()),
            [first, ..] if first & 0x80 != 0 => Err(WireError::NegativeMpint),
            [0, second, ..] if second & 0x80 == 0 => Err(WireError::NonMinimalMpint),
            [0] => Err(WireError::NonMinimalMpint),
            _ => Ok(BigUint::from_bytes_be(bytes)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn finish(self) -> WireResult<()> {
        match self.buf.len() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }
}

#[derive(Default)]
pub struct SshWriter {
    buf: Vec<u8>,
}

impl SshWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write_raw(&value.to_be_bytes())
    }

    pub fn write_string(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u32(bytes.len() as u32).write_raw(bytes)
    }

    pub fn write_mpint(&mut self, value: &BigUint) -> &mut Self {
        if value.is_zero() {
            return self.write_string(&[]);
        }
        let mut bytes = value.to_bytes_be();
        if bytes[0] & 0x80 != 0 {
            bytes.insert(0, 0);
        }
        self.write_string(&bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
