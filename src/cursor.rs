use byteorder::{BigEndian, ByteOrder, LittleEndian};
use segvec::SegVec;

use crate::AssetError::*;
use crate::AssetResult;

/// Single read at a time, never more; bounds an attacker-controlled length
/// field against an up-front allocation before it has been checked against
/// what is actually left in the buffer.
const BOUNDED_READ_CHUNK: usize = 64;
static_assertions::const_assert!(BOUNDED_READ_CHUNK > 0);

/// A forward, random-access reader over a borrowed byte slice.
///
/// Holds only a borrow and a position; remaining length is always derived
/// as `buf.len() - pos`, never mirrored in a separate counter.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
	buf: &'a [u8],
	pos: usize,
}

impl<'a> ByteCursor<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Self { buf, pos: 0 }
	}


	pub fn position(&self) -> usize {
		self.pos
	}


	pub fn remaining(&self) -> usize {
		self.buf.len() - self.pos
	}


	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}


	pub fn seek_to(&mut self, pos: usize) -> AssetResult<()> {
		if pos > self.buf.len() {
			return Err(TruncatedInput);
		}
		self.pos = pos;
		Ok(())
	}


	/// Read `len` bytes, copying them out in bounded chunks so a corrupt
	/// length field cannot force one huge allocation before it is even
	/// known to fit in the remaining slice.
	pub fn read_bytes(&mut self, len: usize) -> AssetResult<Vec<u8>> {
		if len > self.remaining() {
			return Err(TruncatedInput);
		}

		let mut data: SegVec<u8> = SegVec::new();
		let mut taken = 0usize;

		while taken < len {
			let step = std::cmp::min(BOUNDED_READ_CHUNK, len - taken);
			data.extend(&self.buf[self.pos + taken..self.pos + taken + step]);
			taken += step;
		}

		self.pos += len;
		Ok(data.into_iter().collect())
	}


	/// Borrow `len` bytes without copying. Used where the caller hands the
	/// slice straight to another parser (e.g. a nested KTX/SCTX blob).
	pub fn peek_bytes(&self, len: usize) -> AssetResult<&'a [u8]> {
		if len > self.remaining() {
			return Err(TruncatedInput);
		}
		Ok(&self.buf[self.pos..self.pos + len])
	}


	pub fn skip(&mut self, len: usize) -> AssetResult<()> {
		if len > self.remaining() {
			return Err(TruncatedInput);
		}
		self.pos += len;
		Ok(())
	}


	pub fn read_u8(&mut self) -> AssetResult<u8> {
		let b = self.read_bytes(1)?;
		Ok(b[0])
	}


	pub fn read_u16_le(&mut self) -> AssetResult<u16> {
		let b = self.read_bytes(2)?;
		Ok(LittleEndian::read_u16(&b))
	}


	pub fn read_u16_be(&mut self) -> AssetResult<u16> {
		let b = self.read_bytes(2)?;
		Ok(BigEndian::read_u16(&b))
	}


	pub fn read_u32_le(&mut self) -> AssetResult<u32> {
		let b = self.read_bytes(4)?;
		Ok(LittleEndian::read_u32(&b))
	}


	pub fn read_u32_be(&mut self) -> AssetResult<u32> {
		let b = self.read_bytes(4)?;
		Ok(BigEndian::read_u32(&b))
	}


	pub fn read_i32_le(&mut self) -> AssetResult<i32> {
		let b = self.read_bytes(4)?;
		Ok(LittleEndian::read_i32(&b))
	}


	pub fn read_u64_le(&mut self) -> AssetResult<u64> {
		let b = self.read_bytes(8)?;
		Ok(LittleEndian::read_u64(&b))
	}


	/// One-byte unsigned length prefix, then that many bytes interpreted
	/// as UTF-8.
	pub fn read_length_prefixed_string(&mut self) -> AssetResult<String> {
		let len = self.read_u8()? as usize;
		let data = self.read_bytes(len)?;
		String::from_utf8(data).map_err(|_| CorruptedString)
	}


	/// Advance by `(-position) mod alignment`.
	pub fn align(&mut self, alignment: usize) -> AssetResult<()> {
		debug_assert!(alignment.is_power_of_two());
		let pad = self.pos.wrapping_neg() & (alignment - 1);
		self.skip(pad)
	}
}


#[test]
fn read_past_end_is_truncated() {
	let mut c = ByteCursor::new(&[1, 2, 3]);
	assert_eq!(c.read_bytes(4).unwrap_err(), TruncatedInput);
}


#[test]
fn remaining_is_derived_not_mirrored() {
	let mut c = ByteCursor::new(&[0u8; 10]);
	assert_eq!(c.remaining(), 10);
	c.read_bytes(3).unwrap();
	assert_eq!(c.remaining(), 7);
	c.skip(2).unwrap();
	assert_eq!(c.remaining(), 5);
}


#[test]
fn endian_explicit_reads() {
	let mut c = ByteCursor::new(&[0x01, 0x02, 0x03, 0x04]);
	assert_eq!(c.read_u16_le().unwrap(), 0x0201);
	let mut c = ByteCursor::new(&[0x01, 0x02, 0x03, 0x04]);
	assert_eq!(c.read_u16_be().unwrap(), 0x0102);
}


#[test]
fn align_advances_to_boundary() {
	let mut c = ByteCursor::new(&[0u8; 16]);
	c.skip(3).unwrap();
	c.align(4).unwrap();
	assert_eq!(c.position(), 4);
	c.align(4).unwrap();
	assert_eq!(c.position(), 4);
	c.skip(8).unwrap();
	c.align(16).unwrap();
	assert_eq!(c.position(), 16);
}


#[test]
fn length_prefixed_string_round_trip() {
	let mut bytes = vec![5u8];
	bytes.extend(b"hello");
	let mut c = ByteCursor::new(&bytes);
	assert_eq!(c.read_length_prefixed_string().unwrap(), "hello");
}
