use md5::{Digest, Md5};

use crate::compress::{DecompressRouter, LzhamDecoder};
use crate::cursor::ByteCursor;
use crate::trace_decode;
use crate::AssetResult;

/// The outer "SC" envelope: version, hash, and a single compressed payload.
/// See SPEC_FULL.md §3/§4.3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuterSCHeader {
	pub version_major: u32,
	pub version_minor: u32,
	pub hash: Vec<u8>,
}

impl OuterSCHeader {
	/// Read the header; `cursor` must already be positioned at the "SC"
	/// magic (i.e. at the start of the file — the magic itself is consumed
	/// here, not by [`crate::Dispatcher`]).
	pub fn read_from(cursor: &mut ByteCursor) -> AssetResult<Self> {
		cursor.skip(2)?; // "SC" magic, already used for classification
		let version_major = cursor.read_u32_be()?;
		let version_minor = cursor.read_u32_be()?;
		let hash_length = cursor.read_u32_be()?;
		let hash = cursor.read_bytes(hash_length as usize)?;

		trace_decode!("OuterSCHeader: version={}.{} hash_length={}", version_major, version_minor, hash_length);

		Ok(Self { version_major, version_minor, hash })
	}
}


/// Parses the outer envelope and decompresses its payload, verifying the
/// MD5 hash when present. See SPEC_FULL.md §4.3.
pub struct OuterSCParser;

impl OuterSCParser {
	/// Decompress the payload that follows `header` in `data`, checking the
	/// MD5 when `header.hash.len() == 16`. A mismatch is logged as a
	/// warning and never fails the parse — see SPEC_FULL.md invariant (ii).
	pub fn parse(data: &[u8], header: &OuterSCHeader, lzham: &dyn LzhamDecoder) -> AssetResult<Vec<u8>> {
		let header_len = 2 + 4 + 4 + 4 + header.hash.len();
		let payload = &data[header_len..];

		let decompressed = DecompressRouter::decompress(payload, lzham)?;

		if header.hash.len() == 16 {
			let mut hasher = Md5::new();
			hasher.update(&decompressed);
			let digest = hasher.finalize();

			if digest.as_slice() != header.hash.as_slice() {
				log::warn!(
					"{}: stored {:02x?}, computed {:02x?}",
					crate::AssetError::HashMismatch, header.hash, digest.as_slice());
			}
		}

		Ok(decompressed)
	}
}


#[test]
fn header_reads_big_endian_fields() {
	let mut data = b"SC".to_vec();
	data.extend(1u32.to_be_bytes());
	data.extend(2u32.to_be_bytes());
	data.extend(16u32.to_be_bytes());
	data.extend([0xAAu8; 16]);

	let header = OuterSCHeader::read_from(&mut ByteCursor::new(&data)).unwrap();
	assert_eq!(header.version_major, 1);
	assert_eq!(header.version_minor, 2);
	assert_eq!(header.hash, vec![0xAAu8; 16]);
}


#[test]
fn hash_mismatch_is_non_fatal() {
	let mut data = b"SC".to_vec();
	data.extend(1u32.to_be_bytes());
	data.extend(0u32.to_be_bytes());
	data.extend(16u32.to_be_bytes());
	data.extend([0u8; 16]); // wrong hash on purpose

	// Zstd-magic payload with no real frame: decompress will still fail on
	// its own terms, but an empty-but-wrong-length hash must never be the
	// reason a caller gets an Err back.
	let header = OuterSCHeader {
		version_major: 1,
		version_minor: 0,
		hash: vec![0u8; 16],
	};

	let payload = [0x28, 0xB5, 0x2F, 0xFD];
	let full: Vec<u8> = data[0..14].iter().chain(payload.iter()).copied().collect();
	let result = OuterSCParser::parse(&full, &header, &crate::compress::NoLzhamDecoder);
	// The Zstd frame is incomplete so decompression itself fails; the point
	// of this test is only that the function never panics reaching there.
	assert!(result.is_err());
}
