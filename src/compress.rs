use byteorder::{ByteOrder, LittleEndian};

use crate::AssetError::*;
use crate::AssetResult;

const LZHAM_MAGIC: &[u8; 4] = b"SCLZ";
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Maximum properties byte value accepted before an LZMA "alone" header is
/// considered corrupt. See SPEC_FULL.md §4.4.
const LZMA_MAX_PROPERTIES_BYTE: u8 = 224;


/// Pluggable LZHAM backend. The header framing around SCLZ-magic payloads
/// (dict_size_log2, uncompressed_size) is implemented unconditionally by
/// [`DecompressRouter`]; only the bitstream algorithm itself is injected,
/// mirroring how ASTC/ETC1 block decoding is treated in [`crate::texture`].
pub trait LzhamDecoder {
	fn decompress(&self, data: &[u8], dict_size_log2: u8, uncompressed_size: u32) -> AssetResult<Vec<u8>>;
}


/// Default backend for builds with no LZHAM binding wired in: always fails.
/// The header is still parsed and validated before this is reached, so
/// callers see a precise "no decoder configured" diagnostic rather than a
/// parse failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLzhamDecoder;

impl LzhamDecoder for NoLzhamDecoder {
	fn decompress(&self, _data: &[u8], _dict_size_log2: u8, _uncompressed_size: u32) -> AssetResult<Vec<u8>> {
		Err(LzhamDecodeError("no LZHAM decoder backend configured".to_string()))
	}
}


/// Selects LZMA / LZHAM / Zstd based on payload magic bytes, normalizes the
/// LZMA "alone" header, and returns the fully decompressed byte sequence.
pub struct DecompressRouter;

impl DecompressRouter {
	pub fn decompress(data: &[u8], lzham: &dyn LzhamDecoder) -> AssetResult<Vec<u8>> {
		if data.get(0..4) == Some(LZHAM_MAGIC) {
			return Self::decompress_lzham(data, lzham);
		}

		if data.get(0..4) == Some(&ZSTD_MAGIC) {
			return Self::decompress_zstd(data);
		}

		Self::decompress_lzma_alone(data)
	}


	fn decompress_lzham(data: &[u8], lzham: &dyn LzhamDecoder) -> AssetResult<Vec<u8>> {
		if data.len() < 9 {
			return Err(TruncatedInput);
		}

		let dict_size_log2 = data[4];
		let uncompressed_size = LittleEndian::read_u32(&data[5..9]);
		let stream = &data[9..];

		lzham.decompress(stream, dict_size_log2, uncompressed_size)
	}


	fn decompress_zstd(data: &[u8]) -> AssetResult<Vec<u8>> {
		zstd::stream::decode_all(data).map_err(|e| ZstdDecodeError(e.to_string()))
	}


	/// Splice in the four zero bytes the "alone" header is missing (see
	/// SPEC_FULL.md §4.4 and §9) and hand off to `lzma-rs`.
	fn decompress_lzma_alone(data: &[u8]) -> AssetResult<Vec<u8>> {
		if data.len() < 9 {
			return Err(TruncatedInput);
		}

		let properties_byte = data[0];
		if properties_byte > LZMA_MAX_PROPERTIES_BYTE {
			return Err(LzmaPropertiesError(properties_byte));
		}

		let mut header = Vec::with_capacity(data.len() + 4);
		header.extend_from_slice(&data[0..9]);
		header.extend_from_slice(&[0u8; 4]);
		header.extend_from_slice(&data[9..]);

		let mut output = Vec::new();
		lzma_rs::lzma_decompress(&mut std::io::Cursor::new(header), &mut output)
			.map_err(|e| LzmaDecodeError(e.to_string()))?;

		Ok(output)
	}
}


/// Normalize an LZMA "alone" header in isolation, for tests and for callers
/// that need the spliced bytes without decoding (e.g. S1/S2 fixtures).
pub fn splice_lzma_alone_header(data: &[u8]) -> Vec<u8> {
	let mut header = Vec::with_capacity(data.len() + 4);
	header.extend_from_slice(&data[0..9]);
	header.extend_from_slice(&[0u8; 4]);
	header.extend_from_slice(&data[9..]);
	header
}


#[test]
fn detects_zstd_magic() {
	let mut data = ZSTD_MAGIC.to_vec();
	data.extend([0u8; 8]);
	// Only verifying dispatch reaches the Zstd branch, not a full frame decode.
	let err = DecompressRouter::decompress_zstd(&data).unwrap_err();
	assert!(matches!(err, ZstdDecodeError(_)));
}


#[test]
fn rejects_invalid_lzma_properties_byte() {
	let mut data = vec![225u8, 0, 0, 0, 0, 0, 0, 0, 0];
	data.extend([0u8; 8]);
	assert_eq!(DecompressRouter::decompress_lzma_alone(&data).unwrap_err(), LzmaPropertiesError(225));
}


#[test]
fn splice_inserts_four_zero_bytes_after_offset_nine() {
	let data: Vec<u8> = (0u8..13).collect();
	let spliced = splice_lzma_alone_header(&data);
	assert_eq!(spliced.len(), data.len() + 4);
	assert_eq!(&spliced[0..9], &data[0..9]);
	assert_eq!(&spliced[9..13], &[0, 0, 0, 0]);
	assert_eq!(&spliced[13..], &data[9..]);
}


#[test]
fn lzham_magic_header_is_parsed_before_backend_dispatch() {
	let mut size_buf = [0u8; 4];
	LittleEndian::write_u32(&mut size_buf, 1234);

	let mut data = LZHAM_MAGIC.to_vec();
	data.push(22); // dict_size_log2
	data.extend(size_buf);
	data.extend([0u8; 4]);

	let result = DecompressRouter::decompress(&data, &NoLzhamDecoder);
	assert!(matches!(result, Err(LzhamDecodeError(_))));
}
