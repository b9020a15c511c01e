use crate::compress::{DecompressRouter, LzhamDecoder};
use crate::cursor::ByteCursor;
use crate::raster::{ColorModel, Raster};
use crate::trace_decode;
use crate::AssetError::*;
use crate::AssetResult;

const KTX1_IDENTIFIER: &[u8; 12] = b"\xABKTX 11\xBB\r\n\x1A\n";
const KTX2_IDENTIFIER: &[u8; 12] = b"\xABKTX 20\xBB\r\n\x1A\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockFormat {
	Astc { block_x: usize, block_y: usize },
	Etc1,
}


/// Drives the ASTC/ETC1 block decoders for SCTX and KTX payloads. See
/// SPEC_FULL.md §4.7/§4.7a.
pub struct TextureDecoder;

impl TextureDecoder {
	pub fn decode_sctx(data: &[u8], lzham: &dyn LzhamDecoder) -> AssetResult<Raster> {
		let mut cursor = ByteCursor::new(data);
		cursor.skip(52)?;

		let width = cursor.read_u16_le()?;
		let height = cursor.read_u16_le()?;
		let texture_kind = cursor.read_u32_le()?;
		let _length = cursor.read_u32_le()?;
		cursor.skip(16)?;

		let inner_len = cursor.read_u32_le()?;
		cursor.skip(inner_len as usize)?;
		cursor.skip(52)?;

		let remainder = cursor.peek_bytes(cursor.remaining())?;

		trace_decode!("SCTX: {}x{} texture_kind={}", width, height, texture_kind);

		let (block, payload): (BlockFormat, Vec<u8>) = match texture_kind {
			12 => (BlockFormat::Astc { block_x: 4, block_y: 4 }, remainder.to_vec()),
			5 => {
				let decompressed = DecompressRouter::decompress(remainder, lzham)?;
				(BlockFormat::Astc { block_x: 8, block_y: 8 }, decompressed)
			},
			other => return Err(UnknownSCTXKind(other)),
		};

		decode_block_format(block, &payload, width as usize, height as usize)
	}


	pub fn decode_ktx(data: &[u8]) -> AssetResult<Raster> {
		if data.get(0..12) == Some(KTX1_IDENTIFIER.as_slice()) {
			return decode_ktx1(data);
		}

		if data.get(0..12) == Some(KTX2_IDENTIFIER.as_slice()) {
			return decode_ktx2(data);
		}

		Err(UnknownContainer)
	}
}


fn decode_ktx1(data: &[u8]) -> AssetResult<Raster> {
	let mut cursor = ByteCursor::new(data);
	cursor.skip(12)?;
	cursor.skip(16)?;

	let gl_internal_format = cursor.read_u32_le()?;
	cursor.skip(4)?;
	let width = cursor.read_u32_le()?;
	let height = cursor.read_u32_le()?;
	cursor.skip(16)?;

	let kvd_len = cursor.read_u32_le()?;
	cursor.skip(kvd_len as usize)?;
	cursor.skip(4)?;

	let payload = cursor.peek_bytes(cursor.remaining())?;

	trace_decode!("KTX1: {}x{} gl_internal_format={:#x}", width, height, gl_internal_format);

	let block = format_to_block(gl_internal_format)?;
	decode_block_format(block, payload, width as usize, height as usize)
}


fn decode_ktx2(data: &[u8]) -> AssetResult<Raster> {
	let mut cursor = ByteCursor::new(data);
	cursor.skip(12)?;

	let vk_format = cursor.read_u32_le()?;
	cursor.skip(4)?;
	let width = cursor.read_u32_le()?;
	let height = cursor.read_u32_le()?;
	cursor.skip(12)?;

	let level_count = cursor.read_u32_le()?;
	cursor.skip(4)?;
	cursor.skip(8)?;

	let kvd_byte_offset = cursor.read_u32_le()?;
	let kvd_byte_length = cursor.read_u32_le()?;
	cursor.skip(4)?;

	let sgd_byte_length = cursor.read_u32_le()?;
	cursor.skip(8)?;

	let levels = std::cmp::max(1, level_count);
	for _ in 0..levels {
		cursor.skip(24)?;
	}

	let level_image_len = cursor.read_u32_le()?;
	let level_image_remainder = (level_image_len as usize).checked_sub(4).ok_or(TruncatedInput)?;
	cursor.skip(level_image_remainder)?;

	while cursor.position() < (kvd_byte_offset + kvd_byte_length) as usize {
		let kv_len = cursor.read_u32_le()?;
		cursor.skip(kv_len as usize)?;
		cursor.align(4)?;
	}

	cursor.align(16)?;
	cursor.skip(sgd_byte_length as usize)?;

	let payload = cursor.peek_bytes(cursor.remaining())?;

	trace_decode!("KTX2: {}x{} vk_format={}", width, height, vk_format);

	let block = format_to_block(vk_format)?;
	decode_block_format(block, payload, width as usize, height as usize)
}


fn format_to_block(format: u32) -> AssetResult<BlockFormat> {
	match format {
		157 => Ok(BlockFormat::Astc { block_x: 4, block_y: 4 }),
		165 => Ok(BlockFormat::Astc { block_x: 6, block_y: 6 }),
		171 | 172 => Ok(BlockFormat::Astc { block_x: 8, block_y: 8 }),
		0x8D64 => Ok(BlockFormat::Etc1),
		0x93B0 => Ok(BlockFormat::Astc { block_x: 4, block_y: 4 }),
		0x93B4 => Ok(BlockFormat::Astc { block_x: 6, block_y: 6 }),
		other => Err(UnknownTextureFormat(other)),
	}
}


/// Calls into `texture2ddecoder`, which returns packed BGRA `u32`s per its
/// documented contract, and reinterprets that buffer as row-major RGBA8.
fn decode_block_format(block: BlockFormat, data: &[u8], width: usize, height: usize) -> AssetResult<Raster> {
	let mut buffer = vec![0u32; width * height];

	match block {
		BlockFormat::Astc { block_x, block_y } => {
			texture2ddecoder::decode_astc(data, width, height, block_x, block_y, &mut buffer).map_err(|e| {
				log::error!("ASTC {}x{} block decode failed: {}", block_x, block_y, e);
				TruncatedInput
			})?;
		},
		BlockFormat::Etc1 => {
			texture2ddecoder::decode_etc1(data, width, height, &mut buffer).map_err(|e| {
				log::error!("ETC1 block decode failed: {}", e);
				TruncatedInput
			})?;
		},
	}

	let mut pixels = Vec::with_capacity(width * height * 4);
	for pixel in buffer {
		let b = (pixel & 0xFF) as u8;
		let g = ((pixel >> 8) & 0xFF) as u8;
		let r = ((pixel >> 16) & 0xFF) as u8;
		let a = ((pixel >> 24) & 0xFF) as u8;
		pixels.extend_from_slice(&[r, g, b, a]);
	}

	Ok(Raster::new(width as u16, height as u16, ColorModel::Rgba, pixels))
}


#[test]
fn format_to_block_maps_known_vk_formats() {
	assert_eq!(format_to_block(157).unwrap(), BlockFormat::Astc { block_x: 4, block_y: 4 });
	assert_eq!(format_to_block(165).unwrap(), BlockFormat::Astc { block_x: 6, block_y: 6 });
	assert_eq!(format_to_block(171).unwrap(), BlockFormat::Astc { block_x: 8, block_y: 8 });
	assert_eq!(format_to_block(0x8D64).unwrap(), BlockFormat::Etc1);
}


#[test]
fn format_to_block_rejects_unknown_value() {
	assert_eq!(format_to_block(0xDEAD).unwrap_err(), UnknownTextureFormat(0xDEAD));
}


#[test]
fn decode_ktx_rejects_unrecognized_identifier() {
	let data = [0u8; 16];
	assert_eq!(TextureDecoder::decode_ktx(&data).unwrap_err(), UnknownContainer);
}
