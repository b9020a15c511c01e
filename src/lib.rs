// Currently implemented
// =====================
// - SC envelope -> LZMA/Zstd -> tagged chunk walk -> PNG/raw output
// - CSV / Signed CSV / standalone KTX1 / KTX2 / SCTX containers
// - RGBA8888, RGBA4444, RGBA5551, RGB565, LA88, L8 uncompressed pixel payloads
// - ASTC 4x4/6x6/8x8 and ETC1 texture payloads via texture2ddecoder
// - 32x32 block-major deswizzle
//
// [TODO]
// ======
// - LZHAM has no wired-in decoder backend (see LzhamDecoder); scdump reports
//   DecompressError::Lzham for SCLZ-magic payloads until one is plugged in.


#![allow(deprecated)]


use std::path::Path;

use derive_more::{Display, Error};

use AssetError::*;

pub mod cursor;
pub mod dispatch;
pub mod outer_sc;
pub mod compress;
pub mod chunk;
pub mod raster;
pub mod pixel;
pub mod texture;
pub mod deswizzle;
pub mod writer;

pub use cursor::ByteCursor;
pub use dispatch::{ContainerKind, Dispatcher};
pub use outer_sc::{OuterSCHeader, OuterSCParser};
pub use compress::{DecompressRouter, LzhamDecoder, NoLzhamDecoder};
pub use chunk::{ChunkWalker, DecodeTask, InnerChunk};
pub use raster::{ColorModel, Raster};
pub use pixel::{PixelDecoder, PixelSubType};
pub use texture::TextureDecoder;
pub use deswizzle::Deswizzler;
pub use writer::{PngWriter, RawWriter};


/// [`std::result::Result`] parameterized with [`AssetError`].
pub type AssetResult<T> = std::result::Result<T, AssetError>;


macro_rules! trace_decode {
	($fmt:expr) => {
		if cfg!(debug_assertions) {
			log::trace!(concat!("trace_decode: ", $fmt));
		};
	};

	($fmt:expr, $($arg:tt)*) => {
		if cfg!(debug_assertions) {
			log::trace!(concat!("trace_decode: ", $fmt), $($arg)*);
		};
	};
}
pub(crate) use trace_decode;


/// `sc_asset`'s [`std::error::Error`] implementation.
#[derive(Debug, Display, Error, Clone, PartialEq)]
pub enum AssetError {
	/// Dispatcher could not classify the leading bytes of an input.
	#[display(fmt = "Unknown container format (unrecognized magic bytes)")]
	UnknownContainer,

	/// A read asked for more bytes than remained in the cursor.
	#[display(fmt = "Unexpected end of input")]
	TruncatedInput,

	/// A length-prefixed string was not valid UTF-8.
	#[display(fmt = "Length-prefixed string was not valid UTF-8")]
	CorruptedString,

	/// A checked arithmetic operation triggered an unexpected under/overflow.
	#[display(fmt = "A checked arithmetic operation triggered an unexpected under/overflow")]
	ArithmeticOverflow,

	/// The LZMA properties byte exceeded the valid range (> 224).
	#[display(fmt = "Invalid LZMA properties byte: {}", _0)]
	LzmaPropertiesError(#[error(ignore)] u8),

	/// The LZMA decoder failed.
	#[display(fmt = "LZMA decompression failed: {}", _0)]
	LzmaDecodeError(#[error(ignore)] String),

	/// The LZHAM decoder failed, or no LZHAM backend was configured.
	#[display(fmt = "LZHAM decompression failed: {}", _0)]
	LzhamDecodeError(#[error(ignore)] String),

	/// The Zstd decoder failed.
	#[display(fmt = "Zstd decompression failed: {}", _0)]
	ZstdDecodeError(#[error(ignore)] String),

	/// The decompressed inner stream's MD5 did not match `OuterSCHeader::hash`.
	///
	/// Non-fatal: callers log this and continue decoding.
	#[display(fmt = "MD5 of decompressed inner stream does not match stored hash")]
	HashMismatch,

	/// ChunkWalker encountered a tag outside the recognized set.
	///
	/// Non-fatal: the walker skips the chunk body and continues.
	#[display(fmt = "Unknown chunk tag: {}", _0)]
	UnknownChunkTag(#[error(ignore)] u8),

	/// An inline texture chunk declared a sub_type outside the recognized set.
	#[display(fmt = "Unknown pixel sub_type: {}", _0)]
	UnknownPixelSubType(#[error(ignore)] u8),

	/// An SCTX header declared a texture_kind outside the recognized set.
	#[display(fmt = "Unknown SCTX texture_kind: {}", _0)]
	UnknownSCTXKind(#[error(ignore)] u32),

	/// A KTX format value had no corresponding block decoder.
	#[display(fmt = "Unknown texture format: {}", _0)]
	UnknownTextureFormat(#[error(ignore)] u32),

	/// Pixel buffer length did not match `width * height * bytes_per_pixel`.
	#[error(ignore)]
	#[display(fmt = "Pixel buffer size mismatch ({}x{} sub_type {}): expected {}, got {}", _0, _1, _2, _3, _4)]
	PixelBufferSize(u16, u16, u8, usize, usize),

	/// Underlying I/O failure while reading an external SCTX reference or
	/// writing output.
	#[display(fmt = "I/O error: {:?}", _0)]
	IoError(#[error(ignore)] std::io::ErrorKind),

	/// [`image`] failed to encode or construct a raster.
	#[display(fmt = "Image encoding error: {}", _0)]
	ImageError(#[error(ignore)] String),
}


impl From<std::io::Error> for AssetError {
	fn from(error: std::io::Error) -> Self {
		IoError(error.kind())
	}
}


impl From<image::ImageError> for AssetError {
	fn from(error: image::ImageError) -> Self {
		ImageError(error.to_string())
	}
}


/// What processing one input file produced.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
	/// Zero or more PNGs were written (inline chunks, standalone textures).
	Images { count: usize },

	/// A single raw decompressed table was written.
	RawTable { len: usize },
}


/// Options threaded through the per-file pipeline; the CLI's whole
/// configuration surface (see SPEC_FULL.md §4.10).
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
	/// Apply the OldDictionary prologue before walking chunks (`--old`).
	pub old_dictionary: bool,
}


/// Drive the full C2..C9 pipeline for one input file's bytes, writing
/// output into `output_dir` and naming files from `base_name`. Table
/// outputs are named `{base_name}{source_extension}`, preserving whatever
/// extension the input file itself carried.
pub fn process_file(
	bytes: &[u8],
	source_dir: &Path,
	base_name: &str,
	source_extension: &str,
	output_dir: &Path,
	options: &ProcessOptions,
	lzham: &dyn LzhamDecoder,
) -> AssetResult<ProcessOutcome> {
	match Dispatcher::classify(bytes)? {
		ContainerKind::Csv => {
			let decompressed = DecompressRouter::decompress(bytes, lzham)?;
			RawWriter::write(output_dir, base_name, source_extension, &decompressed)?;
			Ok(ProcessOutcome::RawTable { len: decompressed.len() })
		},

		ContainerKind::SignedCsv => {
			let inner = bytes.get(68..).ok_or(TruncatedInput)?;
			let decompressed = DecompressRouter::decompress(inner, lzham)?;
			RawWriter::write(output_dir, base_name, source_extension, &decompressed)?;
			Ok(ProcessOutcome::RawTable { len: decompressed.len() })
		},

		ContainerKind::Sc => {
			let header = OuterSCHeader::read_from(&mut ByteCursor::new(bytes))?;
			let decompressed = OuterSCParser::parse(bytes, &header, lzham)?;

			let mut cursor = ByteCursor::new(&decompressed);
			if options.old_dictionary {
				chunk::skip_old_dictionary_prologue(&mut cursor)?;
			}

			let mut inline_index = 0usize;
			let mut images_written = 0usize;

			for task in ChunkWalker::new(&mut cursor) {
				let task = task?;
				let inline = task.is_inline();

				// UnknownPixelSubType/PixelBufferSize abort the current chunk
				// only; UnknownSCTXKind/UnknownTextureFormat abort the
				// current texture only. Everything else (TruncatedInput
				// chief among them) is file-fatal and propagates.
				let raster = match task.into_raster(source_dir, lzham) {
					Ok(raster) => raster,
					Err(e @ (UnknownPixelSubType(_) | PixelBufferSize(..) | UnknownSCTXKind(_) | UnknownTextureFormat(_))) => {
						log::error!("{}: {}, skipping", base_name, e);
						continue;
					},
					Err(e) => return Err(e),
				};

				if let Some(raster) = raster {
					if inline {
						PngWriter::write(output_dir, base_name, inline_index, &raster)?;
						inline_index += 1;
					} else {
						PngWriter::write_standalone(output_dir, base_name, &raster)?;
					}

					images_written += 1;
				}
			}

			Ok(ProcessOutcome::Images { count: images_written })
		},

		ContainerKind::Ktx => {
			let raster = TextureDecoder::decode_ktx(bytes)?;
			PngWriter::write_standalone(output_dir, base_name, &raster)?;
			Ok(ProcessOutcome::Images { count: 1 })
		},

		ContainerKind::Sctx => {
			let raster = TextureDecoder::decode_sctx(bytes, lzham)?;
			PngWriter::write_standalone(output_dir, base_name, &raster)?;
			Ok(ProcessOutcome::Images { count: 1 })
		},
	}
}


#[test]
fn process_options_default_is_no_old_dictionary() {
	assert!(!ProcessOptions::default().old_dictionary);
}


#[cfg(test)]
mod process_file_tests {
	use super::*;

	fn inline_rgba8888_chunk(width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
		let mut chunk = vec![1u8];
		chunk.extend(((5 + pixels.len()) as u32).to_le_bytes());
		chunk.push(0); // sub_type 0 == RGBA8888
		chunk.extend(width.to_le_bytes());
		chunk.extend(height.to_le_bytes());
		chunk.extend_from_slice(pixels);
		chunk
	}

	/// Wraps a decompressed inner chunk stream in an "SC" envelope with
	/// `hash_length = 0` (no MD5 check) and a Zstd-compressed payload.
	fn wrap_sc_container(inner: &[u8]) -> Vec<u8> {
		let compressed = zstd::stream::encode_all(inner, 0).expect("zstd encode");

		let mut data = b"SC".to_vec();
		data.extend(1u32.to_be_bytes());
		data.extend(0u32.to_be_bytes());
		data.extend(0u32.to_be_bytes()); // hash_length
		data.extend(compressed);
		data
	}

	#[test]
	fn sc_container_with_one_inline_chunk_writes_indexed_png() {
		let pixels = [
			0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF,
			0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
		];
		let inner = inline_rgba8888_chunk(2, 2, &pixels);
		let data = wrap_sc_container(&inner);

		let dir = std::env::temp_dir().join("sc_asset_process_file_inline");
		std::fs::create_dir_all(&dir).unwrap();

		let outcome = process_file(
			&data, &dir, "base", ".csv", &dir, &ProcessOptions::default(), &NoLzhamDecoder,
		).unwrap();

		assert!(matches!(outcome, ProcessOutcome::Images { count: 1 }));
		let decoded = image::open(dir.join("base_0.png")).unwrap().to_rgba8();
		assert_eq!(decoded.as_raw(), &pixels.to_vec());

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn unknown_chunk_tag_does_not_abort_the_file() {
		let mut inner = vec![99u8];
		inner.extend(3u32.to_le_bytes());
		inner.extend(b"xyz");
		inner.extend(inline_rgba8888_chunk(1, 1, &[0, 0, 0, 0]));

		let data = wrap_sc_container(&inner);
		let dir = std::env::temp_dir().join("sc_asset_process_file_unknown_tag");
		std::fs::create_dir_all(&dir).unwrap();

		let outcome = process_file(
			&data, &dir, "base", ".csv", &dir, &ProcessOptions::default(), &NoLzhamDecoder,
		).unwrap();

		assert!(matches!(outcome, ProcessOutcome::Images { count: 1 }));
		assert!(dir.join("base_0.png").exists());

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn bad_pixel_sub_type_aborts_only_its_own_chunk() {
		// A chunk with an unrecognized sub_type, followed by a valid one.
		// Structurally well-formed (5-byte minimum header), so ChunkWalker
		// hands it off; PixelDecoder is what rejects it.
		let mut inner = vec![1u8];
		inner.extend(6u32.to_le_bytes());
		inner.push(250); // unrecognized sub_type
		inner.extend(1u16.to_le_bytes());
		inner.extend(1u16.to_le_bytes());
		inner.push(0xAA);
		inner.extend(inline_rgba8888_chunk(1, 1, &[1, 2, 3, 4]));

		let data = wrap_sc_container(&inner);
		let dir = std::env::temp_dir().join("sc_asset_process_file_bad_sub_type");
		std::fs::create_dir_all(&dir).unwrap();

		let outcome = process_file(
			&data, &dir, "base", ".csv", &dir, &ProcessOptions::default(), &NoLzhamDecoder,
		).unwrap();

		// Only the second chunk produced a PNG; the file as a whole still
		// succeeds and the bad chunk did not consume an index slot.
		assert!(matches!(outcome, ProcessOutcome::Images { count: 1 }));
		assert!(dir.join("base_0.png").exists());

		std::fs::remove_dir_all(&dir).unwrap();
	}

	#[test]
	fn deswizzled_inline_chunk_matches_block_layout() {
		let bpp = 4;
		let mut pixels = Vec::new();
		pixels.extend(std::iter::repeat(0xAAu8).take(32 * 32 * bpp));
		pixels.extend(std::iter::repeat(0xBBu8).take(32 * 32 * bpp));

		let mut chunk = vec![28u8]; // tag 28: swizzled inline texture
		chunk.extend(((5 + pixels.len()) as u32).to_le_bytes());
		chunk.push(0); // sub_type 0 == RGBA8888
		chunk.extend(64u16.to_le_bytes());
		chunk.extend(32u16.to_le_bytes());
		chunk.extend_from_slice(&pixels);

		let data = wrap_sc_container(&chunk);
		let dir = std::env::temp_dir().join("sc_asset_process_file_deswizzle");
		std::fs::create_dir_all(&dir).unwrap();

		let outcome = process_file(
			&data, &dir, "base", ".csv", &dir, &ProcessOptions::default(), &NoLzhamDecoder,
		).unwrap();

		assert!(matches!(outcome, ProcessOutcome::Images { count: 1 }));
		let decoded = image::open(dir.join("base_0.png")).unwrap().to_rgba8();
		assert_eq!(decoded.as_raw()[0], 0xAA);
		assert_eq!(decoded.as_raw()[32 * bpp], 0xBB);

		std::fs::remove_dir_all(&dir).unwrap();
	}
}
