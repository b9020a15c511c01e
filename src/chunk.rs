use std::fs;
use std::path::Path;

use crate::compress::LzhamDecoder;
use crate::cursor::ByteCursor;
use crate::deswizzle::Deswizzler;
use crate::pixel::{PixelDecoder, PixelSubType};
use crate::raster::Raster;
use crate::texture::TextureDecoder;
use crate::trace_decode;
use crate::AssetError::*;
use crate::AssetResult;

const RECOGNIZED_TAGS: [u8; 9] = [1, 8, 12, 24, 27, 28, 45, 47, 49];

/// One `{tag, size, body}` triple from the decompressed inner stream. See
/// SPEC_FULL.md §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerChunk {
	pub tag: u8,
	pub body: Vec<u8>,
}

impl InnerChunk {
	/// Dispatch by tag. Returns `Ok(None)` for chunks that produce no
	/// image (matrix, opaque passthrough); see SPEC_FULL.md §4.5 step 3.
	fn interpret(&self) -> AssetResult<Option<DecodeTask>> {
		match self.tag {
			8 => {
				let mut cursor = ByteCursor::new(&self.body);
				for _ in 0..6 {
					cursor.read_i32_le()?;
				}
				Ok(None)
			},

			12 | 49 => Ok(None),

			45 => {
				let mut cursor = ByteCursor::new(&self.body);
				let inner_size = cursor.read_u32_le()?;
				let bytes = cursor.read_bytes(inner_size as usize)?;
				Ok(Some(DecodeTask::KtxPayload { bytes }))
			},

			47 => {
				let mut cursor = ByteCursor::new(&self.body);
				let filename = cursor.read_length_prefixed_string()?;
				Ok(Some(DecodeTask::SctxReference { filename }))
			},

			1 | 24 | 27 | 28 => {
				let mut cursor = ByteCursor::new(&self.body);
				let sub_type = cursor.read_u8()?;
				let width = cursor.read_u16_le()?;
				let height = cursor.read_u16_le()?;
				let pixels = cursor.read_bytes(cursor.remaining())?;
				let swizzled = matches!(self.tag, 27 | 28);

				Ok(Some(DecodeTask::InlineTexture { sub_type, width, height, pixels, swizzled }))
			},

			other => unreachable!("tag {} passed RECOGNIZED_TAGS but has no interpretation", other),
		}
	}
}


/// What one chunk asks the pipeline to do next: produce a raster from
/// already-borrowed bytes, or go fetch a sibling file first.
#[derive(Debug, Clone)]
pub enum DecodeTask {
	InlineTexture {
		sub_type: u8,
		width: u16,
		height: u16,
		pixels: Vec<u8>,
		swizzled: bool,
	},
	KtxPayload {
		bytes: Vec<u8>,
	},
	SctxReference {
		filename: String,
	},
}

impl DecodeTask {
	/// Whether this task's raster is named `{base_name}_{index}.png`
	/// (inline chunks) rather than `{base_name}.png` (a standalone KTX or
	/// SCTX output reached via tag 45/47). See SPEC_FULL.md §6.
	pub fn is_inline(&self) -> bool {
		matches!(self, DecodeTask::InlineTexture { .. })
	}


	/// Resolve this task into a [`Raster`], loading an external SCTX file
	/// from `source_dir` if the task is a tag-47 reference.
	pub fn into_raster(self, source_dir: &Path, lzham: &dyn LzhamDecoder) -> AssetResult<Option<Raster>> {
		match self {
			DecodeTask::InlineTexture { sub_type, width, height, pixels, swizzled } => {
				let pixels = if swizzled {
					let sub_type = PixelSubType::from_tag(sub_type)?;
					let bpp = sub_type.bytes_per_pixel();
					let expected = width as usize * height as usize * bpp;

					if pixels.len() != expected {
						return Err(PixelBufferSize(width, height, sub_type.tag(), expected, pixels.len()));
					}

					Deswizzler::deswizzle(&pixels, width as usize, height as usize, bpp)
				} else {
					pixels
				};

				Ok(Some(PixelDecoder::decode(sub_type, width, height, &pixels)?))
			},

			DecodeTask::KtxPayload { bytes } => Ok(Some(TextureDecoder::decode_ktx(&bytes)?)),

			DecodeTask::SctxReference { filename } => {
				let bytes = fs::read(source_dir.join(&filename))?;
				Ok(Some(TextureDecoder::decode_sctx(&bytes, lzham)?))
			},
		}
	}
}


/// Apply the legacy OldDictionary prologue ahead of the main chunk loop.
/// See SPEC_FULL.md §4.5.
pub fn skip_old_dictionary_prologue(cursor: &mut ByteCursor) -> AssetResult<()> {
	cursor.skip(17)?;
	let count = cursor.read_u16_le()?;
	cursor.skip(2 * count as usize)?;

	for _ in 0..count {
		cursor.read_length_prefixed_string()?;
	}

	Ok(())
}


/// Iterates the decompressed inner stream, yielding a [`DecodeTask`] for
/// every chunk that produces one. Unknown tags and sentinels are logged
/// and skipped internally; only genuine parse failures surface as `Err`.
pub struct ChunkWalker<'c, 'a> {
	cursor: &'c mut ByteCursor<'a>,
}

impl<'c, 'a> ChunkWalker<'c, 'a> {
	pub fn new(cursor: &'c mut ByteCursor<'a>) -> Self {
		Self { cursor }
	}


	fn step(&mut self) -> AssetResult<Option<DecodeTask>> {
		let tag = self.cursor.read_u8()?;
		let size = self.cursor.read_u32_le()?;

		if size == 0 {
			trace_decode!("ChunkWalker: sentinel tag {}", tag);
			return Ok(None);
		}

		if !RECOGNIZED_TAGS.contains(&tag) {
			log::error!("{} (size {}), skipping", crate::AssetError::UnknownChunkTag(tag), size);
			self.cursor.skip(size as usize)?;
			return Ok(None);
		}

		let body = self.cursor.read_bytes(size as usize)?;
		let chunk = InnerChunk { tag, body };
		chunk.interpret()
	}
}

impl<'c, 'a> Iterator for ChunkWalker<'c, 'a> {
	type Item = AssetResult<DecodeTask>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if self.cursor.is_empty() {
				return None;
			}

			match self.step() {
				Ok(Some(task)) => return Some(Ok(task)),
				Ok(None) => continue,
				Err(e) => return Some(Err(e)),
			}
		}
	}
}


#[test]
fn sentinel_chunks_are_skipped() {
	let mut data = vec![1u8, 0, 0, 0, 0]; // tag 1, size 0
	data.extend([1u8, 21, 0, 0, 0]); // tag 1, size 21
	data.extend([0u8]); // sub_type 0
	data.extend(1u16.to_le_bytes());
	data.extend(1u16.to_le_bytes());
	data.extend([0xFFu8; 4]);

	let mut cursor = ByteCursor::new(&data);
	let tasks: Vec<_> = ChunkWalker::new(&mut cursor).collect();
	assert_eq!(tasks.len(), 1);
	assert!(tasks[0].is_ok());
}


#[test]
fn unknown_tag_is_logged_and_skipped_not_fatal() {
	let mut data = vec![99u8];
	data.extend(3u32.to_le_bytes());
	data.extend(b"xyz");

	data.extend([1u8]);
	data.extend(21u32.to_le_bytes());
	data.extend([0u8]);
	data.extend(2u16.to_le_bytes());
	data.extend(2u16.to_le_bytes());
	data.extend([0u8; 16]);

	let mut cursor = ByteCursor::new(&data);
	let tasks: Vec<_> = ChunkWalker::new(&mut cursor).collect();
	assert_eq!(tasks.len(), 1);
	assert!(matches!(tasks[0], Ok(DecodeTask::InlineTexture { .. })));
}


#[test]
fn matrix_chunk_produces_no_task() {
	let mut data = vec![8u8];
	data.extend(24u32.to_le_bytes());
	data.extend([0u8; 24]);

	let mut cursor = ByteCursor::new(&data);
	let tasks: Vec<_> = ChunkWalker::new(&mut cursor).collect();
	assert!(tasks.is_empty());
}


#[test]
fn external_sctx_reference_chunk_is_parsed() {
	let mut data = vec![47u8];
	let filename = "sibling.sctx";
	data.extend((1 + filename.len() as u32).to_le_bytes());
	data.push(filename.len() as u8);
	data.extend(filename.as_bytes());

	let mut cursor = ByteCursor::new(&data);
	let tasks: Vec<_> = ChunkWalker::new(&mut cursor).collect();
	assert_eq!(tasks.len(), 1);
	match tasks.into_iter().next().unwrap().unwrap() {
		DecodeTask::SctxReference { filename: f } => assert_eq!(f, filename),
		other => panic!("expected SctxReference, got {:?}", other),
	}
}


#[test]
fn walker_consumes_exact_stream_for_well_formed_input() {
	let mut data = vec![1u8];
	data.extend(21u32.to_le_bytes());
	data.extend([0u8]);
	data.extend(2u16.to_le_bytes());
	data.extend(2u16.to_le_bytes());
	data.extend([0u8; 16]);

	let mut cursor = ByteCursor::new(&data);
	let tasks: Vec<_> = ChunkWalker::new(&mut cursor).collect();
	assert_eq!(tasks.len(), 1);
	assert!(cursor.is_empty());
}


#[test]
fn is_inline_distinguishes_task_kinds() {
	let inline = DecodeTask::InlineTexture { sub_type: 0, width: 1, height: 1, pixels: vec![0; 4], swizzled: false };
	let ktx = DecodeTask::KtxPayload { bytes: vec![] };
	let sctx = DecodeTask::SctxReference { filename: "x.sctx".to_string() };

	assert!(inline.is_inline());
	assert!(!ktx.is_inline());
	assert!(!sctx.is_inline());
}
