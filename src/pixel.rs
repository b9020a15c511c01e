use byteorder::{ByteOrder, LittleEndian};
use surety::Ensure;

use crate::raster::{ColorModel, Raster};
use crate::AssetError::*;
use crate::AssetResult;

/// Closed set of uncompressed inline pixel encodings. See SPEC_FULL.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSubType {
	Rgba8888,
	Rgba4444,
	Rgba5551,
	Rgb565,
	La88,
	L8,
}

impl PixelSubType {
	pub fn from_tag(sub_type: u8) -> AssetResult<Self> {
		match sub_type {
			0 | 1 => Ok(PixelSubType::Rgba8888),
			2 => Ok(PixelSubType::Rgba4444),
			3 => Ok(PixelSubType::Rgba5551),
			4 => Ok(PixelSubType::Rgb565),
			6 => Ok(PixelSubType::La88),
			10 => Ok(PixelSubType::L8),
			other => Err(UnknownPixelSubType(other)),
		}
	}


	pub fn bytes_per_pixel(self) -> usize {
		match self {
			PixelSubType::Rgba8888 => 4,
			PixelSubType::Rgba4444 => 2,
			PixelSubType::Rgba5551 => 2,
			PixelSubType::Rgb565 => 2,
			PixelSubType::La88 => 2,
			PixelSubType::L8 => 1,
		}
	}


	pub fn color_model(self) -> ColorModel {
		match self {
			PixelSubType::Rgba8888 | PixelSubType::Rgba4444 | PixelSubType::Rgba5551 => ColorModel::Rgba,
			PixelSubType::Rgb565 => ColorModel::Rgb,
			PixelSubType::La88 => ColorModel::La,
			PixelSubType::L8 => ColorModel::L,
		}
	}


	/// The wire `sub_type` byte this variant was parsed from, for error
	/// reporting (`from_tag` maps both 0 and 1 to `Rgba8888`, so this is not
	/// a perfect inverse, but it is a valid tag for the variant).
	pub fn tag(self) -> u8 {
		match self {
			PixelSubType::Rgba8888 => 0,
			PixelSubType::Rgba4444 => 2,
			PixelSubType::Rgba5551 => 3,
			PixelSubType::Rgb565 => 4,
			PixelSubType::La88 => 6,
			PixelSubType::L8 => 10,
		}
	}
}


/// Converts a raw uncompressed pixel buffer of a known `(sub_type, width,
/// height)` into a [`Raster`]. See SPEC_FULL.md §4.6.
pub struct PixelDecoder;

impl PixelDecoder {
	pub fn decode(sub_type: u8, width: u16, height: u16, data: &[u8]) -> AssetResult<Raster> {
		let sub_type = PixelSubType::from_tag(sub_type)?;
		let bpp = sub_type.bytes_per_pixel();
		let expected: usize = ((width as usize).checked() * height as usize * bpp).ok_or(ArithmeticOverflow)?;

		if data.len() != expected {
			return Err(PixelBufferSize(width, height, sub_type.tag(), expected, data.len()));
		}

		let pixels = match sub_type {
			PixelSubType::Rgba8888 => data.to_vec(),
			PixelSubType::Rgba4444 => decode_rgba4444(data),
			PixelSubType::Rgba5551 => decode_rgba5551(data),
			PixelSubType::Rgb565 => decode_rgb565(data),
			PixelSubType::La88 => data.to_vec(),
			PixelSubType::L8 => data.to_vec(),
		};

		Ok(Raster::new(width, height, sub_type.color_model(), pixels))
	}
}


fn decode_rgba4444(data: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(data.len() * 2);
	for chunk in data.chunks_exact(2) {
		let p = LittleEndian::read_u16(chunk);
		out.push((((p >> 12) & 0xF) << 4) as u8);
		out.push((((p >> 8) & 0xF) << 4) as u8);
		out.push((((p >> 4) & 0xF) << 4) as u8);
		out.push(((p & 0xF) << 4) as u8);
	}
	out
}


/// See SPEC_FULL.md §9 Open Question (a): channel order mirrors sub_type 4
/// (RGB565), R holding the top bits down through a single alpha bit.
fn decode_rgba5551(data: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(data.len() * 2);
	for chunk in data.chunks_exact(2) {
		let p = LittleEndian::read_u16(chunk);
		out.push((((p >> 11) & 0x1F) << 3) as u8);
		out.push((((p >> 6) & 0x1F) << 3) as u8);
		out.push((((p >> 1) & 0x1F) << 3) as u8);
		out.push(((p & 0x1) * 0xFF) as u8);
	}
	out
}


fn decode_rgb565(data: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(data.len() * 3 / 2);
	for chunk in data.chunks_exact(2) {
		let p = LittleEndian::read_u16(chunk);
		out.push((((p >> 11) & 0x1F) << 3) as u8);
		out.push((((p >> 5) & 0x3F) << 2) as u8);
		out.push(((p & 0x1F) << 3) as u8);
	}
	out
}


#[test]
fn rgba8888_is_pass_through() {
	let data = vec![0xFF, 0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
	let raster = PixelDecoder::decode(0, 2, 2, &data).unwrap();
	assert_eq!(raster.pixels, data);
	assert_eq!(raster.color_model, ColorModel::Rgba);
}


#[test]
fn rgba4444_expands_nibbles() {
	// p = 0xF00F -> r=0xF0, g=0x00, b=0x00, a=0xF0
	let data = vec![0x0F, 0xF0];
	let raster = PixelDecoder::decode(2, 1, 1, &data).unwrap();
	assert_eq!(raster.pixels, vec![0xF0, 0x00, 0x00, 0xF0]);
}


#[test]
fn rgb565_matches_spec_formula() {
	// p = 0xF800 -> pure red
	let data = vec![0x00, 0xF8];
	let raster = PixelDecoder::decode(4, 1, 1, &data).unwrap();
	assert_eq!(raster.pixels, vec![0xF8, 0x00, 0x00]);
	assert_eq!(raster.color_model, ColorModel::Rgb);
}


#[test]
fn rgba5551_alpha_bit_is_expanded_to_full_byte() {
	// p = 0x0001 -> a bit set, all colors zero
	let data = vec![0x01, 0x00];
	let raster = PixelDecoder::decode(3, 1, 1, &data).unwrap();
	assert_eq!(raster.pixels, vec![0x00, 0x00, 0x00, 0xFF]);
}


#[test]
fn buffer_size_mismatch_is_rejected() {
	let data = vec![0u8; 3];
	let err = PixelDecoder::decode(0, 2, 2, &data).unwrap_err();
	assert!(matches!(err, PixelBufferSize(2, 2, 0, 16, 3)));
}


#[test]
fn unknown_sub_type_is_rejected() {
	let err = PixelDecoder::decode(200, 1, 1, &[0u8]).unwrap_err();
	assert_eq!(err, UnknownPixelSubType(200));
}
