const BLOCK: usize = 32;

/// Reassembles a 32×32-block-major pixel payload into a row-major raster.
/// See SPEC_FULL.md §4.8.
pub struct Deswizzler;

impl Deswizzler {
	/// `input` holds pixel rows for each super-block in turn, each row
	/// already clipped to `width`; `output` is allocated by the caller to
	/// `width * height * bytes_per_pixel`.
	pub fn deswizzle(input: &[u8], width: usize, height: usize, bytes_per_pixel: usize) -> Vec<u8> {
		let mut output = vec![0u8; width * height * bytes_per_pixel];
		let mut cursor = 0usize;

		let mut by = 0usize;
		while by < height {
			let mut bx = 0usize;
			while bx < width {
				let row_pixels = std::cmp::min(BLOCK, width - bx);
				let row_bytes = row_pixels * bytes_per_pixel;

				for y in by..std::cmp::min(by + BLOCK, height) {
					let dest = (bx + y * width) * bytes_per_pixel;
					output[dest..dest + row_bytes].copy_from_slice(&input[cursor..cursor + row_bytes]);
					cursor += row_bytes;
				}

				bx += BLOCK;
			}
			by += BLOCK;
		}

		output
	}


	/// Inverse of [`Deswizzler::deswizzle`]; used only by the round-trip
	/// test below (no production caller needs to re-swizzle an output).
	pub fn swizzle(input: &[u8], width: usize, height: usize, bytes_per_pixel: usize) -> Vec<u8> {
		let mut output = Vec::with_capacity(input.len());

		let mut by = 0usize;
		while by < height {
			let mut bx = 0usize;
			while bx < width {
				let row_pixels = std::cmp::min(BLOCK, width - bx);
				let row_bytes = row_pixels * bytes_per_pixel;

				for y in by..std::cmp::min(by + BLOCK, height) {
					let src = (bx + y * width) * bytes_per_pixel;
					output.extend_from_slice(&input[src..src + row_bytes]);
				}

				bx += BLOCK;
			}
			by += BLOCK;
		}

		output
	}
}


#[test]
fn deswizzle_two_blocks_side_by_side() {
	// Two 32x32 RGBA8888 blocks, each filled with a distinct constant byte,
	// concatenated in x-major super-block order.
	let bpp = 4;
	let mut input = Vec::new();
	input.extend(std::iter::repeat(0xAAu8).take(32 * 32 * bpp));
	input.extend(std::iter::repeat(0xBBu8).take(32 * 32 * bpp));

	let output = Deswizzler::deswizzle(&input, 64, 32, bpp);
	assert_eq!(output.len(), 64 * 32 * bpp);

	// First pixel of row 0 should come from block A, pixel 32 of row 0 from block B.
	assert_eq!(output[0], 0xAA);
	assert_eq!(output[32 * bpp], 0xBB);
	// Last row, last pixel of block B.
	let last_pixel = ((63 + 31 * 64) * bpp) as usize;
	assert_eq!(output[last_pixel], 0xBB);
}


#[test]
fn deswizzle_then_swizzle_is_identity() {
	let bpp = 2;
	let width = 48;
	let height = 40;
	let swizzled: Vec<u8> = (0..width * height * bpp).map(|i| (i % 256) as u8).collect();

	let deswizzled = Deswizzler::deswizzle(&swizzled, width, height, bpp);
	let reswizzled = Deswizzler::swizzle(&deswizzled, width, height, bpp);

	assert_eq!(reswizzled, swizzled);
}
