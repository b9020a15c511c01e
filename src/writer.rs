use std::path::Path;

use crate::raster::{ColorModel, Raster};
use crate::AssetResult;

/// Encodes a [`Raster`] as PNG via the `image` crate. Never touches pixel
/// data beyond handing it to the matching `image` buffer type.
pub struct PngWriter;

impl PngWriter {
	/// `{base_name}_{index}.png`, for inline chunks (§4.5 step 4).
	pub fn write(output_dir: &Path, base_name: &str, index: usize, raster: &Raster) -> AssetResult<()> {
		let path = output_dir.join(format!("{}_{}.png", base_name, index));
		Self::save(&path, raster)
	}


	/// `{base_name}.png`, for standalone SCTX/KTX/tag-45/tag-47 outputs.
	pub fn write_standalone(output_dir: &Path, base_name: &str, raster: &Raster) -> AssetResult<()> {
		let path = output_dir.join(format!("{}.png", base_name));
		Self::save(&path, raster)
	}


	fn save(path: &Path, raster: &Raster) -> AssetResult<()> {
		let width = raster.width as u32;
		let height = raster.height as u32;

		match raster.color_model {
			ColorModel::Rgba => {
				let image = image::RgbaImage::from_raw(width, height, raster.pixels.clone())
					.expect("Raster invariant guarantees pixels.len() == width*height*4");
				image.save_with_format(path, image::ImageFormat::Png)?;
			},

			ColorModel::Rgb => {
				let image = image::RgbImage::from_raw(width, height, raster.pixels.clone())
					.expect("Raster invariant guarantees pixels.len() == width*height*3");
				image.save_with_format(path, image::ImageFormat::Png)?;
			},

			ColorModel::La => {
				let image = image::GrayAlphaImage::from_raw(width, height, raster.pixels.clone())
					.expect("Raster invariant guarantees pixels.len() == width*height*2");
				image.save_with_format(path, image::ImageFormat::Png)?;
			},

			ColorModel::L => {
				let image = image::GrayImage::from_raw(width, height, raster.pixels.clone())
					.expect("Raster invariant guarantees pixels.len() == width*height");
				image.save_with_format(path, image::ImageFormat::Png)?;
			},
		}

		Ok(())
	}
}


/// Writes a decompressed byte sequence verbatim.
pub struct RawWriter;

impl RawWriter {
	pub fn write(output_dir: &Path, base_name: &str, extension: &str, data: &[u8]) -> AssetResult<()> {
		let path = output_dir.join(format!("{}{}", base_name, extension));
		std::fs::write(path, data)?;
		Ok(())
	}
}


#[test]
fn raw_writer_writes_exact_bytes() {
	let dir = std::env::temp_dir().join("sc_asset_raw_writer_test");
	std::fs::create_dir_all(&dir).unwrap();

	RawWriter::write(&dir, "table", ".csv", b"a,b\n1,2\n").unwrap();
	let written = std::fs::read(dir.join("table.csv")).unwrap();
	assert_eq!(written, b"a,b\n1,2\n");

	std::fs::remove_dir_all(&dir).unwrap();
}


#[test]
fn png_writer_round_trips_rgba_raster() {
	let dir = std::env::temp_dir().join("sc_asset_png_writer_test");
	std::fs::create_dir_all(&dir).unwrap();

	let raster = Raster::new(2, 2, ColorModel::Rgba, vec![
		0xFF, 0x00, 0x00, 0xFF,
		0x00, 0xFF, 0x00, 0xFF,
		0x00, 0x00, 0xFF, 0xFF,
		0xFF, 0xFF, 0xFF, 0xFF,
	]);

	PngWriter::write(&dir, "base", 0, &raster).unwrap();
	let decoded = image::open(dir.join("base_0.png")).unwrap().to_rgba8();
	assert_eq!(decoded.as_raw(), &raster.pixels);

	std::fs::remove_dir_all(&dir).unwrap();
}
