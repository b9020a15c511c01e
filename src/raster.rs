/// Which channels `Raster::pixels` carries, and therefore how the writer
/// constructs an `image` buffer from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
	Rgba,
	Rgb,
	La,
	L,
}

impl ColorModel {
	pub fn channels(self) -> usize {
		match self {
			ColorModel::Rgba => 4,
			ColorModel::Rgb => 3,
			ColorModel::La => 2,
			ColorModel::L => 1,
		}
	}
}


/// A decoded image: dimensions, channel layout, and row-major pixel bytes.
/// The common currency between C6/C7/C8 and C9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
	pub width: u16,
	pub height: u16,
	pub color_model: ColorModel,
	pub pixels: Vec<u8>,
}

impl Raster {
	pub fn new(width: u16, height: u16, color_model: ColorModel, pixels: Vec<u8>) -> Self {
		Self { width, height, color_model, pixels }
	}


	pub fn expected_len(&self) -> usize {
		self.width as usize * self.height as usize * self.color_model.channels()
	}
}


#[test]
fn channel_counts_match_color_models() {
	assert_eq!(ColorModel::Rgba.channels(), 4);
	assert_eq!(ColorModel::Rgb.channels(), 3);
	assert_eq!(ColorModel::La.channels(), 2);
	assert_eq!(ColorModel::L.channels(), 1);
}


#[test]
fn expected_len_multiplies_dimensions_by_channels() {
	let raster = Raster::new(4, 3, ColorModel::Rgba, vec![0u8; 48]);
	assert_eq!(raster.expected_len(), 48);
}
