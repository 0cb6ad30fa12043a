use image::{
	imageops::{self, FilterType},
	GrayImage,
};
use std::{io, path::Path};
use tract_onnx::prelude::tract_ndarray::Array4;

/// Side length, in pixels, of the square grayscale input the model expects.
pub const INPUT_SIZE: u32 = 48;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
	#[error("Failed to read image: {0}")]
	Io(#[from] io::Error),

	#[error("Failed to decode image: {0}")]
	Decode(#[from] image::ImageError),
}

/// A normalized `(1, 48, 48, 1)` model input, NHWC, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceTensor(Array4<f32>);

impl FaceTensor {
	/// Resize a grayscale image to the model input size and scale it into `[0, 1]`.
	///
	/// The whole frame is resized; no cropping or alignment happens here.
	#[must_use]
	#[allow(clippy::cast_possible_truncation)]
	pub fn from_luma(image: &GrayImage) -> Self {
		let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
		let side = INPUT_SIZE as usize;

		Self(Array4::from_shape_fn((1, side, side, 1), |(_, y, x, _)| {
			f32::from(resized.get_pixel(x as u32, y as u32)[0]) / 255.0
		}))
	}

	#[must_use]
	pub fn shape(&self) -> &[usize] {
		self.0.shape()
	}

	#[must_use]
	pub const fn as_array(&self) -> &Array4<f32> {
		&self.0
	}

	#[must_use]
	pub fn into_array(self) -> Array4<f32> {
		self.0
	}
}

/// Decode the image at `path` and turn it into a model input.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not contain a decodable image.
pub fn preprocess(path: impl AsRef<Path>) -> Result<FaceTensor, PreprocessError> {
	let bytes = std::fs::read(path)?;

	preprocess_bytes(&bytes)
}

/// Decode an in-memory image and turn it into a model input.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn preprocess_bytes(bytes: &[u8]) -> Result<FaceTensor, PreprocessError> {
	let image = image::load_from_memory(bytes)?;

	Ok(FaceTensor::from_luma(&image.to_luma8()))
}
