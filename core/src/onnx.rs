use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

use crate::{
	model::{AgeModel, ModelError, Prediction},
	preprocess::{FaceTensor, INPUT_SIZE},
};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// An age model exported to ONNX, run on the CPU with tract.
///
/// The plan is immutable once built, so a single instance can serve concurrent predictions.
pub struct OnnxModel {
	plan: Plan,
	path: PathBuf,
}

impl OnnxModel {
	/// Load and optimize the ONNX graph at `path`, pinning its input to `f32 [1, 48, 48, 1]`.
	///
	/// # Errors
	///
	/// Returns [`ModelError::NotFound`] if there is no file at `path`, or [`ModelError::Load`]
	/// if the graph cannot be parsed or optimized.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
		let path = path.as_ref();
		if !path.is_file() {
			return Err(ModelError::NotFound(path.to_path_buf()));
		}

		tracing::debug!("Loading ONNX model from {}", path.display());
		let side = INPUT_SIZE as usize;
		let plan = tract_onnx::onnx()
			.model_for_path(path)
			.and_then(|model| model.with_input_fact(0, f32::fact([1, side, side, 1]).into()))
			.and_then(|model| model.into_optimized())
			.and_then(|model| model.into_runnable())
			.map_err(ModelError::Load)?;

		tracing::info!("Loaded model from {}", path.display());
		Ok(Self {
			plan,
			path: path.to_path_buf(),
		})
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl std::fmt::Debug for OnnxModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OnnxModel")
			.field("path", &self.path)
			.finish_non_exhaustive()
	}
}

impl AgeModel for OnnxModel {
	fn predict(&self, input: &FaceTensor) -> Result<Prediction, ModelError> {
		let tensor: Tensor = input.as_array().clone().into_tensor();
		let outputs = self
			.plan
			.run(tvec!(tensor.into()))
			.map_err(ModelError::Inference)?;

		let output = outputs.first().ok_or(ModelError::EmptyOutput)?;
		let values = output
			.to_array_view::<f32>()
			.map_err(ModelError::Inference)?;

		Ok(Prediction::new(values.to_owned()))
	}
}
