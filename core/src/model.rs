use std::path::PathBuf;
use tract_onnx::prelude::tract_ndarray::ArrayD;

use crate::{
	losses::{LossFn, LossRegistry},
	preprocess::FaceTensor,
};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
	#[error("Model artifact not found at {}", .0.display())]
	NotFound(PathBuf),

	#[error("Failed to load model: {0}")]
	Load(#[source] anyhow::Error),

	#[error("Failed to run prediction: {0}")]
	Inference(#[source] anyhow::Error),

	#[error("Model returned an empty output")]
	EmptyOutput,

	#[error("No loss or metric registered as `{0}`")]
	UnknownSymbol(String),

	#[error("Expected {expected} targets, got {actual}")]
	Shape { expected: usize, actual: usize },
}

/// A loaded age regression model
pub trait AgeModel: Send + Sync {
	/// Run a forward pass over a single preprocessed face.
	///
	/// # Errors
	///
	/// Returns an error if inference fails.
	fn predict(&self, input: &FaceTensor) -> Result<Prediction, ModelError>;
}

/// Raw output of a forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction(ArrayD<f32>);

impl Prediction {
	#[must_use]
	pub const fn new(output: ArrayD<f32>) -> Self {
		Self(output)
	}

	#[must_use]
	pub const fn output(&self) -> &ArrayD<f32> {
		&self.0
	}

	/// The first scalar of the output, in logical order.
	///
	/// # Errors
	///
	/// Returns [`ModelError::EmptyOutput`] if the output holds no values.
	pub fn first(&self) -> Result<f32, ModelError> {
		self.0.iter().next().copied().ok_or(ModelError::EmptyOutput)
	}

	/// The estimated age, truncated toward zero.
	///
	/// # Errors
	///
	/// Returns [`ModelError::EmptyOutput`] if the output holds no values.
	#[allow(clippy::cast_possible_truncation)]
	pub fn age(&self) -> Result<i32, ModelError> {
		self.first().map(|value| value as i32)
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adam {
	pub learning_rate: f32,
	pub beta_1: f32,
	pub beta_2: f32,
	pub epsilon: f32,
}

impl Default for Adam {
	fn default() -> Self {
		Self {
			learning_rate: 0.001,
			beta_1: 0.9,
			beta_2: 0.999,
			epsilon: 1e-7,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Optimizer {
	Adam(Adam),
}

/// Training configuration attached to a loaded model.
///
/// Loss and metrics are looked up by name in a [`LossRegistry`] when compiling.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileConfig {
	pub optimizer: Optimizer,
	pub loss: String,
	pub metrics: Vec<String>,
}

impl Default for CompileConfig {
	fn default() -> Self {
		Self {
			optimizer: Optimizer::Adam(Adam::default()),
			loss: "mean_squared_error".to_string(),
			metrics: vec!["mae".to_string()],
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
	pub loss: f32,
	pub metrics: Vec<(String, f32)>,
}

impl Evaluation {
	#[must_use]
	pub fn metric(&self, name: &str) -> Option<f32> {
		self.metrics
			.iter()
			.find(|(metric, _)| metric == name)
			.map(|(_, value)| *value)
	}
}

/// A model with its loss, metrics and optimizer resolved.
///
/// Prediction goes straight to the wrapped model; the compiled functions are only used by
/// [`CompiledModel::evaluate`].
#[derive(Debug)]
pub struct CompiledModel<M> {
	model: M,
	optimizer: Optimizer,
	loss: (String, LossFn),
	metrics: Vec<(String, LossFn)>,
}

impl<M: AgeModel> CompiledModel<M> {
	/// Attach `config` to `model`, resolving every named function through `registry`.
	///
	/// # Errors
	///
	/// Returns [`ModelError::UnknownSymbol`] if the loss or a metric is not registered.
	pub fn compile(
		model: M,
		config: &CompileConfig,
		registry: &LossRegistry,
	) -> Result<Self, ModelError> {
		let loss = (config.loss.clone(), registry.resolve(&config.loss)?);
		let metrics = config
			.metrics
			.iter()
			.map(|name| Ok((name.clone(), registry.resolve(name)?)))
			.collect::<Result<Vec<_>, ModelError>>()?;

		tracing::debug!(
			"Compiled model with loss {} and metrics {:?}",
			loss.0,
			config.metrics
		);

		Ok(Self {
			model,
			optimizer: config.optimizer,
			loss,
			metrics,
		})
	}

	pub const fn optimizer(&self) -> &Optimizer {
		&self.optimizer
	}

	pub fn loss_name(&self) -> &str {
		&self.loss.0
	}

	pub const fn inner(&self) -> &M {
		&self.model
	}

	/// Score the model on labelled faces with the compiled loss and metrics.
	///
	/// # Errors
	///
	/// Returns an error if `inputs` and `targets` differ in length or a prediction fails.
	pub fn evaluate(&self, inputs: &[FaceTensor], targets: &[f32]) -> Result<Evaluation, ModelError> {
		if inputs.len() != targets.len() {
			return Err(ModelError::Shape {
				expected: inputs.len(),
				actual: targets.len(),
			});
		}

		let predicted = inputs
			.iter()
			.map(|input| self.model.predict(input)?.first())
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Evaluation {
			loss: (self.loss.1)(targets, &predicted),
			metrics: self
				.metrics
				.iter()
				.map(|(name, metric)| (name.clone(), metric(targets, &predicted)))
				.collect(),
		})
	}
}

impl<M: AgeModel> AgeModel for CompiledModel<M> {
	fn predict(&self, input: &FaceTensor) -> Result<Prediction, ModelError> {
		self.model.predict(input)
	}
}
