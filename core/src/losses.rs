use std::collections::HashMap;

use crate::model::ModelError;

/// A loss or metric over paired ground-truth and predicted values.
pub type LossFn = fn(&[f32], &[f32]) -> f32;

/// Mean of squared differences. Empty input yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(y_true: &[f32], y_pred: &[f32]) -> f32 {
	if y_true.is_empty() {
		return 0.0;
	}

	let sum: f32 = y_true
		.iter()
		.zip(y_pred)
		.map(|(t, p)| (t - p).powi(2))
		.sum();

	sum / y_true.len() as f32
}

/// Mean of absolute differences. Empty input yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(y_true: &[f32], y_pred: &[f32]) -> f32 {
	if y_true.is_empty() {
		return 0.0;
	}

	let sum: f32 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();

	sum / y_true.len() as f32
}

/// Named loss and metric functions.
///
/// Saved training configurations refer to losses by string key, including the
/// `custom_mse` alias the age model was trained with, so every name a config
/// may mention has to be resolvable here.
#[derive(Debug, Clone)]
pub struct LossRegistry {
	symbols: HashMap<String, LossFn>,
}

impl LossRegistry {
	/// An empty registry.
	#[must_use]
	pub fn new() -> Self {
		Self {
			symbols: HashMap::new(),
		}
	}

	/// Register `function` under `name`, replacing any previous entry.
	pub fn register(&mut self, name: impl Into<String>, function: LossFn) -> &mut Self {
		self.symbols.insert(name.into(), function);
		self
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.symbols.contains_key(name)
	}

	/// Look up a function by name.
	///
	/// # Errors
	///
	/// Returns [`ModelError::UnknownSymbol`] if nothing is registered under `name`.
	pub fn resolve(&self, name: &str) -> Result<LossFn, ModelError> {
		self.symbols
			.get(name)
			.copied()
			.ok_or_else(|| ModelError::UnknownSymbol(name.to_string()))
	}
}

impl Default for LossRegistry {
	fn default() -> Self {
		let mut registry = Self::new();
		registry
			.register("custom_mse", mean_squared_error)
			.register("MeanSquaredError", mean_squared_error)
			.register("mean_squared_error", mean_squared_error)
			.register("mse", mean_squared_error)
			.register("MeanAbsoluteError", mean_absolute_error)
			.register("mean_absolute_error", mean_absolute_error)
			.register("mae", mean_absolute_error);

		registry
	}
}
