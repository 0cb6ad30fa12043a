#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod losses;
pub mod model;
pub mod onnx;
pub mod preprocess;

pub use losses::LossRegistry;
pub use model::{
	Adam, AgeModel, CompileConfig, CompiledModel, Evaluation, ModelError, Optimizer, Prediction,
};
pub use onnx::OnnxModel;
pub use preprocess::{preprocess, preprocess_bytes, FaceTensor, PreprocessError, INPUT_SIZE};
pub use tract_onnx::prelude::tract_ndarray as ndarray;
