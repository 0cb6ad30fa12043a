use age_core::{AgeModel, CompileConfig, CompiledModel, LossRegistry, OnnxModel};
use anyhow::{Context, Result};
use axum::Server;
use std::{path::PathBuf, sync::Arc};

use crate::{
	config::Config,
	provision,
	routes::{self, AppState},
	shutdown, templates,
	uploads::UploadDir,
};

/// Provision and load the model, then serve requests until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the model cannot be fetched or loaded, the upload directory cannot be
/// created, or the server fails to bind.
pub async fn start(config: Config) -> Result<()> {
	templates::check()?;

	let model = load_model(&config).await?;
	let uploads = UploadDir::create(&config.upload_dir)
		.await
		.with_context(|| {
			format!(
				"Failed to create upload directory {}",
				config.upload_dir.display()
			)
		})?;

	let router = routes::handler(AppState { model, uploads }, config.max_upload_bytes);

	let addr = config.addr();
	tracing::info!("Starting server on {addr}...");
	Server::try_bind(&addr)?
		.serve(router.into_make_service())
		.with_graceful_shutdown(shutdown::signal())
		.await?;

	Ok(())
}

/// Fetch the model artifact if needed, then load and compile it.
///
/// # Errors
///
/// Returns an error if the artifact is missing and cannot be downloaded, or fails to load.
pub async fn load_model(config: &Config) -> Result<Arc<dyn AgeModel>> {
	provision::ensure_model(&config.model_path, config.model_url.as_ref()).await?;

	let path = config.model_path.clone();
	let model = tokio::task::spawn_blocking(move || {
		let model = OnnxModel::load(&path)?;
		CompiledModel::compile(model, &CompileConfig::default(), &LossRegistry::default())
	})
	.await??;

	tracing::info!("Model loaded and compiled, loss: {}", model.loss_name());
	Ok(Arc::new(model))
}

/// Estimate the age for a single image on disk, outside of the server.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded or the image cannot be processed.
pub async fn predict_file(config: &Config, image: PathBuf) -> Result<i32> {
	let model = load_model(config).await?;

	let age = tokio::task::spawn_blocking(move || -> Result<i32> {
		let input = age_core::preprocess(&image)
			.with_context(|| format!("Failed to preprocess {}", image.display()))?;

		Ok(model.predict(&input)?.age()?)
	})
	.await??;

	Ok(age)
}
