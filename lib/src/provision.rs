use age_core::OnnxModel;
use anyhow::{bail, Context, Result};
use std::{
	ffi::OsString,
	path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

/// Make sure a model artifact exists at `path`, downloading it from `url` if it doesn't.
///
/// Returns `true` if a download happened. The body is written next to `path` first and only
/// moved into place once it has been received completely and loads as a model.
///
/// # Errors
///
/// Returns an error if the artifact is missing and no `url` is given, the download fails, the
/// server answers with a non-success status, the body is not a loadable model, or the artifact
/// cannot be written to disk.
pub async fn ensure_model(path: &Path, url: Option<&Url>) -> Result<bool> {
	if fs::try_exists(path).await? {
		tracing::debug!("Model artifact already present at {}", path.display());
		return Ok(false);
	}

	let Some(url) = url else {
		bail!(
			"No model artifact at {} and MODEL_URL is not set",
			path.display()
		);
	};

	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).await?;
	}

	tracing::info!("Downloading model from {url} to {}...", path.display());
	let partial = partial_path(path);

	if let Err(error) = fetch(url, &partial).await {
		fs::remove_file(&partial).await.ok();
		return Err(error);
	}

	fs::rename(&partial, path).await?;
	tracing::info!("Model downloaded to {}", path.display());

	Ok(true)
}

async fn fetch(url: &Url, destination: &Path) -> Result<()> {
	download(url, destination).await?;

	let candidate = destination.to_path_buf();
	tokio::task::spawn_blocking(move || OnnxModel::load(candidate))
		.await?
		.with_context(|| format!("Downloaded artifact from {url} is not a loadable model"))?;

	Ok(())
}

async fn download(url: &Url, destination: &Path) -> Result<()> {
	let mut response = reqwest::get(url.clone())
		.await?
		.error_for_status()
		.with_context(|| format!("Failed to download model from {url}"))?;

	let mut file = fs::File::create(destination).await?;
	while let Some(chunk) = response.chunk().await? {
		file.write_all(&chunk).await?;
	}
	file.sync_all().await?;

	Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map_or_else(OsString::new, ToOwned::to_owned);
	name.push(".part");

	path.with_file_name(name)
}
