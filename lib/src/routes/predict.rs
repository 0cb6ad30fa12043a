use axum::{
	body::Bytes,
	extract::{multipart::MultipartRejection, Multipart},
	response::Html,
	Extension,
};
use minijinja::context;

use super::{pages, Extension as ExtractState};
use crate::{errors::HTTPError, helpers::with_timing, templates};

struct UploadedFile {
	filename: String,
	bytes: Bytes,
}

/// Handle an image upload: store it, estimate the age and render the result.
///
/// Requests without a usable `file` field get the landing page back.
pub async fn upload(
	Extension(state): ExtractState,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, HTTPError> {
	let mut multipart = match multipart {
		Ok(multipart) => multipart,
		Err(rejection) => {
			tracing::debug!("Upload is not a multipart form ({rejection}), showing landing page.");
			return pages::index().await;
		},
	};

	let Some(file) = read_file_field(&mut multipart).await? else {
		tracing::debug!("No file in upload, showing landing page.");
		return pages::index().await;
	};

	let path = state.uploads.save(&file.filename, &file.bytes).await?;
	tracing::debug!("Saved upload {:?} to {}", file.filename, path.display());

	let model = state.model.clone();
	let image = path.clone();
	let (age, predict_time) = tokio::task::spawn_blocking(move || {
		with_timing(|| -> Result<i32, HTTPError> {
			let input = age_core::preprocess(&image)?;
			Ok(model.predict(&input)?.age()?)
		})
	})
	.await?;
	let age = age?;

	tracing::info!(
		"Predicted age {age} for {} in {:.2}ms",
		path.display(),
		predict_time.as_secs_f64() * 1000.0
	);

	Ok(Html(templates::render(
		"result.html",
		context! {
			age => age,
			image => path.display().to_string(),
			image_url => state.uploads.url_for(&path),
		},
	)?))
}

/// Pull the `file` field out of the form, skipping any other fields.
///
/// A file input submitted without a selection arrives with an empty filename, which counts as
/// no file.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, HTTPError> {
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some("file") {
			continue;
		}

		let filename = field.file_name().unwrap_or_default().to_string();
		let bytes = field.bytes().await?;

		if filename.is_empty() {
			return Ok(None);
		}

		return Ok(Some(UploadedFile { filename, bytes }));
	}

	Ok(None)
}
