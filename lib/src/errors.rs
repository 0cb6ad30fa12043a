use age_core::{ModelError, PreprocessError};
use axum::{
	extract::multipart::MultipartError,
	http::StatusCode,
	response::{Html, IntoResponse, Response},
};
use minijinja::context;

use crate::templates;

/// A request-local failure, rendered as an HTML error page.
#[derive(Debug)]
pub struct HTTPError {
	message: String,
	status_code: StatusCode,
}

impl HTTPError {
	pub fn new(message: &str) -> Self {
		Self {
			message: message.to_string(),
			status_code: StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub const fn with_status(mut self, status_code: StatusCode) -> Self {
		self.status_code = status_code;
		self
	}

	#[cfg(test)]
	pub const fn status(&self) -> StatusCode {
		self.status_code
	}
}

impl IntoResponse for HTTPError {
	fn into_response(self) -> Response {
		if self.status_code.is_server_error() {
			tracing::error!("{}: {}", self.status_code, self.message);
		} else {
			tracing::debug!("{}: {}", self.status_code, self.message);
		}

		let page = templates::render(
			"error.html",
			context! { status => self.status_code.to_string(), message => &self.message },
		);

		match page {
			Ok(html) => (self.status_code, Html(html)).into_response(),
			Err(error) => {
				tracing::error!("Failed to render error page: {error}");
				(self.status_code, self.message).into_response()
			},
		}
	}
}

impl From<PreprocessError> for HTTPError {
	fn from(e: PreprocessError) -> Self {
		match e {
			PreprocessError::Decode(_) => Self::new("The uploaded file is not a readable image.")
				.with_status(StatusCode::BAD_REQUEST),
			PreprocessError::Io(e) => Self::new(&format!("Failed to read the uploaded file: {e}")),
		}
	}
}

impl From<ModelError> for HTTPError {
	fn from(e: ModelError) -> Self {
		Self::new(&e.to_string())
	}
}

impl From<MultipartError> for HTTPError {
	fn from(e: MultipartError) -> Self {
		Self::new(&format!("Invalid upload: {e}")).with_status(StatusCode::BAD_REQUEST)
	}
}

impl From<std::io::Error> for HTTPError {
	fn from(e: std::io::Error) -> Self {
		Self::new(&format!("Failed to store the uploaded file: {e}"))
	}
}

impl From<tokio::task::JoinError> for HTTPError {
	fn from(e: tokio::task::JoinError) -> Self {
		Self::new(&format!("Prediction task failed: {e}"))
	}
}

impl From<minijinja::Error> for HTTPError {
	fn from(e: minijinja::Error) -> Self {
		Self::new(&format!("Failed to render page: {e}"))
	}
}
