use age_core::AgeModel;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::uploads::UploadDir;

pub mod pages;
pub mod predict;

/// Long-lived state shared read-only by every request.
pub struct AppState {
	pub model: Arc<dyn AgeModel>,
	pub uploads: UploadDir,
}

pub type Extension = axum::Extension<Arc<AppState>>;

pub fn handler(state: AppState, max_upload_bytes: usize) -> Router {
	let uploads = ServeDir::new(state.uploads.root());

	Router::new()
		.route("/", get(pages::index).post(predict::upload))
		.route("/about", get(pages::about))
		.nest_service("/uploads", uploads)
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(axum::Extension(Arc::new(state)))
		.layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
	use super::*;
	use age_core::{ndarray::arr2, FaceTensor, ModelError, Prediction};
	use axum::{
		body::Body,
		http::{header, Method, Request, StatusCode},
	};
	use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
	use std::{env::temp_dir, io::Cursor, path::PathBuf};
	use tower::ServiceExt;
	use uuid::Uuid;

	const BOUNDARY: &str = "age-estimator-test-boundary";

	/// Predicts 100 times the mean brightness of the face.
	struct Brightness;

	impl AgeModel for Brightness {
		#[allow(clippy::cast_precision_loss)]
		fn predict(&self, input: &FaceTensor) -> Result<Prediction, ModelError> {
			let values = input.as_array();
			let mean = values.sum() / values.len() as f32;

			Ok(Prediction::new(arr2(&[[mean * 100.0]]).into_dyn()))
		}
	}

	struct Broken;

	impl AgeModel for Broken {
		fn predict(&self, _: &FaceTensor) -> Result<Prediction, ModelError> {
			Err(ModelError::EmptyOutput)
		}
	}

	struct TestApp {
		router: Router,
		root: PathBuf,
	}

	impl TestApp {
		async fn new(model: impl AgeModel + 'static) -> Self {
			let root = temp_dir().join(format!("age-estimator-{}", Uuid::new_v4()));
			let uploads = UploadDir::create(&root).await.unwrap();
			let state = AppState {
				model: Arc::new(model),
				uploads,
			};

			Self {
				router: handler(state, 10 * 1024 * 1024),
				root,
			}
		}

		async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
			let response = self.router.clone().oneshot(request).await.unwrap();
			let status = response.status();
			let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

			(status, String::from_utf8_lossy(&body).into_owned())
		}

		async fn get(&self, uri: &str) -> (StatusCode, String) {
			self.send(Request::get(uri).body(Body::empty()).unwrap())
				.await
		}
	}

	impl Drop for TestApp {
		fn drop(&mut self) {
			std::fs::remove_dir_all(&self.root).ok();
		}
	}

	/// Build a multipart POST to `/` from `(field, filename, bytes)` parts.
	fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
		let mut body = Vec::new();

		for (name, filename, bytes) in parts {
			let disposition = filename.map_or_else(
				|| format!("form-data; name=\"{name}\""),
				|filename| format!("form-data; name=\"{name}\"; filename=\"{filename}\""),
			);

			body.extend_from_slice(
				format!(
					"--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
				)
				.as_bytes(),
			);
			body.extend_from_slice(bytes);
			body.extend_from_slice(b"\r\n");
		}
		body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

		Request::builder()
			.method(Method::POST)
			.uri("/")
			.header(
				header::CONTENT_TYPE,
				format!("multipart/form-data; boundary={BOUNDARY}"),
			)
			.body(Body::from(body))
			.unwrap()
	}

	fn gray_png(level: u8) -> Vec<u8> {
		let mut bytes = Vec::new();
		DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([level])))
			.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
			.unwrap();

		bytes
	}

	#[tokio::test]
	async fn landing_page_has_an_upload_form() {
		let app = TestApp::new(Brightness).await;

		for _ in 0..3 {
			let (status, body) = app.get("/").await;

			assert_eq!(status, StatusCode::OK);
			assert!(body.contains(r#"enctype="multipart/form-data""#));
			assert!(body.contains(r#"name="file""#));
		}
	}

	#[tokio::test]
	async fn about_page_shows_title_and_description() {
		let app = TestApp::new(Brightness).await;
		let (status, body) = app.get("/about").await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(pages::ABOUT_TITLE));
		assert!(body.contains("Convolutional Neural Network (CNN)"));
	}

	#[tokio::test]
	async fn upload_renders_the_predicted_age() {
		let app = TestApp::new(Brightness).await;
		let png = gray_png(128);

		let (status, body) = app.send(multipart(&[("file", Some("face.png"), png.as_slice())])).await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(r#"<strong class="age">50</strong>"#), "{body}");
		assert!(body.contains("face.png"));
		assert_eq!(std::fs::read(app.root.join("face.png")).unwrap(), png);
	}

	#[tokio::test]
	async fn identical_uploads_get_identical_results() {
		let app = TestApp::new(Brightness).await;
		let png = gray_png(200);

		let (_, first) = app.send(multipart(&[("file", Some("same.png"), png.as_slice())])).await;
		let (_, second) = app.send(multipart(&[("file", Some("same.png"), png.as_slice())])).await;

		assert!(first.contains(r#"<strong class="age">78</strong>"#), "{first}");
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn other_fields_are_ignored() {
		let app = TestApp::new(Brightness).await;
		let png = gray_png(52);

		let (status, body) = app
			.send(multipart(&[
				("note", None, b"hello".as_slice()),
				("file", Some("face.png"), png.as_slice()),
			]))
			.await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(r#"<strong class="age">20</strong>"#), "{body}");
	}

	#[tokio::test]
	async fn missing_file_field_shows_the_landing_page() {
		let app = TestApp::new(Brightness).await;
		let (status, body) = app.send(multipart(&[("note", None, b"hello".as_slice())])).await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(r#"name="file""#));
		assert!(!body.contains(r#"class="age""#));
	}

	#[tokio::test]
	async fn empty_file_selection_shows_the_landing_page() {
		let app = TestApp::new(Brightness).await;
		let (status, body) = app.send(multipart(&[("file", Some(""), b"".as_slice())])).await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(r#"name="file""#));
		assert_eq!(std::fs::read_dir(&app.root).unwrap().count(), 0);
	}

	#[tokio::test]
	async fn non_multipart_posts_show_the_landing_page() {
		let app = TestApp::new(Brightness).await;
		let request = Request::builder()
			.method(Method::POST)
			.uri("/")
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from("file=face.png"))
			.unwrap();

		let (status, body) = app.send(request).await;

		assert_eq!(status, StatusCode::OK);
		assert!(body.contains(r#"name="file""#));
	}

	#[tokio::test]
	async fn traversal_filenames_stay_inside_the_upload_directory() {
		let app = TestApp::new(Brightness).await;
		let png = gray_png(128);

		let (status, _) = app
			.send(multipart(&[("file", Some("../../etc/passwd.jpg"), png.as_slice())]))
			.await;

		assert_eq!(status, StatusCode::OK);
		let saved: Vec<_> = std::fs::read_dir(&app.root)
			.unwrap()
			.map(|entry| entry.unwrap().file_name())
			.collect();
		assert_eq!(saved, vec![std::ffi::OsString::from("etc_passwd.jpg")]);
	}

	#[tokio::test]
	async fn undecodable_uploads_are_bad_requests() {
		let app = TestApp::new(Brightness).await;
		let (status, body) = app
			.send(multipart(&[("file", Some("notes.txt"), b"just some text".as_slice())]))
			.await;

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body.contains("400"));
	}

	#[tokio::test]
	async fn model_failures_are_server_errors() {
		let app = TestApp::new(Broken).await;
		let png = gray_png(128);

		let (status, _) = app.send(multipart(&[("file", Some("face.png"), png.as_slice())])).await;

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[tokio::test]
	async fn saved_uploads_are_served() {
		let app = TestApp::new(Brightness).await;
		let png = gray_png(90);
		app.send(multipart(&[("file", Some("face.png"), png.as_slice())])).await;

		let response = app
			.router
			.clone()
			.oneshot(Request::get("/uploads/face.png").body(Body::empty()).unwrap())
			.await
			.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
		assert_eq!(body.to_vec(), png);
	}
}
