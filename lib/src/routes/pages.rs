use axum::response::Html;
use minijinja::context;

use crate::{errors::HTTPError, templates};

pub const ABOUT_TITLE: &str = "Tentang Aplikasi";
pub const ABOUT_DESCRIPTION: &str = "Aplikasi Identifikasi Umur adalah aplikasi berbasis web yang memanfaatkan teknologi Convolutional Neural Network (CNN) untuk melakukan prediksi umur seseorang berdasarkan gambar wajah mereka.";

#[allow(clippy::unused_async)]
pub async fn index() -> Result<Html<String>, HTTPError> {
	Ok(Html(templates::render("index.html", context! {})?))
}

#[allow(clippy::unused_async)]
pub async fn about() -> Result<Html<String>, HTTPError> {
	Ok(Html(templates::render(
		"about.html",
		context! { title => ABOUT_TITLE, description => ABOUT_DESCRIPTION },
	)?))
}
