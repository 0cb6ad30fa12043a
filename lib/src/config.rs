use anyhow::{Context, Result};
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL_PATH: &str = "model_age_cnn.onnx";
pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub port: u16,
	pub model_path: PathBuf,
	/// Where to fetch the ONNX artifact from when `model_path` does not exist yet.
	pub model_url: Option<Url>,
	pub upload_dir: PathBuf,
	pub max_upload_bytes: usize,
}

impl Config {
	/// Read the configuration from environment variables.
	///
	/// # Errors
	///
	/// Returns an error if `MODEL_URL` is set to something that is not a valid URL.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let model_url = lookup("MODEL_URL")
			.filter(|url| !url.trim().is_empty())
			.map(|url| {
				Url::parse(url.trim()).with_context(|| format!("MODEL_URL is not a valid URL: {url}"))
			})
			.transpose()?;

		Ok(Self {
			port: parse_or("PORT", lookup("PORT"), DEFAULT_PORT),
			model_path: lookup("MODEL_PATH")
				.map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from),
			model_url,
			upload_dir: lookup("UPLOAD_DIR")
				.map_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR), PathBuf::from),
			max_upload_bytes: parse_or(
				"MAX_UPLOAD_BYTES",
				lookup("MAX_UPLOAD_BYTES"),
				DEFAULT_MAX_UPLOAD_BYTES,
			),
		})
	}

	/// Address to listen on: every interface, on the configured port.
	#[must_use]
	pub fn addr(&self) -> SocketAddr {
		SocketAddr::from(([0, 0, 0, 0], self.port))
	}
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, value: Option<String>, default: T) -> T {
	let Some(value) = value else {
		return default;
	};

	value.trim().parse().unwrap_or_else(|_| {
		tracing::warn!("Ignoring invalid {key}={value:?}, using {default}");
		default
	})
}
