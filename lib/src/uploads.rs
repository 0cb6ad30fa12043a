use itertools::Itertools;
use std::{
	io,
	path::{Path, PathBuf},
};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const WINDOWS_DEVICE_FILES: [&str; 22] = [
	"CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
	"COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a client-supplied filename to something safe to join onto a directory.
///
/// Accented characters are decomposed to their ASCII base letter, path separators become word
/// breaks, whitespace runs become `_`, and anything outside `[A-Za-z0-9_.-]` is dropped. The result never contains a separator, so it cannot escape
/// the directory it is joined to. It may be empty.
#[must_use]
pub fn secure_filename(filename: &str) -> String {
	let words = filename
		.nfkd()
		.filter(char::is_ascii)
		.map(|c| if c == '/' || c == '\\' { ' ' } else { c })
		.collect::<String>();

	let cleaned = words
		.split_whitespace()
		.join("_")
		.chars()
		.filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
		.collect::<String>();

	let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
	let stem = cleaned.split('.').next().unwrap_or_default();

	if WINDOWS_DEVICE_FILES.contains(&stem.to_ascii_uppercase().as_str()) {
		return format!("_{cleaned}");
	}

	cleaned.to_string()
}

/// Directory uploaded images are written to.
#[derive(Debug, Clone)]
pub struct UploadDir {
	root: PathBuf,
}

impl UploadDir {
	/// Use `root` for uploads, creating it if needed.
	///
	/// # Errors
	///
	/// Returns an error if the directory cannot be created.
	pub async fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
		let root = root.into();
		tokio::fs::create_dir_all(&root).await?;

		Ok(Self { root })
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Write `bytes` under the sanitized form of `filename` and return where they landed.
	///
	/// Uploads that sanitize to the same name replace each other.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be written.
	pub async fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
		let mut name = secure_filename(filename);
		if name.is_empty() {
			name = format!("upload-{}", Uuid::new_v4().simple());
		}

		let path = self.root.join(name);
		tokio::fs::write(&path, bytes).await?;

		Ok(path)
	}

	/// Public URL of a saved upload, as served under `/uploads`.
	#[must_use]
	pub fn url_for(&self, path: &Path) -> String {
		let name = path.file_name().unwrap_or_default().to_string_lossy();

		format!("/uploads/{name}")
	}
}
