use lazy_static::lazy_static;
use minijinja::Environment;
use serde::Serialize;

const SOURCES: [(&str, &str); 5] = [
	("base.html", include_str!("../templates/base.html")),
	("index.html", include_str!("../templates/index.html")),
	("about.html", include_str!("../templates/about.html")),
	("result.html", include_str!("../templates/result.html")),
	("error.html", include_str!("../templates/error.html")),
];

lazy_static! {
	static ref ENVIRONMENT: Environment<'static> = environment();
}

fn environment() -> Environment<'static> {
	let mut env = Environment::new();

	for (name, source) in SOURCES {
		if let Err(error) = env.add_template(name, source) {
			tracing::error!("Failed to parse template {name}: {error}");
		}
	}

	env
}

/// Make sure every embedded template parsed.
///
/// # Errors
///
/// Returns the first template that failed to parse.
pub fn check() -> Result<(), minijinja::Error> {
	for (name, _) in SOURCES {
		ENVIRONMENT.get_template(name)?;
	}

	Ok(())
}

/// Render the embedded template `name` with `ctx`.
///
/// # Errors
///
/// Returns an error if the template does not exist or fails to render.
pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String, minijinja::Error> {
	ENVIRONMENT.get_template(name)?.render(ctx)
}
