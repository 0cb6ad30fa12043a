#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub use config::Config;
pub use server::{load_model, predict_file, start};

pub mod config;
mod errors;
mod helpers;
pub mod provision;
mod routes;
mod server;
mod shutdown;
mod templates;
pub mod uploads;
