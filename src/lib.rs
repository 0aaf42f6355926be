pub mod color;
pub mod config;
pub mod console;
pub mod data;
pub mod endpoint;
pub mod error;
pub mod media;
pub mod progress;
pub mod screen;
pub(crate) mod utils;
