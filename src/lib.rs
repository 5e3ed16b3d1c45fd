pub mod answer;
pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod sources;

pub use backend::{ModelAnswer, ModelBackend, ModelGateway};
pub use config::Settings;
pub use error::{LaiserError, LaiserResult};
pub use pipeline::Pipeline;
pub use sources::{SourceFormat, SourceLinks};
