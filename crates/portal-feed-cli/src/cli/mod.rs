pub mod commands;
pub mod logging;
pub mod render;

pub use commands::{execute, watch, CommandOutput, FeedCommand};
pub use logging::init_tracing;
