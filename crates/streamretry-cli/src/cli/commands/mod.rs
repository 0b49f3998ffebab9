//! CLI command handlers. Each command is in its own file.

mod config;
mod delay;
mod simulate;

pub use config::run_config;
pub use delay::{parse_header, run_delay};
pub use simulate::{run_simulate, SimulateOptions};
