pub mod output;
pub mod runner;

pub use runner::{execute, Command, RunOutput};
