//! Session lifecycle and the encode / run / decode pass.

mod execute;
mod request;
mod runner;

pub use execute::execute;
pub use request::RunRequest;
pub use runner::{Config, InitOutcome, ReinitializePolicy, TensorRunner};
