pub mod args;
pub mod diagnostics;
pub mod flow;
pub mod logging;

pub use args::Args;
pub use flow::{run, Invocation, Outcome};
