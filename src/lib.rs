pub mod app;
pub mod cli;
pub mod core;
pub mod logging;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod verify;

pub use crate::core::*;
pub use crate::pipeline::BatchDriver;
