//! Concrete log targets and batch sinks

pub mod memory;

#[cfg(feature = "console")]
pub mod console;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "network")]
pub mod network;

#[cfg(feature = "log-bridge")]
pub mod log_crate;

pub use memory::{MemorySink, MemoryTarget};

#[cfg(feature = "console")]
pub use console::ConsoleTarget;

#[cfg(feature = "file")]
pub use file::FileSink;

#[cfg(feature = "network")]
pub use network::TcpSink;

#[cfg(feature = "log-bridge")]
pub use log_crate::LogCrateTarget;
