//! # libserial
//!
//! Serial port access for Linux tty devices.
//!
//! - [`Serial`]: open a port, configure its line settings (arbitrary baud rates
//!   through termios2, data length, parity, stop bits, flow control, canonical
//!   mode, VMIN/VTIME) and move data with poll-based timeouts.
//! - [`Ports`]: discover serial devices through `/dev/serial/by-id`.
//! - [`SerialConfig`]: port settings loadable from YAML.
//!
//! All fallible operations return [`Error`], whose messages carry the
//! operating system's error description.
//!
//! ## Features
//!
//! - `default`: enables `bin-dependencies`, everything the `serialctl` command
//!   line tool needs.

mod config;
mod device;
/// Contains error types for the library.
mod error;
pub mod ports;
mod serial;
pub mod sys;
mod types;

pub use config::SerialConfig;
pub use device::Device;
pub use error::{Error, Result};
pub use ports::Ports;
pub use serial::Serial;
pub use types::*;
