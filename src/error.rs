use nix::errno::Errno;
use std::path::PathBuf;

/// Errors reported by the serial port and device discovery.
///
/// Variants fall in two groups: configuration errors about the port itself,
/// and I/O errors raised while moving data. [`Error::is_io`] tells them apart.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device could not be opened.
    #[error("Error opening port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    /// Closing the file descriptor failed.
    #[error("Error closing port: {}", .0.desc())]
    Close(Errno),
    /// An operation needing a device was called on an unopened port.
    #[error("Serial port is not open")]
    NotOpen,
    /// Reading the terminal attributes failed.
    #[error("Error getting terminal attributes: {}", .0.desc())]
    GetAttributes(Errno),
    /// Writing the terminal attributes failed.
    #[error("Error setting terminal attributes: {}", .0.desc())]
    SetAttributes(Errno),
    /// A line setting (baud rate, framing, flow control) was rejected.
    #[error("Error configuring port: {0}")]
    Config(#[from] serialport::Error),
    /// A number that is not one of the [`BaudRate`](crate::BaudRate) values.
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),
    #[error("Error flushing input buffer: {0}")]
    Flush(#[source] serialport::Error),
    #[error("Error getting available data: {0}")]
    AvailableData(#[source] serialport::Error),
    #[error("Error writing to serial port: {}", .0.desc())]
    Write(Errno),
    #[error("Write operation timed out after {0} milliseconds")]
    WriteTimeout(u128),
    #[error("Error reading from serial port: {}", .0.desc())]
    Read(Errno),
    #[error("Error in poll(): {}", .0.desc())]
    Poll(Errno),
    /// `read()` found no input within the read timeout.
    #[error("Read operation timed out after {0} milliseconds")]
    ReadTimeout(u128),
    /// `read_until()` ran past its deadline.
    #[error("Read timeout exceeded while waiting for terminator")]
    TerminatorTimeout,
    /// `read_until()` waited for the next byte until the deadline.
    #[error("Read timeout exceeded while waiting for data")]
    DataTimeout,
    #[error("Read buffer exceeded maximum size limit of {0} bytes without finding terminator")]
    BufferOverflow(usize),
    #[error("Connection closed while reading: no terminator found")]
    ConnectionClosed,
    #[error("read() is not supported in non-canonical mode; use read_bytes() or read_until() instead")]
    ReadNeedsCanonical,
    #[error("read_bytes() is not supported in canonical mode; use read() or read_until() instead")]
    ReadBytesNeedsRaw,
    #[error("Number of bytes requested must be greater than zero")]
    ZeroLengthRead,
    /// The device link directory could not be listed.
    #[error("Error while reading {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error loading configuration {}: {reason}", .path.display())]
    ConfigFile { path: PathBuf, reason: String },
}

impl Error {
    /// Returns `true` for errors raised while transferring data, `false` for
    /// errors about opening, configuring or discovering a port.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::Write(_)
                | Error::WriteTimeout(_)
                | Error::Read(_)
                | Error::Poll(_)
                | Error::ReadTimeout(_)
                | Error::TerminatorTimeout
                | Error::DataTimeout
                | Error::BufferOverflow(_)
                | Error::ConnectionClosed
                | Error::ReadNeedsCanonical
                | Error::ReadBytesNeedsRaw
                | Error::ZeroLengthRead
        )
    }

    /// The `errno` behind this error, if it came straight from a system call.
    pub fn errno(&self) -> Option<Errno> {
        match *self {
            Error::Close(e)
            | Error::GetAttributes(e)
            | Error::SetAttributes(e)
            | Error::Write(e)
            | Error::Read(e)
            | Error::Poll(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_errors_render_strerror_text() {
        let err = Error::Read(Errno::EIO);
        assert_eq!(
            err.to_string(),
            format!("Error reading from serial port: {}", Errno::EIO.desc())
        );
        assert_eq!(err.errno(), Some(Errno::EIO));

        let err = Error::Poll(Errno::EINTR);
        assert_eq!(
            err.to_string(),
            format!("Error in poll(): {}", Errno::EINTR.desc())
        );
    }

    #[test]
    fn timeout_messages_carry_milliseconds() {
        assert_eq!(
            Error::ReadTimeout(100).to_string(),
            "Read operation timed out after 100 milliseconds"
        );
        assert_eq!(
            Error::BufferOverflow(10).to_string(),
            "Read buffer exceeded maximum size limit of 10 bytes without finding terminator"
        );
    }

    #[test]
    fn categories() {
        assert!(Error::ZeroLengthRead.is_io());
        assert!(Error::ConnectionClosed.is_io());
        assert!(Error::Read(Errno::EBADF).is_io());
        assert!(!Error::NotOpen.is_io());
        assert!(!Error::Close(Errno::EBADF).is_io());
        assert!(!Error::Scan {
            path: PathBuf::from("/nope"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .is_io());
    }

    #[test]
    fn scan_error_names_directory() {
        let err = Error::Scan {
            path: PathBuf::from("/this/path/should/not/exist"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err
            .to_string()
            .starts_with("Error while reading /this/path/should/not/exist"));
    }
}
