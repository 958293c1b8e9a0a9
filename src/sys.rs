//! The system calls on a port's data path.
//!
//! [`Serial`](crate::Serial) never calls `poll`, `read` or `write` directly but
//! goes through a [`SystemCalls`] implementation, so tests can substitute
//! failing calls with [`Serial::set_system_calls`](crate::Serial::set_system_calls).

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout};
use std::fmt;
use std::os::fd::{BorrowedFd, RawFd};
use std::time::Duration;

pub trait SystemCalls: fmt::Debug + Send {
    /// Waits until `fd` reports one of `events`. `None` waits forever.
    /// Returns the number of ready descriptors, 0 on timeout.
    fn poll(&self, fd: RawFd, events: PollFlags, timeout: Option<Duration>) -> nix::Result<i32>;

    fn read(&self, fd: RawFd, buf: &mut [u8]) -> nix::Result<usize>;

    fn write(&self, fd: RawFd, buf: &[u8]) -> nix::Result<usize>;
}

/// The real system calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct Posix;

impl SystemCalls for Posix {
    fn poll(&self, fd: RawFd, events: PollFlags, timeout: Option<Duration>) -> nix::Result<i32> {
        let timeout = match timeout {
            Some(timeout) => PollTimeout::try_from(timeout).map_err(|_| Errno::EINVAL)?,
            None => PollTimeout::NONE,
        };
        // SAFETY: callers pass the descriptor of a port they keep open for the call
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        let mut fds = [PollFd::new(fd, events)];
        nix::poll::poll(&mut fds, timeout)
    }

    fn read(&self, fd: RawFd, buf: &mut [u8]) -> nix::Result<usize> {
        nix::unistd::read(fd, buf)
    }

    fn write(&self, fd: RawFd, buf: &[u8]) -> nix::Result<usize> {
        // SAFETY: see poll()
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        nix::unistd::write(fd, buf)
    }
}
