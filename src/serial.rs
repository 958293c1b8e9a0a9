//! The serial port.
//!
//! # Example
//!
//! ```no_run
//! use libserial::{BaudRate, Serial};
//!
//! # fn main() -> Result<(), libserial::Error> {
//! let mut serial = Serial::new();
//! serial.open("/dev/ttyUSB0")?;
//! serial.set_baud_rate(BaudRate::Baud115200)?;
//! serial.write(b"ping\n")?;
//!
//! let mut line = Vec::new();
//! serial.read_until(&mut line, b'\n')?;
//! println!("{}", String::from_utf8_lossy(&line));
//! # Ok(())
//! # }
//! ```

use crate::config::SerialConfig;
use crate::error::{Error, Result};
use crate::sys::{Posix, SystemCalls};
use crate::types::*;
use nix::errno::Errno;
use nix::poll::PollFlags;
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use serialport::{ClearBuffer, SerialPort, TTYPort};
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::time::{Duration, Instant};

/// A serial port on a tty device.
///
/// The port is created closed; settings that live only in this struct (read
/// timeout, mode, terminator...) can be changed before [`open`](Serial::open)
/// and are applied to the device when it is opened.
#[derive(Debug)]
pub struct Serial {
    port: Option<TTYPort>,
    sys: Box<dyn SystemCalls>,
    read_timeout: Duration,
    write_timeout: Duration,
    canonical_mode: CanonicalMode,
    terminator: Terminator,
    max_safe_read_size: usize,
    vtime: u8,
    vmin: u8,
}

impl Default for Serial {
    fn default() -> Self {
        let config = SerialConfig::default();
        Self {
            port: None,
            sys: Box::new(Posix),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            canonical_mode: config.canonical_mode,
            terminator: config.terminator,
            max_safe_read_size: config.max_safe_read_size,
            vtime: config.timeout,
            vmin: config.min_number_char_read,
        }
    }
}

impl Serial {
    /// An unopened port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `port` at 9600 baud.
    pub fn with_port(port: &str) -> Result<Self> {
        let mut serial = Self::new();
        serial.open(port)?;
        serial.set_baud_rate(BaudRate::Baud9600)?;
        Ok(serial)
    }

    /// Opens the device for reading and writing without making it the
    /// controlling terminal. A port that is already open is closed first.
    pub fn open(&mut self, port: &str) -> Result<()> {
        self.close()?;

        let open_error = |source| Error::Open {
            port: port.to_owned(),
            source,
        };
        let mut tty = serialport::new(port, SerialConfig::DEFAULT_BAUD_RATE)
            .open_native()
            .map_err(open_error)?;
        tty.set_exclusive(false).map_err(open_error)?;
        self.port = Some(tty);

        if let Err(err) = self.apply_line_discipline() {
            self.port = None;
            return Err(err);
        }
        log::debug!("Opened {port} ({:?} mode)", self.canonical_mode);
        Ok(())
    }

    /// Closes the port. Closing an unopened port does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            let name = port.name().unwrap_or_default();
            // the duplicate is the last reference once `port` is dropped, so
            // closing it reports what closing the device reports
            let fd = nix::unistd::dup(port.as_raw_fd()).map_err(Error::Close)?;
            drop(port);
            nix::unistd::close(fd).map_err(Error::Close)?;
            log::debug!("Closed {name}");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn port_name(&self) -> Option<String> {
        self.port.as_ref().and_then(|port| port.name())
    }

    /// Writes all of `data`, returning the number of bytes written.
    ///
    /// With a non-zero write timeout every chunk waits at most that long for
    /// the device to accept data.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let fd = self.raw_fd()?;
        let mut written = 0;
        while written < data.len() {
            if !self.write_timeout.is_zero() {
                match self.sys.poll(fd, PollFlags::POLLOUT, Some(self.write_timeout)) {
                    Err(err) => return Err(Error::Poll(err)),
                    Ok(0) => return Err(Error::WriteTimeout(self.write_timeout.as_millis())),
                    Ok(_) => {}
                }
            }
            match self.sys.write(fd, &data[written..]) {
                Ok(0) => return Err(Error::Write(Errno::EIO)),
                Ok(n) => written += n,
                Err(Errno::EINTR) => continue,
                Err(err) => return Err(Error::Write(err)),
            }
        }
        log::trace!("write: {data:02X?}");
        Ok(written)
    }

    /// Reads one line in canonical mode.
    ///
    /// Waits up to the read timeout for input (a zero timeout only checks for
    /// input already waiting), then reads at most [`max_safe_read_size`](Serial::max_safe_read_size)
    /// bytes. `buf` is replaced with the bytes read.
    pub fn read(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        if self.canonical_mode == CanonicalMode::Disable {
            return Err(Error::ReadNeedsCanonical);
        }
        let fd = self.raw_fd()?;
        buf.clear();

        match self.sys.poll(fd, PollFlags::POLLIN, Some(self.read_timeout)) {
            Err(err) => return Err(Error::Poll(err)),
            Ok(0) => return Err(Error::ReadTimeout(self.read_timeout.as_millis())),
            Ok(_) => {}
        }

        buf.resize(self.max_safe_read_size, 0);
        let received = self.sys.read(fd, buf).map_err(|err| {
            buf.clear();
            Error::Read(err)
        })?;
        buf.truncate(received);
        log::trace!("read: {buf:02X?}");
        Ok(received)
    }

    /// Reads up to `num_bytes` in non-canonical mode. When the call returns is
    /// decided by the VMIN and VTIME settings.
    pub fn read_bytes(&mut self, buf: &mut Vec<u8>, num_bytes: usize) -> Result<usize> {
        if self.canonical_mode == CanonicalMode::Enable {
            return Err(Error::ReadBytesNeedsRaw);
        }
        if num_bytes == 0 {
            return Err(Error::ZeroLengthRead);
        }
        let fd = self.raw_fd()?;

        buf.clear();
        buf.resize(num_bytes, 0);
        let received = self.sys.read(fd, buf).map_err(|err| {
            buf.clear();
            Error::Read(err)
        })?;
        buf.truncate(received);
        log::trace!("read_bytes: {buf:02X?}");
        Ok(received)
    }

    /// Reads byte by byte until `terminator`, which is kept at the end of `buf`.
    ///
    /// Works in both modes. A non-zero read timeout bounds the whole call; a
    /// zero timeout waits forever. Fails once `buf` reaches
    /// [`max_safe_read_size`](Serial::max_safe_read_size) without a terminator.
    pub fn read_until(&mut self, buf: &mut Vec<u8>, terminator: u8) -> Result<usize> {
        let fd = self.raw_fd()?;
        buf.clear();
        let start = Instant::now();

        loop {
            if buf.len() >= self.max_safe_read_size {
                return Err(Error::BufferOverflow(self.max_safe_read_size));
            }

            if !self.read_timeout.is_zero() {
                let elapsed = start.elapsed();
                if elapsed >= self.read_timeout {
                    return Err(Error::TerminatorTimeout);
                }
                match self
                    .sys
                    .poll(fd, PollFlags::POLLIN, Some(self.read_timeout - elapsed))
                {
                    Err(err) => return Err(Error::Poll(err)),
                    Ok(0) => return Err(Error::DataTimeout),
                    Ok(_) => {}
                }
            }

            let mut byte = [0u8; 1];
            match self.sys.read(fd, &mut byte) {
                // EWOULDBLOCK is EAGAIN on Linux
                Err(Errno::EAGAIN) => {
                    std::thread::sleep(Duration::from_millis(1));
                    continue;
                }
                Err(err) => return Err(Error::Read(err)),
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(_) => {}
            }

            buf.push(byte[0]);
            if byte[0] == terminator {
                log::trace!("read_until: {buf:02X?}");
                return Ok(buf.len());
            }
        }
    }

    /// [`read_until`](Serial::read_until) with the configured terminator.
    pub fn read_until_terminator(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let terminator = self.terminator.into();
        self.read_until(buf, terminator)
    }

    /// Discards received but unread input.
    pub fn flush_input_buffer(&mut self) -> Result<()> {
        self.port_mut()?
            .clear(ClearBuffer::Input)
            .map_err(Error::Flush)
    }

    /// Number of bytes waiting to be read.
    pub fn available_data(&self) -> Result<u32> {
        self.port_ref()?
            .bytes_to_read()
            .map_err(Error::AvailableData)
    }

    /// Sets input and output speed. Any rate the driver accepts is allowed.
    pub fn set_baud_rate(&mut self, baud_rate: impl Into<u32>) -> Result<()> {
        let baud_rate = baud_rate.into();
        self.port_mut()?.set_baud_rate(baud_rate)?;
        log::debug!("Baud rate set to {baud_rate}");
        Ok(())
    }

    /// The speed currently configured on the device.
    pub fn baud_rate(&self) -> Result<u32> {
        Ok(self.port_ref()?.baud_rate()?)
    }

    pub fn set_data_length(&mut self, data_length: DataLength) -> Result<()> {
        self.port_mut()?.set_data_bits(data_length.into())?;
        log::debug!("Data length set to {data_length:?}");
        Ok(())
    }

    pub fn data_length(&self) -> Result<DataLength> {
        Ok(self.port_ref()?.data_bits()?.into())
    }

    pub fn set_parity(&mut self, parity: Parity) -> Result<()> {
        self.port_mut()?.set_parity(parity.into())?;
        log::debug!("Parity set to {parity:?}");
        Ok(())
    }

    pub fn parity(&self) -> Result<Parity> {
        Ok(self.port_ref()?.parity()?.into())
    }

    pub fn set_stop_bits(&mut self, stop_bits: StopBits) -> Result<()> {
        self.port_mut()?.set_stop_bits(stop_bits.into())?;
        log::debug!("Stop bits set to {stop_bits:?}");
        Ok(())
    }

    pub fn stop_bits(&self) -> Result<StopBits> {
        Ok(self.port_ref()?.stop_bits()?.into())
    }

    pub fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<()> {
        self.port_mut()?.set_flow_control(flow_control.into())?;
        log::debug!("Flow control set to {flow_control:?}");
        Ok(())
    }

    pub fn flow_control(&self) -> Result<FlowControl> {
        Ok(self.port_ref()?.flow_control()?.into())
    }

    pub fn set_canonical_mode(&mut self, mode: CanonicalMode) -> Result<()> {
        self.canonical_mode = mode;
        self.apply_if_open()
    }

    pub fn canonical_mode(&self) -> CanonicalMode {
        self.canonical_mode
    }

    pub fn set_terminator(&mut self, terminator: Terminator) {
        self.terminator = terminator;
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// VTIME: non-canonical read timeout in deciseconds.
    pub fn set_timeout(&mut self, deciseconds: u8) -> Result<()> {
        self.vtime = deciseconds;
        self.apply_if_open()
    }

    pub fn timeout(&self) -> u8 {
        self.vtime
    }

    /// VMIN: minimum number of bytes a non-canonical read waits for.
    pub fn set_min_number_char_read(&mut self, num: u8) -> Result<()> {
        self.vmin = num;
        self.apply_if_open()
    }

    pub fn min_number_char_read(&self) -> u8 {
        self.vmin
    }

    pub fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Upper bound for a single `read()` and for the line `read_until()` collects.
    pub fn set_max_safe_read_size(&mut self, size: usize) {
        self.max_safe_read_size = size;
    }

    pub fn max_safe_read_size(&self) -> usize {
        self.max_safe_read_size
    }

    /// Replaces the system calls used on the data path.
    pub fn set_system_calls(&mut self, sys: impl SystemCalls + 'static) {
        self.sys = Box::new(sys);
    }

    /// Applies every setting of `config`. The port must be open.
    pub fn apply_config(&mut self, config: &SerialConfig) -> Result<()> {
        self.read_timeout = config.read_timeout;
        self.write_timeout = config.write_timeout;
        self.terminator = config.terminator;
        self.max_safe_read_size = config.max_safe_read_size;
        self.canonical_mode = config.canonical_mode;
        self.vtime = config.timeout;
        self.vmin = config.min_number_char_read;
        self.apply_line_discipline()?;

        self.set_baud_rate(config.baud_rate)?;
        self.set_data_length(config.data_length)?;
        self.set_parity(config.parity)?;
        self.set_stop_bits(config.stop_bits)?;
        self.set_flow_control(config.flow_control)
    }

    fn apply_if_open(&self) -> Result<()> {
        if self.is_open() {
            self.apply_line_discipline()
        } else {
            Ok(())
        }
    }

    /// Writes ICANON, VMIN and VTIME to the device.
    fn apply_line_discipline(&self) -> Result<()> {
        let canonical = self.canonical_mode == CanonicalMode::Enable;
        let (vmin, vtime) = (self.vmin, self.vtime);
        self.update_attributes(|attrs| {
            attrs.local_flags.set(LocalFlags::ICANON, canonical);
            attrs.control_chars[SpecialCharacterIndices::VMIN as usize] = vmin;
            attrs.control_chars[SpecialCharacterIndices::VTIME as usize] = vtime;
        })
    }

    fn update_attributes(&self, update: impl FnOnce(&mut Termios)) -> Result<()> {
        let port = self.port_ref()?;
        // SAFETY: `port` owns the descriptor and outlives this borrow
        let fd = unsafe { BorrowedFd::borrow_raw(port.as_raw_fd()) };
        let mut attrs = termios::tcgetattr(fd).map_err(Error::GetAttributes)?;
        update(&mut attrs);
        termios::tcsetattr(fd, SetArg::TCSANOW, &attrs).map_err(Error::SetAttributes)
    }

    fn raw_fd(&self) -> Result<RawFd> {
        Ok(self.port_ref()?.as_raw_fd())
    }

    fn port_ref(&self) -> Result<&TTYPort> {
        self.port.as_ref().ok_or(Error::NotOpen)
    }

    fn port_mut(&mut self) -> Result<&mut TTYPort> {
        self.port.as_mut().ok_or(Error::NotOpen)
    }
}
