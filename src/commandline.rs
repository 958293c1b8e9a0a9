use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use std::time::Duration;

fn default_device_name() -> String {
    String::from("/dev/ttyUSB0")
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// List serial devices found in /dev/serial/by-id
    List {
        /// Directory of device links to scan instead of /dev/serial/by-id
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Print the devices as JSON
        #[arg(long, action)]
        json: bool,
    },
    /// Show the line settings of the port and the number of pending bytes
    Info,
    /// Write a message to the port
    Send {
        message: String,
        /// Append a line feed to the message
        #[arg(long, short, action)]
        newline: bool,
    },
    /// Read one line (canonical mode)
    Receive,
    /// Read until a terminator byte arrives
    ReadUntil {
        /// Terminator character, e.g. '!' (defaults to line feed)
        #[arg(long, short, default_value_t = '\n')]
        terminator: char,
    },
    /// Read up to N bytes in non-canonical mode
    ReadBytes {
        count: usize,
        /// VMIN: minimum number of bytes to wait for
        #[arg(long, default_value_t = 1)]
        min: u8,
        /// VTIME: inter-byte timeout in deciseconds
        #[arg(long, default_value_t = 10)]
        deciseconds: u8,
    },
    /// Set each common baud rate and show the rate read back from the device
    BaudTest,
    /// Interactive mode: send lines typed on stdin and print what arrives
    Chat,
}

const fn about_text() -> &'static str {
    "serial port command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Serial port device path (e.g., /dev/ttyUSB0, /dev/ttyACM0, /tmp/ttyV0)
    #[arg(short, long, default_value_t = default_device_name())]
    pub device: String,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Line speed; overrides the configuration file
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Read timeout (e.g., "100ms", "1s", "2s 500ms"); overrides the configuration file
    #[arg(value_parser = humantime::parse_duration, long)]
    pub timeout: Option<Duration>,

    /// YAML file with port settings (baud_rate, parity, read_timeout, ...)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
