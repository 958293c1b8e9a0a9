use anyhow::{Context, Result};
use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};
use libserial::{BaudRate, CanonicalMode, Ports, Serial, SerialConfig};
use log::*;
use std::io::{BufRead, Write};
use std::{ops::Deref, panic, path::Path, time::Duration, time::Instant};

mod commandline;

use commandline::{CliArgs, CliCommands};

fn logging_init(loglevel: LevelFilter) -> LoggerHandle {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .expect("Cannot init logging")
        .start()
        .expect("Cannot start logging");

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown>", 0, 0));
        let cause = panic_info
            .payload()
            .downcast_ref::<String>()
            .map(String::deref);
        let cause = cause.unwrap_or_else(|| {
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .unwrap_or("<cause unknown>")
        });

        error!(
            "Thread '{}' panicked at {}:{}:{}: {}",
            std::thread::current().name().unwrap_or("<unknown>"),
            filename,
            line,
            column,
            cause
        );
    }));
    log_handle
}

fn open_port(args: &CliArgs) -> Result<Serial> {
    let mut config = match &args.config {
        Some(path) => SerialConfig::from_file(path)?,
        None => SerialConfig::default(),
    };
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(timeout) = args.timeout {
        config.read_timeout = timeout;
    }

    let mut serial = Serial::new();
    serial
        .open(&args.device)
        .with_context(|| format!("Cannot open serial port '{}'", args.device))?;
    serial
        .apply_config(&config)
        .with_context(|| format!("Cannot configure serial port '{}'", args.device))?;
    Ok(serial)
}

fn list_devices(dir: Option<&Path>, json: bool) -> Result<()> {
    let mut ports = match dir {
        Some(dir) => Ports::with_dir(dir),
        None => Ports::new(),
    };
    let count = ports
        .scan_ports()
        .with_context(|| "Cannot scan serial devices")?;

    if json {
        println!("{}", serde_json::to_string_pretty(ports.devices())?);
        return Ok(());
    }

    println!("Number of devices found: {count}");
    for device in ports.devices() {
        println!(
            "  [{}] {} -> {} (bus: {})",
            device.id(),
            device.name(),
            device.port_path(),
            device.bus_path()
        );
    }
    Ok(())
}

fn print_received(buffer: &[u8]) {
    println!(
        "Received ({} bytes): '{}'",
        buffer.len(),
        String::from_utf8_lossy(buffer)
    );
}

fn print_info(serial: &Serial) -> Result<()> {
    println!("Baud rate: {}", serial.baud_rate()?);
    println!("Data length: {:?}", serial.data_length()?);
    println!("Parity: {:?}", serial.parity()?);
    println!("Stop bits: {:?}", serial.stop_bits()?);
    println!("Flow control: {:?}", serial.flow_control()?);
    println!("Mode: {:?}", serial.canonical_mode());
    println!("Read timeout: {:?}", serial.read_timeout());
    println!(
        "Available data: {} bytes",
        serial
            .available_data()
            .with_context(|| "Cannot get available data")?
    );
    Ok(())
}

fn baud_test(serial: &mut Serial) -> Result<()> {
    for baud in BaudRate::COMMON {
        let requested = u32::from(baud);
        match serial.set_baud_rate(baud).and_then(|_| serial.baud_rate()) {
            Ok(actual) => println!(
                "  Set: {requested} -> Got: {actual} {}",
                if actual == requested { "ok" } else { "MISMATCH" }
            ),
            Err(err) => println!("  Failed to set {requested}: {err}"),
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    for baud in [BaudRate::Baud9600, BaudRate::Baud115200] {
        serial.set_baud_rate(baud)?;
        let message = format!("Speed test at {}", u32::from(baud));
        let start = Instant::now();
        serial
            .write(message.as_bytes())
            .with_context(|| "Cannot write to serial")?;
        println!("  Write time at {}: {:?}", u32::from(baud), start.elapsed());
        std::thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}

fn receive_pending(serial: &mut Serial) -> Result<()> {
    let available = serial.available_data()?;
    if available == 0 {
        return Ok(());
    }
    let mut buffer = Vec::new();
    match serial.canonical_mode() {
        CanonicalMode::Enable => serial.read(&mut buffer)?,
        CanonicalMode::Disable => serial.read_bytes(&mut buffer, available as usize)?,
    };
    print_received(&buffer);
    Ok(())
}

fn chat(serial: &mut Serial) -> Result<()> {
    println!("Interactive mode - type messages (Ctrl+D to exit):");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let mut line = line.with_context(|| "Cannot read from stdin")?;
        if line.is_empty() {
            continue;
        }
        line.push('\n');
        serial
            .write(line.as_bytes())
            .with_context(|| "Cannot write to serial")?;
        info!("Sent {} bytes", line.len());

        std::thread::sleep(Duration::from_millis(100));
        receive_pending(serial)?;
    }
    Ok(())
}

/// Opens the port from the global options, runs `action` on it and closes it.
fn with_port(args: &CliArgs, action: impl FnOnce(&mut Serial) -> Result<()>) -> Result<()> {
    let mut serial = open_port(args)?;
    action(&mut serial)?;
    serial.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter());

    let mut buffer = Vec::new();

    match &args.command {
        CliCommands::List { dir, json } => list_devices(dir.as_deref(), *json),
        CliCommands::Info => with_port(&args, |serial| print_info(serial)),
        CliCommands::Send { message, newline } => with_port(&args, |serial| {
            let mut data = message.clone().into_bytes();
            if *newline {
                data.push(b'\n');
            }
            let written = serial
                .write(&data)
                .with_context(|| "Cannot write to serial")?;
            println!("Sent {written} bytes");
            Ok(())
        }),
        CliCommands::Receive => with_port(&args, |serial| {
            serial
                .read(&mut buffer)
                .with_context(|| "Cannot read from serial")?;
            print_received(&buffer);
            Ok(())
        }),
        CliCommands::ReadUntil { terminator } => {
            let terminator = u8::try_from(*terminator)
                .with_context(|| format!("Terminator '{terminator}' is not a single byte"))?;
            with_port(&args, |serial| {
                serial
                    .read_until(&mut buffer, terminator)
                    .with_context(|| "Cannot read from serial")?;
                print_received(&buffer);
                Ok(())
            })
        }
        CliCommands::ReadBytes {
            count,
            min,
            deciseconds,
        } => with_port(&args, |serial| {
            serial.set_canonical_mode(CanonicalMode::Disable)?;
            serial.set_min_number_char_read(*min)?;
            serial.set_timeout(*deciseconds)?;
            serial
                .read_bytes(&mut buffer, *count)
                .with_context(|| "Cannot read from serial")?;
            print_received(&buffer);
            Ok(())
        }),
        CliCommands::BaudTest => with_port(&args, baud_test),
        CliCommands::Chat => with_port(&args, chat),
    }
}
