//! nexys2epp - EPP register comms tool for the Digilent Nexys2.
//!
//! Interacts with a Nexys2 programmed with dpimref.vhd (or similar),
//! reading and writing peripheral-bus registers over the board's USB
//! bridge.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use nexys2epp as app;

use app::error::AppError;
use app::usb::UsbDevice;
use app::{epp, payload};

/// Read or write a register on a Nexys2 over its USB EPP bridge.
#[derive(Parser, Debug)]
#[command(name = "nexys2epp", version)]
#[command(group(ArgGroup::new("direction").required(true).args(["read", "write"])))]
struct Cli {
    /// Vendor ID of the board
    #[arg(short, long, value_parser = parse_u16, default_value = "0x1443")]
    vid: u16,

    /// Product ID of the board
    #[arg(short, long, value_parser = parse_u16, default_value = "0x0005")]
    pid: u16,

    /// Read from the device
    #[arg(short, long)]
    read: bool,

    /// Write to the device
    #[arg(short, long)]
    write: bool,

    /// File to read from or write to (default stdin/stdout)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Number of bytes to transfer (inferred from the file length when writing)
    #[arg(short, long, value_parser = parse_u32)]
    len: Option<u32>,

    /// Register address to read from or write to
    #[arg(short, long, value_parser = parse_u8)]
    addr: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics stay on stderr; stdout carries payload data
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> app::Result<()> {
    // Source the payload (writes) or size the buffer (reads) before
    // touching the device
    let mut buf = if cli.write {
        payload::load(cli.file.as_deref(), cli.len)?
    } else {
        let Some(len) = cli.len else {
            return Err(AppError::validation(
                "a length is required when reading (--len)",
            ));
        };
        vec![0u8; len as usize]
    };

    let mut device = UsbDevice::open(cli.vid, cli.pid)?;

    if cli.write {
        epp::write_register(&mut device, cli.addr, &buf)?;
        tracing::info!("wrote {} bytes to register {:#04x}", buf.len(), cli.addr);
    } else {
        epp::read_register(&mut device, cli.addr, &mut buf)?;
        payload::store(cli.file.as_deref(), &buf)?;
        tracing::info!("read {} bytes from register {:#04x}", buf.len(), cli.addr);
    }

    Ok(())
}

/// Parse a number accepting decimal or 0x-prefixed hex.
fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    u16::try_from(parse_u32(s)?).map_err(|_| format!("value out of range: {s}"))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    u8::try_from(parse_u32(s)?).map_err(|_| format!("value out of range: {s}"))
}
