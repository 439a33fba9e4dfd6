// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use minihart_core::bus::{SystemBus, DEFAULT_RAM_SIZE};
use minihart_core::{Machine, StopReason};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn parse_size(s: &str) -> Result<usize, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex size '{}': {}", s, e))
    } else {
        usize::from_str(trimmed).map_err(|e| format!("Invalid size '{}': {}", s, e))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Minihart payload runner", long_about = None)]
struct Cli {
    /// Path to the payload ELF file
    #[arg(short, long)]
    firmware: PathBuf,

    /// Enable instruction-level execution tracing
    #[arg(short, long)]
    trace: bool,

    /// Maximum number of steps to execute before giving up
    #[arg(long, default_value = "20000")]
    max_steps: u64,

    /// Disable console stdout echo (output is still captured)
    #[arg(long)]
    no_echo: bool,

    /// RAM size in bytes (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_size, default_value = "16777216")]
    memory_size: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    info!("Loading payload: {:?}", cli.firmware);
    let program = match minihart_loader::load_elf(&cli.firmware) {
        Ok(program) => program,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    info!("Entry Point: {:#x}", program.entry_point);

    let mut bus = if cli.memory_size == DEFAULT_RAM_SIZE {
        SystemBus::new()
    } else {
        SystemBus::with_ram_size(cli.memory_size)
    };

    let console = Arc::new(Mutex::new(Vec::new()));
    bus.attach_console_sink(console.clone(), !cli.no_echo);

    let mut machine = Machine::new(bus);
    machine.load_image(&program);

    info!("Running for up to {} steps...", cli.max_steps);
    let reason = match machine.run(cli.max_steps) {
        Ok(reason) => reason,
        Err(e) => {
            error!("Simulation error after {} steps: {}", machine.total_steps, e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let captured = console.lock().map(|g| g.clone()).unwrap_or_default();
    info!("Console output: {} bytes", captured.len());

    match reason {
        StopReason::Parked(pc) => {
            info!(
                "Payload parked at {:#x} after {} steps",
                pc, machine.total_steps
            );
            ExitCode::from(EXIT_PASS)
        }
        StopReason::MaxStepsReached => {
            error!("Step budget exhausted before the payload parked");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
