//! Game Boy emulator binary.
//!
//! Headless runner: boots a cartridge, steps it for a number of
//! instructions or frames, and dumps the result. Also serves the machine
//! as a JSON-RPC control server.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use emu_gb::mcp::McpServer;
use emu_gb::{EntropyConfig, GameBoy, GbConfig, PowerOn, StepError, StopReason};

/// Game Boy emulator
#[derive(Parser, Debug)]
#[command(name = "emu-gb")]
#[command(about = "Headless Game Boy (DMG) emulator", long_about = None)]
struct Args {
    /// Cartridge image (.gb)
    #[arg(short, long)]
    rom: Option<PathBuf>,

    /// Boot ROM mapped over $0000-$00FF until the program disables it
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Number of instructions to execute
    #[arg(short, long, conflicts_with = "frames")]
    steps: Option<u64>,

    /// Number of frames to run [default: 1 when --steps is absent]
    #[arg(short, long)]
    frames: Option<u64>,

    /// Stop when PC reaches this address (hex, e.g. 0150 or $0150)
    #[arg(short, long, value_parser = parse_hex_address)]
    breakpoint: Option<u16>,

    /// Randomize registers at power-on (PC starts at $0000)
    #[arg(long)]
    randomize: bool,

    /// Seed for the entropy source (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the cartridge header and exit
    #[arg(short, long)]
    info: bool,

    /// Print every executed instruction (with --steps)
    #[arg(short, long)]
    trace: bool,

    /// Dump final registers as JSON
    #[arg(long)]
    json: bool,

    /// Run as a JSON-RPC server over stdio
    #[arg(long)]
    serve: bool,
}

fn parse_hex_address(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{text}': {e}"))
}

fn make_gb(args: &Args, rom_path: &Path) -> GameBoy {
    let rom_data = match std::fs::read(rom_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", rom_path.display());
            process::exit(1);
        }
    };
    let boot_rom = args.boot_rom.as_ref().map(|path| match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to read boot ROM {}: {e}", path.display());
            process::exit(1);
        }
    });

    let config = GbConfig {
        rom_data,
        save_data: None,
        boot_rom,
        power_on: if args.randomize {
            PowerOn::Randomized
        } else {
            PowerOn::PostBoot
        },
        entropy: args.seed.map_or(EntropyConfig::System, EntropyConfig::Seeded),
    };

    match GameBoy::new(&config) {
        Ok(mut gb) => {
            gb.set_breakpoint(args.breakpoint);
            gb
        }
        Err(e) => {
            eprintln!("Failed to load cartridge: {e}");
            process::exit(1);
        }
    }
}

/// Step until the budget runs out or the breakpoint is reached.
fn drive(gb: &mut GameBoy, args: &Args) -> Result<(), StepError> {
    if let Some(steps) = args.steps {
        for _ in 0..steps {
            let record = gb.step_one()?;
            if args.trace {
                println!("{record}");
            }
            if gb.breakpoint() == Some(gb.registers().pc) {
                eprintln!("Breakpoint at ${:04X}", gb.registers().pc);
                break;
            }
        }
        return Ok(());
    }

    for _ in 0..args.frames.unwrap_or(1) {
        let outcome = gb.run_until_frame(true)?;
        if outcome.stop == StopReason::Breakpoint {
            eprintln!("Breakpoint at ${:04X}", gb.registers().pc);
            break;
        }
    }
    Ok(())
}

fn dump_state(gb: &GameBoy, json: bool) {
    let regs = gb.registers();
    if json {
        match serde_json::to_string_pretty(&regs) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("JSON error: {e}"),
        }
        return;
    }
    println!(
        "A={:02X} F={:02X} B={:02X} C={:02X} D={:02X} E={:02X} H={:02X} L={:02X} SP={:04X} PC={:04X}",
        regs.a, regs.f, regs.b, regs.c, regs.d, regs.e, regs.h, regs.l, regs.sp, regs.pc
    );
    println!(
        "Z={} N={} H={} C={}  frames={} cycles={}",
        u8::from(regs.zero()),
        u8::from(regs.subtract()),
        u8::from(regs.half_carry()),
        u8::from(regs.carry()),
        gb.frame_count(),
        gb.total_cycles()
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.serve {
        let mut server = McpServer::new();
        if let Some(path) = args.rom.clone() {
            server.set_rom_path(path);
        }
        if let Some(path) = args.boot_rom.clone() {
            server.set_boot_rom_path(path);
        }
        server.run();
        return;
    }

    let Some(rom_path) = args.rom.clone() else {
        eprintln!("No ROM given. Use --rom <file> or --serve.");
        process::exit(1);
    };
    let mut gb = make_gb(&args, &rom_path);

    if args.info {
        if let Some(summary) = gb.header_summary() {
            println!("{summary}");
        }
        return;
    }

    if let Err(e) = drive(&mut gb, &args) {
        eprintln!(
            "Halted at ${:04X} (opcode ${:02X}): {e}",
            e.address(),
            e.opcode()
        );
        for record in gb.history() {
            eprintln!("  {record}");
        }
        if e.is_fatal() {
            dump_state(&gb, args.json);
            process::exit(1);
        }
    }

    dump_state(&gb, args.json);
}
