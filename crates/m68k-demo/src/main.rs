//! CLI entry point for the m68k-demo binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use m68k_core::{disassemble_range, CpuState, Machine, MachineConfig, MachineError, RunBoundary};
use m68k_demo::{hex_dump, parse_number, run_sort_demo, DEFAULT_STACK_TOP, SORT_LOAD_ADDRESS};
#[cfg(test)]
use tempfile as _;
use tracing::Level;

const USAGE_TEXT: &str = "\
Usage: m68k-demo [command] [options]

Commands:
  sort                                  Sort a canned byte list (default)
  run <file> [options]                  Run a raw big-endian binary
  disasm <file> [--address <addr>]      List a raw binary as 68000 assembly

Run options:
  --address <addr>     Load and start address (default: $1000)
  --max-steps <n>      Stop after n instructions
  --dump <addr>:<len>  Hex-dump memory after the run

Global options:
  -v, --verbose        Log loads, traps, and run summaries
  --trace              Also log every executed instruction
  -h, --help           Show this help message

Numbers accept $hex, 0xhex, or decimal.

Examples:
  m68k-demo
  m68k-demo run program.bin --max-steps 1000 --dump $2000:64
  m68k-demo disasm program.bin --address $400
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Sort,
    Run(RunArgs),
    Disasm(DisasmArgs),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
enum LogLevel {
    Info,
    Debug,
    Trace,
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    command: Command,
    log_level: LogLevel,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    address: u32,
    max_steps: Option<u64>,
    dump: Option<(u32, usize)>,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    input: PathBuf,
    address: u32,
}

#[derive(Debug)]
enum ParseResult {
    Command(Invocation),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut log_level = LogLevel::Info;
    let mut rest = Vec::new();
    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }
        if arg == "--verbose" || arg == "-v" {
            log_level = log_level.max(LogLevel::Debug);
        } else if arg == "--trace" {
            log_level = LogLevel::Trace;
        } else {
            rest.push(arg);
        }
    }

    let mut rest = rest.into_iter();
    let command = match rest.next() {
        None => Command::Sort,
        Some(first) => match first.to_string_lossy().to_string().as_str() {
            "sort" => {
                if let Some(extra) = rest.next() {
                    return Err(format!("unexpected argument: {}", extra.to_string_lossy()));
                }
                Command::Sort
            }
            "run" => Command::Run(parse_run_args(rest)?),
            "disasm" => Command::Disasm(parse_disasm_args(rest)?),
            other => return Err(format!("unknown command: {other}")),
        },
    };
    Ok(ParseResult::Command(Invocation { command, log_level }))
}

impl LogLevel {
    const fn as_tracing(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

fn option_value(
    args: &mut impl Iterator<Item = OsString>,
    name: &str,
) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {name}"))
}

fn parse_dump(text: &str) -> Result<(u32, usize), String> {
    let (address, len) = text
        .split_once(':')
        .ok_or_else(|| format!("invalid dump range: {text}"))?;
    let len = usize::try_from(parse_number(len)?).map_err(|e| e.to_string())?;
    Ok((parse_number(address)?, len))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut address = SORT_LOAD_ADDRESS;
    let mut max_steps = None;
    let mut dump = None;

    while let Some(arg) = args.next() {
        if arg == "--address" {
            address = parse_number(&option_value(&mut args, "--address")?)?;
            continue;
        }

        if arg == "--max-steps" {
            max_steps = Some(u64::from(parse_number(&option_value(
                &mut args,
                "--max-steps",
            )?)?));
            continue;
        }

        if arg == "--dump" {
            dump = Some(parse_dump(&option_value(&mut args, "--dump")?)?);
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        address,
        max_steps,
        dump,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_disasm_args(mut args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut address = SORT_LOAD_ADDRESS;

    while let Some(arg) = args.next() {
        if arg == "--address" {
            address = parse_number(&option_value(&mut args, "--address")?)?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs { input, address })
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn machine_for(level: LogLevel) -> Machine {
    Machine::with_config(&MachineConfig {
        trace_instructions: level == LogLevel::Trace,
        ..MachineConfig::default()
    })
}

fn report_machine_error(e: &MachineError, machine: &Machine) {
    eprintln!("error: {e}");
    eprintln!("CPU status dump:");
    eprintln!("{}", machine.dump_state());
}

fn format_values(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_sort(level: LogLevel) -> Result<(), i32> {
    let mut machine = machine_for(level);
    let report = match run_sort_demo(&mut machine) {
        Ok(report) => report,
        Err(e) => {
            report_machine_error(&e, &machine);
            return Err(1);
        }
    };

    println!("Unsorted:");
    println!("{}", format_values(&report.unsorted));
    println!("Sorted:");
    println!("{}", format_values(&report.sorted));
    println!();
    println!("CPU status dump:");
    println!("{}", report.state_dump);
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>, i32> {
    fs::read(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        1
    })
}

fn run_binary(args: &RunArgs, level: LogLevel) -> Result<(), i32> {
    let bytes = read_input(&args.input)?;
    let mut machine = machine_for(level);
    let outcome = machine
        .load_executable(&bytes, args.address, true)
        .and_then(|()| {
            machine.set_cpu_state(&CpuState {
                usp: Some(DEFAULT_STACK_TOP),
                ssp: Some(DEFAULT_STACK_TOP),
                ..CpuState::default()
            });
            machine.run_with_limit(args.max_steps)
        });
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            report_machine_error(&e, &machine);
            return Err(1);
        }
    };

    let reason = match outcome.boundary {
        RunBoundary::EndOfCode => "reached end of code",
        RunBoundary::Finished => "returned from program",
        RunBoundary::Stopped => "stopped",
        RunBoundary::StepLimit => "hit step limit",
    };
    println!(
        "Ran {} instructions ({} cycles): {reason}",
        outcome.steps, outcome.cycles
    );

    if let Some((address, len)) = args.dump {
        match machine.dump_memory(address, len) {
            Ok(bytes) => print!("{}", hex_dump(address, bytes)),
            Err(e) => {
                eprintln!("error: {e}");
                return Err(1);
            }
        }
    }

    println!("CPU status dump:");
    println!("{}", machine.dump_state());
    Ok(())
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    let bytes = read_input(&args.input)?;
    let mut machine = Machine::new();
    if let Err(e) = machine.load_data(&bytes, args.address, true) {
        eprintln!("error: {e}");
        return Err(1);
    }
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    let end = args.address.saturating_add(len);
    for row in disassemble_range(&machine.memory, args.address, end) {
        println!("{row}");
    }
    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Invocation { command, log_level })) => {
            init_logging(log_level);
            let result = match command {
                Command::Sort => run_sort(log_level),
                Command::Run(args) => run_binary(&args, log_level),
                Command::Disasm(args) => run_disasm(&args),
            };
            match result {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
