//! `lanes`: command-line driver for the lane permute engine.
//!
//! Runs permutes, deinterleaves and block plans on a chosen backend and
//! prints the result as text or JSON. Also renders plans as C.
//!
//! **Usage:**
//! ```
//! lanes [-v] [--backend <auto|scalar|ssse3|avx2|avx512|neon>] [--format <text|json>] <command>
//!
//! lanes permute --lane u8 --input 0,1,2,3 --indices 3,2,1,0
//! lanes deinterleave --channels 3 --input 255,0,0,0,255,0 [--tail skip]
//! lanes plan --pattern 3,2,1,0,4,5
//! lanes emit-c --pattern 7,6,5,4,3,2,1,0 --target avx2 [--out permute.c] [--scatter]
//! lanes simplec --pattern 2,0,1 --target scalar
//! lanes rand-pattern --len 1000 [--seed 42]
//! lanes features
//! ```
//!
//! The backend defaults to the `LANES_BACKEND` environment variable.
//!
//! Patterns are gathers (`out[i] = in[pattern[i]]`) unless `--scatter` is
//! given, in which case they read `out[pattern[i]] = in[i]`. `simplec`
//! always reads its pattern as a scatter.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lanes::{
    emit_c, random_pattern, Backend, BackendPreference, CTarget, Deinterleaver, Dispatcher, Lane,
    Plan, TailPolicy, BACKEND_ENV,
};
use serde::Serialize;

/// Run lane permutes from the command line.
#[derive(Parser)]
#[command(name = "lanes", version, about = "Portable lane permute and deinterleave")]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Backend to run on.
    #[arg(long, env = BACKEND_ENV, default_value = "auto", global = true)]
    backend: BackendPreference,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Command to run.
    #[command(subcommand)]
    command: Command,
}

/// Output format.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable lines.
    Text,
    /// One JSON document.
    Json,
}

/// Element type of the values on the command line.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LaneKind {
    /// Unsigned 8-bit.
    U8,
    /// Signed 8-bit.
    I8,
    /// Unsigned 16-bit.
    U16,
    /// Unsigned 32-bit.
    U32,
    /// Signed 32-bit.
    I32,
    /// 32-bit float.
    F32,
}

/// Commands.
#[derive(Subcommand)]
enum Command {
    /// Permute values: out[i] = input[indices[i] mod len].
    Permute {
        /// Element type.
        #[arg(long, value_enum, default_value_t = LaneKind::U8)]
        lane: LaneKind,
        /// Comma-separated input values.
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        input: Vec<String>,
        /// Comma-separated source indices, one per input value.
        #[arg(long, value_delimiter = ',', required = true)]
        indices: Vec<u32>,
    },

    /// Split interleaved values into channel planes.
    Deinterleave {
        /// Element type.
        #[arg(long, value_enum, default_value_t = LaneKind::U8)]
        lane: LaneKind,
        /// Number of interleaved channels.
        #[arg(long, short)]
        channels: usize,
        /// Comma-separated interleaved values.
        #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
        input: Vec<String>,
        /// What to do with a trailing partial block.
        #[arg(long, default_value = "process")]
        tail: TailPolicy,
    },

    /// Decompose a permutation pattern into vector blocks and moves.
    Plan {
        /// Comma-separated pattern (out[i] = in[pattern[i]]).
        #[arg(long, short, value_delimiter = ',', required = true)]
        pattern: Vec<u32>,
        /// Read the pattern as out[pattern[i]] = in[i].
        #[arg(long)]
        scatter: bool,
        /// Window widths to try, widest first.
        #[arg(long, value_delimiter = ',', default_value = "16,8,4")]
        widths: Vec<usize>,
    },

    /// Render a permutation pattern as a C function.
    #[command(name = "emit-c")]
    EmitC {
        /// Comma-separated pattern (out[i] = in[pattern[i]]).
        #[arg(long, short, value_delimiter = ',', required = true)]
        pattern: Vec<u32>,
        /// Read the pattern as out[pattern[i]] = in[i].
        #[arg(long)]
        scatter: bool,
        /// Instruction set to render for.
        #[arg(long, short, default_value = "avx2")]
        target: CTarget,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render a scatter pattern (out[pattern[i]] = in[i]) as a C function.
    Simplec {
        /// Comma-separated destination of each input position.
        #[arg(long, short, value_delimiter = ',', required = true)]
        pattern: Vec<u32>,
        /// Instruction set to render for.
        #[arg(long, short, default_value = "avx2")]
        target: CTarget,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print a random permutation of 0..len.
    #[command(name = "rand-pattern", alias = "randpat")]
    RandPattern {
        /// Pattern length.
        #[arg(long, short)]
        len: u32,
        /// Seed for a reproducible pattern; random when omitted.
        #[arg(long, short)]
        seed: Option<u64>,
    },

    /// Show detected CPU features and backends.
    Features,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let dispatcher = Dispatcher::from_preference(args.backend);
    log::info!("backend {} (requested {})", dispatcher.backend(), args.backend);

    match args.command {
        Command::Permute {
            lane,
            input,
            indices,
        } => match lane {
            LaneKind::U8 => run_permute::<u8>(&dispatcher, args.format, &input, &indices),
            LaneKind::I8 => run_permute::<i8>(&dispatcher, args.format, &input, &indices),
            LaneKind::U16 => run_permute::<u16>(&dispatcher, args.format, &input, &indices),
            LaneKind::U32 => run_permute::<u32>(&dispatcher, args.format, &input, &indices),
            LaneKind::I32 => run_permute::<i32>(&dispatcher, args.format, &input, &indices),
            LaneKind::F32 => run_permute::<f32>(&dispatcher, args.format, &input, &indices),
        },
        Command::Deinterleave {
            lane,
            channels,
            input,
            tail,
        } => {
            let d = Deinterleaver::new(channels)
                .context("Invalid channel count")?
                .with_tail(tail)
                .with_dispatcher(dispatcher);
            match lane {
                LaneKind::U8 => run_deinterleave::<u8>(&d, args.format, &input),
                LaneKind::I8 => run_deinterleave::<i8>(&d, args.format, &input),
                LaneKind::U16 => run_deinterleave::<u16>(&d, args.format, &input),
                LaneKind::U32 => run_deinterleave::<u32>(&d, args.format, &input),
                LaneKind::I32 => run_deinterleave::<i32>(&d, args.format, &input),
                LaneKind::F32 => run_deinterleave::<f32>(&d, args.format, &input),
            }
        }
        Command::Plan {
            pattern,
            scatter,
            widths,
        } => run_plan(args.format, &pattern, scatter, &widths),
        Command::EmitC {
            pattern,
            scatter,
            target,
            out,
        } => run_emit_c(&pattern, scatter, target, out),
        Command::Simplec {
            pattern,
            target,
            out,
        } => run_emit_c(&pattern, true, target, out),
        Command::RandPattern { len, seed } => run_rand_pattern(args.format, len, seed),
        Command::Features => run_features(&dispatcher, args.format),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn parse_values<T>(raw: &[String]) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            s.trim()
                .parse::<T>()
                .map_err(|err| anyhow::anyhow!("value {i} ({s:?}): {err}"))
        })
        .collect()
}

fn join<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Serialize)]
struct PermuteReport<'a, T> {
    backend: Backend,
    indices: &'a [u32],
    output: Vec<T>,
}

fn run_permute<T>(
    dispatcher: &Dispatcher,
    format: Format,
    raw: &[String],
    indices: &[u32],
) -> Result<()>
where
    T: Lane + FromStr + Display + Serialize,
    T::Err: Display,
{
    let input: Vec<T> = parse_values(raw).context("Failed to parse --input")?;
    let output = dispatcher
        .permute_slice(&input, indices)
        .context("Failed to permute")?;

    match format {
        Format::Text => println!("{}", join(&output)),
        Format::Json => print_json(&PermuteReport {
            backend: dispatcher.backend(),
            indices,
            output,
        })?,
    }
    Ok(())
}

fn run_deinterleave<T>(d: &Deinterleaver, format: Format, raw: &[String]) -> Result<()>
where
    T: Lane + FromStr + Display + Serialize,
    T::Err: Display,
{
    let input: Vec<T> = parse_values(raw).context("Failed to parse --input")?;
    let planes = d.run(&input).with_context(|| {
        format!(
            "Failed to deinterleave {} values into {} channels",
            input.len(),
            d.channels()
        )
    })?;

    match format {
        Format::Text => {
            for (c, plane) in planes.planes().iter().enumerate() {
                println!("channel {c}: {}", join(plane));
            }
            if planes.unprocessed() > 0 {
                println!("unprocessed: {}", planes.unprocessed());
            }
        }
        Format::Json => print_json(&planes)?,
    }
    Ok(())
}

fn build_plan(pattern: &[u32], scatter: bool, widths: &[usize]) -> Result<Plan> {
    let plan = if scatter {
        Plan::from_scatter(pattern, widths)
    } else {
        Plan::with_widths(pattern, widths)
    };
    plan.context("Failed to plan pattern")
}

fn run_plan(format: Format, pattern: &[u32], scatter: bool, widths: &[usize]) -> Result<()> {
    let plan = build_plan(pattern, scatter, widths)?;

    match format {
        Format::Text => {
            println!(
                "{} positions: {} lane blocks, {} moves",
                plan.len(),
                plan.lane_blocks(),
                plan.move_count()
            );
            for block in plan.blocks() {
                match block {
                    lanes::Block::Lanes {
                        offset,
                        width,
                        indices,
                    } => println!("  lanes  @{offset:<4} x{width:<2} [{}]", join(indices)),
                    lanes::Block::Move { dst, src } => println!("  move   {dst} <- {src}"),
                }
            }
        }
        Format::Json => print_json(&plan)?,
    }
    Ok(())
}

fn run_emit_c(pattern: &[u32], scatter: bool, target: CTarget, out: Option<PathBuf>) -> Result<()> {
    let plan = build_plan(pattern, scatter, target.widths())?;
    let source = emit_c(&plan, target);

    match out {
        Some(path) => {
            fs::write(&path, &source)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("  Written: {}", path.display());
        }
        None => print!("{source}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct RandPatternReport {
    len: u32,
    seed: u64,
    pattern: Vec<u32>,
}

fn run_rand_pattern(format: Format, len: u32, seed: Option<u64>) -> Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("random pattern of {len} with seed {seed}");
    let pattern = random_pattern(len, seed);

    match format {
        Format::Text => println!("{}", join(&pattern)),
        Format::Json => print_json(&RandPatternReport { len, seed, pattern })?,
    }
    Ok(())
}

#[derive(Serialize)]
struct FeaturesReport {
    arch: &'static str,
    detected: Backend,
    selected: Backend,
    available: Vec<Backend>,
}

fn run_features(dispatcher: &Dispatcher, format: Format) -> Result<()> {
    let report = FeaturesReport {
        arch: std::env::consts::ARCH,
        detected: Backend::detect(),
        selected: dispatcher.backend(),
        available: Backend::available(),
    };

    match format {
        Format::Text => {
            println!("arch:      {}", report.arch);
            #[cfg(target_arch = "x86_64")]
            {
                let cpu = lanes::arch::CpuFeatures::get();
                println!("cpu:       {cpu}");
                if let Some(missing) = cpu.missing_features() {
                    println!("missing:   {missing}");
                }
            }
            #[cfg(target_arch = "aarch64")]
            println!("cpu:       {:?}", lanes::arch::CpuFeatures::get());
            println!("detected:  {}", report.detected);
            println!("selected:  {}", report.selected);
            println!("available: {}", join(&report.available));
        }
        Format::Json => print_json(&report)?,
    }
    Ok(())
}
