// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use asm_averager::{
    AveragerProgram, CompilerSettings, ProgramConfig, RAveragerProgram, UnsupportedGatePolicy,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tproc_asm::program::Program;
use tproc_asm::simulator::Simulator;

#[derive(Parser, Debug)]
#[command(name = "asm-averager", version, about = "Compile gate listings into tProc programs")]
struct Cli {
    /// Log per-gate translation details.
    #[arg(long, global = true)]
    diagnostics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    /// Gate listing file.
    #[arg(long)]
    listing: PathBuf,
    /// JSON program configuration.
    #[arg(long)]
    config: PathBuf,
    /// Wrap the listing in an outer `expts` sweep loop.
    #[arg(long)]
    sweep: bool,
    /// Fail on gates other than `h` and `x` instead of skipping them.
    #[arg(long)]
    reject_unsupported: bool,
    /// Memory address of the progress counter.
    #[arg(long, default_value_t = 1)]
    progress_address: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the assembly of the compiled program.
    Compile {
        #[command(flatten)]
        args: CompileArgs,
        /// Write the assembly to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Compile and execute the program in the reference simulator.
    Simulate {
        #[command(flatten)]
        args: CompileArgs,
    },
}

fn compile(args: &CompileArgs) -> anyhow::Result<Program> {
    let listing = std::fs::read_to_string(&args.listing)
        .with_context(|| format!("Failed to read listing '{}'", args.listing.display()))?;
    let config = ProgramConfig::from_file(&args.config)?;
    let settings = CompilerSettings {
        progress_address: args.progress_address,
        unsupported_gates: if args.reject_unsupported {
            UnsupportedGatePolicy::Reject
        } else {
            UnsupportedGatePolicy::Skip
        },
        ..Default::default()
    };
    let program = if args.sweep {
        RAveragerProgram::from_listing(&listing, &config, &settings)?
            .program()
            .clone()
    } else {
        AveragerProgram::from_listing(&listing, &config, &settings)?
            .program()
            .clone()
    };
    Ok(program)
}

fn write_output(asm: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, asm)
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            print!("{asm}");
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    tproc_log::init_logging(cli.diagnostics);

    match cli.command {
        Command::Compile { args, output } => {
            let program = compile(&args)?;
            write_output(&program.to_asm(), output.as_deref())?;
        }
        Command::Simulate { args } => {
            let program = compile(&args)?;
            let mut simulator = Simulator::new();
            let report = simulator.run(&program)?;
            let progress = simulator.memory(args.progress_address).unwrap_or(0);
            log::info!(
                "Executed {} steps, fired {} pulses",
                report.steps,
                report.pulses.len()
            );
            println!("progress: {progress}");
            for pulse in report.pulses.iter().take(16) {
                println!(
                    "ch {} {} length {}",
                    pulse.channel, pulse.waveform, pulse.length
                );
            }
        }
    }
    Ok(())
}
