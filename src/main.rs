//! vmsim - run a read/write trace through the simulated virtual memory
//!
//! Usage: vmsim [OPTIONS] <TRACE> [OUTPUT]
//!
//! Each trace line is `r <address>` or `w <address> <value>`. One result
//! line is produced per operation: the word read, `ok` for a write, or -1
//! when the address is out of range.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use vm_manager::io::{format_results, run_trace, write_results, Trace};
use vm_manager::logger;
use vm_manager::{Geometry, VirtualMemory};

#[derive(Parser)]
#[command(name = "vmsim")]
#[command(about = "Hierarchical page-table virtual memory simulator")]
struct Cli {
    /// Trace file with one `r <address>` or `w <address> <value>` per line
    trace: PathBuf,

    /// Where to write results (stdout if omitted)
    output: Option<PathBuf>,

    /// JSON file with `offset_width`, `tables_depth` and `num_frames`
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    offset_width: Option<u32>,

    #[arg(long)]
    tables_depth: Option<u32>,

    #[arg(long)]
    num_frames: Option<u64>,

    /// Print translation statistics as JSON to stderr
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Defaults, then the config file, then individual flags
    fn geometry(&self) -> Result<Geometry> {
        let base = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Geometry::default(),
        };

        let geometry = Geometry::new(
            self.offset_width.unwrap_or(base.offset_width()),
            self.tables_depth.unwrap_or(base.tables_depth()),
            self.num_frames.unwrap_or(base.num_frames()),
        )?;
        Ok(geometry)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose)).context("Failed to install logger")?;

    let geometry = cli.geometry()?;
    info!(
        "geometry: offset width {}, depth {}, {} frames ({} virtual words, {} physical)",
        geometry.offset_width(),
        geometry.tables_depth(),
        geometry.num_frames(),
        geometry.virtual_memory_size(),
        geometry.ram_size()
    );

    let trace = Trace::from_file(&cli.trace).map_err(anyhow::Error::msg)?;
    info!("{} operations in {}", trace.ops.len(), cli.trace.display());

    let mut vm = VirtualMemory::new(geometry);
    let results = run_trace(&mut vm, &trace);

    for (page, frame) in vm.resident_pages() {
        info!("page {} resident in frame {}", page, frame);
    }

    match &cli.output {
        Some(path) => {
            write_results(path, &results).map_err(anyhow::Error::msg)?;
            info!("Results written to: {}", path.display());
        }
        None => print!("{}", format_results(&results)),
    }

    if cli.stats {
        let stats = serde_json::to_string_pretty(&vm.stats())?;
        eprintln!("{}", stats);
    }

    Ok(())
}
