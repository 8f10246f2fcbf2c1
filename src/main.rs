//! FastBai CLI entry point
//!
//! Inspect BAM index files and resolve regions into virtual-offset ranges.

use anyhow::Context;
use clap::{Parser, Subcommand};
use fast_bai::core::{reg2bin, reg2bins, DEFAULT_CACHE_CAPACITY};
use fast_bai::{index_path_for, BaiIndex, IndexOptions, IoStrategy, VirtualOffset};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fast-bai")]
#[command(about = "BAM index (BAI) inspection and region queries")]
#[command(version)]
#[command(author = "FastBai Contributors")]
struct Cli {
    /// Number of parsed reference blocks kept in memory
    #[arg(long = "cache-size", global = true, default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_size: usize,

    /// Memory-map the index file instead of buffered reads
    #[arg(long, global = true)]
    mmap: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print reference spans, bin counts and unmapped statistics
    Info {
        /// BAI file, or the BAM file it accompanies
        index: PathBuf,
    },
    /// Print virtual-offset ranges covering a region
    Query {
        /// BAI file, or the BAM file it accompanies
        index: PathBuf,
        /// Reference id (0-based)
        ref_id: usize,
        /// Region start (0-based, inclusive)
        start: i64,
        /// Region end (exclusive)
        stop: i64,
    },
    /// Print the bins of a region
    Bins {
        /// Region start (0-based, inclusive)
        start: i64,
        /// Region end (exclusive)
        stop: i64,
    },
}

/// Accept either the index itself or the alignment it belongs to
fn resolve_index_path(path: PathBuf) -> PathBuf {
    if path.exists() {
        return path;
    }
    let candidate = index_path_for(&path);
    if candidate.exists() {
        candidate
    } else {
        path
    }
}

fn open_index(path: PathBuf, cli: &Cli) -> anyhow::Result<BaiIndex> {
    let start = Instant::now();
    let path = resolve_index_path(path);
    eprintln!("Loading BAI file: {:?}", path);

    let capacity = NonZeroUsize::new(cli.cache_size)
        .context("--cache-size must be at least 1")?;
    let strategy = if cli.mmap {
        IoStrategy::MemoryMapped
    } else {
        IoStrategy::Auto
    };
    let options = IndexOptions::default()
        .with_cache_capacity(capacity)
        .with_io_strategy(strategy);

    let index = BaiIndex::open_with(&path, options)
        .with_context(|| format!("Failed to load BAI file {:?}", path))?;
    eprintln!("BAI file loaded in {:.3}s", start.elapsed().as_secs_f64());
    Ok(index)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Info { index } => {
            let index = open_index(index.clone(), &cli)?;

            println!("n_ref\t{}", index.n_refs());
            match index.n_no_coor() {
                Some(n) => println!("n_no_coor\t{}", n),
                None => println!("n_no_coor\t."),
            }
            println!("#ref_id\tstart_offset\tend_offset\tn_bins\tn_mapped\tn_unmapped");
            for (ref_id, entry) in index.catalog().iter().enumerate() {
                let (mapped, unmapped) = match index.unmapped(ref_id) {
                    Some(stats) => (stats.n_mapped.to_string(), stats.n_unmapped.to_string()),
                    None => (".".to_string(), ".".to_string()),
                };
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    ref_id, entry.start_offset, entry.end_offset, entry.n_bins, mapped, unmapped
                );
            }
        }

        Commands::Query { index, ref_id, start, stop } => {
            let mut index = open_index(index.clone(), &cli)?;
            let ranges = index
                .query(*ref_id, *start, *stop)
                .with_context(|| format!("Query {}:{}-{} failed", ref_id, start, stop))?;

            for (begin, end) in &ranges {
                println!(
                    "{}\t{}\t{}\t{}",
                    begin,
                    end,
                    VirtualOffset::from_raw(*begin),
                    VirtualOffset::from_raw(*end)
                );
            }
            eprintln!("{} range(s)", ranges.len());
        }

        Commands::Bins { start, stop } => {
            let bins: Vec<String> = reg2bins(*start, *stop)?.map(|b| b.to_string()).collect();
            println!("reg2bin\t{}", reg2bin(*start, *stop));
            println!("reg2bins\t{}", bins.join(","));
        }
    }

    Ok(())
}
