use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use txmap::coord::{self, ErrorPolicy, MapOpt};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "txmap", author, version, about = "Translate transcript coordinates to genomic coordinates", arg_required_else_help = true)]
struct Cli {
    /// Tab-delimited transcript mappings: tx_id, chrom_id, mapping_start_pos, CIGAR
    #[arg(short, long)]
    transcripts: PathBuf,
    /// Tab-delimited queries: tx_id, tx_pos (0-based)
    #[arg(short, long)]
    queries: PathBuf,
    /// Output path: tx_id, tx_pos, chrom_id, chrom_pos
    #[arg(short, long)]
    output: PathBuf,
    /// What to do with a query that cannot be mapped
    #[arg(long = "on-error", value_enum, default_value_t = ErrorPolicy::Abort)]
    on_error: ErrorPolicy,
    #[arg(long = "threads", default_value_t = 1)]
    threads: usize,
    /// Queries mapped per parallel batch
    #[arg(long = "batch-size", default_value_t = 8192)]
    batch_size: usize,
    /// Log filter, e.g. `info` or `txmap=debug` (RUST_LOG takes precedence)
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let opt = MapOpt {
        on_error: cli.on_error,
        threads: cli.threads,
        batch_size: cli.batch_size,
    };
    let summary = coord::map_query_file(&cli.transcripts, &cli.queries, &cli.output, &opt)
        .with_context(|| {
            format!(
                "cannot map queries '{}' against transcripts '{}'",
                cli.queries.display(),
                cli.transcripts.display()
            )
        })?;

    info!(
        mapped = summary.mapped,
        in_insertion = summary.in_insertion,
        skipped = summary.skipped,
        "Mappings done, output to {}",
        cli.output.display()
    );
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", level, e))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}
