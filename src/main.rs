use std::path::PathBuf;

use clap::Parser;
use regularly_convert::commands::convert::{self, ConvertArgs};
use regularly_convert::output::Format;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regularly-convert",
    version,
    about = "Convert a Regularly DB to this program's format"
)]
struct Cli {
    /// Path to regularly.db
    #[arg(value_name = "INFILE")]
    infile: PathBuf,
    /// Directory for output; converted.db is written next to it
    #[arg(value_name = "OUTDIR")]
    outdir: String,
    /// Inspect the source and report what would be converted, writing nothing
    #[arg(long)]
    dry_run: bool,
    /// Write the old -> new task id mapping to this JSON file
    #[arg(long, value_name = "PATH")]
    id_map: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: Format,
    /// Shorthand for --format pretty
    #[arg(long, hide = true)]
    pretty: bool,
    /// Log progress to stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = if cli.pretty {
        Format::Pretty
    } else {
        cli.format
    };
    let args = ConvertArgs {
        infile: cli.infile,
        outdir: cli.outdir,
        dry_run: cli.dry_run,
        id_map: cli.id_map,
    };
    if let Err(e) = convert::run(&args, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            Format::Pretty => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
