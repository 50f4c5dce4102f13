use std::io::Write as _;
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use crate::config::Config;
use crate::diagnose_slabs::SlabOptions;

mod check_e57;
mod config;
mod diagnose_slabs;

#[derive(Parser, Debug)]
#[command(
    name = "Point Cloud Diagnostics",
    about = "Diagnostic tools for indoor scan point clouds",
    version = "0.0.1"
)]
struct Cli {
    /// TOML config listing the input files.
    #[arg(short, long, default_value = "config.toml", value_name = "FILE")]
    config: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which fields an E57 scan archive exposes.
    #[command(name = "check-e57")]
    CheckE57 {
        /// Archive to inspect instead of the first configured one.
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Histogram the z axis of the configured point files and report
    /// heavily populated levels.
    #[command(name = "diagnose-slabs")]
    DiagnoseSlabs {
        /// Height of one histogram bin in meters.
        #[arg(long, default_value_t = 0.15)]
        bin_width: f64,

        /// Fraction of the fullest bin a level must exceed to be reported.
        #[arg(long, default_value_t = 0.6)]
        threshold: f64,

        /// Keep only every n-th point record of each file.
        #[arg(long, default_value_t = 1)]
        every_nth: usize,

        /// Where the distribution chart is written.
        #[arg(long, default_value = "z_distribution.svg", value_name = "FILE")]
        plot_output: PathBuf,
    },
}

fn main() {
    let args = Cli::parse();

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, args.log_level)
        .init();

    log::info!("config file: {}", args.config.display());

    let config = match Config::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let start = std::time::Instant::now();
    log::info!("start processing...");

    let result = match &args.command {
        Command::CheckE57 { file } => check_e57::run(&config, file.as_deref()),
        Command::DiagnoseSlabs {
            bin_width,
            threshold,
            every_nth,
            plot_output,
        } => diagnose_slabs::run(
            &config,
            &SlabOptions {
                bin_width: *bin_width,
                threshold_fraction: *threshold,
                every_nth: *every_nth,
                plot_output: plot_output.clone(),
            },
        ),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }

    log::info!("Elapsed: {:?}", start.elapsed());
    log::info!("Finish processing");
}
