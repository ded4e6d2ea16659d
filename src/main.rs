use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error, info, warn};
use simplelog::{ColorChoice, ConfigBuilder, SimpleLogger, TermLogger, TerminalMode};

use dupscan::{Cli, DuplicateScanner, OutputFormat, ScanConfig, ScanError, format_human_elapsed};

/// Exit code used when the user interrupts the scan.
const EXIT_INTERRUPTED: i32 = 130;

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };

    let mut builder = ConfigBuilder::new();
    builder.set_target_level(LevelFilter::Off);
    // Falls back to UTC when the local offset cannot be determined
    let _ = builder.set_time_offset_to_local();
    let config = builder.build();

    if TermLogger::init(level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        let _ = SimpleLogger::init(level, config);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = ScanConfig::resolve(cli)?;
    debug!("Effective config: {:?}", config);

    let algorithm = config.algorithm;
    let scanner = DuplicateScanner::new(config);
    let result = scanner.scan_with_stats(&cli.path)?;

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut out = stdout.lock();
    let written = match cli.format {
        OutputFormat::Text => dupscan::write_text(&mut out, &cli.path, &result.duplicates, color),
        OutputFormat::Json => dupscan::write_json(&mut out, &cli.path, &result, algorithm),
    };
    written
        .and_then(|()| out.flush())
        .context("Failed to write report")?;

    Ok(())
}

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logging(&cli);

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    if let Err(e) = ctrlc::set_handler(|| {
        warn!("Interrupted, aborting scan");
        std::process::exit(EXIT_INTERRUPTED);
    }) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    match run(&cli) {
        Ok(()) => {
            info!(
                "Program completed successfully in {}",
                format_human_elapsed(start_time.elapsed())
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err
                .downcast_ref::<ScanError>()
                .map(ScanError::exit_code)
                .unwrap_or(1);
            error!("{err:#}");
            ExitCode::from(code)
        }
    }
}
