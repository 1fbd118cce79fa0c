//! CLI command handler: merge config file and flags, count, print the report.

use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::Opts;
use crate::WordCountReport;
use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_byte_bar, finish_bar, progress_callback};
use crate::utils::chunkpipe_toml::{apply_file_to_opts, load_chunkpipe_toml};
use crate::utils::{Colors, setup_logging};
use crate::wordcount::word_count_file;

/// Defaults, then `.chunkpipe.toml` in `config_dir`, then CLI flags. Logging is initialised here,
/// before any config error is reported. A broken config file fails the run.
pub fn setup_opts(cli: &Cli, config_dir: &Path) -> Result<Opts> {
    let file = load_chunkpipe_toml(config_dir);
    let file_verbose = file.as_ref().ok().and_then(|f| f.as_ref()?.verbose());
    setup_logging(cli.verbose.or(file_verbose).unwrap_or(false));

    let mut opts = Opts::default();
    if let Some(file) = file? {
        apply_file_to_opts(&file, &mut opts);
    }
    apply_cli_to_opts(cli, &mut opts);
    Ok(opts)
}

/// Overwrite opts with every flag the user actually passed.
pub fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    macro_rules! apply_flag {
        ($($field:ident),+) => {
            $(
                if let Some(v) = cli.$field {
                    opts.$field = v;
                }
            )+
        };
    }
    apply_flag!(workers, capacity, chunk_size, strict, verbose, json, in_memory);
}

/// Count `cli.file` and print the result.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli, Path::new("."))?;
    debug!("{} CONFIG: {:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

    let bar = if opts.verbose && !opts.in_memory {
        std::fs::metadata(&cli.file)
            .ok()
            .map(|m| create_byte_bar(m.len() as usize))
    } else {
        None
    };
    let report = word_count_file(&cli.file, &opts, progress_callback(&bar))?;
    if let Some(bar) = &bar {
        finish_bar(bar, report.tally.bytes as usize);
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &WordCountReport) {
    let line = |label: &str, value: String| {
        println!(
            "{} {}",
            Colors::colorize(Colors::LABEL, label),
            Colors::colorize(Colors::VALUE, &value)
        );
    };
    line("Total words:", report.tally.words.to_string());
    line("Lines:", report.tally.lines.to_string());
    line("Bytes:", report.tally.bytes.to_string());
    line(
        "Elapsed time (total):",
        format!("{:.2} ms", report.elapsed.as_secs_f64() * 1000.0),
    );
    if report.skipped > 0 {
        println!(
            "{}",
            Colors::colorize(
                Colors::WARN,
                &format!("{} chunks skipped; totals are partial", report.skipped)
            )
        );
    }
}
