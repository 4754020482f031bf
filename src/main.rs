// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the caches (unless --no-cache)
// 3. Scan the directory and validate every link
// 4. Print the report (or JSON) to stdout, optionally write it to a file
// 5. Update the caches after live runs
// 6. Exit with proper code (0 = all valid, 1 = broken links, 2 = error)
//
// Progress messages go to stderr so `--json > out.json` stays clean.
//
// Rust concepts used:
// - async/await: Link validation runs many requests concurrently
// - anyhow::Context: attach "what were we doing" to an error
// - Option<T>: the caches are simply None when --no-cache is given
// =============================================================================

mod cli; // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method

use cli::Cli;
use link_checker::cache::{
    cleanup_config, load_config, load_skip_config, record_results, save_config,
    save_skip_config, update_skip_config,
};
use link_checker::logging::init_logger;
use link_checker::{format_report, summarize, CacheLookup, LinkInfo, Scanner};

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = no invalid links
//   Ok(1) = invalid links found
//   Err = configuration or I/O problem (mapped to exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.log_level) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let options = cli.scan_options();
    let live = options.check_live_links;

    eprintln!("🔍 Scanning {}", cli.directory.display());
    if !live {
        eprintln!("🌐 External links: syntax check only (use --live for real requests)");
    }

    let (mut config, mut skip) = if cli.no_cache {
        (None, None)
    } else {
        (Some(load_config(&cli.config)), Some(load_skip_config(&cli.skip_config)))
    };

    let scanner = Scanner::new(options).context("failed to set up the HTTP client")?;
    let cache = CacheLookup {
        results: config.as_ref(),
        skip: skip.as_ref(),
    };
    let results = scanner
        .scan_with_cache(&cli.directory, cache)
        .await
        .with_context(|| format!("failed to scan {}", cli.directory.display()))?;

    eprintln!("📄 Checked {} link(s)\n", results.len());

    let report = format_report(&results);
    if cli.json {
        let summary = summarize(results.clone());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", report);
    }

    if let Some(path) = &cli.output {
        std::fs::write(path, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("💾 Report written to {}", path.display());
    }

    // A syntax-only pass proves nothing about reachability, so only live
    // runs are allowed to change what the caches believe
    if live {
        if let Some(config) = config.as_mut() {
            config.clear_locations();
            record_results(config, &results);
            cleanup_config(config);
            save_config(config, &cli.config)
                .with_context(|| format!("failed to save {}", cli.config.display()))?;
        }
        if let Some(skip) = skip.as_mut() {
            update_skip_config(skip, &results);
            save_skip_config(skip, &cli.skip_config)
                .with_context(|| format!("failed to save {}", cli.skip_config.display()))?;
        }
    }

    Ok(exit_code(&results))
}

fn exit_code(results: &[LinkInfo]) -> i32 {
    if results.iter().any(|r| r.is_invalid()) {
        1 // Exit code 1 = broken links found
    } else {
        0 // Exit code 0 = all good
    }
}
