//! `ppdcache` - inspect and check PPD cache files.
//!
//! Build: `cargo build --bin ppdcache --features cli`

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use ppdcache::{Config, PpdCache};

// ── CLI ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ppdcache", about = "inspect PPD cache files")]
struct Args {
    /// path to config.toml
    #[arg(long, env = "PPDCACHE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// show what a cache file maps
    Inspect {
        /// cache file, or printer name inside the cache directory
        file: String,
        /// print the whole cache as JSON
        #[arg(long)]
        json: bool,
    },
    /// resolve a page size name (PPD name, PWG keyword or Custom.WxH)
    LookupSize {
        file: String,
        name: String,
    },
    /// list the finishings table
    Finishings { file: String },
    /// load a cache file and report whether it is usable
    Check { file: String },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    };

    // RUST_LOG wins over the configured filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &args.command {
        Command::Inspect { file, json } => inspect(&config, file, *json),
        Command::LookupSize { file, name } => lookup_size(&config, file, name),
        Command::Finishings { file } => finishings(&config, file),
        Command::Check { file } => check(&config, file),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

// ── commands ────────────────────────────────────────────────────────

fn inspect(config: &Config, file: &str, json: bool) -> CliResult {
    let path = config.cache_file(file);
    let (pc, attrs) = PpdCache::load_with_attributes(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pc)?);
        return Ok(());
    }

    println!("{}", path.display());
    println!("product:      {}", pc.product().unwrap_or("-"));
    println!("max copies:   {}", pc.max_copies());
    println!("single file:  {}", pc.single_file());
    if let Some((max, min)) = pc.custom_keywords() {
        println!("custom sizes: {min} .. {max}");
    }
    if let Some(option) = pc.sides_option() {
        println!("sides option: {option}");
    }
    if let Some(attrs) = &attrs {
        println!("attributes:   {}", attrs.len());
    }

    println!();
    println!("{:<40} {:<24} {:>7} {:>7}", "SIZE", "PPD", "WIDTH", "LENGTH");
    println!("{}", "─".repeat(81));
    for s in pc.sizes() {
        println!("{:<40} {:<24} {:>7} {:>7}", s.pwg, s.ppd, s.width, s.length);
    }

    for (title, maps) in [("SOURCE", pc.sources()), ("TYPE", pc.types()), ("BIN", pc.bins())] {
        if maps.is_empty() {
            continue;
        }
        println!();
        println!("{title:<40} PPD");
        println!("{}", "─".repeat(64));
        for map in maps {
            println!("{:<40} {}", map.pwg, map.ppd);
        }
    }

    if !pc.presets().is_empty() {
        println!();
        println!("{:<12} {:<8} OPTIONS", "COLOR", "QUALITY");
        println!("{}", "─".repeat(64));
        for (color, quality, options) in pc.presets().iter() {
            if !options.is_empty() {
                println!("{:<12} {:<8} {options}", color.keyword(), quality.keyword());
            }
        }
    }

    for filter in pc.filters() {
        println!("filter: {filter}");
    }
    Ok(())
}

fn lookup_size(config: &Config, file: &str, name: &str) -> CliResult {
    let pc = config.loaded_caches().get(config.cache_file(file))?;

    let size = pc.size_for_name(name);
    let page_size = pc.page_size_for_keyword(name);
    if size.is_none() && page_size.is_none() {
        return Err(format!("no size matches '{name}'").into());
    }

    if let Some(size) = size {
        println!("pwg:       {}", size.pwg);
        println!("ppd:       {}", size.ppd);
        println!("size:      {} x {} (1/2540 in)", size.width, size.length);
        println!(
            "margins:   left {} bottom {} right {} top {}",
            size.left, size.bottom, size.right, size.top
        );
    }
    if let Some(m) = page_size {
        let kind = if m.exact { "exact" } else { "closest" };
        println!("page size: {} ({kind})", m.name);
    }
    Ok(())
}

fn finishings(config: &Config, file: &str) -> CliResult {
    let pc = PpdCache::load(config.cache_file(file))?;

    if pc.finishings().is_empty() {
        println!("no finishings.");
        return Ok(());
    }
    println!("{:>6}  OPTIONS", "VALUE");
    println!("{}", "─".repeat(64));
    for entry in pc.finishings() {
        println!("{:>6}  {}", entry.value, entry.options);
    }
    for template in pc.templates() {
        println!("template: {template}");
    }
    Ok(())
}

fn check(config: &Config, file: &str) -> CliResult {
    let path = config.cache_file(file);
    match PpdCache::load(&path) {
        Ok(pc) => {
            println!(
                "{}: ok (version {}, {} sizes)",
                path.display(),
                ppdcache::CACHE_VERSION,
                pc.sizes().len()
            );
            Ok(())
        }
        Err(e) if e.is_out_of_date() => Err(format!("{}: out of date: {e}", path.display()).into()),
        Err(e) if e.is_bad_format() => Err(format!("{}: bad format: {e}", path.display()).into()),
        Err(e) => Err(e.into()),
    }
}
