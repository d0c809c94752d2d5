// Clippy allows
#![allow(clippy::too_many_arguments)]

//! upvc: short-read aligner and variant caller CLI.
//!
//! Usage: upvc -r <reference.fasta> --pe1 <mate1.fastq> --pe2 <mate2.fastq> -o <prefix>

use std::fs::File;
use std::io::BufReader;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use upvc_core::config::Cli;
use upvc_core::context::UpvcContext;
use upvc_core::error::Result;
use upvc_core::genome::Genome;
use upvc_core::reads;

/// `-v` for info, `-vv` for debug, `-vvv+` for trace; silent otherwise
/// beyond warnings, matching the CLI's `verbose: u8` count.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config()?;
    upvc_core::config::set_no_filter(config.no_filter);

    tracing::info!(reference = %cli.reference.display(), "loading reference");
    let genome = Genome::from_fasta(&cli.reference)?;

    tracing::info!(pe1 = %cli.pe1.display(), pe2 = %cli.pe2.display(), "loading reads");
    let mut mate1 = BufReader::new(File::open(&cli.pe1)?);
    let mut mate2 = BufReader::new(File::open(&cli.pe2)?);
    let reads = reads::load_pairs(&mut mate1, &mut mate2, config.read_len.as_usize(), usize::MAX)?;
    tracing::info!(nb_reads = reads.len(), "read pairs loaded");

    let mut ctx = UpvcContext::new(genome, config.clone());
    let unmapped = ctx.run(reads)?;
    tracing::info!(nb_unmapped = unmapped.len(), "mapping finished");

    let vcf_path = format!("{}_upvc.vcf", config.input_prefix);
    let out = File::create(&vcf_path)?;
    let emitted = ctx.write_vcf(out, &cli.reference.display().to_string(), "20260101")?;
    tracing::info!(vcf_path = %vcf_path, nb_variants = emitted, "variants written");

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}
