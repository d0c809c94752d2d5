//! Pipeline configuration.
//!
//! Most values that the original design treats as build-time constants are
//! kept as plain `Config` fields here so the core stays testable without a
//! recompile, and are passed explicitly through the pipeline rather than
//! read from globals (see DESIGN.md's "cyclic / global state" note). The
//! one exception is `no_filter`, a single global toggle in the source
//! design (`get_no_filter()`); kept as a process-wide atomic since it's
//! read from deep inside the variant emitter's hot path and set once at
//! startup, not worth threading through every call site.

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

/// Global "skip empirical filters" toggle, mirroring `get_no_filter()`.
static NO_FILTER: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn set_no_filter(enabled: bool) {
    NO_FILTER.store(enabled, Ordering::Release);
}

#[inline]
pub fn no_filter() -> bool {
    NO_FILTER.load(Ordering::Acquire)
}

/// Supported read lengths; the variant filter tables are keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLen {
    Bp120,
    Bp150,
}

impl ReadLen {
    pub fn as_usize(self) -> usize {
        match self {
            ReadLen::Bp120 => 120,
            ReadLen::Bp150 => 150,
        }
    }

    pub fn from_usize(len: usize) -> Option<Self> {
        match len {
            120 => Some(ReadLen::Bp120),
            150 => Some(ReadLen::Bp150),
            _ => None,
        }
    }
}

/// Runtime configuration for one mapping run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Read length `L`.
    pub read_len: ReadLen,
    /// Seed length `S` used by the index.
    pub seed_len: usize,
    /// Substitution-only early-exit threshold passed into both kernels.
    pub max_score: i32,
    /// Gap-affine costs.
    pub cost_sub: i32,
    pub cost_gapo: i32,
    pub cost_gape: i32,
    /// ODPD band width parameter; half-band = `nb_diag / 2 + 1`.
    pub nb_diag: usize,
    /// DOUT capacities.
    pub max_local_results_per_read: usize,
    pub max_results_per_read: usize,
    /// Result pool capacity (per simulated accelerator).
    pub max_dpu_results: usize,
    /// Number of cooperative workers per simulated accelerator.
    pub nb_tasklet_per_dpu: usize,
    /// Number of simulated accelerator slots.
    pub nb_dpu: usize,
    /// Disable the empirical depth/score/percentage filters (homopolymer
    /// suppression still applies).
    pub no_filter: bool,
    /// Output file prefix; VCF/unmapped-FASTA/timing files derive from it.
    pub input_prefix: String,
}

impl Config {
    /// Neighbourhood byte length for `delta = 0` (round 0).
    pub fn nbr_bytes(&self) -> usize {
        (self.read_len.as_usize() - self.seed_len) / 4
    }

    /// Neighbourhood byte length shrunk for round `round` (0, 1, or 2).
    pub fn nbr_bytes_for_round(&self, round: usize) -> usize {
        let delta = self.delta_for_round(round);
        self.nbr_bytes().saturating_sub(delta)
    }

    /// `delta = seed_len * round / 4`, per spec.
    pub fn delta_for_round(&self, round: usize) -> usize {
        self.seed_len * round / 4
    }

    /// Half-band width used by the ODPD kernel.
    pub fn odpd_diagonal(&self) -> usize {
        self.nb_diag / 2 + 1
    }

    /// Sensible defaults for a given read length, matching the source
    /// design's constants where they could be recovered (see DESIGN.md).
    pub fn default_for_read_len(read_len: ReadLen) -> Self {
        Self {
            read_len,
            seed_len: 12,
            max_score: 40,
            cost_sub: 10,
            cost_gapo: 11,
            cost_gape: 1,
            nb_diag: 15,
            max_local_results_per_read: 8,
            max_results_per_read: 256,
            max_dpu_results: 4096,
            nb_tasklet_per_dpu: 16,
            nb_dpu: 1,
            no_filter: false,
            input_prefix: "upvc".to_string(),
        }
    }
}

/// Command-line entry point for the `upvc` binary.
#[derive(Parser, Debug)]
#[command(name = "upvc")]
#[command(author = "Manish Kumar Bobbili")]
#[command(version)]
#[command(
    about = "upvc-rs: short-read aligner and variant caller core",
    long_about = None
)]
pub struct Cli {
    /// Reference FASTA path.
    #[arg(short = 'r', long)]
    pub reference: std::path::PathBuf,

    /// Paired-end mate 1 FASTQ path.
    #[arg(long = "pe1")]
    pub pe1: std::path::PathBuf,

    /// Paired-end mate 2 FASTQ path.
    #[arg(long = "pe2")]
    pub pe2: std::path::PathBuf,

    /// Output file prefix.
    #[arg(short = 'o', long, default_value = "upvc")]
    pub output_prefix: String,

    /// Read length (120 or 150).
    #[arg(long, default_value_t = 120)]
    pub read_len: usize,

    /// Number of simulated accelerator slots.
    #[arg(long, default_value_t = 1)]
    pub nb_dpu: usize,

    /// Disable the empirical depth/score/percentage filters.
    #[arg(long)]
    pub no_filter: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Build a pipeline [`Config`] from parsed CLI args.
    pub fn to_config(&self) -> crate::error::Result<Config> {
        let read_len = ReadLen::from_usize(self.read_len).ok_or_else(|| {
            crate::error::UpvcError::Configuration(format!(
                "unsupported read length {}; expected 120 or 150",
                self.read_len
            ))
        })?;
        let mut config = Config::default_for_read_len(read_len);
        config.nb_dpu = self.nb_dpu;
        config.no_filter = self.no_filter;
        config.input_prefix = self.output_prefix.clone();
        Ok(config)
    }
}
