// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! upvc-rs: short-read aligner and variant caller core.
//!
//! Seeds paired-end reads against a reference index, dispatches candidate
//! neighbourhoods to accelerator slots (simulated on host threads or, in
//! principle, a real device), runs a fast substitution-only kernel with a
//! banded affine-gap dynamic-programming fallback, accumulates best-scoring
//! hits, and deduplicates discovered variants into a per-chromosome store
//! emitted as VCF.
//!
//! # Example
//!
//! ```rust,no_run
//! use upvc_core::config::{Config, ReadLen};
//! use upvc_core::context::UpvcContext;
//! use upvc_core::genome::Genome;
//!
//! let genome = Genome::from_fasta("reference.fasta").unwrap();
//! let config = Config::default_for_read_len(ReadLen::Bp120);
//! let mut ctx = UpvcContext::new(genome, config);
//! let unmapped = ctx.run(Vec::new()).unwrap();
//! let out = std::fs::File::create("out.vcf").unwrap();
//! ctx.write_vcf(out, "reference.fasta", "20260101").unwrap();
//! ```

pub mod accumulate;
pub mod backend;
pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod dout;
pub mod error;
pub mod genome;
pub mod index;
pub mod kernel;
pub mod pass;
pub mod reads;
pub mod result_pool;
pub mod types;
pub mod variant_call;
pub mod vartree;
pub mod vcf;
pub mod wire;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
