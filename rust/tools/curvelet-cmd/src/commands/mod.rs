//! Command implementations for curvelet-cmd

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use curvelet_bridge::{BoundaryMode, Complex64, FdctOptions};
use curvelet_testkit::data_gen;

/// Binds `$lib` to the selected backend and evaluates `$body`.
macro_rules! with_backend {
    ($backend:expr, |$lib:ident| $body:expr) => {
        match $backend {
            $crate::commands::Backend::BlockPartition => {
                let $lib = curvelet_bridge::BlockPartition::default();
                $body
            }
            #[cfg(feature = "curvelab")]
            $crate::commands::Backend::Curvelab => {
                let $lib = curvelet_bridge::CurveLab::default();
                $body
            }
            #[cfg(not(feature = "curvelab"))]
            $crate::commands::Backend::Curvelab => {
                anyhow::bail!("curvelet-cmd was built without the `curvelab` feature")
            }
        }
    };
}

pub mod energy;
pub mod params;
pub mod roundtrip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Pure-Rust stand-in that partitions the input into bands
    BlockPartition,
    /// CurveLab through the native shim
    Curvelab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Boundary {
    Curvelets,
    Wavelets,
}

impl From<Boundary> for BoundaryMode {
    fn from(boundary: Boundary) -> Self {
        match boundary {
            Boundary::Curvelets => BoundaryMode::Curvelets,
            Boundary::Wavelets => BoundaryMode::Wavelets,
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Input extents, row-major (e.g. `--dims 128,96`)
    #[arg(long, value_delimiter = ',', required = true)]
    pub dims: Vec<usize>,

    /// JSON file with transform options; flags override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of scales (derived from the extents when omitted)
    #[arg(long, allow_negative_numbers = true)]
    pub nbscales: Option<i32>,

    /// Number of angles at the second coarsest scale
    #[arg(long)]
    pub nbangles_coarse: Option<i32>,

    /// Band type at the finest scale
    #[arg(long, value_enum)]
    pub boundary: Option<Boundary>,

    /// Transform implementation
    #[arg(long, value_enum, default_value_t = Backend::BlockPartition)]
    pub backend: Backend,
}

impl TransformArgs {
    /// Options from `--config`, with the explicit flags applied on top.
    pub fn options(&self) -> Result<FdctOptions> {
        let mut options = match &self.config {
            Some(path) => FdctOptions::load(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => FdctOptions::default(),
        };
        if let Some(nbscales) = self.nbscales {
            options.nbscales = Some(nbscales);
        }
        if let Some(nbangles_coarse) = self.nbangles_coarse {
            options.nbangles_coarse = nbangles_coarse;
        }
        if let Some(boundary) = self.boundary {
            options.boundary = boundary.into();
        }
        log::info!("transform options: {options:?}");
        Ok(options)
    }
}

/// `len` random samples, seeded when `seed` is given.
pub fn random_samples(len: usize, seed: Option<u64>) -> Vec<Complex64> {
    match seed {
        Some(seed) => data_gen::complex_vec_seeded(len, seed),
        None => data_gen::complex_vec(len),
    }
}
