//! Roundtrip command implementation

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use curvelet_bridge::{BoundaryMode, CurveletLibrary, FdctOperator};
use ndarray::{Ix2, Ix3};
use serde::Serialize;

use crate::commands::{TransformArgs, random_samples};

#[derive(Debug, Args)]
pub struct RoundtripArgs {
    #[command(flatten)]
    pub transform: TransformArgs,

    /// Transformed axes, negative values counting from the last one (default: all)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub dirs: Vec<isize>,

    /// Seed for the random input
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Serialize)]
struct RoundtripSummary {
    dims: Vec<usize>,
    dirs: Vec<usize>,
    nbscales: i32,
    nbangles_coarse: i32,
    boundary: BoundaryMode,
    angle_counts: Vec<usize>,
    iterations: usize,
    coefficients: usize,
    relative_error: f64,
    forward_ms: f64,
    inverse_ms: f64,
}

pub fn run(args: RoundtripArgs) -> Result<()> {
    let options = args.transform.options()?;
    let dims = &args.transform.dims;
    let dirs: Vec<isize> = if args.dirs.is_empty() {
        (0..dims.len() as isize).collect()
    } else {
        args.dirs.clone()
    };
    let summary = with_backend!(args.transform.backend, |lib| {
        let op = FdctOperator::new(lib, dims, &dirs, &options)
            .context("Failed to set up the transform")?;
        roundtrip(&op, args.seed)?
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn roundtrip<L>(op: &FdctOperator<L>, seed: Option<u64>) -> Result<RoundtripSummary>
where
    L: CurveletLibrary<Ix2> + CurveletLibrary<Ix3>,
{
    let (_, cols) = op.shape();
    let x = random_samples(cols, seed);

    let start = Instant::now();
    let y = op.matvec(&x).context("Forward transform failed")?;
    let forward_ms = start.elapsed().as_secs_f64() * 1e3;

    let start = Instant::now();
    let back = op.rmatvec(&y).context("Inverse transform failed")?;
    let inverse_ms = start.elapsed().as_secs_f64() * 1e3;

    let geometry = op.geometry();
    Ok(RoundtripSummary {
        dims: op.dims().to_vec(),
        dirs: op.dirs().to_vec(),
        nbscales: geometry.nbscales,
        nbangles_coarse: geometry.nbangles_coarse,
        boundary: geometry.boundary,
        angle_counts: op.parameters().angle_counts(),
        iterations: op.iterations(),
        coefficients: y.len(),
        relative_error: curvelet_testkit::relative_error(&back, &x),
        forward_ms,
        inverse_ms,
    })
}

#[cfg(test)]
mod tests {
    use curvelet_bridge::{BlockPartition, FdctOptions};

    use super::*;

    #[test]
    fn test_roundtrip_summary() {
        let options = FdctOptions {
            nbscales: Some(2),
            nbangles_coarse: 8,
            boundary: BoundaryMode::Curvelets,
        };
        let op = FdctOperator::new(BlockPartition::default(), &[3, 32, 24], &[-2, -1], &options)
            .unwrap();
        let summary = roundtrip(&op, Some(11)).unwrap();
        assert_eq!(summary.dirs, vec![1, 2]);
        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.coefficients, 3 * 32 * 24);
        assert_eq!(summary.angle_counts, vec![1, 8]);
        assert!(summary.relative_error < 1e-12);
    }
}
