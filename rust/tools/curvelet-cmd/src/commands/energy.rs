//! Energy command implementation

use anyhow::{Result, bail};
use clap::Args;
use curvelet_bridge::{
    CoeffArray, Complex64, RaggedCollection, fdct2d, fdct3d,
    wedges::{apply_along_wedges, energy, ndargmax},
};
use ndarray::{ArrayViewD, Dimension, IntoDimension, IxDyn};
use serde::Serialize;

use crate::commands::{TransformArgs, random_samples};

#[derive(Debug, Args)]
pub struct EnergyArgs {
    #[command(flatten)]
    pub transform: TransformArgs,

    /// Seed for the random input
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct StrongestWedge {
    scale: usize,
    angle: usize,
    energy: f64,
    /// Index of the largest coefficient magnitude within the wedge.
    peak: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct EnergySummary {
    energies: RaggedCollection<f64>,
    strongest: Option<StrongestWedge>,
}

pub fn run(args: EnergyArgs) -> Result<()> {
    let options = args.transform.options()?;
    let dims = &args.transform.dims;
    let geometry = options.geometry_for(dims);
    let samples = random_samples(dims.iter().product(), args.seed);
    let input = ArrayViewD::from_shape(IxDyn(dims), &samples)?;
    let summary = with_backend!(args.transform.backend, |lib| match dims.len() {
        2 => summarize(&fdct2d::forward(&lib, &geometry, input)?),
        3 => summarize(&fdct3d::forward(&lib, &geometry, input)?),
        n => bail!("expected 2 or 3 dimensions, got {n}"),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn summarize<D: Dimension>(coeffs: &RaggedCollection<CoeffArray<D>>) -> EnergySummary {
    let energies = apply_along_wedges(coeffs, |band, _| energy(&band.view()));
    let strongest = energies
        .iter_indexed()
        .filter(|(_, e)| e.is_finite())
        .fold(None, |best: Option<(_, f64)>, (index, &e)| match best {
            Some((_, max)) if max >= e => best,
            _ => Some((index, e)),
        })
        .map(|(index, energy)| {
            let wedge = &coeffs[(index.scale, index.angle)];
            let magnitudes = wedge.view().mapv(|c: Complex64| c.norm());
            let peak = ndargmax(&magnitudes)
                .map(|p| p.into_dimension().slice().to_vec())
                .unwrap_or_default();
            StrongestWedge {
                scale: index.scale,
                angle: index.angle,
                energy,
                peak,
            }
        });
    EnergySummary {
        energies,
        strongest,
    }
}
