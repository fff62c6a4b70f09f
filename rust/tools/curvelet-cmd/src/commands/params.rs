//! Params command implementation

use anyhow::{Result, bail};
use curvelet_bridge::{fdct2d, fdct3d};

use crate::commands::TransformArgs;

pub fn run(args: TransformArgs) -> Result<()> {
    let options = args.options()?;
    let geometry = options.geometry_for(&args.dims);
    let params = with_backend!(args.backend, |lib| match args.dims.len() {
        2 => fdct2d::param_query(&lib, &args.dims, &geometry)?,
        3 => fdct3d::param_query(&lib, &args.dims, &geometry)?,
        n => bail!("expected 2 or 3 dimensions, got {n}"),
    });
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}
