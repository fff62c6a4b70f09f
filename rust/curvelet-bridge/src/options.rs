//! Transform options, loadable from JSON.

use std::{ffi::c_int, path::Path};

use curvelet_common::{Result, error::Error};
use curvelet_native::{BoundaryMode, Geometry, geometry::default_scale_count};
use serde::{Deserialize, Serialize};

/// User-facing transform options.
///
/// ```json
/// { "nbscales": 4, "nbangles_coarse": 16, "boundary": "wavelets" }
/// ```
///
/// Every field is optional. Without `nbscales` the scale count is derived from
/// the transformed extents as `ceil(log2(min extent) - 3)`, at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FdctOptions {
    pub nbscales: Option<c_int>,
    pub nbangles_coarse: c_int,
    pub boundary: BoundaryMode,
}

impl Default for FdctOptions {
    fn default() -> Self {
        FdctOptions {
            nbscales: None,
            nbangles_coarse: Geometry::DEFAULT_ANGLES_COARSE,
            boundary: BoundaryMode::Curvelets,
        }
    }
}

impl FdctOptions {
    /// The geometry these options describe for an input with the given extents.
    pub fn geometry_for(&self, extents: &[usize]) -> Geometry {
        Geometry::new(
            self.nbscales
                .unwrap_or_else(|| default_scale_count(extents)),
            self.nbangles_coarse,
            self.boundary,
        )
    }

    pub fn from_json(json: &str) -> Result<FdctOptions> {
        serde_json::from_str(json).map_err(|e| Error::config("fdct options", Box::new(e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<FdctOptions> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::config(path.display().to_string(), Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use curvelet_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = FdctOptions::from_json("{}").unwrap();
        assert_eq!(options, FdctOptions::default());
        let geometry = options.geometry_for(&[100, 50]);
        assert_eq!(geometry, Geometry::new(3, 16, BoundaryMode::Curvelets));
    }

    #[test]
    fn test_explicit_fields() {
        let options = FdctOptions::from_json(
            r#"{"nbscales": 4, "nbangles_coarse": 8, "boundary": "wavelets"}"#,
        )
        .unwrap();
        assert_eq!(
            options.geometry_for(&[8, 8]),
            Geometry::new(4, 8, BoundaryMode::Wavelets)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FdctOptions::from_json(r#"{"scales": 3}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config { .. }));
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"nbangles_coarse": 24}}"#).unwrap();
        let options = FdctOptions::load(file.path()).unwrap();
        assert_eq!(options.nbangles_coarse, 24);
        assert_eq!(options.nbscales, None);

        let err = FdctOptions::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }
}
