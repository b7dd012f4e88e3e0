// Interpolation-table contract consumed by the scattering mechanism.
//
// The interpolation engine itself lives outside this crate. The mechanism
// only needs the ability to query a table's valid input domain, its output
// range, and an interpolated value at a given input vector and polynomial
// order. Tables never extrapolate: an input outside the declared domain is a
// caller error, which is why the mechanism clamps or rejects energies before
// every interpolation call.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A bound, immutable interpolation table.
pub trait Table: Send + Sync {
    /// Number of input dimensions.
    fn dimension(&self) -> usize;

    /// Valid input interval `[min, max]` for the given dimension.
    fn domain(&self, dim: usize) -> [f64; 2];

    /// Valid output interval `[min, max]`.
    fn range(&self) -> [f64; 2];

    /// Interpolated value at `input` using the given polynomial order.
    ///
    /// `input.len()` must equal [`Table::dimension`] and every component must
    /// lie inside the corresponding domain.
    fn interpolate(&self, input: &[f64], order: usize) -> f64;
}

/// Failure to bind a table from its backing resource.
///
/// These are recoverable from the loader's point of view; the scattering
/// mechanism treats them as fatal at construction time, since it cannot
/// operate with a missing table.
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("table file {0} not found")]
    NotFound(String),
    #[error("table file {path} is malformed: {detail}")]
    Malformed { path: String, detail: String },
}

/// Builds [`Table`] instances from opaque path strings.
pub trait TableLoader {
    fn load(&self, path: &str) -> Result<Arc<dyn Table>, TableLoadError>;
}

/// The four table paths needed to drive one material's inelastic scattering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePaths {
    /// Inverse inelastic mean free path vs. PE kinetic energy.
    pub iimfp: String,
    /// Reduced energy loss deltaE/E vs. (E, r).
    pub reduced_delta_e: String,
    /// PE scattering angle vs. (E, reduced deltaE, r).
    pub theta: String,
    /// SE initial energy vs. (deltaE, r). Only consulted by the SE models
    /// that sample an initial energy.
    pub se_energy: String,
}

/// The four interpolation tables bound to one scattering mechanism.
///
/// The SE initial-energy table is optional because the reference SE model
/// never consults it.
pub struct TableSet {
    pub iimfp: Arc<dyn Table>,
    pub reduced_delta_e: Arc<dyn Table>,
    pub theta: Arc<dyn Table>,
    pub se_energy: Option<Arc<dyn Table>>,
}

impl std::fmt::Debug for TableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableSet")
            .field("se_energy", &self.se_energy.is_some())
            .finish_non_exhaustive()
    }
}

impl TableSet {
    pub fn new(
        iimfp: Arc<dyn Table>,
        reduced_delta_e: Arc<dyn Table>,
        theta: Arc<dyn Table>,
        se_energy: Option<Arc<dyn Table>>,
    ) -> Self {
        Self {
            iimfp,
            reduced_delta_e,
            theta,
            se_energy,
        }
    }

    /// Load a table set through `loader`. The SE initial-energy table is only
    /// loaded when `with_se_energy` is set, so table files for the reference
    /// SE model need not exist.
    pub fn load(
        loader: &dyn TableLoader,
        paths: &TablePaths,
        with_se_energy: bool,
    ) -> Result<Self, TableLoadError> {
        let iimfp = loader.load(&paths.iimfp)?;
        let reduced_delta_e = loader.load(&paths.reduced_delta_e)?;
        let theta = loader.load(&paths.theta)?;
        let se_energy = if with_se_energy {
            Some(loader.load(&paths.se_energy)?)
        } else {
            None
        };
        Ok(Self::new(iimfp, reduced_delta_e, theta, se_energy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTable;

    impl Table for StubTable {
        fn dimension(&self) -> usize {
            1
        }
        fn domain(&self, _dim: usize) -> [f64; 2] {
            [0.0, 1.0]
        }
        fn range(&self) -> [f64; 2] {
            [0.0, 1.0]
        }
        fn interpolate(&self, _input: &[f64], _order: usize) -> f64 {
            0.5
        }
    }

    struct StubLoader {
        missing: &'static str,
    }

    impl TableLoader for StubLoader {
        fn load(&self, path: &str) -> Result<Arc<dyn Table>, TableLoadError> {
            if path == self.missing {
                Err(TableLoadError::NotFound(path.to_string()))
            } else {
                Ok(Arc::new(StubTable))
            }
        }
    }

    fn paths() -> TablePaths {
        TablePaths {
            iimfp: "iimfp.tab".to_string(),
            reduced_delta_e: "deltae.tab".to_string(),
            theta: "theta.tab".to_string(),
            se_energy: "see0.tab".to_string(),
        }
    }

    #[test]
    fn test_load_all_four_tables() {
        let loader = StubLoader { missing: "" };
        let set = TableSet::load(&loader, &paths(), true).unwrap();
        assert!(set.se_energy.is_some());
    }

    #[test]
    fn test_se_table_skipped_when_not_needed() {
        // The SE energy file is missing but also not requested.
        let loader = StubLoader {
            missing: "see0.tab",
        };
        let set = TableSet::load(&loader, &paths(), false).unwrap();
        assert!(set.se_energy.is_none());
    }

    #[test]
    fn test_missing_table_reported_by_path() {
        let loader = StubLoader {
            missing: "theta.tab",
        };
        let err = TableSet::load(&loader, &paths(), true).unwrap_err();
        assert!(err.to_string().contains("theta.tab"));
    }
}
