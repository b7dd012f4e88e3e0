// Construction of the mechanism through the table-loading and
// configuration paths.

use std::sync::Arc;

use semc::{
    BandStructure, Config, Material, SeModel, Table, TableLoadError, TableLoader, TablePaths,
    TabulatedInelastic,
};

const EV: f64 = 1.602176634e-19;

struct FlatTable;

impl Table for FlatTable {
    fn dimension(&self) -> usize {
        1
    }
    fn domain(&self, _dim: usize) -> [f64; 2] {
        [1.0 * EV, 20_000.0 * EV]
    }
    fn range(&self) -> [f64; 2] {
        [0.0, 1.0]
    }
    fn interpolate(&self, _input: &[f64], _order: usize) -> f64 {
        0.1
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
            Ok(Arc::new(FlatTable))
        }
    }
}

fn metal() -> Material {
    Material::with_band_structure(
        "loader-test-metal",
        BandStructure {
            energy_cb_bottom: -11.65 * EV,
            workfunction: 4.65 * EV,
            bandgap: 0.0,
            fermi_energy: 7.0 * EV,
            core_energies: vec![],
        },
    )
}

fn paths(prefix: &str) -> TablePaths {
    TablePaths {
        iimfp: format!("{}/iimfp.tab", prefix),
        reduced_delta_e: format!("{}/deltae.tab", prefix),
        theta: format!("{}/theta.tab", prefix),
        se_energy: format!("{}/see0.tab", prefix),
    }
}

#[test]
fn test_from_paths_reference_model_skips_se_table() {
    // The SE energy file does not exist, but the reference model never
    // reads it.
    let loader = StubLoader {
        missing: "tables/see0.tab",
    };
    let mech = TabulatedInelastic::from_paths(
        &metal(),
        SeModel::FermiLevel,
        &loader,
        &paths("tables"),
        0.0,
    );
    assert_eq!(mech.se_model(), SeModel::FermiLevel);
}

#[test]
#[should_panic(expected = "cannot construct inelastic mechanism")]
fn test_from_paths_missing_table_is_fatal() {
    let loader = StubLoader {
        missing: "tables/theta.tab",
    };
    TabulatedInelastic::from_paths(
        &metal(),
        SeModel::FermiLevel,
        &loader,
        &paths("tables"),
        0.0,
    );
}

#[test]
fn test_from_config_uses_registered_paths() {
    // Material names are unique per test because the registry is global.
    let mat = Material::with_band_structure(
        "config-test-Cu",
        metal().band_structure.clone().unwrap(),
    );
    Config::global().set_scatter_tables("config-test-Cu", paths("cfg"));

    let loader = StubLoader { missing: "" };
    let mech = TabulatedInelastic::from_config(&mat, SeModel::SampledInitial, &loader);
    assert_eq!(mech.se_model(), SeModel::SampledInitial);
}

#[test]
#[should_panic(expected = "no scattering tables configured")]
fn test_from_config_unregistered_material_is_fatal() {
    let mat = Material::with_band_structure(
        "config-test-unregistered",
        metal().band_structure.clone().unwrap(),
    );
    let loader = StubLoader { missing: "" };
    TabulatedInelastic::from_config(&mat, SeModel::FermiLevel, &loader);
}
