use serde::{Deserialize, Serialize};

/// Band-structure parameters of a material, all in joules.
///
/// Energies are referenced as follows: `energy_cb_bottom` is the potential
/// energy at the bottom of the conduction band relative to vacuum (negative
/// for a bound crystal). `fermi_energy` is the position of the highest
/// occupied state relative to the bottom of the conduction band, which makes
/// it the usual Fermi energy for a metal and `-bandgap` for an insulator or
/// semiconductor. Core-level binding energies are referenced to the Fermi
/// level for metals and to the top of the valence band otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandStructure {
    pub energy_cb_bottom: f64,
    pub workfunction: f64,
    pub bandgap: f64,
    pub fermi_energy: f64,
    /// Core-level binding energies, strictly increasing.
    #[serde(default)]
    pub core_energies: Vec<f64>,
}

/// A material as seen by the scattering mechanism.
///
/// Only materials carrying band-structure data can be bound to a
/// [`TabulatedInelastic`](crate::TabulatedInelastic) mechanism; binding any
/// other material is a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub band_structure: Option<BandStructure>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            band_structure: None,
        }
    }

    pub fn with_band_structure(name: &str, band_structure: BandStructure) -> Self {
        Self {
            name: name.to_string(),
            band_structure: Some(band_structure),
        }
    }

    /// Parse a material descriptor from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
