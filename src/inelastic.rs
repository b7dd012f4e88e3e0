//! Tabulated inelastic scattering of primary electrons.
//!
//! Nearly all of the physics of this mechanism lives in externally supplied
//! interpolation tables: the inverse inelastic mean free path, the energy
//! lost per event, the deflection of the primary electron (PE), and the
//! initial energy of the secondary electron (SE) are all table lookups. The
//! mechanism itself turns those lookups plus the bound material's
//! band-structure parameters into per-event stochastic decisions.
//!
//! One ambiguity the tables cannot resolve is what "kinetic energy" means
//! for a PE inside a crystal when the scattering band is offset from the
//! conduction band, as it is in insulators. The DFT dielectric model behind
//! the tables is built on a free electron gas and is silent on the question.
//! The energy offset passed at construction shifts the SE energy reference
//! accordingly, while the PE kinetic energy stays referenced to the bottom
//! of the conduction band; whether that is the better convention is an open
//! modeling question, which is why the choice sits in configuration rather
//! than in code.
//!
//! A second, related ambiguity is how a PE energy loss maps onto an SE final
//! energy and trajectory. Three published treatments are implemented and
//! selected by [`SeModel`]; they are deliberately kept as-published rather
//! than reconciled.

use rand::Rng;
use std::f64::consts::PI;

use crate::binding::{cumulative_branching_probabilities, search_cumulative};
use crate::config::Config;
use crate::dispersion::dispersion_energy;
use crate::electron::{compose_deflection, Electron};
use crate::material::Material;
use crate::tables::{TableLoader, TablePaths, TableSet};

/// How SE final energy and trajectory are derived from a PE energy loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeModel {
    /// The SE starts at the Fermi level with zero momentum and is emitted
    /// back-to-back with the PE deflection. Ding & Shimizu, SCANNING 18
    /// (1996) 92.
    FermiLevel,
    /// Like [`SeModel::FermiLevel`] for core-level excitations; otherwise
    /// the SE initial energy is sampled from the occupied-state
    /// distribution table. Ding, Tang & Shimizu, J. Appl. Phys. 89 (2001)
    /// 718.
    SampledInitial,
    /// Events are split into electron-electron collisions and plasmon
    /// excitations by the momentum transfer; plasmon decay is isotropic.
    /// After Mao et al., J. Appl. Phys. 104 (2008) 114907.
    MomentumPartition,
}

impl SeModel {
    /// Map the integer selector used in table-driven configuration files.
    /// Any unrecognized value selects the reference model.
    pub fn from_selector(selector: i32) -> Self {
        match selector {
            2 => SeModel::SampledInitial,
            3 => SeModel::MomentumPartition,
            _ => SeModel::FermiLevel,
        }
    }

    pub fn selector(self) -> i32 {
        match self {
            SeModel::FermiLevel => 1,
            SeModel::SampledInitial => 2,
            SeModel::MomentumPartition => 3,
        }
    }

    fn needs_se_energy_table(self) -> bool {
        !matches!(self, SeModel::FermiLevel)
    }
}

/// A table-driven inelastic scattering mechanism bound to one material.
///
/// All energies are in joules. PE kinetic energy is measured relative to
/// the bottom of the conduction band of the bound material.
///
/// The mechanism is immutable during scattering, so one instance may be
/// shared across worker threads as long as each worker brings its own
/// random stream. Rebinding to a different material must not be interleaved
/// with in-flight scattering calls.
pub struct TabulatedInelastic {
    model: SeModel,
    tables: TableSet,
    /// (energy of conduction band bottom) - (the zero of energy used by the
    /// tables, generally the scattering band bottom).
    energy_offset: f64,

    // Scalars cached from the bound material.
    energy_cb_bottom: f64,
    workfunction: f64,
    bandgap: f64,
    /// Smallest deltaE in the scattering tables. Equal to the bandgap unless
    /// overridden for materials with bound states inside the gap.
    energy_gap: f64,
    /// Fermi energy measured from the bottom of the scattering band.
    offset_fermi_energy: f64,
    /// Reference energy for core-level binding energies, relative to the
    /// conduction band bottom.
    binding_energy_ref: f64,
    core_energies: Vec<f64>,

    /// Intersection of the PE-energy domains of the deltaE and theta tables.
    ke_domain: [f64; 2],
    iimfp_domain: [f64; 2],
    se_energy_range: Option<[f64; 2]>,

    min_egen_se: f64,
    rate_multiplier: f64,
    branching: Option<Vec<Vec<f64>>>,
    dispersion_mode: bool,
}

impl TabulatedInelastic {
    /// Construct a mechanism with a zero energy offset.
    pub fn new(material: &Material, model: SeModel, tables: TableSet) -> Self {
        Self::with_energy_offset(material, model, tables, 0.0)
    }

    /// Construct a mechanism for tables whose energy zero differs from the
    /// conduction band bottom by `energy_offset`.
    pub fn with_energy_offset(
        material: &Material,
        model: SeModel,
        tables: TableSet,
        energy_offset: f64,
    ) -> Self {
        if model.needs_se_energy_table() && tables.se_energy.is_none() {
            panic!(
                "SE model {:?} samples the SE initial energy and requires the SE energy table",
                model
            );
        }
        let se_energy_range = tables.se_energy.as_ref().map(|t| t.range());
        let mut mechanism = Self {
            model,
            tables,
            energy_offset,
            energy_cb_bottom: 0.0,
            workfunction: 0.0,
            bandgap: 0.0,
            energy_gap: 0.0,
            offset_fermi_energy: 0.0,
            binding_energy_ref: 0.0,
            core_energies: Vec::new(),
            ke_domain: [0.0, 0.0],
            iimfp_domain: [0.0, 0.0],
            se_energy_range,
            min_egen_se: 0.0,
            rate_multiplier: 1.0,
            branching: None,
            dispersion_mode: false,
        };
        mechanism.bind(material);
        mechanism
    }

    /// Load the tables from `paths` through `loader` and construct. A
    /// missing or malformed table file is fatal: the mechanism cannot
    /// function without its tables.
    pub fn from_paths(
        material: &Material,
        model: SeModel,
        loader: &dyn TableLoader,
        paths: &TablePaths,
        energy_offset: f64,
    ) -> Self {
        let tables = TableSet::load(loader, paths, model.needs_se_energy_table())
            .unwrap_or_else(|e| panic!("cannot construct inelastic mechanism: {}", e));
        Self::with_energy_offset(material, model, tables, energy_offset)
    }

    /// Construct using the table paths registered for the material in the
    /// global [`Config`].
    pub fn from_config(material: &Material, model: SeModel, loader: &dyn TableLoader) -> Self {
        let paths = Config::global()
            .scatter_tables(&material.name)
            .unwrap_or_else(|| {
                panic!(
                    "no scattering tables configured for material '{}'; \
                     register them with Config::set_scatter_tables",
                    material.name
                )
            });
        Self::from_paths(material, model, loader, &paths, 0.0)
    }

    /// Bind the mechanism to a material, replacing all cached scalars.
    ///
    /// The energy gap reverts to the material's bandgap; call
    /// [`TabulatedInelastic::set_energy_gap`] again afterwards if the tables
    /// were computed with a different gap.
    pub fn bind(&mut self, material: &Material) {
        let bs = material.band_structure.as_ref().unwrap_or_else(|| {
            panic!(
                "material '{}' carries no band-structure data as required for \
                 tabulated inelastic scattering",
                material.name
            )
        });
        for pair in bs.core_energies.windows(2) {
            if pair[1] <= pair[0] {
                panic!(
                    "core-level binding energies of material '{}' must be strictly increasing",
                    material.name
                );
            }
        }

        self.energy_cb_bottom = bs.energy_cb_bottom;
        self.workfunction = bs.workfunction;
        self.bandgap = bs.bandgap;
        self.energy_gap = bs.bandgap;
        self.offset_fermi_energy = bs.fermi_energy + self.energy_offset;
        self.core_energies = bs.core_energies.clone();
        // Binding energies come referenced to the Fermi level for metals and
        // to the top of the valence band for gapped materials; either way
        // this puts their reference relative to the conduction band bottom.
        self.binding_energy_ref = if bs.bandgap > 0.0 {
            -bs.bandgap
        } else {
            bs.fermi_energy
        };

        // The merged domain must be valid for every table that takes the PE
        // energy as its first input.
        let mut ke_domain = self.tables.reduced_delta_e.domain(0);
        let theta_domain = self.tables.theta.domain(0);
        if theta_domain[0] > ke_domain[0] {
            ke_domain[0] = theta_domain[0];
        }
        if theta_domain[1] < ke_domain[1] {
            ke_domain[1] = theta_domain[1];
        }
        self.ke_domain = ke_domain;
        self.iimfp_domain = self.tables.iimfp.domain(0);
    }

    /// Inverse inelastic mean free path for the electron's current energy.
    pub fn scatter_rate(&self, pe: &Electron) -> f64 {
        let ke = pe.energy;
        // The PE energy can fall below the table minimum for materials with
        // an energy gap; the true rate there is 0.
        if ke < self.iimfp_domain[0] {
            return 0.0;
        }
        if ke > self.iimfp_domain[1] {
            panic!(
                "PE energy {} J exceeds the IIMFP table maximum energy of {} J",
                ke, self.iimfp_domain[1]
            );
        }
        // First-order interpolation only: the rate approaches 0 at the Fermi
        // level and cubic interpolation can overshoot to negative values.
        // Clipping to 0 instead would mean an infinite inelastic free path.
        self.rate_multiplier * self.tables.iimfp.interpolate(&[ke], 1)
    }

    /// Sample one inelastic event. The primary's energy and direction are
    /// updated in place; the returned electron, if any, is the generated
    /// secondary.
    pub fn scatter<R: Rng>(&self, pe: &mut Electron, rng: &mut R) -> Option<Electron> {
        let ke = pe.energy;

        // The energy may have dropped below the table minimum between the
        // decision that an event occurs and the event itself, e.g. from an
        // electrostatic potential difference along the step. Simply don't
        // scatter.
        if ke < self.ke_domain[0] {
            return None;
        }
        if ke > self.ke_domain[1] {
            panic!(
                "PE energy {} J is outside the interpolation table interval [{}, {}]",
                ke, self.ke_domain[0], self.ke_domain[1]
            );
        }

        let randoms = [
            rng.gen::<f64>(),
            rng.gen::<f64>(),
            rng.gen::<f64>(),
            rng.gen::<f64>(),
        ];

        let mut delta_e = ke
            * self
                .tables
                .reduced_delta_e
                .interpolate(&[ke, randoms[0]], 3);
        // Cubic interpolation can undershoot. deltaE close to but below the
        // energy gap is treated as such undershoot and corrected. Larger
        // shortfalls are most likely non-electronic losses (e.g. phonon
        // scattering) retained in an empirical table; the angular model does
        // not apply to those, so angular deflection and SE generation are
        // skipped while the PE still pays the energy loss.
        if delta_e < self.energy_gap && delta_e > 0.95 * self.energy_gap {
            delta_e = self.energy_gap;
        }

        // The SE emission frame references the PE direction before the event.
        let theta0 = pe.theta;
        let phi0 = pe.phi;

        let mut theta = 0.0;
        let mut phi = 0.0;
        if delta_e >= self.bandgap {
            // Reduced energy runs from 0 to 1 as deltaE runs from its minimum
            // to its maximum; interpolation error can push it slightly
            // outside, so clip.
            let u = ((delta_e - self.energy_gap) / (ke - self.energy_gap)).clamp(0.0, 1.0);
            theta = self.tables.theta.interpolate(&[ke, u, randoms[1]], 3);
            phi = 2.0 * PI * randoms[2];
            pe.deflect(theta, phi);
        }

        // Any continuous energy-loss formula must exclude this loss.
        pe.set_energy(ke - delta_e);

        // Losses inside the gap have no mobile final state for an SE; they
        // may correspond to phonon excitation in measured loss data.
        if delta_e < self.bandgap {
            return None;
        }

        // Momentum conservation gives the kinetic-energy equivalent of the
        // momentum transferred to the SE.
        let eq = 2.0 * ke - delta_e - 2.0 * (ke * (ke - delta_e)).sqrt() * theta.cos();

        match self.model {
            SeModel::FermiLevel => {
                // binding_energy_ref - be + deltaE is the SE final energy
                // whether the SE came from the Fermi level (be = 0) or from a
                // core level referenced to it.
                let be = self.select_binding_energy(eq, delta_e, rng);
                let energy_se = delta_e + self.binding_energy_ref - be;
                self.emit_back_to_back(pe, theta0, phi0, theta, phi, energy_se)
            }
            SeModel::SampledInitial => {
                let be = self.select_binding_energy(eq, delta_e, rng);
                let energy_se = if be > 0.0 {
                    delta_e + self.binding_energy_ref - be
                } else {
                    delta_e + self.sample_se_initial_energy(delta_e, randoms[3])
                        - self.energy_offset
                };
                self.emit_back_to_back(pe, theta0, phi0, theta, phi, energy_se)
            }
            SeModel::MomentumPartition => self.scatter_momentum_partition(
                pe, theta0, phi0, theta, phi, eq, delta_e, randoms[3], rng,
            ),
        }
    }

    /// Back-to-back SE emission: the SE leaves at right angles to the PE
    /// deflection, consistent with a stationary pre-scattering SE.
    fn emit_back_to_back(
        &self,
        pe: &Electron,
        theta0: f64,
        phi0: f64,
        theta: f64,
        phi: f64,
        energy_se: f64,
    ) -> Option<Electron> {
        if energy_se + self.energy_cb_bottom < self.min_egen_se {
            return None;
        }
        let mut se = Electron::secondary(pe, theta0, phi0, energy_se);
        se.deflect(PI / 2.0 - theta, phi + PI);
        Some(se)
    }

    #[allow(clippy::too_many_arguments)]
    fn scatter_momentum_partition<R: Rng>(
        &self,
        pe: &Electron,
        theta0: f64,
        phi0: f64,
        theta: f64,
        phi: f64,
        eq: f64,
        delta_e: f64,
        r3: f64,
        rng: &mut R,
    ) -> Option<Electron> {
        let be = self.select_binding_energy(eq, delta_e, rng);
        if be > 0.0 {
            // Core-level excitation. The angular distribution is approximated
            // as isotropic.
            let energy_se = delta_e + self.binding_energy_ref - be;
            if energy_se + self.energy_cb_bottom < self.min_egen_se {
                return None;
            }
            let theta_se = (1.0 - 2.0 * rng.gen::<f64>()).acos();
            let phi_se = 2.0 * PI * rng.gen::<f64>();
            return Some(Electron::secondary(pe, theta_se, phi_se, energy_se));
        }

        // SE generation from the extended band. The momentum transfer decides
        // between a single-electron collision and a plasmon excitation: only
        // momenta reachable from the Fermi sea can be absorbed by a single
        // electron.
        let root = 2.0 * (self.offset_fermi_energy * (self.offset_fermi_energy + delta_e)).sqrt();
        let sum = 2.0 * self.offset_fermi_energy + delta_e;
        let eq_min = sum - root;
        let eq_max = sum + root;
        if eq_min <= eq && eq <= eq_max {
            let (e_final, theta_q) = self.single_electron_final(eq, delta_e, r3);
            let energy_se = e_final - self.energy_offset;
            if energy_se + self.energy_cb_bottom < self.min_egen_se {
                return None;
            }
            // Start the SE along the PE's original direction, then apply the
            // momentum-transfer-frame deflection composed with the
            // back-to-back frame.
            let mut se = Electron::secondary(pe, theta0, phi0, energy_se);
            let (d_theta, d_phi) = compose_deflection(
                PI / 2.0 - theta,
                phi + PI,
                theta_q,
                2.0 * PI * rng.gen::<f64>(),
            );
            se.deflect(d_theta, d_phi);
            Some(se)
        } else {
            // Plasmon excitation. The plasmon forgets the momentum of the
            // event that created it before decaying into an electron-hole
            // pair, so emission is isotropic.
            let energy_se =
                delta_e + self.sample_se_initial_energy(delta_e, r3) - self.energy_offset;
            if energy_se + self.energy_cb_bottom < self.min_egen_se {
                return None;
            }
            let theta_se = (1.0 - 2.0 * rng.gen::<f64>()).acos();
            let phi_se = 2.0 * PI * rng.gen::<f64>();
            Some(Electron::secondary(pe, theta_se, phi_se, energy_se))
        }
    }

    /// SE initial energy from the occupied-state table, clipped into the
    /// table's declared output range (interpolation can overshoot).
    fn sample_se_initial_energy(&self, delta_e: f64, r: f64) -> f64 {
        let table = self
            .tables
            .se_energy
            .as_ref()
            .expect("SE model checked at construction");
        let range = self.se_energy_range.expect("cached with the table");
        table.interpolate(&[delta_e, r], 3).clamp(range[0], range[1])
    }

    /// Final SE energy and the polar angle of its trajectory relative to the
    /// momentum-transfer direction, for a single-electron collision.
    /// Derivation after Mao et al., J. Appl. Phys. 104 (2008).
    fn single_electron_final(&self, eq: f64, delta_e: f64, r: f64) -> (f64, f64) {
        let q = eq.sqrt();
        let kz = (delta_e - eq) / 2.0 / q;
        let kzf = kz + q;
        let ezq = kzf * kzf;
        let min_e = (self.offset_fermi_energy + self.bandgap - ezq).max(0.0);
        let max_e = self.offset_fermi_energy - kz * kz;
        assert!(
            min_e <= max_e,
            "single-electron kinematics produced an empty energy window [{}, {}] \
             for Eq = {}, deltaE = {}",
            min_e,
            max_e,
            eq,
            delta_e
        );
        let exy = min_e * (1.0 - r) + max_e * r;
        let e_final = exy + ezq;
        let theta_q = (kzf / e_final.sqrt()).acos();
        (e_final, theta_q)
    }

    /// Binding energy of the core level ionized by an event, or 0 for the
    /// valence/conduction channel.
    fn select_binding_energy<R: Rng>(&self, eq: f64, delta_e: f64, rng: &mut R) -> f64 {
        // Most events transfer too little energy for inner-shell excitation;
        // detect that without touching the dispersion solver.
        match self.core_energies.first() {
            Some(&lowest) if delta_e > lowest => {}
            _ => return 0.0,
        }

        // In dispersion mode only the zero-momentum part of deltaE is
        // available for ionization, which is more restrictive.
        let ionization_energy = if self.dispersion_mode {
            dispersion_energy(eq, delta_e)
        } else {
            delta_e
        };

        let eligible = self
            .core_energies
            .partition_point(|&e| e <= ionization_energy);
        if eligible == 0 {
            return 0.0;
        }
        match &self.branching {
            // Default policy: the highest eligible level always wins.
            None => self.core_energies[eligible - 1],
            Some(ladder) => {
                let row = &ladder[eligible - 1];
                match search_cumulative(row, rng.gen::<f64>()) {
                    Some(index) => self.core_energies[index],
                    // The draw fell below every branch: valence channel.
                    None => 0.0,
                }
            }
        }
    }

    /// Minimum energy of generated secondaries, measured relative to vacuum;
    /// an SE is kept only if it would have at least this much energy left
    /// after escaping over the workfunction barrier. The default of 0 keeps
    /// exactly the secondaries that can barely escape.
    pub fn set_min_egen_se(&mut self, min_egen_se: f64) {
        if min_egen_se <= -self.workfunction {
            panic!(
                "minimum generated-SE energy {} J must exceed -workfunction ({} J)",
                min_egen_se, -self.workfunction
            );
        }
        self.min_egen_se = min_egen_se;
    }

    pub fn min_egen_se(&self) -> f64 {
        self.min_egen_se
    }

    pub fn se_model(&self) -> SeModel {
        self.model
    }

    /// Multiplier applied to the tabulated scatter rate (default 1). Setting
    /// it to a fill fraction approximates the effect of porosity.
    pub fn set_rate_multiplier(&mut self, rate_multiplier: f64) {
        self.rate_multiplier = rate_multiplier;
    }

    /// Override the smallest deltaE represented in the scattering tables.
    ///
    /// Ordinarily equal to the bandgap, and reset to it on every bind. They
    /// differ when the tables include scattering into bound states inside
    /// the gap, e.g. the exciton states of LiF: the energy gap must then
    /// match the value used to compute the tables, while the bandgap keeps
    /// locating the zero of kinetic energy for free electrons.
    pub fn set_energy_gap(&mut self, energy_gap: f64) {
        self.energy_gap = energy_gap;
    }

    pub fn energy_gap(&self) -> f64 {
        self.energy_gap
    }

    pub fn binding_energy_reference(&self) -> f64 {
        self.binding_energy_ref
    }

    pub fn offset_fermi_energy(&self) -> f64 {
        self.offset_fermi_energy
    }

    /// PE kinetic-energy interval on which events can be sampled.
    pub fn kinetic_energy_domain(&self) -> [f64; 2] {
        self.ke_domain
    }

    /// Weight core-level selection by branching ratios instead of always
    /// taking the highest eligible level. `ratios[i]` is the probability
    /// that the channel opened by core level `i` is not taken, read off the
    /// energy-loss function as the ratio of its value below the edge to its
    /// value above. One ratio per core level.
    pub fn set_branching_ratios(&mut self, ratios: &[f64]) {
        if ratios.len() != self.core_energies.len() {
            panic!(
                "the number of branching ratios must equal the number of core energies, \
                 {} in this case",
                self.core_energies.len()
            );
        }
        self.branching = Some(cumulative_branching_probabilities(ratios));
    }

    /// Restore the default highest-eligible-level policy.
    pub fn clear_branching_ratios(&mut self) {
        self.branching = None;
    }

    pub fn dispersion_mode(&self) -> bool {
        self.dispersion_mode
    }

    /// When set, the energy available for inner-shell ionization is the
    /// zero-momentum component of deltaE from the plasmon dispersion
    /// relation rather than deltaE itself.
    pub fn set_dispersion_mode(&mut self, dispersion_mode: bool) {
        self.dispersion_mode = dispersion_mode;
    }
}
