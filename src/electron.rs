use nalgebra::Vector3;

/// A simulated electron: position, kinetic energy, and direction expressed
/// as polar/azimuthal angles relative to the laboratory z axis.
///
/// Kinetic energy is in joules, measured relative to the bottom of the
/// conduction band of the material the electron is travelling in.
#[derive(Debug, Clone)]
pub struct Electron {
    pub position: [f64; 3],
    pub energy: f64,
    pub theta: f64,
    pub phi: f64,
    /// 0 for beam electrons, parent generation + 1 for secondaries.
    pub generation: u32,
}

impl Electron {
    pub fn new(position: [f64; 3], theta: f64, phi: f64, energy: f64) -> Self {
        Self {
            position,
            energy,
            theta,
            phi,
            generation: 0,
        }
    }

    /// Spawn a secondary at the parent's position with an explicitly given
    /// direction and energy.
    pub fn secondary(parent: &Electron, theta: f64, phi: f64, energy: f64) -> Self {
        Self {
            position: parent.position,
            energy,
            theta,
            phi,
            generation: parent.generation + 1,
        }
    }

    /// Spawn a secondary inheriting the parent's current direction.
    pub fn secondary_along(parent: &Electron, energy: f64) -> Self {
        Self::secondary(parent, parent.theta, parent.phi, energy)
    }

    pub fn set_energy(&mut self, energy: f64) {
        self.energy = energy;
    }

    /// Unit direction vector corresponding to the current angles.
    pub fn direction(&self) -> Vector3<f64> {
        let (st, ct) = self.theta.sin_cos();
        let (sp, cp) = self.phi.sin_cos();
        Vector3::new(st * cp, st * sp, ct)
    }

    /// Deflect the trajectory by a polar/azimuthal deflection pair expressed
    /// relative to the current direction.
    pub fn deflect(&mut self, d_theta: f64, d_phi: f64) {
        let (theta, phi) = compose_deflection(self.theta, self.phi, d_theta, d_phi);
        self.theta = theta;
        self.phi = phi;
    }
}

/// Compose a direction `(theta, phi)` with a deflection `(d_theta, d_phi)`
/// expressed relative to that direction, returning the new angles.
///
/// `d_theta = 0` is no deflection. The result has `theta` in `[0, pi]` and
/// `phi` in `(-pi, pi]`.
pub fn compose_deflection(theta: f64, phi: f64, d_theta: f64, d_phi: f64) -> (f64, f64) {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let (sa, ca) = d_theta.sin_cos();
    let cb = d_phi.cos();

    let xx = cb * ct * sa + ca * st;
    let yy = sa * d_phi.sin();
    let dx = cp * xx - sp * yy;
    let dy = cp * yy + sp * xx;
    let dz = ca * ct - cb * sa * st;

    ((dx * dx + dy * dy).sqrt().atan2(dz), dy.atan2(dx))
}
