//! Closed-form solution of the Penn plasmon dispersion relation.
//!
//! For an event transferring energy `deltaE` with momentum-transfer energy
//! `Eq = (hbar q)^2 / 2m`, the dispersion relation splits `deltaE` into a
//! zero-momentum part E0 and a momentum-carrying remainder. E0 is the energy
//! actually available to ionize an inner shell when the mechanism runs in
//! dispersion mode. The cubic in E0^2 that the relation reduces to has an
//! analytically selected physical root, so no iterative root finding is
//! involved: the branch is chosen by the sign of a discriminant-like
//! quantity.

/// Constant appearing in the solution of Penn's dispersion equation, in 1/J.
const DISPERSION_SCALE: f64 = 3.77300614251479e17;

/// Zero-momentum component E0 of an energy transfer `delta_e` with
/// momentum-transfer energy `eq`, both in joules.
///
/// `eq == 0` is the degenerate no-momentum-transfer case and returns
/// `delta_e` unchanged.
pub fn dispersion_energy(eq: f64, delta_e: f64) -> f64 {
    if eq == 0.0 {
        return delta_e;
    }
    let x = eq / delta_e;
    let y = DISPERSION_SCALE * eq;
    let x2 = x * x;
    let c1 = x2 * x2 * (27.0 + 18.0 * y + 2.0 * y * y);
    let c2 = x2 * (27.0 + 4.0 * y);
    let c3 = c2 - 27.0;
    let c4 = x2 * (3.0 + y);
    let c6 = 1.0 - x2;
    if c3 > 0.0 {
        // Three real roots; the physical one in trigonometric form.
        let tan_part = (3.0 * c6 * (3.0 * c3 * c6).sqrt()).atan2(18.0 * c4 - c1 - 27.0);
        let prefactor = 2.0 * x * (y * (y - c6 * (y + 6.0))).sqrt();
        let trig_part = prefactor * (tan_part / 3.0).cos();
        delta_e * ((3.0 - c4 + trig_part) / 3.0).sqrt()
    } else {
        // Single real root via the radical form.
        let c5 = (-c1 + 18.0 * c4 + 3.0 * (-9.0 + c6 * (-(3.0 * c3 * c6)).sqrt())).cbrt();
        let x13 = x.cbrt();
        let x23 = x13 * x13;
        let x43 = x * x13;
        let y13 = y.cbrt();
        let y23 = y13 * y13;
        let x43y23 = x43 * y23;
        let two13 = 2.0_f64.cbrt();
        let term1 = -2.0 * c4;
        let term23 = (-12.0 * two13 * x43y23 * c6 + 2.0 * two13 * x43y23 * x2 * y) / c5;
        let term4 = two13 * two13 * x23 * y13 * c5;
        delta_e * ((6.0 + term1 + term23 + term4) / 6.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EV: f64 = 1.602176634e-19;

    #[test]
    fn test_zero_momentum_transfer_returns_delta_e() {
        for delta_e in [0.5 * EV, 10.0 * EV, 100.0 * EV] {
            assert_eq!(dispersion_energy(0.0, delta_e), delta_e);
        }
    }

    #[test]
    fn test_radical_branch_is_finite_and_bounded() {
        // Small Eq relative to deltaE keeps c3 negative.
        let delta_e = 10.0 * EV;
        for frac in [0.05, 0.2, 0.5] {
            let e0 = dispersion_energy(frac * delta_e, delta_e);
            assert!(e0.is_finite());
            assert!(e0 > 0.0, "E0 = {} for frac {}", e0, frac);
            assert!(e0 <= delta_e, "E0 = {} exceeds deltaE for frac {}", e0, frac);
        }
    }

    #[test]
    fn test_trigonometric_branch_is_finite_and_bounded() {
        // Eq close to deltaE drives c3 positive for ~10 eV transfers.
        let delta_e = 10.0 * EV;
        for frac in [0.97, 0.99] {
            let e0 = dispersion_energy(frac * delta_e, delta_e);
            assert!(e0.is_finite());
            assert!(e0 > 0.0, "E0 = {} for frac {}", e0, frac);
            assert!(e0 <= delta_e, "E0 = {} exceeds deltaE for frac {}", e0, frac);
        }
    }

    #[test]
    fn test_near_total_momentum_leaves_little_ionization_energy() {
        // Almost the whole transfer goes into momentum as Eq approaches deltaE.
        let delta_e = 10.0 * EV;
        let e0 = dispersion_energy(0.999 * delta_e, delta_e);
        assert!(e0 < 0.2 * delta_e, "E0/deltaE = {}", e0 / delta_e);
    }

    #[test]
    fn test_small_momentum_limit_approaches_delta_e() {
        let delta_e = 10.0 * EV;
        let e0 = dispersion_energy(1e-3 * delta_e, delta_e);
        assert!(e0 < delta_e);
        assert!(e0 > 0.97 * delta_e, "E0/deltaE = {}", e0 / delta_e);
    }

    #[test]
    fn test_more_momentum_leaves_less_ionization_energy() {
        let delta_e = 20.0 * EV;
        let lo = dispersion_energy(0.1 * delta_e, delta_e);
        let hi = dispersion_energy(0.6 * delta_e, delta_e);
        assert!(hi < lo, "E0(0.6) = {} !< E0(0.1) = {}", hi, lo);
    }
}
