pub const BOLTZMANN: f64 = 0.008_314_462_618; // In kJ/(mol·K)

#[inline]
pub fn thermal_energy(temperature: f64) -> f64 {
    BOLTZMANN * temperature
}

/// Harmonic force constant whose thermal fluctuation has standard deviation `sigma`.
#[inline]
pub fn thermal_stiffness(kt: f64, sigma: f64) -> f64 {
    kt / (sigma * sigma)
}

/// Lorentz-Berthelot combination of two Lennard-Jones parameter pairs.
#[inline]
pub fn lorentz_berthelot(sigma1: f64, epsilon1: f64, sigma2: f64, epsilon2: f64) -> (f64, f64) {
    (0.5 * (sigma1 + sigma2), (epsilon1 * epsilon2).sqrt())
}

/// Distance between the outer atoms of an angle with arms `r1`, `r2` and opening `theta`.
#[inline]
pub fn law_of_cosines(r1: f64, r2: f64, theta: f64) -> f64 {
    (r1 * r1 + r2 * r2 - 2.0 * r1 * r2 * theta.cos()).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn thermal_energy_at_room_temperature() {
        assert!((thermal_energy(300.0) - 2.494_338_785).abs() < 1e-6);
    }

    #[test]
    fn thermal_stiffness_scales_inverse_square() {
        let k1 = thermal_stiffness(2.5, 0.01);
        let k2 = thermal_stiffness(2.5, 0.02);
        assert!(f64_approx_equal(k1, 25_000.0));
        assert!(f64_approx_equal(k1 / k2, 4.0));
    }

    #[test]
    fn lorentz_berthelot_combines_arithmetic_and_geometric_means() {
        let (sigma, epsilon) = lorentz_berthelot(0.3, 0.4, 0.5, 0.9);
        assert!(f64_approx_equal(sigma, 0.4));
        assert!(f64_approx_equal(epsilon, 0.6));
    }

    #[test]
    fn law_of_cosines_handles_right_and_straight_angles() {
        assert!(f64_approx_equal(
            law_of_cosines(3.0, 4.0, std::f64::consts::FRAC_PI_2),
            5.0
        ));
        assert!(f64_approx_equal(
            law_of_cosines(1.0, 1.0, std::f64::consts::PI),
            2.0
        ));
    }
}
