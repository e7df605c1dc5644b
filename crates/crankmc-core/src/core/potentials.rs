/// Pairwise and external potential forms used by the shipped contact model.
///
/// Pure functions of distances only; everything stateful lives in the model
/// that calls them.

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// Harmonic restraint outside a flat slab of half-width `halfwidth` centered
/// on the xy-plane; zero inside.
#[inline]
pub fn flat_bottom_slab(z: f64, halfwidth: f64, k: f64) -> f64 {
    let excess = z.abs() - halfwidth;
    if excess <= 0.0 {
        0.0
    } else {
        k * excess * excess
    }
}

/// Threefold torsional well, minimum at the staggered rotamers.
#[inline]
pub fn threefold_torsion(chi: f64, barrier: f64) -> f64 {
    0.5 * barrier * (1.0 + (3.0 * chi).cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        assert_relative_eq!(lennard_jones_12_6(6.0, 6.0, 0.3), -0.3, epsilon = 1e-12);
    }

    #[test]
    fn lennard_jones_at_tiny_distance_is_strongly_repulsive() {
        assert!(lennard_jones_12_6(1e-8, 6.0, 0.3) >= 1e10);
    }

    #[test]
    fn slab_is_flat_inside_and_quadratic_outside() {
        assert_eq!(flat_bottom_slab(3.0, 15.0, 0.5), 0.0);
        assert_eq!(flat_bottom_slab(-3.0, 15.0, 0.5), 0.0);
        assert_relative_eq!(flat_bottom_slab(17.0, 15.0, 0.5), 2.0, epsilon = 1e-12);
        assert_relative_eq!(flat_bottom_slab(-17.0, 15.0, 0.5), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn torsion_minimum_sits_at_staggered_angle() {
        let staggered = 60.0f64.to_radians();
        assert_relative_eq!(threefold_torsion(staggered, 0.4), 0.0, epsilon = 1e-12);
        assert_relative_eq!(threefold_torsion(0.0, 0.4), 0.4, epsilon = 1e-12);
    }
}
