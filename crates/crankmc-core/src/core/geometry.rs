use nalgebra::{Matrix3, Point3, Rotation3, Unit, Vector3};
use rand::{Rng, RngCore};

/// Orthonormal triplet spanning one CA->CA virtual bond. The first column
/// points from CA_i towards CA_{i+1}; the remaining columns complete a
/// right-handed local frame used to place the peptide-plane atoms.
pub type Frame = Matrix3<f64>;

/// Virtual CA-CA bond length of the coarse-grained backbone, in Angstroms.
pub const CA_CA_DISTANCE: f64 = 3.8;

const N_CA_BOND: f64 = 1.455;
const CA_C_BOND: f64 = 1.528;
const C_O_BOND: f64 = 1.227;
const N_H_BOND: f64 = 1.0;
const CA_CB_BOND: f64 = 1.53;
const CB_G_BOND: f64 = 1.52;

pub fn identity_frame() -> Frame {
    Matrix3::identity()
}

/// Applies a rigid rotation to a backbone frame, column by column.
#[inline]
pub fn rotate_frame(rot: &Rotation3<f64>, frame: &Frame) -> Frame {
    rot.matrix() * frame
}

#[inline]
pub fn rotation_about_axis(axis: &Vector3<f64>, angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle)
}

/// Uniformly distributed point on the unit sphere (Marsaglia's method via
/// the cylindrical-projection form).
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vector3<f64> {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let phi: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let r = (1.0 - z * z).sqrt();
    Vector3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Amide nitrogen, placed in the preceding peptide-unit frame.
#[inline]
pub fn place_n(ca: &Point3<f64>, prev: &Frame) -> Point3<f64> {
    let local = Vector3::new(-1.33, 0.59, 0.0) * (N_CA_BOND / 1.455);
    ca + prev * local
}

/// Carbonyl carbon, placed in the residue's own peptide-unit frame.
#[inline]
pub fn place_c(ca: &Point3<f64>, frame: &Frame) -> Point3<f64> {
    let local = Vector3::new(0.45, 1.46, 0.0) * (CA_C_BOND / 1.528);
    ca + frame * local
}

/// Carbonyl oxygen, off the C in the peptide plane.
#[inline]
pub fn place_o(c: &Point3<f64>, frame: &Frame) -> Point3<f64> {
    let local = Vector3::new(-0.65, 1.04, 0.0) * (C_O_BOND / 1.2266);
    c + frame * local
}

/// Amide hydrogen, trailing the nitrogen in the preceding frame.
#[inline]
pub fn place_h(n: &Point3<f64>, prev: &Frame) -> Point3<f64> {
    let local = Vector3::new(-0.35, -0.94, 0.0) * (N_H_BOND / 1.0031);
    n + prev * local
}

/// Beta carbon from the N-CA-C anchor triad: along the reflected bisector of
/// the two backbone bonds, tipped out of their plane by the tetrahedral
/// off-plane angle.
pub fn place_cb(n: &Point3<f64>, ca: &Point3<f64>, c: &Point3<f64>) -> Point3<f64> {
    let ca_n = (n - ca).normalize();
    let ca_c = (c - ca).normalize();

    let bisector = -(ca_n + ca_c).normalize();
    let in_plane_axis = Unit::new_normalize(bisector);
    let rot_off_plane = Rotation3::from_axis_angle(&in_plane_axis, 54.25f64.to_radians());
    let plane_normal = ca_n.cross(&ca_c).normalize();

    let cb_dir = rot_off_plane * plane_normal;
    ca + cb_dir * CA_CB_BOND
}

/// Gamma heavy atom from the chi1 dihedral: rotate a reference direction
/// about the CA->CB axis and tip it to the tetrahedral opening angle.
pub fn place_gamma(
    n: &Point3<f64>,
    ca: &Point3<f64>,
    cb: &Point3<f64>,
    chi1: f64,
) -> Point3<f64> {
    let axis = Unit::new_normalize(cb - ca);
    let back = (ca - n).normalize();
    let reference = (back - axis.into_inner() * back.dot(&axis)).normalize();

    let opening = 66.0f64.to_radians();
    let swung = Rotation3::from_axis_angle(&axis, chi1) * reference;
    let dir = axis.into_inner() * opening.cos() + swung * opening.sin();
    cb + dir * CB_G_BOND
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_unit_vector_has_unit_norm() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rotate_frame_preserves_orthonormality() {
        let mut rng = StdRng::seed_from_u64(11);
        let axis = random_unit_vector(&mut rng);
        let rot = rotation_about_axis(&axis, 0.83);
        let rotated = rotate_frame(&rot, &identity_frame());

        for col in 0..3 {
            assert_relative_eq!(rotated.column(col).norm(), 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(
            rotated.column(0).dot(&rotated.column(1)),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn placed_atoms_keep_their_bond_lengths() {
        let ca = Point3::new(1.0, -2.0, 3.0);
        let frame = identity_frame();
        let prev = rotate_frame(&rotation_about_axis(&Vector3::z(), 0.4), &identity_frame());

        let n = place_n(&ca, &prev);
        let c = place_c(&ca, &frame);
        let o = place_o(&c, &frame);
        let h = place_h(&n, &prev);

        assert_relative_eq!((n - ca).norm(), 1.455, epsilon = 1e-3);
        assert_relative_eq!((c - ca).norm(), 1.528, epsilon = 1e-3);
        assert_relative_eq!((o - c).norm(), 1.227, epsilon = 1e-3);
        assert_relative_eq!((h - n).norm(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn cb_placement_is_equidistant_from_backbone_rotations() {
        let ca = Point3::new(0.0, 0.0, 0.0);
        let n = Point3::new(-1.2, 0.8, 0.0);
        let c = Point3::new(1.2, 0.8, 0.1);

        let cb = place_cb(&n, &ca, &c);
        assert_relative_eq!((cb - ca).norm(), 1.53, epsilon = 1e-9);

        // Rigidly rotating the anchor triad must rotate CB with it.
        let rot = rotation_about_axis(&Vector3::new(0.3, -1.0, 0.2), 1.1);
        let cb_rot = place_cb(&(rot * n), &(rot * ca), &(rot * c));
        assert_relative_eq!((cb_rot - rot * cb).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn gamma_placement_tracks_chi1() {
        let ca = Point3::new(0.0, 0.0, 0.0);
        let n = Point3::new(-1.2, 0.8, 0.0);
        let cb = Point3::new(0.0, -1.53, 0.0);

        let g0 = place_gamma(&n, &ca, &cb, 0.0);
        let g1 = place_gamma(&n, &ca, &cb, 1.0);
        assert_relative_eq!((g0 - cb).norm(), 1.52, epsilon = 1e-9);
        assert_relative_eq!((g1 - cb).norm(), 1.52, epsilon = 1e-9);
        assert!((g0 - g1).norm() > 1e-3);
    }
}
