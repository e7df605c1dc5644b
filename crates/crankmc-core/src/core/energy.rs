use super::models::residue::Residue;
use super::potentials;
use rand::{Rng, RngCore};

/// Contract between the move engine and a potential model.
///
/// `pair_energy` is symmetric in principle and is called once per unordered
/// pair; `global_energy` is the external term over the whole system, where
/// residues inside `start..=end` are read from `trial` and everything else
/// from `committed` (both slices are same-shape, slot 0 being the sentinel).
pub trait EnergyModel {
    fn pair_energy(&self, a: &Residue, b: &Residue) -> f64;

    fn self_energy(&self, residue: &Residue) -> f64;

    fn global_energy(
        &self,
        start: usize,
        end: usize,
        committed: &[Residue],
        trial: &[Residue],
    ) -> f64;

    /// Type-specific chi1 sample for side-chain resampling.
    fn sidechain_dihedral(&self, code: char, rng: &mut dyn RngCore) -> f64;

    /// Type-specific chi2 sample conditioned on chi1.
    fn sidechain_dihedral2(&self, code: char, chi1: f64, rng: &mut dyn RngCore) -> f64;
}

const ROTAMER_WELLS: [f64; 3] = [-60.0, 60.0, 180.0];

/// CA-contact Lennard-Jones model with a flat-bottom membrane slab as the
/// external term and threefold torsional self-energies.
#[derive(Debug, Clone, PartialEq)]
pub struct CaContactModel {
    pub r_min: f64,
    pub well_depth: f64,
    pub torsion_barrier: f64,
    pub slab_halfwidth: f64,
    pub slab_k: f64,
}

impl Default for CaContactModel {
    fn default() -> Self {
        Self {
            r_min: 6.0,
            well_depth: 0.3,
            torsion_barrier: 0.4,
            slab_halfwidth: 15.0,
            slab_k: 0.5,
        }
    }
}

impl EnergyModel for CaContactModel {
    fn pair_energy(&self, a: &Residue, b: &Residue) -> f64 {
        // Bonded neighbours are held by the backbone, not the contact term.
        if a.chain == b.chain && a.seq.abs_diff(b.seq) <= 1 {
            return 0.0;
        }
        let dist = (a.ca - b.ca).norm();
        potentials::lennard_jones_12_6(dist, self.r_min, self.well_depth)
    }

    fn self_energy(&self, residue: &Residue) -> f64 {
        let mut e = 0.0;
        if let Some(chi1) = residue.chi1 {
            e += potentials::threefold_torsion(chi1, self.torsion_barrier);
        }
        if let Some(chi2) = residue.chi2 {
            e += potentials::threefold_torsion(chi2, self.torsion_barrier);
        }
        e
    }

    fn global_energy(
        &self,
        start: usize,
        end: usize,
        committed: &[Residue],
        trial: &[Residue],
    ) -> f64 {
        let mut e = 0.0;
        for i in 1..committed.len() {
            let residue = if i >= start && i <= end {
                &trial[i]
            } else {
                &committed[i]
            };
            e += potentials::flat_bottom_slab(residue.ca.z, self.slab_halfwidth, self.slab_k);
        }
        e
    }

    fn sidechain_dihedral(&self, _code: char, rng: &mut dyn RngCore) -> f64 {
        let well = ROTAMER_WELLS[rng.gen_range(0..ROTAMER_WELLS.len())];
        (well + rng.gen_range(-10.0..10.0)).to_radians()
    }

    fn sidechain_dihedral2(&self, _code: char, chi1: f64, rng: &mut dyn RngCore) -> f64 {
        // Branched side chains prefer the anti well unless chi1 is gauche+.
        let base: f64 = if chi1 > 0.0 { 180.0 } else { -60.0 };
        (base + rng.gen_range(-10.0..10.0)).to_radians()
    }
}
