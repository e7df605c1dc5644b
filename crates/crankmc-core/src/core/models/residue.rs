use crate::core::geometry::{self, Frame};
use nalgebra::Point3;

/// Per-residue move constraints.
///
/// `fixed` residues may never change coordinates; `constrained` residues are
/// carried through for external potentials that bound their configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResidueFlags {
    pub fixed: bool,
    pub constrained: bool,
}

/// One amino-acid unit of the coarse-grained chain.
///
/// Backbone atoms are derived quantities: everything except CA is rebuilt
/// from the CA position and the peptide-unit frames on either side of the
/// residue, so a rigid rotation of the frames moves the whole residue
/// rigidly.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub code: char, // One-letter amino-acid code
    pub seq: usize, // Sequence index within the conformation (1-based)
    pub chain: u32, // Identifier of the owning chain segment
    pub flags: ResidueFlags,

    pub n: Point3<f64>,
    pub ca: Point3<f64>,
    pub c: Point3<f64>,
    pub o: Point3<f64>,
    pub h: Point3<f64>, // Amide hydrogen; meaningless for proline
    pub cb: Point3<f64>, // Beta carbon; meaningless for glycine
    pub g: Option<Point3<f64>>, // Gamma heavy atom, present when chi1 is defined

    pub chi1: Option<f64>,
    pub chi2: Option<f64>,
}

impl Residue {
    pub fn new(code: char, seq: usize, chain: u32) -> Self {
        let chi1 = has_chi1(code).then_some(-60.0f64.to_radians());
        let chi2 = has_chi2(code).then_some(180.0f64.to_radians());
        Self {
            code,
            seq,
            chain,
            flags: ResidueFlags::default(),
            n: Point3::origin(),
            ca: Point3::origin(),
            c: Point3::origin(),
            o: Point3::origin(),
            h: Point3::origin(),
            cb: Point3::origin(),
            g: None,
            chi1,
            chi2,
        }
    }

    /// The reserved slot-0 residue. Its chain id can never collide with a
    /// real chain, which makes `chain != previous.chain` hold at index 1.
    pub(crate) fn sentinel() -> Self {
        Self::new('\0', 0, u32::MAX)
    }

    pub fn has_amide_h(&self) -> bool {
        self.code != 'P'
    }

    pub fn has_cb(&self) -> bool {
        self.code != 'G'
    }

    pub fn has_chi1(&self) -> bool {
        has_chi1(self.code)
    }

    pub fn has_chi2(&self) -> bool {
        has_chi2(self.code)
    }

    /// Copies identity, flags and dihedrals without touching coordinates.
    pub(crate) fn copy_identity_from(&mut self, other: &Residue) {
        self.code = other.code;
        self.seq = other.seq;
        self.chain = other.chain;
        self.flags = other.flags;
    }

    /// Re-derives every non-CA atom from the CA position and the two
    /// peptide-unit frames bracketing this residue.
    pub(crate) fn rebuild_atoms(&mut self, prev: &Frame, frame: &Frame) {
        self.n = geometry::place_n(&self.ca, prev);
        self.c = geometry::place_c(&self.ca, frame);
        self.o = geometry::place_o(&self.c, frame);
        if self.has_amide_h() {
            self.h = geometry::place_h(&self.n, prev);
        }
        if self.has_cb() {
            self.cb = geometry::place_cb(&self.n, &self.ca, &self.c);
            self.g = self
                .chi1
                .map(|chi1| geometry::place_gamma(&self.n, &self.ca, &self.cb, chi1));
        }
    }
}

fn has_chi1(code: char) -> bool {
    code != 'G' && code != 'A' && code != '\0'
}

fn has_chi2(code: char) -> bool {
    matches!(code, 'V' | 'I' | 'T')
}
