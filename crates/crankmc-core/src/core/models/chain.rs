use super::residue::Residue;
use crate::core::geometry::Frame;

/// The committed conformation: residues indexed `1..naa` (slot 0 is a
/// sentinel), per-residue peptide-unit frames, and one "previous" frame per
/// chain segment that orients the N-terminal amide of that segment.
///
/// Backbone geometry is internally consistent by construction: every
/// residue's atoms derive from the bracketing frames, and FIXED residues are
/// never touched by the move engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformation {
    pub(crate) residues: Vec<Residue>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) prev_frames: Vec<Frame>,
    nchains: usize,
}

impl Conformation {
    pub(crate) fn from_parts(
        residues: Vec<Residue>,
        frames: Vec<Frame>,
        prev_frames: Vec<Frame>,
    ) -> Self {
        debug_assert_eq!(residues.len(), frames.len());
        let nchains = prev_frames.len();
        Self {
            residues,
            frames,
            prev_frames,
            nchains,
        }
    }

    /// Number of residue slots, sentinel included; residues live at
    /// `1..naa()`.
    pub fn naa(&self) -> usize {
        self.residues.len()
    }

    pub fn nchains(&self) -> usize {
        self.nchains
    }

    pub fn residue(&self, index: usize) -> &Residue {
        &self.residues[index]
    }

    pub(crate) fn residue_mut(&mut self, index: usize) -> &mut Residue {
        &mut self.residues[index]
    }

    /// All residue slots including the sentinel, for merged trial/committed
    /// energy evaluation.
    pub fn residue_slots(&self) -> &[Residue] {
        &self.residues
    }

    pub fn frame(&self, index: usize) -> Frame {
        self.frames[index]
    }

    pub(crate) fn set_frame(&mut self, index: usize, frame: Frame) {
        self.frames[index] = frame;
    }

    pub fn prev_frame(&self, chain_id: usize) -> Frame {
        self.prev_frames[chain_id]
    }

    pub(crate) fn set_prev_frame(&mut self, chain_id: usize, frame: Frame) {
        self.prev_frames[chain_id] = frame;
    }

    /// One-letter sequence with `|` marking chain breaks, mostly for logs.
    pub fn sequence_string(&self) -> String {
        let mut out = String::new();
        for i in 1..self.naa() {
            if i > 1 && self.residues[i].chain != self.residues[i - 1].chain {
                out.push('|');
            }
            out.push(self.residues[i].code);
        }
        out
    }
}
