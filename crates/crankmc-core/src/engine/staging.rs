use super::matrix::TrialRows;
use crate::core::geometry::Frame;
use crate::core::models::chain::Conformation;
use crate::core::models::residue::Residue;

/// Full shadow copy of the conformation used to build one candidate move.
///
/// Phase 1 of every step writes only here; phase 2 either copies the touched
/// window back into the committed state or abandons the buffer wholesale.
/// Nothing outside the engine ever reads it, and its contents are only
/// meaningful for the single step that wrote them.
#[derive(Debug, Clone)]
pub struct TrialStagingBuffer {
    pub(crate) residues: Vec<Residue>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) prev_frames: Vec<Frame>,
    pub(crate) trial_rows: TrialRows,
}

impl TrialStagingBuffer {
    /// Allocates a same-shape shadow of the conformation. Allocation happens
    /// once per run; per-step work only rewrites the touched parts.
    pub fn new(chain: &Conformation) -> Self {
        Self {
            residues: chain.residues.clone(),
            frames: chain.frames.clone(),
            prev_frames: chain.prev_frames.clone(),
            trial_rows: TrialRows::new(chain.naa()),
        }
    }

    /// Per-step refresh: residue identities, flags and dihedrals, plus the
    /// per-chain boundary frames. Coordinates are left stale on purpose;
    /// the move builder overwrites every coordinate it later reads.
    pub(crate) fn stage_step(&mut self, chain: &Conformation) {
        for i in 1..chain.naa() {
            let committed = chain.residue(i);
            let trial = &mut self.residues[i];
            trial.copy_identity_from(committed);
            trial.chi1 = committed.chi1;
            trial.chi2 = committed.chi2;
        }
        self.prev_frames.copy_from_slice(&chain.prev_frames);
    }

    pub fn residue(&self, index: usize) -> &Residue {
        &self.residues[index]
    }

    pub fn trial_rows(&self) -> &TrialRows {
        &self.trial_rows
    }
}
