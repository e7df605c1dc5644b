use super::chain::Conformation;
use super::residue::Residue;
use crate::core::geometry::{self, CA_CA_DISTANCE, Frame};
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Sequence is empty")]
    EmptySequence,
    #[error("Chain segment {0} is empty")]
    EmptyChain(usize),
    #[error("Unknown residue code '{0}'")]
    UnknownResidue(char),
    #[error("Fixed-residue index {0} is out of range")]
    FixedOutOfRange(usize),
}

const KNOWN_CODES: &str = "ACDEFGHIKLMNPQRSTVWY";

/// Builds an extended starting conformation from a one-letter sequence.
///
/// `|` separates chain segments. Residues zig-zag along x with each chain
/// offset in y, and every derived atom is placed through the same frame
/// rebuild the move engine uses, so the starting state already satisfies the
/// backbone-consistency invariant.
#[derive(Debug, Default)]
pub struct ConformationBuilder {
    sequence: String,
    fixed: HashSet<usize>,
    constrained: HashSet<usize>,
}

impl ConformationBuilder {
    pub fn new(sequence: &str) -> Self {
        Self {
            sequence: sequence.to_string(),
            ..Self::default()
        }
    }

    /// Pins the residue at the given 1-based global index.
    pub fn fix_residue(mut self, index: usize) -> Self {
        self.fixed.insert(index);
        self
    }

    pub fn constrain_residue(mut self, index: usize) -> Self {
        self.constrained.insert(index);
        self
    }

    pub fn build(self) -> Result<Conformation, BuildError> {
        if self.sequence.is_empty() {
            return Err(BuildError::EmptySequence);
        }

        let mut residues = vec![Residue::sentinel()];
        let mut chain_id: u32 = 0;
        for (segment_idx, segment) in self.sequence.split('|').enumerate() {
            if segment.is_empty() {
                return Err(BuildError::EmptyChain(segment_idx));
            }
            for code in segment.chars() {
                if !KNOWN_CODES.contains(code) {
                    return Err(BuildError::UnknownResidue(code));
                }
                let seq = residues.len();
                residues.push(Residue::new(code, seq, chain_id));
            }
            chain_id += 1;
        }
        let nchains = chain_id as usize;
        let naa = residues.len();

        for &index in self.fixed.iter().chain(self.constrained.iter()) {
            if index == 0 || index >= naa {
                return Err(BuildError::FixedOutOfRange(index));
            }
        }
        for &index in &self.fixed {
            residues[index].flags.fixed = true;
        }
        for &index in &self.constrained {
            residues[index].flags.constrained = true;
        }

        // Alternating small twists about z keep the extended chain from
        // being perfectly collinear.
        let mut frames: Vec<Frame> = vec![geometry::identity_frame(); naa];
        for (i, frame) in frames.iter_mut().enumerate().skip(1) {
            let tilt = if i % 2 == 0 { 0.3 } else { -0.3 };
            *frame = geometry::rotate_frame(
                &geometry::rotation_about_axis(&Vector3::z(), tilt),
                &geometry::identity_frame(),
            );
        }
        let prev_frames: Vec<Frame> = (0..nchains)
            .map(|cid| {
                geometry::rotate_frame(
                    &geometry::rotation_about_axis(&Vector3::z(), 0.3 * (cid as f64 + 1.0)),
                    &geometry::identity_frame(),
                )
            })
            .collect();

        // Propagate CA positions chain by chain, each chain shifted in y.
        for i in 1..naa {
            let cid = residues[i].chain;
            let chain_start = residues[i].chain != residues[i - 1].chain;
            if chain_start {
                residues[i].ca = Point3::new(0.0, 20.0 * cid as f64, 0.0);
            } else {
                let step = frames[i - 1].column(0) * CA_CA_DISTANCE;
                residues[i].ca = residues[i - 1].ca + step;
            }
        }

        for i in 1..naa {
            let chain_start = residues[i].chain != residues[i - 1].chain;
            let prev = if chain_start {
                prev_frames[residues[i].chain as usize]
            } else {
                frames[i - 1]
            };
            let frame = frames[i];
            residues[i].rebuild_atoms(&prev, &frame);
        }

        Ok(Conformation::from_parts(residues, frames, prev_frames))
    }
}
