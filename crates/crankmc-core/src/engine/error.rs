use thiserror::Error;

/// Fatal invariant violations of the move engine.
///
/// Every variant signals an internally inconsistent topology, model or
/// configuration; there is no retry path. Rejected moves are normal outcomes
/// and are never reported through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Chain topology unusable for move enumeration: {0}")]
    Topology(String),

    #[error(
        "Move count mismatch for segment length {length}: {legal} legal + {fixed_disallowed} fixed-disallowed != {theoretical} theoretical (too short chains?)"
    )]
    MoveCountMismatch {
        length: usize,
        legal: usize,
        fixed_disallowed: usize,
        theoretical: usize,
    },

    #[error("Move lookup hit a sentinel slot (segment length {length}, slot {slot})")]
    SentinelMove { length: usize, slot: usize },

    #[error("Tried to move fixed residue {index} inside window {start}..{end}")]
    FixedResidueInWindow {
        index: usize,
        start: usize,
        end: usize,
    },

    #[error("Inconsistent chain ids at move classification for window {start}..={end}")]
    Classification { start: usize, end: usize },

    #[error("Invalid calibration configuration: {0}")]
    Calibration(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
