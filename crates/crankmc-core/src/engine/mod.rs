//! The sampling engine: move proposal, incremental energy bookkeeping and
//! acceptance.
//!
//! The [`driver::MoveDriver`] ties the pieces together. Around it sit the
//! [`lookup::MoveLookupTable`] (which segment rotations are legal), the
//! [`staging::TrialStagingBuffer`] (candidate coordinates, never the
//! committed state), the [`matrix::EnergyMatrixCache`] (pairwise energies
//! recomputed only for the moved window) and the
//! [`amplitude::AmplitudeController`] (acceptance-rate feedback on the
//! rotation angle).

pub mod amplitude;
pub mod config;
pub mod driver;
pub mod error;
pub mod lookup;
pub mod matrix;
pub mod moves;
pub mod staging;
