//! # CrankMC Core Library
//!
//! A Metropolis / Nested-Sampling move engine for coarse-grained
//! polypeptide chains. Conformations are chains of CA-anchored residues
//! whose backbone is encoded as a sequence of orthonormal frames; moves are
//! crankshaft and pivot rotations of contiguous segments.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict two-layer split:
//!
//! - **[`core`]: The Foundation.** Stateless data models ([`core::models`]),
//!   rigid-body frame geometry ([`core::geometry`]), analytic potentials
//!   ([`core::potentials`]) and the [`core::energy::EnergyModel`] contract a
//!   scoring function must fulfil.
//!
//! - **[`engine`]: The Logic Core.** The stateful sampling machinery: the
//!   move lookup table, the trial staging buffer, the incrementally
//!   maintained pairwise energy matrix, the acceptance rules and the
//!   adaptive amplitude controller, all orchestrated by
//!   [`engine::driver::MoveDriver`].
//!
//! A single Markov-chain step is one call to
//! [`engine::driver::MoveDriver::step`]: stage, rotate, evaluate the moved
//! window against the committed matrix, decide, and commit or discard.

pub mod core;
pub mod engine;
