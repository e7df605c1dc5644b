//! Stateless foundation layer: chain models, rigid-body geometry, and the
//! potential-model contract. Nothing here owns sampling state; the stateful
//! move machinery lives in [`crate::engine`].

pub mod energy;
pub mod geometry;
pub mod models;
pub mod potentials;
