//! Stock fragments: capping atoms, moieties, surfaces, and chain recipes.
//!
//! Everything here is data expressed as constructors: fixed geometries with
//! ports already registered, ready to feed the assembly layer.

pub mod atoms;
pub mod chains;
pub mod moieties;
pub mod surfaces;
