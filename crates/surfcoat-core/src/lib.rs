//! # Surfcoat Core Library
//!
//! A library for building coated-surface molecular systems (monolayers,
//! polymer brushes, dual-monolayer sandwiches, and solvated interfaces)
//! by composing port-bearing molecular fragments.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict layered architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Fragment`,
//!   `Port`, bounding boxes, system boxes), pure geometry utilities, and the
//!   fragment-template loader.
//!
//! - **[`assembly`]: The Logic Core.** This layer implements the operations that
//!   transform fragments: the port-join operator (`join`), linear chain
//!   construction (`ChainBuilder`), lattice population and surface tiling,
//!   fraction-based pattern allocation, and deterministic box packing.
//!
//! - **[`recipes`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `assembly` and `core` layers together into complete
//!   structure-generation procedures: `Monolayer`, `DualMonolayer`, and their
//!   solvated variants.
//!
//! - **[`library`]: Stock Fragments.** Ready-made building blocks (capping
//!   atoms, common moieties, crystalline surfaces, and chain recipes) defined
//!   as data-producing constructors.
//!
//! All randomized operations take an explicit RNG handle, so any assembly is
//! reproducible bit-for-bit from a seed.

pub mod assembly;
pub mod core;
pub mod library;
pub mod recipes;
