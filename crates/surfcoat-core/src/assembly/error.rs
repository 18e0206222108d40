use crate::core::models::port::PortError;
use thiserror::Error;

/// Errors detectable from an assembly request alone, before any geometry work.
///
/// Configuration errors are never retried; the offending build aborts
/// immediately.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Requested {context} must be positive (got {value})")]
    NonPositiveDimension { context: &'static str, value: f64 },

    #[error("Requested {context} must be at least one (got 0)")]
    ZeroCount { context: &'static str },

    #[error("Chain fractions must sum to 1 (got {sum})")]
    FractionSum { sum: f64 },

    #[error("Fraction {value} at position {index} is outside [0, 1]")]
    FractionRange { index: usize, value: f64 },

    #[error("Number of fractions ({fractions}) does not match the number of chain types ({chains})")]
    FractionCount { chains: usize, fractions: usize },

    #[error("At least one chain type is required")]
    EmptyChainList,

    #[error("Pattern requests {requested} site(s) but only {available} free port(s) exist")]
    InsufficientPorts { requested: usize, available: usize },

    #[error("At least one monomer is required to build a chain")]
    EmptyMonomerList,

    #[error("Sequence symbol '{symbol}' does not map into the {monomers} supplied monomer(s)")]
    SequenceSymbol { symbol: char, monomers: usize },

    #[error("Lattice basis key '{key}' has no matching compound")]
    UnknownBasisKey { key: String },

    #[error("Lattice basis is empty")]
    EmptyBasis,

    #[error("Lattice angle {value} at position {index} must lie in (0, 180) degrees")]
    InvalidAngle { index: usize, value: f64 },
}

/// Errors from degenerate geometry encountered mid-assembly. Fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Port '{label}' has a zero-length orientation vector")]
    ZeroOrientation { label: String },

    #[error(
        "Joined anchors would sit {separation} nm apart, below the bond tolerance of {tolerance} nm"
    )]
    DisjointAnchors { separation: f64, tolerance: f64 },

    #[error("Fragment '{name}' has no particles to derive geometry from")]
    EmptyFragment { name: String },
}

/// The top-level assembly error taxonomy.
///
/// Every failure is fatal: a failed assembly leaves no usable partial system,
/// matching the batch nature of structure generation.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
