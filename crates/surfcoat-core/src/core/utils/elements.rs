use phf::{Map, phf_map};

// Standard atomic weights (u), abridged to the elements that appear in the
// stock fragment library and common coating chemistries.
static ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    "H" => 1.008,
    "C" => 12.011,
    "N" => 14.007,
    "O" => 15.999,
    "F" => 18.998,
    "Na" => 22.990,
    "Si" => 28.085,
    "P" => 30.974,
    "S" => 32.06,
    "Cl" => 35.45,
    "Br" => 79.904,
    "Au" => 196.967,
};

// Covalent radii (nm), same element set.
static COVALENT_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 0.031,
    "C" => 0.076,
    "N" => 0.071,
    "O" => 0.066,
    "F" => 0.057,
    "Na" => 0.166,
    "Si" => 0.111,
    "P" => 0.107,
    "S" => 0.105,
    "Cl" => 0.102,
    "Br" => 0.120,
    "Au" => 0.136,
};

/// Looks up the standard atomic mass for an element symbol.
pub fn atomic_mass(symbol: &str) -> Option<f64> {
    ATOMIC_MASSES.get(symbol).copied()
}

/// Looks up the covalent radius (nm) for an element symbol.
pub fn covalent_radius(symbol: &str) -> Option<f64> {
    COVALENT_RADII.get(symbol).copied()
}

/// Upper bound for a plausible bond length between two elements, as the sum of
/// covalent radii scaled by `tolerance`.
pub fn max_bond_length(symbol_a: &str, symbol_b: &str, tolerance: f64) -> Option<f64> {
    Some((covalent_radius(symbol_a)? + covalent_radius(symbol_b)?) * tolerance)
}
