use super::bbox::BoundingBox;

/// Per-axis periodicity flags for an assembled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Periodicity(pub [bool; 3]);

impl Periodicity {
    /// Periodic in the two in-plane axes, aperiodic along the exposed face.
    ///
    /// This is the convention for every slab-with-vacuum surface.
    pub fn in_plane() -> Self {
        Periodicity([true, true, false])
    }

    /// Fully periodic, the bulk-crystal case.
    pub fn bulk() -> Self {
        Periodicity([true, true, true])
    }

    pub fn none() -> Self {
        Periodicity([false, false, false])
    }
}

/// The enclosing box of an assembled system.
///
/// A `SystemBox` is always derived from the bounding boxes of the composed
/// fragments; it is bookkeeping, not independent state. Angles are 90 degrees
/// unless the system was built from a triclinic lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemBox {
    pub lengths: [f64; 3],
    pub angles: [f64; 3],
    pub periodicity: Periodicity,
}

impl SystemBox {
    /// Creates an orthorhombic box with the given edge lengths.
    pub fn new(lengths: [f64; 3], periodicity: Periodicity) -> Self {
        Self {
            lengths,
            angles: [90.0, 90.0, 90.0],
            periodicity,
        }
    }

    /// Creates a box from explicit lengths and angles (degrees).
    pub fn with_angles(lengths: [f64; 3], angles: [f64; 3], periodicity: Periodicity) -> Self {
        Self {
            lengths,
            angles,
            periodicity,
        }
    }

    /// Creates an orthorhombic box enclosing a bounding box.
    pub fn from_bounds(bounds: &BoundingBox, periodicity: Periodicity) -> Self {
        Self::new(bounds.lengths(), periodicity)
    }
}
