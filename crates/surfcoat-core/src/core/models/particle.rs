use nalgebra::Point3;

/// Represents a single particle (atom or coarse-grained bead) in a fragment.
///
/// A particle carries its element symbol, an optional display name used to
/// distinguish chemically equivalent sites, and a 3D position. Positions are
/// expressed in nanometers throughout the library.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// The element symbol (e.g., "C", "Si", "Au").
    pub element: String,
    /// The display name of the particle; defaults to the element symbol.
    pub name: String,
    /// The 3D coordinates of the particle in nanometers.
    pub position: Point3<f64>,
}

impl Particle {
    /// Creates a new `Particle` named after its element symbol.
    ///
    /// # Arguments
    ///
    /// * `element` - The element symbol.
    /// * `position` - The 3D coordinates of the particle.
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            name: element.to_string(),
            position,
        }
    }

    /// Creates a new `Particle` with a display name distinct from its element.
    ///
    /// # Arguments
    ///
    /// * `element` - The element symbol.
    /// * `name` - The display name (e.g., "HB" for a specific hydrogen).
    /// * `position` - The 3D coordinates of the particle.
    pub fn named(element: &str, name: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            name: name.to_string(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particle_uses_element_as_name() {
        let particle = Particle::new("Si", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(particle.element, "Si");
        assert_eq!(particle.name, "Si");
        assert_eq!(particle.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn named_particle_keeps_distinct_name() {
        let particle = Particle::named("H", "HB2", Point3::origin());
        assert_eq!(particle.element, "H");
        assert_eq!(particle.name, "HB2");
    }
}
