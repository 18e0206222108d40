use crate::assembly::error::{AssemblyError, ConfigurationError};
use crate::assembly::lattice::Lattice;
use crate::assembly::surface::{DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION, Surface};
use crate::core::models::fragment::Fragment;
use crate::core::models::particle::Particle;
use crate::core::models::system::Periodicity;
use nalgebra::Point3;
use std::collections::HashMap;

// Diamond-cubic silicon lattice constant, nm.
const SILICON_SPACING: f64 = 0.54309;
// Si-Si bond search window, nm.
const SILICON_BOND_MAX: f64 = 0.236;
// fcc gold lattice constant, nm.
const GOLD_SPACING: f64 = 0.40782;

fn single_atom(element: &str) -> Fragment {
    let mut fragment = Fragment::new(element);
    fragment.add_particle(Particle::new(element, Point3::origin()));
    fragment
}

/// A block of crystalline silicon: diamond-cubic lattice with bonds generated
/// by the Si-Si distance criterion. Periodic in-plane, open along z.
///
/// `x`, `y`, `z` are unit-cell replication counts.
pub fn crystalline_silicon(x: usize, y: usize, z: usize) -> Result<Surface, AssemblyError> {
    let lattice = Lattice::new(
        [SILICON_SPACING, SILICON_SPACING, SILICON_SPACING],
        [90.0, 90.0, 90.0],
    )?
    .with_basis(
        "Si",
        vec![
            [0.0, 0.0, 0.0],
            [0.5, 0.5, 0.0],
            [0.5, 0.0, 0.5],
            [0.0, 0.5, 0.5],
            [0.25, 0.25, 0.75],
            [0.25, 0.75, 0.25],
            [0.75, 0.25, 0.25],
            [0.75, 0.75, 0.75],
        ],
    );
    let compounds = HashMap::from([("Si".to_string(), single_atom("Si"))]);
    let mut surface = Surface::build(&lattice, &compounds, x, y, z, Periodicity::in_plane())?;
    surface
        .fragment_mut()
        .generate_bonds("Si", "Si", 0.0, SILICON_BOND_MAX);
    Ok(surface)
}

/// A crystalline-silicon slab with attachment ports exposed on its top face.
pub fn silicon_interface(x: usize, y: usize, z: usize) -> Result<Surface, AssemblyError> {
    let mut surface = crystalline_silicon(x, y, z)?;
    surface.expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)?;
    Ok(surface)
}

/// An fcc gold block, fully periodic (bulk-crystal convention).
///
/// `x` and `y` are target extents in nm, rounded down to whole unit cells;
/// `n_layers` counts cells along z.
pub fn gold_lattice(x: f64, y: f64, n_layers: usize) -> Result<Surface, AssemblyError> {
    for (context, value) in [("gold sheet length", x), ("gold sheet depth", y)] {
        if value <= 0.0 {
            return Err(ConfigurationError::NonPositiveDimension { context, value }.into());
        }
    }
    let replicate_x = (x / GOLD_SPACING) as usize;
    let replicate_y = (y / GOLD_SPACING) as usize;

    let lattice = Lattice::new(
        [GOLD_SPACING, GOLD_SPACING, GOLD_SPACING],
        [90.0, 90.0, 90.0],
    )?
    .with_basis(
        "Au",
        vec![
            [0.0, 0.0, 0.0],
            [0.5, 0.5, 0.0],
            [0.0, 0.5, 0.5],
            [0.5, 0.0, 0.5],
        ],
    );
    let compounds = HashMap::from([("Au".to_string(), single_atom("Au"))]);
    Surface::build(
        &lattice,
        &compounds,
        replicate_x,
        replicate_y,
        n_layers,
        Periodicity::bulk(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crystalline_silicon_has_eight_atoms_per_cell() {
        let surface = crystalline_silicon(2, 2, 1).unwrap();
        assert_eq!(surface.fragment().n_particles(), 8 * 4);
        assert_eq!(surface.periodicity(), Periodicity::in_plane());
    }

    #[test]
    fn crystalline_silicon_is_bonded() {
        let surface = crystalline_silicon(1, 1, 1).unwrap();
        assert!(!surface.fragment().bonds().is_empty());
    }

    #[test]
    fn silicon_interface_exposes_attachment_ports() {
        let surface = silicon_interface(2, 2, 1).unwrap();
        assert!(surface.fragment().free_port_count() > 0);
        for port in surface.fragment().free_ports() {
            assert!(port.label().starts_with("attach-"));
        }
    }

    #[test]
    fn gold_lattice_is_fully_periodic() {
        let surface = gold_lattice(1.0, 1.0, 2).unwrap();
        assert_eq!(surface.periodicity(), Periodicity::bulk());
        // 2x2 in-plane cells at 4 atoms each, two layers.
        assert_eq!(surface.fragment().n_particles(), 2 * 2 * 2 * 4);
    }

    #[test]
    fn gold_lattice_rejects_non_positive_dimensions() {
        let result = gold_lattice(-1.0, 1.0, 2);
        assert!(matches!(
            result,
            Err(AssemblyError::Configuration(
                ConfigurationError::NonPositiveDimension { .. }
            ))
        ));
    }
}
