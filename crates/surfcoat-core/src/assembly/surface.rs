use super::error::{AssemblyError, ConfigurationError, GeometryError};
use super::lattice::Lattice;
use crate::core::models::fragment::Fragment;
use crate::core::models::port::Port;
use crate::core::models::system::Periodicity;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::debug;

/// Default thickness of the exposed-face shell when hunting for surface atoms,
/// in nm. Atoms within this distance of the slab's top plane get a port.
pub const DEFAULT_FACE_TOLERANCE: f64 = 0.05;

/// Default separation for surface attachment ports, in nm.
pub const DEFAULT_PORT_SEPARATION: f64 = 0.07;

/// A crystalline or amorphous slab with attachment ports on its exposed face.
///
/// Besides the particle geometry, a surface knows its full periodic repeat
/// lengths and its periodicity flags. The repeat lengths differ from the
/// particle bounding box, since a populated lattice stops one spacing short of
/// the next period; tiling strides by the periodic lengths so adjacent tiles
/// seam together without gap or overlap.
#[derive(Debug, Clone)]
pub struct Surface {
    fragment: Fragment,
    cell_lengths: [f64; 3],
    periodicity: Periodicity,
}

impl Surface {
    /// Wraps an already-built slab fragment.
    pub fn new(fragment: Fragment, cell_lengths: [f64; 3], periodicity: Periodicity) -> Self {
        Self {
            fragment,
            cell_lengths,
            periodicity,
        }
    }

    /// Populates `lattice` over `nx x ny x nz` cells and shifts the slab so
    /// its minimum corner sits at the origin.
    ///
    /// The result has no ports yet; call [`Surface::expose_ports`] to open the
    /// top face for attachment.
    pub fn build(
        lattice: &Lattice,
        compounds: &HashMap<String, Fragment>,
        nx: usize,
        ny: usize,
        nz: usize,
        periodicity: Periodicity,
    ) -> Result<Self, AssemblyError> {
        let mut slab = lattice.populate(compounds, nx, ny, nz)?;
        slab.translate_to_origin();
        Ok(Self {
            fragment: slab,
            cell_lengths: lattice.cell_lengths(nx, ny, nz),
            periodicity,
        })
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn fragment_mut(&mut self) -> &mut Fragment {
        &mut self.fragment
    }

    pub fn into_fragment(self) -> Fragment {
        self.fragment
    }

    pub fn cell_lengths(&self) -> [f64; 3] {
        self.cell_lengths
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Opens one outward-facing port per surface-exposed atom.
    ///
    /// An atom is surface-exposed when its z coordinate lies within
    /// `face_tolerance` of the slab's topmost plane. Ports are labeled
    /// `attach-{i}` in (y, then x) sorted order, which fixes the port ordering
    /// the allocator's reproducibility contract depends on.
    ///
    /// # Return
    ///
    /// The number of ports added.
    ///
    /// # Errors
    ///
    /// A slab with no particles cannot define an exposed face.
    pub fn expose_ports(
        &mut self,
        face_tolerance: f64,
        separation: f64,
    ) -> Result<usize, AssemblyError> {
        let bounds =
            self.fragment
                .bounding_box()
                .ok_or_else(|| GeometryError::EmptyFragment {
                    name: self.fragment.name().to_string(),
                })?;
        let top = bounds.max.z;

        let mut exposed: Vec<_> = self
            .fragment
            .particles()
            .filter(|(_, p)| p.position.z >= top - face_tolerance)
            .map(|(id, p)| (id, p.position))
            .collect();
        exposed.sort_by(|(_, a), (_, b)| {
            (a.y, a.x)
                .partial_cmp(&(b.y, b.x))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let count = exposed.len();
        for (i, (id, _)) in exposed.into_iter().enumerate() {
            let label = self.fragment.unique_port_label(&format!("attach-{i}"));
            self.fragment
                .add_port(Port::new(&label, id, Vector3::z(), separation))?;
        }
        debug!(count, "exposed surface ports");
        Ok(count)
    }

    /// Replicates the surface across a `tile_x x tile_y` in-plane grid.
    ///
    /// Each tile is a full clone of this surface (ports included, with labels
    /// uniquified), offset by whole periodic lengths.
    ///
    /// # Errors
    ///
    /// Zero tile counts are configuration errors, raised before any copying.
    pub fn tile(&self, tile_x: usize, tile_y: usize) -> Result<Surface, AssemblyError> {
        for (context, count) in [("tile_x", tile_x), ("tile_y", tile_y)] {
            if count == 0 {
                return Err(ConfigurationError::ZeroCount { context }.into());
            }
        }
        if tile_x == 1 && tile_y == 1 {
            return Ok(self.clone());
        }

        let [period_x, period_y, _] = self.cell_lengths;
        let mut tiled = Fragment::new(self.fragment.name());
        for i in 0..tile_x {
            for j in 0..tile_y {
                let mut tile = self.fragment.clone();
                tile.translate(Vector3::new(
                    period_x * i as f64,
                    period_y * j as f64,
                    0.0,
                ));
                tiled.merge(tile, "tile");
            }
        }
        Ok(Surface {
            fragment: tiled,
            cell_lengths: [
                self.cell_lengths[0] * tile_x as f64,
                self.cell_lengths[1] * tile_y as f64,
                self.cell_lengths[2],
            ],
            periodicity: self.periodicity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use nalgebra::Point3;

    fn two_layer_surface() -> Surface {
        let lattice = Lattice::cubic(0.5)
            .unwrap()
            .with_basis("A", vec![[0.0, 0.0, 0.0]]);
        let compounds = HashMap::from([(
            "A".to_string(),
            single_atom("Si"),
        )]);
        Surface::build(&lattice, &compounds, 2, 2, 2, Periodicity::in_plane()).unwrap()
    }

    fn single_atom(element: &str) -> Fragment {
        let mut fragment = Fragment::new(element);
        fragment.add_particle(Particle::new(element, Point3::origin()));
        fragment
    }

    #[test]
    fn build_places_minimum_corner_at_origin() {
        let surface = two_layer_surface();
        let bounds = surface.fragment().bounding_box().unwrap();
        assert!(bounds.min.coords.norm() < 1e-12);
    }

    #[test]
    fn expose_ports_opens_only_top_face() {
        let mut surface = two_layer_surface();
        let count = surface
            .expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)
            .unwrap();

        // 2x2 in-plane atoms on the top layer.
        assert_eq!(count, 4);
        assert_eq!(surface.fragment().free_port_count(), 4);
        for port in surface.fragment().free_ports() {
            let anchor = surface.fragment().particle(port.anchor()).unwrap();
            assert!((anchor.position.z - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn exposed_ports_are_ordered_row_major() {
        let mut surface = two_layer_surface();
        surface
            .expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)
            .unwrap();

        let anchors: Vec<(f64, f64)> = surface
            .fragment()
            .free_ports()
            .map(|port| {
                let p = surface.fragment().particle(port.anchor()).unwrap();
                (p.position.y, p.position.x)
            })
            .collect();
        let mut sorted = anchors.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(anchors, sorted);
    }

    #[test]
    fn tile_strides_by_periodic_lengths() {
        let mut surface = two_layer_surface();
        surface
            .expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)
            .unwrap();
        let tiled = surface.tile(2, 1).unwrap();

        assert_eq!(tiled.fragment().n_particles(), 16);
        assert_eq!(tiled.fragment().free_port_count(), 8);
        assert_eq!(tiled.cell_lengths()[0], 2.0);
        // The second tile starts a full period (1.0 nm) over, not at the
        // bounding-box edge (0.5 nm).
        let max_x = tiled
            .fragment()
            .particles()
            .map(|(_, p)| p.position.x)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((max_x - 1.5).abs() < 1e-9);
    }

    #[test]
    fn tile_rejects_zero_counts_before_copying() {
        let surface = two_layer_surface();
        let result = surface.tile(0, 3);
        assert!(matches!(
            result,
            Err(AssemblyError::Configuration(ConfigurationError::ZeroCount { .. }))
        ));
    }

    #[test]
    fn tile_preserves_periodicity_flags() {
        let surface = two_layer_surface();
        let tiled = surface.tile(2, 2).unwrap();
        assert_eq!(tiled.periodicity(), Periodicity::in_plane());
    }
}
