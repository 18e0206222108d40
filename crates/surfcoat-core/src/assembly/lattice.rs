use super::error::{AssemblyError, ConfigurationError};
use crate::core::models::fragment::Fragment;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::debug;

/// A periodic lattice defined by cell edge lengths, cell angles, and a basis
/// of fractional sites.
///
/// Basis sites are grouped under string keys; `populate` substitutes one
/// compound fragment per key, replicated across every cell of the requested
/// extent. This mirrors the unit-cell description of crystalline surfaces:
/// the lattice holds pure geometry, the compounds carry chemistry.
#[derive(Debug, Clone)]
pub struct Lattice {
    spacing: [f64; 3],
    angles: [f64; 3],
    basis: Vec<(String, Vec<[f64; 3]>)>,
}

impl Lattice {
    /// Creates a lattice with the given edge lengths (nm) and angles (degrees).
    ///
    /// # Errors
    ///
    /// Non-positive spacings and angles outside (0, 180) are configuration
    /// errors, rejected before any geometry work.
    pub fn new(spacing: [f64; 3], angles: [f64; 3]) -> Result<Self, AssemblyError> {
        for &length in &spacing {
            if length <= 0.0 {
                return Err(ConfigurationError::NonPositiveDimension {
                    context: "lattice spacing",
                    value: length,
                }
                .into());
            }
        }
        for (index, &angle) in angles.iter().enumerate() {
            if angle <= 0.0 || angle >= 180.0 {
                return Err(ConfigurationError::InvalidAngle {
                    index,
                    value: angle,
                }
                .into());
            }
        }
        Ok(Self {
            spacing,
            angles,
            basis: Vec::new(),
        })
    }

    /// A cubic lattice with edge length `a`.
    pub fn cubic(a: f64) -> Result<Self, AssemblyError> {
        Self::new([a, a, a], [90.0, 90.0, 90.0])
    }

    /// Adds a named group of fractional basis sites.
    pub fn with_basis(mut self, key: &str, points: Vec<[f64; 3]>) -> Self {
        self.basis.push((key.to_string(), points));
        self
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// The full periodic lengths of an `nx x ny x nz` replication.
    pub fn cell_lengths(&self, nx: usize, ny: usize, nz: usize) -> [f64; 3] {
        [
            self.spacing[0] * nx as f64,
            self.spacing[1] * ny as f64,
            self.spacing[2] * nz as f64,
        ]
    }

    /// The three cell vectors of the (possibly triclinic) unit cell.
    pub fn cell_vectors(&self) -> [Vector3<f64>; 3] {
        let [a, b, c] = self.spacing;
        let alpha = self.angles[0].to_radians();
        let beta = self.angles[1].to_radians();
        let gamma = self.angles[2].to_radians();

        let a_vec = Vector3::new(a, 0.0, 0.0);
        let b_vec = Vector3::new(b * gamma.cos(), b * gamma.sin(), 0.0);
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();
        [a_vec, b_vec, Vector3::new(cx, cy, cz)]
    }

    /// Replicates the basis over an `nx x ny x nz` block of cells,
    /// substituting `compounds[key]` at every site of each basis group.
    ///
    /// # Errors
    ///
    /// Zero extents, an empty basis, or a basis key without a matching
    /// compound are configuration errors raised before any cell is built.
    pub fn populate(
        &self,
        compounds: &HashMap<String, Fragment>,
        nx: usize,
        ny: usize,
        nz: usize,
    ) -> Result<Fragment, AssemblyError> {
        for (context, extent) in [("x replication", nx), ("y replication", ny), ("z replication", nz)]
        {
            if extent == 0 {
                return Err(ConfigurationError::ZeroCount { context }.into());
            }
        }
        if self.basis.is_empty() {
            return Err(ConfigurationError::EmptyBasis.into());
        }
        for (key, _) in &self.basis {
            if !compounds.contains_key(key) {
                return Err(ConfigurationError::UnknownBasisKey { key: key.clone() }.into());
            }
        }

        let [a_vec, b_vec, c_vec] = self.cell_vectors();
        let mut slab = Fragment::new("lattice");
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    for (key, points) in &self.basis {
                        let compound = &compounds[key];
                        for point in points {
                            let offset = a_vec * (i as f64 + point[0])
                                + b_vec * (j as f64 + point[1])
                                + c_vec * (k as f64 + point[2]);
                            let mut site = compound.clone();
                            site.translate(offset);
                            slab.merge(site, key);
                        }
                    }
                }
            }
        }

        debug!(
            nx,
            ny,
            nz,
            particles = slab.n_particles(),
            "populated lattice"
        );
        Ok(slab)
    }
}
