use super::error::{AssemblyError, ConfigurationError, GeometryError};
use crate::core::models::fragment::Fragment;
use nalgebra::Point3;
use tracing::{debug, warn};

/// Packs `n` copies of a compound into a box of the given edge lengths.
///
/// Copies are placed on the smallest cubic grid that holds `n` cells, one
/// copy per cell, centered by mass. The layout is fully deterministic: the
/// same inputs always yield the same packed fragment. The box spans
/// `[0, lengths]` on each axis; callers translate the result into place.
///
/// # Errors
///
/// Non-positive box lengths or a zero copy count are configuration errors;
/// a compound with no particles is a geometry error.
pub fn fill_box(
    compound: &Fragment,
    box_lengths: [f64; 3],
    n_compounds: usize,
) -> Result<Fragment, AssemblyError> {
    for (context, value) in [
        ("box length x", box_lengths[0]),
        ("box length y", box_lengths[1]),
        ("box length z", box_lengths[2]),
    ] {
        if value <= 0.0 {
            return Err(ConfigurationError::NonPositiveDimension { context, value }.into());
        }
    }
    if n_compounds == 0 {
        return Err(ConfigurationError::ZeroCount {
            context: "compound count",
        }
        .into());
    }
    let center_of_mass = compound
        .center_of_mass()
        .ok_or_else(|| GeometryError::EmptyFragment {
            name: compound.name().to_string(),
        })?;

    let cells_per_axis = (n_compounds as f64).cbrt().ceil() as usize;
    let cell = [
        box_lengths[0] / cells_per_axis as f64,
        box_lengths[1] / cells_per_axis as f64,
        box_lengths[2] / cells_per_axis as f64,
    ];
    if let Some(bounds) = compound.bounding_box() {
        let extents = bounds.lengths();
        if extents.iter().zip(&cell).any(|(e, c)| e > c) {
            warn!(
                compound = compound.name(),
                "packed compounds exceed their grid cells; expect close contacts"
            );
        }
    }

    let mut packed = Fragment::new("packed-box");
    let mut placed = 0;
    'fill: for k in 0..cells_per_axis {
        for j in 0..cells_per_axis {
            for i in 0..cells_per_axis {
                if placed == n_compounds {
                    break 'fill;
                }
                let target = Point3::new(
                    (i as f64 + 0.5) * cell[0],
                    (j as f64 + 0.5) * cell[1],
                    (k as f64 + 0.5) * cell[2],
                );
                let mut copy = compound.clone();
                copy.translate(target - center_of_mass);
                packed.merge(copy, compound.name());
                placed += 1;
            }
        }
    }

    debug!(placed, cells_per_axis, "filled box");
    Ok(packed)
}
