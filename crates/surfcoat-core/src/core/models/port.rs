use super::ids::ParticleId;
use nalgebra::{Point3, Unit, Vector3};
use thiserror::Error;

/// Errors arising from port-table operations on a fragment.
///
/// These are fatal: an assembly step that trips one of them is aborted and no
/// automatic repair is attempted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortError {
    #[error("Fragment '{fragment}' has no port labeled '{label}'")]
    Missing { fragment: String, label: String },

    #[error("Port '{label}' on fragment '{fragment}' has already been consumed by a join")]
    Consumed { fragment: String, label: String },

    #[error("Fragment '{fragment}' already has a port labeled '{label}'")]
    DuplicateLabel { fragment: String, label: String },

    #[error("Port '{label}' anchors to a particle that is not part of fragment '{fragment}'")]
    DanglingAnchor { fragment: String, label: String },
}

/// A labeled attachment site on a fragment.
///
/// A port anchors to one particle of its host fragment and defines an
/// orientation vector plus a separation distance along that vector. The point
/// `anchor + direction * separation` is the notional attachment plane: when two
/// ports are joined, their planes coincide and the two anchors end up separated
/// by the sum of both separations. A port is consumed exactly once, by the join
/// that uses it; consumed ports are retained in the port table so stale labels
/// are reported as [`PortError::Consumed`] rather than silently vanishing.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    label: String,
    anchor: ParticleId,
    orientation: Vector3<f64>,
    separation: f64,
    consumed: bool,
}

impl Port {
    /// Creates a new free port.
    ///
    /// # Arguments
    ///
    /// * `label` - The label under which the port is registered.
    /// * `anchor` - The particle the port is anchored to.
    /// * `orientation` - The outward direction of the attachment site.
    /// * `separation` - Distance from the anchor to the attachment plane, in nm.
    pub fn new(label: &str, anchor: ParticleId, orientation: Vector3<f64>, separation: f64) -> Self {
        Self {
            label: label.to_string(),
            anchor,
            orientation,
            separation,
            consumed: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn anchor(&self) -> ParticleId {
        self.anchor
    }

    pub fn orientation(&self) -> Vector3<f64> {
        self.orientation
    }

    pub fn separation(&self) -> f64 {
        self.separation
    }

    pub fn is_free(&self) -> bool {
        !self.consumed
    }

    /// Returns the normalized orientation, or `None` for a degenerate
    /// (zero-length) orientation vector.
    pub fn direction(&self) -> Option<Unit<Vector3<f64>>> {
        Unit::try_new(self.orientation, 1e-12)
    }

    /// The notional attachment point, given the anchor's current position.
    pub fn attachment_point(&self, anchor_position: &Point3<f64>) -> Option<Point3<f64>> {
        self.direction()
            .map(|dir| anchor_position + dir.into_inner() * self.separation)
    }

    pub(crate) fn consume(&mut self) {
        self.consumed = true;
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub(crate) fn set_anchor(&mut self, anchor: ParticleId) {
        self.anchor = anchor;
    }

    pub(crate) fn rotate(&mut self, rotation: &nalgebra::Rotation3<f64>) {
        self.orientation = rotation * self.orientation;
    }
}
