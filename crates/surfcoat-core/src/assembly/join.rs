use super::error::{AssemblyError, GeometryError};
use crate::core::models::fragment::Fragment;
use crate::core::models::ids::ParticleId;
use crate::core::models::port::PortError;
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry;
use nalgebra::{Point3, Unit, Vector3};
use tracing::trace;

/// Minimum admissible anchor-to-anchor distance after a join, in nm.
///
/// Two ports whose separations cancel out would fuse their anchors into a
/// single point, which has no valid bond distance.
pub const DEFAULT_BOND_TOLERANCE: f64 = 1e-3;

/// Tunable parameters for a single join operation.
#[derive(Debug, Clone, Copy)]
pub struct JoinOptions {
    /// The order of the bond appended between the two anchors.
    pub bond_order: BondOrder,
    /// Minimum admissible fused anchor separation, in nm.
    pub tolerance: f64,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            bond_order: BondOrder::Single,
            tolerance: DEFAULT_BOND_TOLERANCE,
        }
    }
}

/// Outcome of a successful join.
#[derive(Debug, Clone)]
pub struct JoinReport {
    /// The child label the guest was absorbed under.
    pub child_label: String,
    /// The host-side anchor of the new bond.
    pub host_anchor: ParticleId,
    /// The guest-side anchor of the new bond (its ID in the host).
    pub guest_anchor: ParticleId,
    /// New IDs of all absorbed guest particles, in guest order.
    pub particles: Vec<ParticleId>,
    /// `(guest label, host label)` pairs for the guest's surviving free ports.
    pub ports: Vec<(String, String)>,
}

impl JoinReport {
    /// Looks up the host-side label a guest port was merged under.
    pub fn merged_port(&self, guest_label: &str) -> Option<&str> {
        self.ports
            .iter()
            .find(|(guest, _)| guest == guest_label)
            .map(|(_, host)| host.as_str())
    }
}

/// Joins `guest` onto `host` by mating the two named ports, with default
/// options. See [`join_with`].
pub fn join(
    host: &mut Fragment,
    host_port: &str,
    guest: Fragment,
    guest_port: &str,
) -> Result<JoinReport, AssemblyError> {
    join_with(host, host_port, guest, guest_port, &JoinOptions::default())
}

/// Joins `guest` onto `host` by mating the two named ports.
///
/// The guest is rigidly transformed so its port orientation becomes
/// antiparallel to the host port's and its anchor lands at
/// `host_anchor + host_direction * (host_separation + guest_separation)`,
/// i.e. the two attachment planes coincide. A bond is appended between the
/// anchors, both ports are consumed, and the guest's remaining free ports are
/// merged into the host's port table (labels uniquified on collision).
///
/// The guest is consumed; it survives only as a labeled child of the host.
///
/// # Errors
///
/// * [`PortError::Missing`] / [`PortError::Consumed`] if either port is
///   unknown or already used.
/// * [`GeometryError::ZeroOrientation`] for a degenerate port orientation.
/// * [`GeometryError::DisjointAnchors`] if the fused anchor separation falls
///   below `options.tolerance`.
pub fn join_with(
    host: &mut Fragment,
    host_port: &str,
    mut guest: Fragment,
    guest_port: &str,
    options: &JoinOptions,
) -> Result<JoinReport, AssemblyError> {
    let (host_anchor, host_direction, host_separation) =
        port_frame(host, host_port)?;
    let (guest_anchor, guest_direction, guest_separation) =
        port_frame(&guest, guest_port)?;

    let fused_separation = host_separation + guest_separation;
    if fused_separation.abs() <= options.tolerance {
        return Err(GeometryError::DisjointAnchors {
            separation: fused_separation,
            tolerance: options.tolerance,
        }
        .into());
    }

    let host_anchor_position = anchor_position(host, host_port, host_anchor)?;
    let guest_anchor_position = anchor_position(&guest, guest_port, guest_anchor)?;

    // Rotate the guest about its own anchor so the two ports face each other,
    // then drop its anchor onto the fused-separation point.
    let rotation =
        geometry::rotation_to_antiparallel(&guest_direction.into_inner(), &host_direction.into_inner());
    guest.rotate_about(&rotation, &guest_anchor_position);
    let target = host_anchor_position + host_direction.into_inner() * fused_separation;
    guest.translate(target - guest_anchor_position);

    host.consume_port(host_port);
    guest.consume_port(guest_port);

    let anchor_index = guest
        .particle_ids()
        .iter()
        .position(|&id| id == guest_anchor)
        .ok_or_else(|| PortError::DanglingAnchor {
            fragment: guest.name().to_string(),
            label: guest_port.to_string(),
        })?;

    let child_label = guest.name().to_string();
    let merge = host.merge(guest, &child_label);
    let guest_anchor_in_host = merge.particles[anchor_index];
    host.add_bond(host_anchor, guest_anchor_in_host, options.bond_order);

    trace!(
        host_port,
        guest_port,
        child = merge.label.as_str(),
        "joined fragments"
    );

    Ok(JoinReport {
        child_label: merge.label,
        host_anchor,
        guest_anchor: guest_anchor_in_host,
        particles: merge.particles,
        ports: merge.ports,
    })
}

fn port_frame(
    fragment: &Fragment,
    label: &str,
) -> Result<(ParticleId, Unit<Vector3<f64>>, f64), AssemblyError> {
    let port = fragment.port(label).ok_or_else(|| PortError::Missing {
        fragment: fragment.name().to_string(),
        label: label.to_string(),
    })?;
    if !port.is_free() {
        return Err(PortError::Consumed {
            fragment: fragment.name().to_string(),
            label: label.to_string(),
        }
        .into());
    }
    let direction = port.direction().ok_or_else(|| GeometryError::ZeroOrientation {
        label: label.to_string(),
    })?;
    Ok((port.anchor(), direction, port.separation()))
}

fn anchor_position(
    fragment: &Fragment,
    label: &str,
    anchor: ParticleId,
) -> Result<Point3<f64>, AssemblyError> {
    fragment
        .particle(anchor)
        .map(|p| p.position)
        .ok_or_else(|| {
            PortError::DanglingAnchor {
                fragment: fragment.name().to_string(),
                label: label.to_string(),
            }
            .into()
        })
}
