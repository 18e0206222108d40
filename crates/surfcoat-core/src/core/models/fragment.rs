use super::bbox::BoundingBox;
use super::ids::ParticleId;
use super::particle::Particle;
use super::port::{Port, PortError};
use super::topology::{Bond, BondOrder};
use crate::core::utils::elements;
use nalgebra::{Point3, Rotation3, Vector3};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};

/// Outcome of merging one fragment into another.
///
/// Records how the guest's contents were renamed on the way in, so callers can
/// keep addressing the merged particles and ports.
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// The child label the guest was registered under (uniquified on collision).
    pub label: String,
    /// New particle IDs in the host, in the guest's particle order.
    pub particles: Vec<ParticleId>,
    /// `(guest label, host label)` pairs for every merged free port.
    pub ports: Vec<(String, String)>,
}

impl MergeReport {
    /// Looks up the host-side label a guest port was merged under.
    pub fn merged_port(&self, guest_label: &str) -> Option<&str> {
        self.ports
            .iter()
            .find(|(guest, _)| guest == guest_label)
            .map(|(_, host)| host.as_str())
    }
}

/// A named collection of particles, bonds, and attachment ports.
///
/// `Fragment` is the unit of composition for the whole library: monomers,
/// chains, surfaces, and fully assembled systems are all fragments. Particles
/// live in a slot-map arena and are addressed by stable [`ParticleId`]s; ports
/// reference their anchor particle by ID rather than holding a back-pointer to
/// their host. Iteration over particles and ports follows insertion order,
/// which makes every derived quantity reproducible.
///
/// Fragments are constructed fully formed and then only consumed: joined,
/// cloned, translated, or rotated. A fragment merged into a parent loses its
/// independent identity, surviving only as a labeled child span.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    name: String,
    particles: SlotMap<ParticleId, Particle>,
    order: Vec<ParticleId>,
    bonds: Vec<Bond>,
    ports: Vec<Port>,
    port_index: HashMap<String, usize>,
    children: Vec<(String, Vec<ParticleId>)>,
}

impl Fragment {
    /// Creates a new, empty fragment.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    // --- Particles ---

    /// Adds a particle and returns its stable ID.
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        let id = self.particles.insert(particle);
        self.order.push(id);
        id
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Returns all particle IDs in insertion order.
    pub fn particle_ids(&self) -> &[ParticleId] {
        &self.order
    }

    /// Returns an iterator over `(ParticleId, &Particle)` in insertion order.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.order.iter().map(|&id| (id, &self.particles[id]))
    }

    pub fn n_particles(&self) -> usize {
        self.order.len()
    }

    /// Returns the IDs of all particles with the given element symbol.
    pub fn particles_by_element(&self, element: &str) -> Vec<ParticleId> {
        self.particles()
            .filter(|(_, p)| p.element == element)
            .map(|(id, _)| id)
            .collect()
    }

    // --- Bonds ---

    /// Adds a bond between two particles.
    ///
    /// Idempotent; adding an existing bond succeeds without duplicating it.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if both particles exist, otherwise `None`.
    pub fn add_bond(
        &mut self,
        particle1_id: ParticleId,
        particle2_id: ParticleId,
        order: BondOrder,
    ) -> Option<()> {
        if !self.particles.contains_key(particle1_id) || !self.particles.contains_key(particle2_id)
        {
            return None;
        }
        let exists = self.bonds.iter().any(|b| {
            (b.particle1_id == particle1_id && b.particle2_id == particle2_id)
                || (b.particle1_id == particle2_id && b.particle2_id == particle1_id)
        });
        if !exists {
            self.bonds.push(Bond::new(particle1_id, particle2_id, order));
        }
        Some(())
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Creates single bonds between all particle pairs of the two elements
    /// whose distance falls within `(dmin, dmax]`.
    ///
    /// This is the distance-criterion bond generation used after populating a
    /// lattice, where connectivity is implied by geometry rather than declared.
    ///
    /// # Return
    ///
    /// The number of bonds added.
    pub fn generate_bonds(
        &mut self,
        element_a: &str,
        element_b: &str,
        dmin: f64,
        dmax: f64,
    ) -> usize {
        let ids = self.order.clone();
        let mut added = 0;
        for (i, &id_a) in ids.iter().enumerate() {
            for &id_b in &ids[i + 1..] {
                let (pa, pb) = (&self.particles[id_a], &self.particles[id_b]);
                let pair_matches = (pa.element == element_a && pb.element == element_b)
                    || (pa.element == element_b && pb.element == element_a);
                if !pair_matches {
                    continue;
                }
                let distance = (pa.position - pb.position).norm();
                if distance > dmin && distance <= dmax {
                    let before = self.bonds.len();
                    self.add_bond(id_a, id_b, BondOrder::Single);
                    if self.bonds.len() > before {
                        added += 1;
                    }
                }
            }
        }
        added
    }

    // --- Ports ---

    /// Registers a port on this fragment.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::DuplicateLabel`] if the label is taken and
    /// [`PortError::DanglingAnchor`] if the anchor particle does not belong to
    /// this fragment.
    pub fn add_port(&mut self, port: Port) -> Result<(), PortError> {
        if self.port_index.contains_key(port.label()) {
            return Err(PortError::DuplicateLabel {
                fragment: self.name.clone(),
                label: port.label().to_string(),
            });
        }
        if !self.particles.contains_key(port.anchor()) {
            return Err(PortError::DanglingAnchor {
                fragment: self.name.clone(),
                label: port.label().to_string(),
            });
        }
        self.port_index
            .insert(port.label().to_string(), self.ports.len());
        self.ports.push(port);
        Ok(())
    }

    pub fn port(&self, label: &str) -> Option<&Port> {
        self.port_index.get(label).map(|&i| &self.ports[i])
    }

    pub(crate) fn port_mut(&mut self, label: &str) -> Option<&mut Port> {
        let index = *self.port_index.get(label)?;
        Some(&mut self.ports[index])
    }

    /// The current position of a port's anchor particle.
    pub fn port_anchor_position(&self, label: &str) -> Option<Point3<f64>> {
        let port = self.port(label)?;
        self.particles.get(port.anchor()).map(|p| p.position)
    }

    /// All ports, free and consumed, in insertion order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// All free (not yet consumed) ports, in insertion order.
    pub fn free_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_free())
    }

    pub fn free_port_count(&self) -> usize {
        self.free_ports().count()
    }

    /// Relabels a port.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::Missing`] if `old` is unknown and
    /// [`PortError::DuplicateLabel`] if `new` is already taken.
    pub fn rename_port(&mut self, old: &str, new: &str) -> Result<(), PortError> {
        if old == new {
            return Ok(());
        }
        if self.port_index.contains_key(new) {
            return Err(PortError::DuplicateLabel {
                fragment: self.name.clone(),
                label: new.to_string(),
            });
        }
        let index = self
            .port_index
            .remove(old)
            .ok_or_else(|| PortError::Missing {
                fragment: self.name.clone(),
                label: old.to_string(),
            })?;
        self.ports[index].set_label(new);
        self.port_index.insert(new.to_string(), index);
        Ok(())
    }

    /// Removes a port from the table.
    pub fn remove_port(&mut self, label: &str) -> Option<Port> {
        let index = self.port_index.remove(label)?;
        let port = self.ports.remove(index);
        self.reindex_ports();
        Some(port)
    }

    /// Drops all consumed ports from the table.
    ///
    /// Join operations retain consumed ports so stale labels fail loudly;
    /// finished builders call this to leave a clean port table behind.
    pub fn prune_consumed_ports(&mut self) {
        self.ports.retain(|p| p.is_free());
        self.reindex_ports();
    }

    fn reindex_ports(&mut self) {
        self.port_index = self
            .ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.label().to_string(), i))
            .collect();
    }

    pub(crate) fn consume_port(&mut self, label: &str) {
        if let Some(port) = self.port_mut(label) {
            port.consume();
        }
    }

    /// Produces a port label not yet present in the table.
    pub(crate) fn unique_port_label(&self, base: &str) -> String {
        if !self.port_index.contains_key(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !self.port_index.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn unique_child_label(&self, base: &str) -> String {
        let taken: HashSet<&str> = self.children.iter().map(|(l, _)| l.as_str()).collect();
        if !taken.contains(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !taken.contains(candidate.as_str()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    // --- Rigid transforms ---

    /// Translates every particle by `offset`.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for id in &self.order {
            self.particles[*id].position += offset;
        }
    }

    /// Translates the fragment so its bounding-box minimum corner sits at the
    /// origin, returning the offset that was applied.
    pub fn translate_to_origin(&mut self) -> Vector3<f64> {
        let Some(bounds) = self.bounding_box() else {
            return Vector3::zeros();
        };
        let offset = -bounds.min.coords;
        self.translate(offset);
        offset
    }

    /// Rotates every particle and port orientation about the origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        self.rotate_about(rotation, &Point3::origin());
    }

    /// Rotates every particle and port orientation about an arbitrary point.
    pub fn rotate_about(&mut self, rotation: &Rotation3<f64>, about: &Point3<f64>) {
        for id in &self.order {
            let position = self.particles[*id].position;
            self.particles[*id].position = about + rotation * (position - about);
        }
        for port in &mut self.ports {
            port.rotate(rotation);
        }
    }

    /// Rotates the fragment about its geometric center.
    pub fn spin(&mut self, rotation: &Rotation3<f64>) {
        if let Some(center) = self.center() {
            self.rotate_about(rotation, &center);
        }
    }

    /// Rotates a subset of particles (and any ports anchored on them) about a
    /// point. Used to spin an attached chain about its anchor without touching
    /// the rest of the system.
    pub fn rotate_particles(
        &mut self,
        ids: &[ParticleId],
        rotation: &Rotation3<f64>,
        about: &Point3<f64>,
    ) {
        let member: HashSet<ParticleId> = ids.iter().copied().collect();
        for &id in ids {
            if let Some(particle) = self.particles.get_mut(id) {
                particle.position = about + rotation * (particle.position - about);
            }
        }
        for port in &mut self.ports {
            if member.contains(&port.anchor()) {
                port.rotate(rotation);
            }
        }
    }

    // --- Derived geometry ---

    /// The mean particle position.
    pub fn center(&self) -> Option<Point3<f64>> {
        if self.order.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.particles().map(|(_, p)| p.position.coords).sum();
        Some(Point3::from(sum / self.order.len() as f64))
    }

    /// The mass-weighted particle position. Elements without tabulated masses
    /// contribute unit weight.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        if self.order.is_empty() {
            return None;
        }
        let mut total_mass = 0.0;
        let mut weighted = Vector3::zeros();
        for (_, particle) in self.particles() {
            let mass = elements::atomic_mass(&particle.element).unwrap_or(1.0);
            total_mass += mass;
            weighted += particle.position.coords * mass;
        }
        Some(Point3::from(weighted / total_mass))
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.particles().map(|(_, p)| p.position))
    }

    /// The bounding box of a subset of particles, e.g. a labeled child span.
    pub fn bounds_of(&self, ids: &[ParticleId]) -> Option<BoundingBox> {
        BoundingBox::from_points(
            ids.iter()
                .filter_map(|id| self.particles.get(*id))
                .map(|p| p.position),
        )
    }

    // --- Composition ---

    /// Absorbs `guest` into this fragment under a child label.
    ///
    /// Guest particles are re-inserted with fresh IDs, bonds are remapped, and
    /// the guest's free ports are carried over with labels uniquified against
    /// this fragment's port table. Consumed guest ports are dropped. The
    /// guest's own child spans are flattened: only the top-level label
    /// survives, covering every absorbed particle.
    pub fn merge(&mut self, guest: Fragment, label: &str) -> MergeReport {
        let child_label = self.unique_child_label(label);
        let mut id_map: HashMap<ParticleId, ParticleId> = HashMap::new();
        let mut new_ids = Vec::with_capacity(guest.order.len());

        for &guest_id in &guest.order {
            let new_id = self.add_particle(guest.particles[guest_id].clone());
            id_map.insert(guest_id, new_id);
            new_ids.push(new_id);
        }

        for bond in &guest.bonds {
            self.add_bond(id_map[&bond.particle1_id], id_map[&bond.particle2_id], bond.order);
        }

        let mut merged_ports = Vec::new();
        for port in guest.ports.iter().filter(|p| p.is_free()) {
            let host_label = self.unique_port_label(port.label());
            let mut merged = port.clone();
            merged.set_anchor(id_map[&port.anchor()]);
            let guest_label = merged.label().to_string();
            merged.set_label(&host_label);
            self.port_index.insert(host_label.clone(), self.ports.len());
            self.ports.push(merged);
            merged_ports.push((guest_label, host_label));
        }

        self.children.push((child_label.clone(), new_ids.clone()));
        MergeReport {
            label: child_label,
            particles: new_ids,
            ports: merged_ports,
        }
    }

    /// The particle IDs recorded under a child label.
    pub fn child_particles(&self, label: &str) -> Option<&[ParticleId]> {
        self.children
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, ids)| ids.as_slice())
    }

    /// All child labels, in merge order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &[ParticleId])> {
        self.children
            .iter()
            .map(|(l, ids)| (l.as_str(), ids.as_slice()))
    }
}
