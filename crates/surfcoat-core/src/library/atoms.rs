use crate::core::models::fragment::Fragment;
use crate::core::models::particle::Particle;
use crate::core::models::port::Port;
use nalgebra::{Point3, Vector3};

/// Standard port separation used across the stock library, in nm. Two stock
/// ports meet at a fused anchor distance of twice this value.
pub const PORT_SEPARATION: f64 = 0.07;

/// A single hydrogen with one `up` port.
///
/// The default backfill: capping a leftover surface port or an open chain
/// terminus costs exactly one of these.
pub fn hydrogen() -> Fragment {
    let mut fragment = Fragment::new("hydrogen");
    let anchor = fragment.add_particle(Particle::new("H", Point3::origin()));
    fragment
        .add_port(Port::new("up", anchor, Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
}
