use super::atoms::PORT_SEPARATION;
use crate::core::models::fragment::Fragment;
use crate::core::models::particle::Particle;
use crate::core::models::port::Port;
use crate::core::models::topology::BondOrder;
use nalgebra::{Point3, Vector3};

// Bond lengths in nm.
const CH_BOND: f64 = 0.109;
const SIH_BOND: f64 = 0.148;
const OH_BOND: f64 = 0.0957;

/// A methylene (CH2) backbone unit with `up`/`down` ports along ±y.
///
/// The workhorse monomer: an n-unit chain of these is an alkane backbone.
pub fn methylene() -> Fragment {
    let mut fragment = Fragment::new("methylene");
    let c = fragment.add_particle(Particle::new("C", Point3::origin()));
    // Hydrogens in the xz plane, perpendicular to the chain axis.
    let spread = (109.5f64 / 2.0).to_radians();
    let h1 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(CH_BOND * spread.sin(), 0.0, CH_BOND * spread.cos()),
    ));
    let h2 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(-CH_BOND * spread.sin(), 0.0, CH_BOND * spread.cos()),
    ));
    fragment.add_bond(c, h1, BondOrder::Single).unwrap();
    fragment.add_bond(c, h2, BondOrder::Single).unwrap();
    fragment
        .add_port(Port::new("up", c, Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
        .add_port(Port::new("down", c, -Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
}

/// A methyl (CH3) terminal group with a single `down` port.
pub fn methyl() -> Fragment {
    let mut fragment = Fragment::new("methyl");
    let c = fragment.add_particle(Particle::new("C", Point3::origin()));
    // Tetrahedral hydrogens around the +y hemisphere; the port takes -y.
    let polar = (180.0f64 - 109.5).to_radians();
    let axial = CH_BOND * polar.cos();
    let radial = CH_BOND * polar.sin();
    for i in 0..3 {
        let azimuth = (i as f64) * 120.0f64.to_radians();
        let h = fragment.add_particle(Particle::new(
            "H",
            Point3::new(radial * azimuth.cos(), axial, radial * azimuth.sin()),
        ));
        fragment.add_bond(c, h, BondOrder::Single).unwrap();
    }
    fragment
        .add_port(Port::new("down", c, -Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
}

/// A silane (SiH2) buffer with `up`/`down` ports along ±y.
///
/// The conventional surface-facing end of a grafted chain: its `down` port is
/// what binds to a surface attachment site.
pub fn silane() -> Fragment {
    let mut fragment = Fragment::new("silane");
    let si = fragment.add_particle(Particle::new("Si", Point3::origin()));
    let spread = (109.5f64 / 2.0).to_radians();
    let h1 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(SIH_BOND * spread.sin(), 0.0, SIH_BOND * spread.cos()),
    ));
    let h2 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(-SIH_BOND * spread.sin(), 0.0, SIH_BOND * spread.cos()),
    ));
    fragment.add_bond(si, h1, BondOrder::Single).unwrap();
    fragment.add_bond(si, h2, BondOrder::Single).unwrap();
    fragment
        .add_port(Port::new("up", si, Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
        .add_port(Port::new("down", si, -Vector3::y(), PORT_SEPARATION))
        .unwrap();
    fragment
}

/// A water molecule. No ports; it exists to be packed, not joined.
pub fn water() -> Fragment {
    let mut fragment = Fragment::new("water");
    let o = fragment.add_particle(Particle::new("O", Point3::origin()));
    let half_angle = (104.5f64 / 2.0).to_radians();
    let h1 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(OH_BOND * half_angle.sin(), OH_BOND * half_angle.cos(), 0.0),
    ));
    let h2 = fragment.add_particle(Particle::new(
        "H",
        Point3::new(-OH_BOND * half_angle.sin(), OH_BOND * half_angle.cos(), 0.0),
    ));
    fragment.add_bond(o, h1, BondOrder::Single).unwrap();
    fragment.add_bond(o, h2, BondOrder::Single).unwrap();
    fragment
}
