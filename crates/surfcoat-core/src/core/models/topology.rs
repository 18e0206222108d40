use super::ids::ParticleId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl Default for BondOrder {
    fn default() -> Self {
        BondOrder::Single
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub particle1_id: ParticleId, // ID of the first particle
    pub particle2_id: ParticleId, // ID of the second particle
    pub order: BondOrder,         // Bond order (e.g., single, double, etc.)
}

impl Bond {
    pub fn new(particle1_id: ParticleId, particle2_id: ParticleId, order: BondOrder) -> Self {
        Self {
            particle1_id,
            particle2_id,
            order,
        }
    }

    pub fn contains(&self, particle_id: ParticleId) -> bool {
        self.particle1_id == particle_id || self.particle2_id == particle_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_particle_id(n: u64) -> ParticleId {
        ParticleId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("S".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("2".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("3".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("ar".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("0".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_display_outputs_expected_strings() {
        assert_eq!(BondOrder::Single.to_string(), "Single");
        assert_eq!(BondOrder::Aromatic.to_string(), "Aromatic");
    }

    #[test]
    fn bond_order_default_is_single() {
        assert_eq!(BondOrder::default(), BondOrder::Single);
    }

    #[test]
    fn bond_new_initializes_fields_correctly() {
        let p1 = dummy_particle_id(1);
        let p2 = dummy_particle_id(2);
        let bond = Bond::new(p1, p2, BondOrder::Double);
        assert_eq!(bond.particle1_id, p1);
        assert_eq!(bond.particle2_id, p2);
        assert_eq!(bond.order, BondOrder::Double);
    }

    #[test]
    fn bond_contains_returns_true_only_for_member_particles() {
        let p1 = dummy_particle_id(10);
        let p2 = dummy_particle_id(20);
        let unrelated = dummy_particle_id(30);
        let bond = Bond::new(p1, p2, BondOrder::Single);
        assert!(bond.contains(p1));
        assert!(bond.contains(p2));
        assert!(!bond.contains(unrelated));
    }
}
