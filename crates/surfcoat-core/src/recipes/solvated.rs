use super::monolayer::{DualMonolayer, Monolayer};
use crate::assembly::error::{AssemblyError, ConfigurationError, GeometryError};
use crate::assembly::packing::fill_box;
use crate::core::models::fragment::Fragment;
use crate::core::models::system::{Periodicity, SystemBox};
use nalgebra::Vector3;
use tracing::instrument;

/// Options shared by the solvation recipes.
#[derive(Debug, Clone, Copy)]
pub struct SolvationOptions {
    /// Number of solvent copies packed into the slab.
    pub n_solvents: usize,
    /// Height of the solvent slab above a single monolayer, in nm. Ignored by
    /// the dual-monolayer recipe, which fills the inter-monolayer gap instead.
    pub solvent_box_height: f64,
}

impl Default for SolvationOptions {
    fn default() -> Self {
        Self {
            n_solvents: 1000,
            solvent_box_height: 5.0,
        }
    }
}

/// A monolayer with a packed solvent slab resting on its top face.
#[derive(Debug, Clone)]
pub struct SolvatedMonolayer {
    system: Fragment,
    system_box: SystemBox,
}

impl SolvatedMonolayer {
    /// Packs `solvent` into a box matching the monolayer's surface footprint
    /// and `options.solvent_box_height`, seated flush on the monolayer's top.
    #[instrument(skip_all, fields(n_solvents = options.n_solvents))]
    pub fn assemble(
        monolayer: Monolayer,
        solvent: &Fragment,
        options: &SolvationOptions,
    ) -> Result<Self, AssemblyError> {
        let surface_bounds =
            monolayer
                .tiled_surface_bounds()
                .ok_or_else(|| GeometryError::EmptyFragment {
                    name: "tiled-surface".to_string(),
                })?;
        let monolayer_box = monolayer.system_box();
        let periodicity = monolayer.periodicity();

        let solvent_box = [
            surface_bounds.lengths()[0],
            surface_bounds.lengths()[1],
            options.solvent_box_height,
        ];
        let mut packed = fill_box(solvent, solvent_box, options.n_solvents)?;
        packed.translate(Vector3::new(
            surface_bounds.min.x,
            surface_bounds.min.y,
            monolayer_box.lengths[2],
        ));

        let mut system = Fragment::new("solvated-monolayer");
        system.merge(monolayer.into_system(), "monolayer");
        system.merge(packed, "solvent");

        let system_box = SystemBox::new(
            [
                monolayer_box.lengths[0],
                monolayer_box.lengths[1],
                monolayer_box.lengths[2] + options.solvent_box_height,
            ],
            periodicity,
        );
        Ok(Self { system, system_box })
    }

    pub fn system(&self) -> &Fragment {
        &self.system
    }

    pub fn into_system(self) -> Fragment {
        self.system
    }

    pub fn system_box(&self) -> SystemBox {
        self.system_box
    }

    pub fn periodicity(&self) -> Periodicity {
        self.system_box.periodicity
    }
}

/// A dual-monolayer system whose inter-monolayer gap is filled with solvent.
#[derive(Debug, Clone)]
pub struct SolvatedDualMonolayer {
    system: Fragment,
    system_box: SystemBox,
}

impl SolvatedDualMonolayer {
    /// Packs `options.n_solvents` copies of `solvent` into the gap between the
    /// two monolayers; the gap height is derived from the assembled dual
    /// system, not configured.
    #[instrument(skip_all, fields(n_solvents = options.n_solvents))]
    pub fn assemble(
        dual: DualMonolayer,
        solvent: &Fragment,
        options: &SolvationOptions,
    ) -> Result<Self, AssemblyError> {
        let periodicity = dual.periodicity();
        let top_surface = dual.top_surface_bounds();
        let bottom_surface = dual.bottom_surface_bounds();
        let total_height = dual
            .system()
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "dual-monolayer".to_string(),
            })?
            .lengths()[2];

        let gap = total_height - (dual.top_height() + dual.bottom_height());
        if gap <= 0.0 {
            return Err(ConfigurationError::NonPositiveDimension {
                context: "inter-monolayer gap",
                value: gap,
            }
            .into());
        }

        let solvent_box = [
            bottom_surface.lengths()[0],
            bottom_surface.lengths()[1],
            gap,
        ];
        let bottom_height = dual.bottom_height();
        let mut packed = fill_box(solvent, solvent_box, options.n_solvents)?;
        packed.translate(Vector3::new(
            bottom_surface.min.x,
            bottom_surface.min.y,
            bottom_height,
        ));

        let mut system = Fragment::new("solvated-dual-monolayer");
        system.merge(dual.into_system(), "monolayers");
        system.merge(packed, "solvents");

        let system_bounds = system
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "solvated-dual-monolayer".to_string(),
            })?;
        let system_box = SystemBox::new(
            [
                top_surface.lengths()[0].max(bottom_surface.lengths()[0]),
                top_surface.lengths()[1].max(bottom_surface.lengths()[1]),
                system_bounds.lengths()[2],
            ],
            periodicity,
        );
        Ok(Self { system, system_box })
    }

    pub fn system(&self) -> &Fragment {
        &self.system
    }

    pub fn into_system(self) -> Fragment {
        self.system
    }

    pub fn system_box(&self) -> SystemBox {
        self.system_box
    }

    pub fn periodicity(&self) -> Periodicity {
        self.system_box.periodicity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::lattice::Lattice;
    use crate::assembly::surface::{
        DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION, Surface,
    };
    use crate::core::models::particle::Particle;
    use crate::core::models::port::Port;
    use crate::library::moieties;
    use crate::recipes::monolayer::{DualMonolayerOptions, MonolayerBuilder};
    use nalgebra::Point3;
    use std::collections::HashMap;

    fn test_monolayer(seed: u64) -> Monolayer {
        let lattice = Lattice::cubic(0.5)
            .unwrap()
            .with_basis("Si", vec![[0.0, 0.0, 0.0]]);
        let mut compound = Fragment::new("Si");
        compound.add_particle(Particle::new("Si", Point3::origin()));
        let compounds = HashMap::from([("Si".to_string(), compound)]);
        let mut surface = Surface::build(
            &lattice,
            &compounds,
            3,
            3,
            2,
            Periodicity::in_plane(),
        )
        .unwrap();
        surface
            .expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)
            .unwrap();

        let mut chain = Fragment::new("chain");
        let a = chain.add_particle(Particle::new("C", Point3::origin()));
        let b = chain.add_particle(Particle::new("C", Point3::new(0.0, 0.0, 0.14)));
        chain
            .add_bond(a, b, crate::core::models::topology::BondOrder::Single)
            .unwrap();
        chain
            .add_port(Port::new("down", a, -Vector3::z(), 0.07))
            .unwrap();
        chain.add_port(Port::new("up", b, Vector3::z(), 0.07)).unwrap();

        let config = MonolayerBuilder::new()
            .surface(surface)
            .chain(chain)
            .n_chains(5)
            .seed(seed)
            .build()
            .unwrap();
        Monolayer::assemble(config).unwrap()
    }

    fn small_solvation() -> SolvationOptions {
        SolvationOptions {
            n_solvents: 8,
            solvent_box_height: 1.0,
        }
    }

    #[test]
    fn solvated_monolayer_box_grows_by_solvent_height() {
        let monolayer = test_monolayer(1);
        let monolayer_height = monolayer.system_box().lengths[2];

        let solvated =
            SolvatedMonolayer::assemble(monolayer, &moieties::water(), &small_solvation())
                .unwrap();

        let lengths = solvated.system_box().lengths;
        assert!((lengths[2] - (monolayer_height + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn solvated_monolayer_places_solvent_above_coating() {
        let monolayer = test_monolayer(2);
        let monolayer_height = monolayer.system_box().lengths[2];

        let solvated =
            SolvatedMonolayer::assemble(monolayer, &moieties::water(), &small_solvation())
                .unwrap();

        let solvent_ids = solvated.system().child_particles("solvent").unwrap();
        let solvent_bounds = solvated.system().bounds_of(solvent_ids).unwrap();
        assert!(solvent_bounds.min.z >= monolayer_height - 1e-9);
    }

    #[test]
    fn solvated_monolayer_inherits_periodicity() {
        let monolayer = test_monolayer(3);
        let solvated =
            SolvatedMonolayer::assemble(monolayer, &moieties::water(), &small_solvation())
                .unwrap();
        assert_eq!(solvated.periodicity(), Periodicity::in_plane());
    }

    #[test]
    fn solvated_dual_monolayer_fills_the_gap() {
        let dual = DualMonolayer::assemble(
            test_monolayer(4),
            test_monolayer(5),
            &DualMonolayerOptions {
                separation: 1.2,
                shift: true,
            },
        )
        .unwrap();
        let bottom_height = dual.bottom_height();
        let top_of_gap = dual.system().bounding_box().unwrap().lengths()[2]
            - dual.top_height();

        let solvated = SolvatedDualMonolayer::assemble(
            dual,
            &moieties::water(),
            &SolvationOptions {
                n_solvents: 8,
                solvent_box_height: 0.0,
            },
        )
        .unwrap();

        let solvent_ids = solvated.system().child_particles("solvents").unwrap();
        let solvent_bounds = solvated.system().bounds_of(solvent_ids).unwrap();
        assert!(solvent_bounds.min.z >= bottom_height - 1e-9);
        assert!(solvent_bounds.max.z <= top_of_gap + 1e-9);
    }

    #[test]
    fn solvated_dual_monolayer_inherits_bottom_periodicity() {
        let dual = DualMonolayer::assemble(
            test_monolayer(6),
            test_monolayer(7),
            &DualMonolayerOptions::default(),
        )
        .unwrap();
        let solvated = SolvatedDualMonolayer::assemble(
            dual,
            &moieties::water(),
            &SolvationOptions {
                n_solvents: 4,
                solvent_box_height: 0.0,
            },
        )
        .unwrap();
        assert_eq!(solvated.periodicity(), Periodicity::in_plane());
    }
}
