use crate::assembly::error::{AssemblyError, ConfigurationError, GeometryError};
use crate::assembly::pattern::{AllocateOptions, Allocation, ChainSpec, Pattern, allocate};
use crate::assembly::surface::Surface;
use crate::core::models::bbox::BoundingBox;
use crate::core::models::fragment::Fragment;
use crate::core::models::ids::ParticleId;
use crate::core::models::system::{Periodicity, SystemBox};
use crate::core::utils::geometry;
use crate::library::atoms;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::PI;
use tracing::{info, instrument, warn};

/// Default seed for monolayer randomness; override for production runs.
pub const DEFAULT_SEED: u64 = 12345;

/// Configuration for a [`Monolayer`] build.
#[derive(Debug, Clone)]
pub struct MonolayerConfig {
    pub surface: Surface,
    pub chains: Vec<Fragment>,
    pub n_chains: usize,
    /// Per-chain-type fractions. Defaults to an equal split.
    pub fractions: Option<Vec<f64>>,
    /// Fragment capping every port no chain claims.
    pub backfill: Fragment,
    pub tile_x: usize,
    pub tile_y: usize,
    pub rotate_chains: bool,
    pub seed: u64,
}

/// Builder for [`MonolayerConfig`].
#[derive(Debug, Clone, Default)]
pub struct MonolayerBuilder {
    surface: Option<Surface>,
    chains: Vec<Fragment>,
    n_chains: Option<usize>,
    fractions: Option<Vec<f64>>,
    backfill: Option<Fragment>,
    tile_x: Option<usize>,
    tile_y: Option<usize>,
    rotate_chains: Option<bool>,
    seed: Option<u64>,
}

impl MonolayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn chain(mut self, chain: Fragment) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn chains(mut self, chains: Vec<Fragment>) -> Self {
        self.chains = chains;
        self
    }

    pub fn n_chains(mut self, n_chains: usize) -> Self {
        self.n_chains = Some(n_chains);
        self
    }

    pub fn fractions(mut self, fractions: Vec<f64>) -> Self {
        self.fractions = Some(fractions);
        self
    }

    pub fn backfill(mut self, backfill: Fragment) -> Self {
        self.backfill = Some(backfill);
        self
    }

    pub fn tile(mut self, tile_x: usize, tile_y: usize) -> Self {
        self.tile_x = Some(tile_x);
        self.tile_y = Some(tile_y);
        self
    }

    pub fn rotate_chains(mut self, rotate_chains: bool) -> Self {
        self.rotate_chains = Some(rotate_chains);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<MonolayerConfig, AssemblyError> {
        Ok(MonolayerConfig {
            surface: self
                .surface
                .ok_or(ConfigurationError::MissingParameter("surface"))?,
            chains: self.chains,
            n_chains: self
                .n_chains
                .ok_or(ConfigurationError::MissingParameter("n_chains"))?,
            fractions: self.fractions,
            backfill: self.backfill.unwrap_or_else(atoms::hydrogen),
            tile_x: self.tile_x.unwrap_or(1),
            tile_y: self.tile_y.unwrap_or(1),
            rotate_chains: self.rotate_chains.unwrap_or(true),
            seed: self.seed.unwrap_or(DEFAULT_SEED),
        })
    }
}

/// A surface coated by a monolayer of chains.
///
/// The surface is tiled, a seeded random pattern claims `n_chains` attachment
/// sites, chain types split the sites by their fractions, and every unclaimed
/// port is capped by the backfill fragment. The enclosing box takes its
/// in-plane lengths from the tiled surface and its height from the full
/// coated system; periodicity is inherited from the surface.
#[derive(Debug, Clone)]
pub struct Monolayer {
    system: Fragment,
    surface_particles: Vec<ParticleId>,
    system_box: SystemBox,
    allocation: Allocation,
}

impl Monolayer {
    /// Assembles a monolayer from its configuration.
    #[instrument(skip_all, fields(n_chains = config.n_chains, seed = config.seed))]
    pub fn assemble(config: MonolayerConfig) -> Result<Self, AssemblyError> {
        if config.chains.is_empty() {
            return Err(ConfigurationError::EmptyChainList.into());
        }
        let fractions = match &config.fractions {
            Some(fractions) => {
                if fractions.len() != config.chains.len() {
                    return Err(ConfigurationError::FractionCount {
                        chains: config.chains.len(),
                        fractions: fractions.len(),
                    }
                    .into());
                }
                fractions.clone()
            }
            None => {
                if config.chains.len() == 1 {
                    warn!("no fractions provided; assuming a single chain type");
                }
                vec![1.0 / config.chains.len() as f64; config.chains.len()]
            }
        };

        let periodicity = config.surface.periodicity();
        let tiled = config.surface.tile(config.tile_x, config.tile_y)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut pattern = Pattern::random(config.n_chains, &mut rng);

        let mut system = Fragment::new("monolayer");
        let surface_report = system.merge(tiled.into_fragment(), "tiled-surface");
        let surface_particles = surface_report.particles;

        let specs: Vec<ChainSpec> = config
            .chains
            .iter()
            .zip(&fractions)
            .map(|(chain, &fraction)| ChainSpec::new(chain.clone(), fraction))
            .collect();
        let options = AllocateOptions {
            rotate_chains: config.rotate_chains,
            ..AllocateOptions::default()
        };
        let allocation = allocate(
            &mut system,
            &mut pattern,
            &specs,
            &config.backfill,
            &options,
            &mut rng,
        )?;

        let surface_bounds =
            system
                .bounds_of(&surface_particles)
                .ok_or_else(|| GeometryError::EmptyFragment {
                    name: "tiled-surface".to_string(),
                })?;
        let system_bounds = system
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: system.name().to_string(),
            })?;
        let system_box = SystemBox::new(
            [
                surface_bounds.lengths()[0],
                surface_bounds.lengths()[1],
                system_bounds.lengths()[2],
            ],
            periodicity,
        );

        info!(
            chains = allocation.placements.len(),
            backfilled = allocation.backfilled.len(),
            "assembled monolayer"
        );
        Ok(Self {
            system,
            surface_particles,
            system_box,
            allocation,
        })
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

    /// Bounding box of the tiled surface slab alone, excluding chains.
    pub fn tiled_surface_bounds(&self) -> Option<BoundingBox> {
        self.system.bounds_of(&self.surface_particles)
    }

    /// The site-assignment record of the coating.
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }
}

/// Options for stacking two monolayers face-to-face.
#[derive(Debug, Clone, Copy)]
pub struct DualMonolayerOptions {
    /// Vacuum gap between the bottom system's top and the flipped top system,
    /// in nm.
    pub separation: f64,
    /// Shift the top monolayer so the two surfaces' in-plane minima align.
    pub shift: bool,
}

impl Default for DualMonolayerOptions {
    fn default() -> Self {
        Self {
            separation: 0.8,
            shift: true,
        }
    }
}

/// Two monolayers stacked chains-inward with a controlled gap.
#[derive(Debug, Clone)]
pub struct DualMonolayer {
    system: Fragment,
    system_box: SystemBox,
    top_surface_bounds: BoundingBox,
    bottom_surface_bounds: BoundingBox,
    top_height: f64,
    bottom_height: f64,
}

impl DualMonolayer {
    /// Stacks `top` (flipped half a turn about y) above `bottom`.
    ///
    /// Periodicity flags are inherited from the bottom monolayer, unchanged by
    /// the top one.
    #[instrument(skip_all)]
    pub fn assemble(
        top: Monolayer,
        bottom: Monolayer,
        options: &DualMonolayerOptions,
    ) -> Result<Self, AssemblyError> {
        let periodicity = bottom.periodicity();
        let bottom_box = bottom.system_box();
        let top_box = top.system_box();

        let mut top_system = top.system;
        let flip = geometry::rotation_about_axis(&Vector3::y(), PI);
        top_system.spin(&flip);

        let bottom_height = bottom
            .system
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "bottom monolayer".to_string(),
            })?
            .lengths()[2];
        let top_height = top_system
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "top monolayer".to_string(),
            })?
            .lengths()[2];
        top_system.translate(Vector3::new(0.0, 0.0, bottom_height + options.separation));

        let bottom_surface_bounds = bottom
            .system
            .bounds_of(&bottom.surface_particles)
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "bottom tiled-surface".to_string(),
            })?;
        let mut top_surface_bounds = top_system
            .bounds_of(&top.surface_particles)
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: "top tiled-surface".to_string(),
            })?;

        if options.shift {
            let offset = Vector3::new(
                bottom_surface_bounds.min.x - top_surface_bounds.min.x,
                bottom_surface_bounds.min.y - top_surface_bounds.min.y,
                0.0,
            );
            top_system.translate(offset);
            top_surface_bounds = top_system
                .bounds_of(&top.surface_particles)
                .ok_or_else(|| GeometryError::EmptyFragment {
                    name: "top tiled-surface".to_string(),
                })?;
        }

        let mut system = Fragment::new("dual-monolayer");
        system.merge(top_system, "top-monolayer");
        system.merge(bottom.system, "bottom-monolayer");

        let system_bounds = system
            .bounding_box()
            .ok_or_else(|| GeometryError::EmptyFragment {
                name: system.name().to_string(),
            })?;
        let system_box = SystemBox::new(
            [
                top_box.lengths[0].max(bottom_box.lengths[0]),
                top_box.lengths[1].max(bottom_box.lengths[1]),
                system_bounds.lengths()[2],
            ],
            periodicity,
        );

        Ok(Self {
            system,
            system_box,
            top_surface_bounds,
            bottom_surface_bounds,
            top_height,
            bottom_height,
        })
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

    pub fn top_surface_bounds(&self) -> BoundingBox {
        self.top_surface_bounds
    }

    pub fn bottom_surface_bounds(&self) -> BoundingBox {
        self.bottom_surface_bounds
    }

    pub fn top_height(&self) -> f64 {
        self.top_height
    }

    pub fn bottom_height(&self) -> f64 {
        self.bottom_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::lattice::Lattice;
    use crate::assembly::surface::{DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION};
    use crate::core::models::particle::Particle;
    use crate::core::models::port::Port;
    use nalgebra::Point3;
    use std::collections::HashMap;

    fn test_surface(periodicity: Periodicity) -> Surface {
        let lattice = Lattice::cubic(0.5)
            .unwrap()
            .with_basis("Si", vec![[0.0, 0.0, 0.0]]);
        let mut compound = Fragment::new("Si");
        compound.add_particle(Particle::new("Si", Point3::origin()));
        let compounds = HashMap::from([("Si".to_string(), compound)]);
        let mut surface =
            Surface::build(&lattice, &compounds, 3, 3, 2, periodicity).unwrap();
        surface
            .expose_ports(DEFAULT_FACE_TOLERANCE, DEFAULT_PORT_SEPARATION)
            .unwrap();
        surface
    }

    fn chain_template() -> Fragment {
        let mut fragment = Fragment::new("chain");
        let mut previous = None;
        for i in 0..3 {
            let id = fragment.add_particle(Particle::new(
                "C",
                Point3::new(0.0, 0.0, i as f64 * 0.14),
            ));
            if let Some(prev) = previous {
                fragment
                    .add_bond(prev, id, crate::core::models::topology::BondOrder::Single)
                    .unwrap();
            }
            previous = Some(id);
        }
        let ids = fragment.particle_ids().to_vec();
        fragment
            .add_port(Port::new("down", ids[0], -Vector3::z(), 0.07))
            .unwrap();
        fragment
            .add_port(Port::new("up", ids[2], Vector3::z(), 0.07))
            .unwrap();
        fragment
    }

    fn monolayer(periodicity: Periodicity, seed: u64) -> Monolayer {
        let config = MonolayerBuilder::new()
            .surface(test_surface(periodicity))
            .chain(chain_template())
            .n_chains(5)
            .seed(seed)
            .build()
            .unwrap();
        Monolayer::assemble(config).unwrap()
    }

    #[test]
    fn monolayer_leaves_no_free_ports() {
        let monolayer = monolayer(Periodicity::in_plane(), 1);
        // Each chain keeps its own free "up" tip; surface ports are all used.
        assert_eq!(monolayer.system().free_port_count(), 5);
        let surface_ports_free = monolayer
            .system()
            .free_ports()
            .filter(|p| p.label().starts_with("attach"))
            .count();
        assert_eq!(surface_ports_free, 0);
    }

    #[test]
    fn monolayer_box_spans_surface_and_chains() {
        let monolayer = monolayer(Periodicity::in_plane(), 2);
        let surface_bounds = monolayer.tiled_surface_bounds().unwrap();
        let box_lengths = monolayer.system_box().lengths;

        assert_eq!(box_lengths[0], surface_bounds.lengths()[0]);
        assert_eq!(box_lengths[1], surface_bounds.lengths()[1]);
        // Height covers the surface plus the tallest chain.
        assert!(box_lengths[2] >= surface_bounds.lengths()[2]);
        assert!(box_lengths[2] >= 0.28); // chain span
    }

    #[test]
    fn monolayer_inherits_surface_periodicity() {
        let monolayer = monolayer(Periodicity::in_plane(), 3);
        assert_eq!(monolayer.periodicity(), Periodicity::in_plane());
    }

    #[test]
    fn monolayer_allocation_covers_requested_chains() {
        let monolayer = monolayer(Periodicity::in_plane(), 4);
        assert_eq!(monolayer.allocation().placements.len(), 5);
        // 9 surface ports, 5 chains, 4 backfills.
        assert_eq!(monolayer.allocation().backfilled.len(), 4);
    }

    #[test]
    fn monolayer_is_reproducible_for_a_fixed_seed() {
        let first = monolayer(Periodicity::in_plane(), 42);
        let second = monolayer(Periodicity::in_plane(), 42);
        assert_eq!(
            first.allocation().placements,
            second.allocation().placements
        );

        let positions = |m: &Monolayer| -> Vec<Point3<f64>> {
            m.system().particles().map(|(_, p)| p.position).collect()
        };
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn rejects_mismatched_fraction_count() {
        let config = MonolayerBuilder::new()
            .surface(test_surface(Periodicity::in_plane()))
            .chain(chain_template())
            .n_chains(4)
            .fractions(vec![0.5, 0.5])
            .build()
            .unwrap();
        let result = Monolayer::assemble(config);
        assert!(matches!(
            result,
            Err(AssemblyError::Configuration(ConfigurationError::FractionCount {
                chains: 1,
                fractions: 2,
            }))
        ));
    }

    #[test]
    fn builder_requires_surface_and_chain_count() {
        let result = MonolayerBuilder::new().chain(chain_template()).build();
        assert!(matches!(
            result,
            Err(AssemblyError::Configuration(
                ConfigurationError::MissingParameter("surface")
            ))
        ));
    }

    #[test]
    fn dual_monolayer_inherits_bottom_periodicity() {
        // Deliberately different periodicity on top: it must not leak through.
        let top = monolayer(Periodicity::bulk(), 5);
        let bottom = monolayer(Periodicity::in_plane(), 6);
        let dual =
            DualMonolayer::assemble(top, bottom, &DualMonolayerOptions::default()).unwrap();
        assert_eq!(dual.periodicity(), Periodicity::in_plane());
    }

    #[test]
    fn dual_monolayer_separates_and_aligns_slabs() {
        let top = monolayer(Periodicity::in_plane(), 7);
        let bottom = monolayer(Periodicity::in_plane(), 8);
        let bottom_height = bottom.system().bounding_box().unwrap().lengths()[2];

        let options = DualMonolayerOptions {
            separation: 1.0,
            shift: true,
        };
        let dual = DualMonolayer::assemble(top, bottom, &options).unwrap();

        // In-plane minima of the two surfaces line up.
        let top_bounds = dual.top_surface_bounds();
        let bottom_bounds = dual.bottom_surface_bounds();
        assert!((top_bounds.min.x - bottom_bounds.min.x).abs() < 1e-9);
        assert!((top_bounds.min.y - bottom_bounds.min.y).abs() < 1e-9);

        // The combined box is taller than both slabs plus the gap.
        let total = dual.system_box().lengths[2];
        assert!(total >= bottom_height + 1.0);
    }

    #[test]
    fn dual_monolayer_flips_top_surface_upward() {
        let top = monolayer(Periodicity::in_plane(), 9);
        let bottom = monolayer(Periodicity::in_plane(), 10);
        let dual =
            DualMonolayer::assemble(top, bottom, &DualMonolayerOptions::default()).unwrap();

        // After the flip, the top slab sits above its own chains: its surface
        // bounds top out at the system's upper edge.
        let system_bounds = dual.system().bounding_box().unwrap();
        assert!((dual.top_surface_bounds().max.z - system_bounds.max.z).abs() < 0.11);
    }
}
