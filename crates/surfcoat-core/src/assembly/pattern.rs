use super::error::{AssemblyError, ConfigurationError};
use super::join::join;
use crate::core::models::fragment::Fragment;
use crate::core::utils::geometry;
use nalgebra::{Point2, Vector3};
use rand::Rng;
use rand::seq::index::sample;
use std::f64::consts::TAU;
use tracing::{info, instrument};

/// Tolerance for validating that chain fractions sum to one.
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// An ordered set of candidate attachment sites in the unit square.
///
/// Points are claimed (removed) as the allocator maps them onto surface
/// ports, so a pattern is good for one allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    points: Vec<Point2<f64>>,
}

impl Pattern {
    /// `n` points drawn uniformly at random from the unit square.
    pub fn random(n: usize, rng: &mut impl Rng) -> Self {
        let points = (0..n)
            .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect();
        Self { points }
    }

    /// An `nx x ny` grid of evenly spaced points.
    pub fn grid(nx: usize, ny: usize) -> Self {
        let mut points = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                points.push(Point2::new(
                    (i as f64 + 0.5) / nx as f64,
                    (j as f64 + 0.5) / ny as f64,
                ));
            }
        }
        Self { points }
    }

    pub fn from_points(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn drain(&mut self) -> Vec<Point2<f64>> {
        std::mem::take(&mut self.points)
    }
}

/// One chain type competing for surface ports.
#[derive(Debug, Clone)]
pub struct ChainSpec {
    /// The chain fragment cloned once per claimed port; it attaches through
    /// its `down` port (see [`AllocateOptions::via_port`]).
    pub template: Fragment,
    /// Target fraction of the claimed sites this chain type receives.
    pub fraction: f64,
}

impl ChainSpec {
    pub fn new(template: Fragment, fraction: f64) -> Self {
        Self { template, fraction }
    }
}

/// Knobs for [`allocate`].
#[derive(Debug, Clone)]
pub struct AllocateOptions {
    /// Port on the chain template that mates with a surface port.
    pub via_port: String,
    /// Port on the backfill fragment that mates with a leftover surface port.
    pub backfill_port: String,
    /// Spin each placed chain by a uniform random angle about the surface
    /// normal through its anchor, breaking steric registry across the lattice.
    pub rotate_chains: bool,
    /// The surface normal used for chain spinning.
    pub normal: Vector3<f64>,
}

impl Default for AllocateOptions {
    fn default() -> Self {
        Self {
            via_port: "down".to_string(),
            backfill_port: "up".to_string(),
            rotate_chains: true,
            normal: Vector3::z(),
        }
    }
}

/// One chain placed by the allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPlacement {
    /// Index into the spec list of the chain type placed here.
    pub spec_index: usize,
    /// The surface port the chain was joined to.
    pub port_label: String,
    /// The spin angle applied about the surface normal, if any.
    pub spin_angle: Option<f64>,
    /// The child label the chain was absorbed under.
    pub child_label: String,
}

/// The full, reproducible record of an allocation.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub placements: Vec<ChainPlacement>,
    pub backfilled: Vec<String>,
}

impl Allocation {
    /// Chains placed per spec index.
    pub fn counts_per_spec(&self, n_specs: usize) -> Vec<usize> {
        let mut counts = vec![0; n_specs];
        for placement in &self.placements {
            counts[placement.spec_index] += 1;
        }
        counts
    }
}

/// Partitions a host's free ports among chain types and fills the rest.
///
/// The pattern's points are scaled onto the host's in-plane footprint and each
/// claims its nearest free port; those claimed ports form the chain pool. For
/// every spec but the last, `round(fraction x pool)` ports are drawn uniformly
/// without replacement and one clone of that spec's template is joined to
/// each. The last spec absorbs every pool port still unclaimed (rounding slack
/// included). Ports outside the pool, present when the pattern holds fewer
/// points than the surface has ports, receive the backfill fragment, so the
/// host ends with zero free ports. With a single spec no partition happens:
/// the whole pool goes to it and its fraction is not validated.
///
/// Reproducibility contract: identical RNG seed and identical host port
/// ordering reproduce bit-identical site assignments and spin angles. All
/// randomness flows through `rng`; nothing else is consulted.
#[instrument(skip_all, fields(sites = pattern.len(), specs = specs.len()))]
pub fn allocate(
    host: &mut Fragment,
    pattern: &mut Pattern,
    specs: &[ChainSpec],
    backfill: &Fragment,
    options: &AllocateOptions,
    rng: &mut impl Rng,
) -> Result<Allocation, AssemblyError> {
    validate_specs(specs)?;

    let site_labels: Vec<String> = host
        .free_ports()
        .map(|port| port.label().to_string())
        .collect();
    if pattern.len() > site_labels.len() {
        return Err(ConfigurationError::InsufficientPorts {
            requested: pattern.len(),
            available: site_labels.len(),
        }
        .into());
    }

    // Phase 1: map pattern points onto their nearest free ports.
    let pool = claim_sites(host, pattern, &site_labels);

    // Phase 2: draw the per-spec partition of the pool.
    let pool_size = pool.len();
    let mut remaining = pool;
    let mut assignments: Vec<(usize, String)> = Vec::with_capacity(pool_size);
    for (spec_index, spec) in specs.iter().enumerate() {
        if spec_index + 1 == specs.len() {
            // Rounding slack and leftovers all land on the final chain type.
            assignments.extend(remaining.drain(..).map(|label| (spec_index, label)));
        } else {
            let requested = (spec.fraction * pool_size as f64).round() as usize;
            let count = requested.min(remaining.len());
            let mut chosen = sample(rng, remaining.len(), count).into_vec();
            chosen.sort_unstable();
            for &index in chosen.iter().rev() {
                assignments.push((spec_index, remaining.remove(index)));
            }
        }
        info!(
            spec_index,
            placed = assignments.iter().filter(|(s, _)| *s == spec_index).count(),
            "assigned chain sites"
        );
    }

    // Phase 3: grow chains, then spin each about the surface normal.
    let mut allocation = Allocation::default();
    for (spec_index, port_label) in assignments {
        let template = specs[spec_index].template.clone();
        let report = join(host, &port_label, template, &options.via_port)?;
        let spin_angle = if options.rotate_chains {
            let angle = rng.gen_range(0.0..TAU);
            let anchor = host
                .particle(report.guest_anchor)
                .map(|p| p.position)
                .unwrap_or_else(nalgebra::Point3::origin);
            let rotation = geometry::rotation_about_axis(&options.normal, angle);
            host.rotate_particles(&report.particles, &rotation, &anchor);
            Some(angle)
        } else {
            None
        };
        allocation.placements.push(ChainPlacement {
            spec_index,
            port_label,
            spin_angle,
            child_label: report.child_label,
        });
    }

    // Phase 4: cap every port the pool never claimed.
    for label in site_labels {
        let still_free = host.port(&label).map(|p| p.is_free()).unwrap_or(false);
        if still_free {
            join(host, &label, backfill.clone(), &options.backfill_port)?;
            allocation.backfilled.push(label);
        }
    }

    info!(
        chains = allocation.placements.len(),
        backfilled = allocation.backfilled.len(),
        "allocation complete"
    );
    Ok(allocation)
}

fn validate_specs(specs: &[ChainSpec]) -> Result<(), AssemblyError> {
    if specs.is_empty() {
        return Err(ConfigurationError::EmptyChainList.into());
    }
    if specs.len() == 1 {
        return Ok(());
    }
    for (index, spec) in specs.iter().enumerate() {
        if !(0.0..=1.0).contains(&spec.fraction) {
            return Err(ConfigurationError::FractionRange {
                index,
                value: spec.fraction,
            }
            .into());
        }
    }
    let sum: f64 = specs.iter().map(|s| s.fraction).sum();
    if (sum - 1.0).abs() > FRACTION_TOLERANCE {
        return Err(ConfigurationError::FractionSum { sum }.into());
    }
    Ok(())
}

/// Scales the pattern onto the host footprint and claims, for each point in
/// pattern order, the nearest not-yet-claimed free port.
fn claim_sites(host: &Fragment, pattern: &mut Pattern, site_labels: &[String]) -> Vec<String> {
    let bounds = host.bounding_box();
    let (origin, lengths) = match bounds {
        Some(b) => (b.min, b.lengths()),
        None => (nalgebra::Point3::origin(), [0.0; 3]),
    };

    let mut sites: Vec<(String, Point2<f64>)> = site_labels
        .iter()
        .filter_map(|label| {
            host.port_anchor_position(label)
                .map(|p| (label.clone(), Point2::new(p.x, p.y)))
        })
        .collect();

    let mut pool = Vec::new();
    for point in pattern.drain() {
        let target = Point2::new(
            origin.x + point.x * lengths[0],
            origin.y + point.y * lengths[1],
        );
        let nearest = sites
            .iter()
            .enumerate()
            .min_by(|(_, (_, a)), (_, (_, b))| {
                (a - target)
                    .norm_squared()
                    .partial_cmp(&(b - target).norm_squared())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(index, _)| index);
        if let Some(index) = nearest {
            pool.push(sites.remove(index).0);
        }
    }
    pool
}
