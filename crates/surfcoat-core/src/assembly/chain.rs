use super::error::{AssemblyError, ConfigurationError};
use super::join::{JoinReport, join};
use crate::core::models::fragment::Fragment;
use crate::core::models::port::PortError;
use crate::core::utils::geometry;
use std::f64::consts::TAU;
use tracing::debug;

/// Builds a linear chain of monomer fragments joined up-port to down-port.
///
/// Monomer templates must expose free `up` and `down` ports. The built chain
/// exposes exactly `up` and `down` ports at its termini, unless an end is
/// capped by a head or tail group with no ports of its own to spare, in which
/// case that terminus is closed.
///
/// An optional `sequence` string selects the monomer type per unit (`'A'` is
/// the first template, `'B'` the second, and so on); the sequence is repeated
/// `repeat` times, mirroring common copolymer notation like `"AABCB"`.
#[derive(Debug, Clone)]
pub struct ChainBuilder {
    name: String,
    monomers: Vec<Fragment>,
    repeat: usize,
    sequence: Option<String>,
    head: Option<(Fragment, String)>,
    tail: Option<(Fragment, String)>,
    twist: bool,
}

impl ChainBuilder {
    /// Starts a builder for a homopolymer of one monomer template.
    pub fn new(monomer: Fragment) -> Self {
        Self::with_monomers(vec![monomer])
    }

    /// Starts a builder over an ordered list of monomer templates.
    pub fn with_monomers(monomers: Vec<Fragment>) -> Self {
        Self {
            name: "chain".to_string(),
            monomers,
            repeat: 1,
            sequence: None,
            head: None,
            tail: None,
            twist: false,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of sequence repetitions (total units = repeat x sequence length).
    pub fn repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    /// Per-unit monomer selector, e.g. `"AABCB"`.
    pub fn sequence(mut self, sequence: &str) -> Self {
        self.sequence = Some(sequence.to_string());
        self
    }

    /// Attaches `group` to the chain's top (`up`) terminus, joining through the
    /// group's `via` port.
    pub fn head(mut self, group: Fragment, via: &str) -> Self {
        self.head = Some((group, via.to_string()));
        self
    }

    /// Attaches `group` to the chain's bottom (`down`) terminus, joining
    /// through the group's `via` port.
    pub fn tail(mut self, group: Fragment, via: &str) -> Self {
        self.tail = Some((group, via.to_string()));
        self
    }

    /// Pre-rotates unit `i` by `2*pi*i/n` about the chain axis before joining.
    /// A steric staggering aid; off by default.
    pub fn twist(mut self, twist: bool) -> Self {
        self.twist = twist;
        self
    }

    /// Builds the chain.
    pub fn build(self) -> Result<Fragment, AssemblyError> {
        let units = self.unit_indices()?;
        for monomer in &self.monomers {
            for label in ["up", "down"] {
                if monomer.port(label).is_none() {
                    return Err(PortError::Missing {
                        fragment: monomer.name().to_string(),
                        label: label.to_string(),
                    }
                    .into());
                }
            }
        }

        debug!(name = self.name.as_str(), units = units.len(), "building chain");

        let total = units.len();
        let mut chain: Option<Fragment> = None;
        let mut top_label = "up".to_string();

        for (i, &monomer_index) in units.iter().enumerate() {
            let mut unit = self.monomers[monomer_index].clone();
            if self.twist && total > 1 {
                let angle = TAU * i as f64 / total as f64;
                let axis = unit.port("up").map(|p| p.orientation());
                let anchor = unit.port_anchor_position("down");
                if let (Some(axis), Some(anchor)) = (axis, anchor) {
                    let rotation = geometry::rotation_about_axis(&axis, angle);
                    unit.rotate_about(&rotation, &anchor);
                }
            }
            chain = Some(match chain {
                None => unit,
                Some(mut grown) => {
                    let report = join(&mut grown, &top_label, unit, "down")?;
                    top_label = merged_label(&report, "up")?;
                    grown
                }
            });
        }

        let mut chain = chain.ok_or(ConfigurationError::ZeroCount {
            context: "chain length",
        })?;

        let mut bottom_label = "down".to_string();
        if let Some((group, via)) = self.head {
            let report = join(&mut chain, &top_label, group, &via)?;
            top_label = match report.ports.first() {
                Some((_, host_label)) => host_label.clone(),
                None => String::new(), // capped: nothing left to expose up top
            };
        }
        if let Some((group, via)) = self.tail {
            let report = join(&mut chain, &bottom_label, group, &via)?;
            bottom_label = match report.ports.first() {
                Some((_, host_label)) => host_label.clone(),
                None => String::new(),
            };
        }

        chain.prune_consumed_ports();
        if !top_label.is_empty() && top_label != "up" {
            chain.rename_port(&top_label, "up")?;
        }
        if !bottom_label.is_empty() && bottom_label != "down" {
            chain.rename_port(&bottom_label, "down")?;
        }
        chain.set_name(&self.name);
        Ok(chain)
    }

    fn unit_indices(&self) -> Result<Vec<usize>, AssemblyError> {
        if self.monomers.is_empty() {
            return Err(ConfigurationError::EmptyMonomerList.into());
        }
        if self.repeat == 0 {
            return Err(ConfigurationError::ZeroCount {
                context: "repeat count",
            }
            .into());
        }
        let sequence = self.sequence.as_deref().unwrap_or("A");
        let mut period = Vec::with_capacity(sequence.len());
        for symbol in sequence.chars() {
            let index = (symbol as usize).wrapping_sub('A' as usize);
            if index >= self.monomers.len() {
                return Err(ConfigurationError::SequenceSymbol {
                    symbol,
                    monomers: self.monomers.len(),
                }
                .into());
            }
            period.push(index);
        }
        if period.is_empty() {
            return Err(ConfigurationError::ZeroCount {
                context: "sequence length",
            }
            .into());
        }
        Ok(period.repeat(self.repeat))
    }
}

fn merged_label(report: &JoinReport, guest_label: &str) -> Result<String, AssemblyError> {
    report
        .merged_port(guest_label)
        .map(|s| s.to_string())
        .ok_or_else(|| {
            PortError::Missing {
                fragment: report.child_label.clone(),
                label: guest_label.to_string(),
            }
            .into()
        })
}

/// Decorates a backbone monomer with side chains and terminal groups.
///
/// For every `side{i}` port on the backbone, one clone of `side_chain` is
/// joined through its `side` port, and one clone of `terminal_group` is joined
/// through its `terminal` port onto the side chain's `terminal` port. The
/// backbone's `up`/`down` ports are left untouched, so the result is usable as
/// a chain-builder monomer.
///
/// # Errors
///
/// A backbone without `side0`, or a side chain without a matching `terminal`
/// port for the terminal group, is a fatal [`PortError::Missing`].
pub fn functionalized_monomer(
    mut backbone: Fragment,
    side_chain: &Fragment,
    terminal_group: &Fragment,
) -> Result<Fragment, AssemblyError> {
    let side_labels: Vec<String> = (0..)
        .map(|i| format!("side{i}"))
        .take_while(|label| backbone.port(label).is_some())
        .collect();
    if side_labels.is_empty() {
        return Err(PortError::Missing {
            fragment: backbone.name().to_string(),
            label: "side0".to_string(),
        }
        .into());
    }

    for side_label in side_labels {
        let report = join(&mut backbone, &side_label, side_chain.clone(), "side")?;
        let terminal_label = merged_label(&report, "terminal")?;
        join(
            &mut backbone,
            &terminal_label,
            terminal_group.clone(),
            "terminal",
        )?;
    }
    Ok(backbone)
}
