use crate::core::models::fragment::Fragment;
use crate::core::models::particle::Particle;
use crate::core::models::port::Port;
use crate::core::models::topology::BondOrder;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// A fragment definition as stored on disk (TOML).
///
/// Particles are listed first and referenced by zero-based index from bonds
/// and ports, mirroring the load-then-register-ports lifecycle: geometry comes
/// from the file, attachment sites are declared against it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FragmentTemplate {
    pub name: String,
    #[serde(default)]
    pub particles: Vec<ParticleTemplate>,
    #[serde(default)]
    pub bonds: Vec<BondTemplate>,
    #[serde(default)]
    pub ports: Vec<PortTemplate>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ParticleTemplate {
    pub element: String,
    pub name: Option<String>,
    pub position: [f64; 3],
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BondTemplate {
    pub particles: [usize; 2],
    pub order: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PortTemplate {
    pub label: String,
    pub anchor: usize,
    pub orientation: [f64; 3],
    pub separation: f64,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid fragment template '{path}': {message}")]
    Invalid { path: String, message: String },
}

/// Loads a fragment from a TOML template file.
///
/// # Errors
///
/// Returns [`TemplateError::Io`] / [`TemplateError::Toml`] for unreadable or
/// malformed files, and [`TemplateError::Invalid`] for templates that parse
/// but violate the fragment invariants (out-of-range particle indices,
/// duplicate port labels, zero-length port orientations).
pub fn load_fragment(path: &Path) -> Result<Fragment, TemplateError> {
    let display_path = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
        path: display_path.clone(),
        source: e,
    })?;
    let template: FragmentTemplate =
        toml::from_str(&content).map_err(|e| TemplateError::Toml {
            path: display_path.clone(),
            source: e,
        })?;
    realize(&template).map_err(|message| TemplateError::Invalid {
        path: display_path,
        message,
    })
}

/// Builds a [`Fragment`] from an in-memory template.
pub fn realize(template: &FragmentTemplate) -> Result<Fragment, String> {
    let mut fragment = Fragment::new(&template.name);
    let mut ids = Vec::with_capacity(template.particles.len());

    for particle in &template.particles {
        let position = Point3::from(particle.position);
        let realized = match &particle.name {
            Some(name) => Particle::named(&particle.element, name, position),
            None => Particle::new(&particle.element, position),
        };
        ids.push(fragment.add_particle(realized));
    }

    for (i, bond) in template.bonds.iter().enumerate() {
        let [a, b] = bond.particles;
        if a >= ids.len() || b >= ids.len() {
            return Err(format!("bond {i} references particle out of range"));
        }
        let order = match &bond.order {
            Some(text) => text
                .parse::<BondOrder>()
                .map_err(|_| format!("bond {i} has unknown order '{text}'"))?,
            None => BondOrder::default(),
        };
        fragment.add_bond(ids[a], ids[b], order);
    }

    for port in &template.ports {
        if port.anchor >= ids.len() {
            return Err(format!(
                "port '{}' anchors to particle {} which is out of range",
                port.label, port.anchor
            ));
        }
        let orientation = Vector3::from(port.orientation);
        if orientation.norm() < 1e-12 {
            return Err(format!(
                "port '{}' has a zero-length orientation vector",
                port.label
            ));
        }
        fragment
            .add_port(Port::new(
                &port.label,
                ids[port.anchor],
                orientation,
                port.separation,
            ))
            .map_err(|e| e.to_string())?;
    }

    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const METHANE: &str = r#"
name = "methane"

[[particles]]
element = "C"
position = [0.0, 0.0, 0.0]

[[particles]]
element = "H"
position = [0.0, 0.109, 0.0]

[[bonds]]
particles = [0, 1]
order = "single"

[[ports]]
label = "down"
anchor = 0
orientation = [0.0, -1.0, 0.0]
separation = 0.07
"#;

    fn write_template(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn loads_fragment_successfully_from_valid_file() {
        let file = write_template(METHANE);

        let fragment = load_fragment(file.path()).unwrap();

        assert_eq!(fragment.name(), "methane");
        assert_eq!(fragment.n_particles(), 2);
        assert_eq!(fragment.bonds().len(), 1);
        assert_eq!(fragment.free_port_count(), 1);
        let port = fragment.port("down").unwrap();
        assert_eq!(port.separation(), 0.07);
    }

    #[test]
    fn returns_io_error_for_nonexistent_file() {
        let result = load_fragment(Path::new("nonexistent_fragment.toml"));
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }

    #[test]
    fn returns_toml_error_for_malformed_file() {
        let file = write_template("this is not valid toml");
        let result = load_fragment(file.path());
        assert!(matches!(result, Err(TemplateError::Toml { .. })));
    }

    #[test]
    fn rejects_bond_with_out_of_range_particle() {
        let content = r#"
name = "broken"

[[particles]]
element = "C"
position = [0.0, 0.0, 0.0]

[[bonds]]
particles = [0, 5]
"#;
        let file = write_template(content);
        let result = load_fragment(file.path());
        assert!(matches!(result, Err(TemplateError::Invalid { .. })));
    }

    #[test]
    fn rejects_port_with_zero_orientation() {
        let content = r#"
name = "broken"

[[particles]]
element = "C"
position = [0.0, 0.0, 0.0]

[[ports]]
label = "up"
anchor = 0
orientation = [0.0, 0.0, 0.0]
separation = 0.07
"#;
        let file = write_template(content);
        let result = load_fragment(file.path());
        assert!(matches!(result, Err(TemplateError::Invalid { .. })));
    }

    #[test]
    fn rejects_duplicate_port_labels() {
        let content = r#"
name = "broken"

[[particles]]
element = "C"
position = [0.0, 0.0, 0.0]

[[ports]]
label = "up"
anchor = 0
orientation = [0.0, 1.0, 0.0]
separation = 0.07

[[ports]]
label = "up"
anchor = 0
orientation = [0.0, -1.0, 0.0]
separation = 0.07
"#;
        let file = write_template(content);
        let result = load_fragment(file.path());
        assert!(matches!(result, Err(TemplateError::Invalid { .. })));
    }
}
