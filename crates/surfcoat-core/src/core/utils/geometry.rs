use nalgebra::{Rotation3, Unit, Vector3};

/// Computes the rotation mapping `from` onto `to`.
///
/// Unlike [`Rotation3::rotation_between`], this never returns `None` for
/// antiparallel inputs: in that degenerate case the rotation is a half-turn
/// about an arbitrary axis perpendicular to `from`.
pub fn rotation_to_align(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    match Rotation3::rotation_between(from, to) {
        Some(rotation) => rotation,
        None => {
            let axis = perpendicular_axis(from);
            Rotation3::from_axis_angle(&axis, std::f64::consts::PI)
        }
    }
}

/// Computes the rotation mapping `from` onto the direction opposite `to`.
///
/// This is the alignment needed to mate two ports face-to-face.
pub fn rotation_to_antiparallel(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    rotation_to_align(from, &-to)
}

/// A rotation by `angle_radians` about `axis`.
pub fn rotation_about_axis(axis: &Vector3<f64>, angle_radians: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_radians)
}

fn perpendicular_axis(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let candidate = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&candidate))
}
