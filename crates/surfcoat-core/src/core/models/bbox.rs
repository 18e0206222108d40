use nalgebra::Point3;

/// An axis-aligned bounding box over a set of particle positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Computes the bounding box of a point set.
    ///
    /// # Return
    ///
    /// Returns `None` if the iterator yields no points.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BoundingBox {
            min: first,
            max: first,
        };
        for p in iter {
            for axis in 0..3 {
                bbox.min[axis] = bbox.min[axis].min(p[axis]);
                bbox.max[axis] = bbox.max[axis].max(p[axis]);
            }
        }
        Some(bbox)
    }

    /// The per-axis extents of the box.
    pub fn lengths(&self) -> [f64; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }

    /// The geometric center of the box.
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// The smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            min[axis] = min[axis].min(other.min[axis]);
            max[axis] = max[axis].max(other.max[axis]);
        }
        BoundingBox { min, max }
    }
}
