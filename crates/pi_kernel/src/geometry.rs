//! Sample points and circle classification.

/// A sampled point in the bounding square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance from the origin.
    #[inline]
    pub fn distance_from_origin(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Returns `true` if the point lies inside or on the circle of `radius`
    /// centred at the origin.
    #[inline]
    pub fn is_inside(&self, radius: f64) -> bool {
        self.distance_from_origin() <= radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_inside() {
        assert!(Point::new(0.0, 0.0).is_inside(1.0));
    }

    #[test]
    fn test_boundary_point_is_inside() {
        assert!(Point::new(1.0, 0.0).is_inside(1.0));
        assert!(Point::new(0.0, -2.0).is_inside(2.0));
        assert!(Point::new(3.0, 4.0).is_inside(5.0));
    }

    #[test]
    fn test_corner_is_outside() {
        assert!(!Point::new(1.0, 1.0).is_inside(1.0));
        assert!(!Point::new(-50.0, 50.0).is_inside(50.5));
    }

    #[test]
    fn test_distance_does_not_overflow() {
        let p = Point::new(1e300, 1e300);
        assert!(p.distance_from_origin().is_finite());
    }
}
