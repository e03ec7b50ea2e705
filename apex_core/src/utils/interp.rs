// apex_core/src/utils/interp.rs

use num_traits::Float;

/// Piecewise-linear interpolation over a set of (x, y) sample points.
///
/// Points are kept sorted by x as they are added. Evaluation clamps to the
/// first/last sample outside the covered range, so the curve never
/// extrapolates.
#[derive(Debug, Clone)]
pub struct LinearInterp<T: Float> {
    points: Vec<(T, T)>,
}

impl<T: Float> Default for LinearInterp<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T: Float> LinearInterp<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sample, keeping the point list sorted by x.
    pub fn add_point(&mut self, x: T, y: T) {
        let idx = self
            .points
            .iter()
            .position(|&(px, _)| px > x)
            .unwrap_or(self.points.len());
        self.points.insert(idx, (x, y));
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<(T, T)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(T, T)> {
        self.points.last().copied()
    }

    /// Evaluates the curve at `x`. An empty curve evaluates to zero.
    pub fn interpolate(&self, x: T) -> T {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return T::zero(),
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        // The upper bracket exists because x < last.0 here.
        let hi = self
            .points
            .iter()
            .position(|&(px, _)| px >= x)
            .unwrap_or(self.points.len() - 1);
        let (x1, y1) = self.points[hi - 1];
        let (x2, y2) = self.points[hi];
        let span = x2 - x1;
        if span <= T::zero() {
            return y1;
        }
        let t = (x - x1) / span;
        y1 + (y2 - y1) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolates_between_samples() {
        let mut interp = LinearInterp::new();
        interp.add_point(0.0, 0.0);
        interp.add_point(10.0, 100.0);
        assert_relative_eq!(interp.interpolate(5.0), 50.0);
        assert_relative_eq!(interp.interpolate(2.5), 25.0);
    }

    #[test]
    fn clamps_outside_range() {
        let mut interp = LinearInterp::new();
        interp.add_point(1.0, 3.0);
        interp.add_point(2.0, 7.0);
        assert_relative_eq!(interp.interpolate(0.0), 3.0);
        assert_relative_eq!(interp.interpolate(5.0), 7.0);
    }

    #[test]
    fn keeps_points_sorted_regardless_of_insertion_order() {
        let mut interp = LinearInterp::new();
        interp.add_point(10.0, 1.0);
        interp.add_point(0.0, 0.0);
        interp.add_point(5.0, 10.0);
        assert_relative_eq!(interp.interpolate(2.5), 5.0);
        assert_relative_eq!(interp.interpolate(7.5), 5.5);
    }

    #[test]
    fn empty_curve_is_zero() {
        let interp: LinearInterp<f64> = LinearInterp::new();
        assert_eq!(interp.interpolate(42.0), 0.0);
    }
}
