use serde::{Deserialize, Serialize};

use crate::slope::slope_from_points;
use crate::SlopeError;

/// A profile vertex in meters: `x` horizontal position, `z` elevation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, z): (f64, f64)) -> Self {
        Self { x, z }
    }
}

/// Slope between two consecutive profile points. Always derived from the
/// points at read time, never stored.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub slope_percent: f64,
    pub angle_degrees: f64,
}

impl Segment {
    pub fn between(start: Point, end: Point) -> Self {
        let (slope_percent, angle_degrees) = slope_from_points(&start, &end);
        Self {
            start,
            end,
            slope_percent,
            angle_degrees,
        }
    }

    pub fn rise(&self) -> f64 {
        self.end.z - self.start.z
    }

    pub fn run(&self) -> f64 {
        self.end.x - self.start.x
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileTotals {
    pub distance: f64,
    pub rise: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SlopeStats {
    pub min_percent: f64,
    pub max_percent: f64,
    /// Index of the segment with the largest absolute grade.
    pub steepest_segment: usize,
}

/// Ordered terrain profile. Point order defines traversal order.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub points: Vec<Point>,
}

impl Profile {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Two-point profile `[(0, h1), (distance, h2)]`.
    pub fn from_endpoints(distance: f64, h1: f64, h2: f64) -> Self {
        Self {
            points: vec![Point::new(0.0, h1), Point::new(distance, h2)],
        }
    }

    /// Build a profile from `(x, z)` pairs, keeping their order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SlopeError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let points: Vec<Point> = pairs.into_iter().map(Point::from).collect();
        if points.is_empty() {
            return Err(SlopeError::EmptyProfile);
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, point: Point) -> Result<(), SlopeError> {
        if index > self.points.len() {
            return Err(SlopeError::PointIndex {
                index,
                len: self.points.len(),
            });
        }
        self.points.insert(index, point);
        Ok(())
    }

    pub fn replace(&mut self, index: usize, point: Point) -> Result<Point, SlopeError> {
        let len = self.points.len();
        let slot = self
            .points
            .get_mut(index)
            .ok_or(SlopeError::PointIndex { index, len })?;
        Ok(std::mem::replace(slot, point))
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.points
            .windows(2)
            .map(|w| Segment::between(w[0], w[1]))
            .collect()
    }

    /// Sum of per-segment horizontal magnitudes, so back-tracking x still adds distance.
    pub fn total_distance(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1].x - w[0].x).abs()).sum()
    }

    /// Net elevation change from the first to the last point.
    pub fn total_rise(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() >= 2 => last.z - first.z,
            _ => 0.0,
        }
    }

    pub fn totals(&self) -> ProfileTotals {
        ProfileTotals {
            distance: self.total_distance(),
            rise: self.total_rise(),
        }
    }

    pub fn slope_stats(&self) -> Option<SlopeStats> {
        let segments = self.segments();
        let first = segments.first()?;
        let mut stats = SlopeStats {
            min_percent: first.slope_percent,
            max_percent: first.slope_percent,
            steepest_segment: 0,
        };
        let mut steepest = first.slope_percent.abs();
        for (idx, segment) in segments.iter().enumerate().skip(1) {
            let p = segment.slope_percent;
            stats.min_percent = stats.min_percent.min(p);
            stats.max_percent = stats.max_percent.max(p);
            if p.abs() > steepest {
                steepest = p.abs();
                stats.steepest_segment = idx;
            }
        }
        Some(stats)
    }

    /// `(x, z)` pairs in order, as stored in project documents.
    pub fn pairs(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.x, p.z]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Profile {
        Profile::from_pairs([(0.0, 10.0), (50.0, 10.0), (100.0, 18.0)]).unwrap()
    }

    #[test]
    fn totals_and_segments() {
        let profile = sample();
        assert_eq!(profile.total_distance(), 100.0);
        assert_eq!(profile.total_rise(), 8.0);
        let segments = profile.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].slope_percent, 0.0);
        assert_relative_eq!(segments[1].slope_percent, 16.0);
        assert_relative_eq!(segments[1].angle_degrees, (0.16f64).atan().to_degrees());
        assert_eq!(segments[1].rise(), 8.0);
        assert_eq!(segments[1].run(), 50.0);
    }

    #[test]
    fn short_profiles_have_no_segments() {
        let empty = Profile::default();
        assert!(empty.segments().is_empty());
        assert_eq!(empty.totals(), ProfileTotals::default());

        let single = Profile::new(vec![Point::new(3.0, 7.0)]);
        assert!(single.segments().is_empty());
        assert_eq!(single.total_distance(), 0.0);
        assert_eq!(single.total_rise(), 0.0);
        assert!(single.slope_stats().is_none());
    }

    #[test]
    fn non_monotonic_x_accumulates_distance() {
        let profile = Profile::from_pairs([(0.0, 0.0), (10.0, 1.0), (4.0, 3.0)]).unwrap();
        assert_eq!(profile.total_distance(), 16.0);
        assert_eq!(profile.total_rise(), 3.0);
    }

    #[test]
    fn vertical_segment_resolves_to_sentinels() {
        let profile = Profile::from_pairs([(5.0, 0.0), (5.0, 2.0)]).unwrap();
        let seg = profile.segments()[0];
        assert_eq!(seg.slope_percent, f64::INFINITY);
        assert_eq!(seg.angle_degrees, 90.0);
    }

    #[test]
    fn from_pairs_rejects_empty() {
        let err = Profile::from_pairs(Vec::<(f64, f64)>::new()).unwrap_err();
        assert!(matches!(err, SlopeError::EmptyProfile));
    }

    #[test]
    fn from_endpoints_builds_two_points() {
        let profile = Profile::from_endpoints(100.0, 10.0, 18.0);
        assert_eq!(profile.points, vec![Point::new(0.0, 10.0), Point::new(100.0, 18.0)]);
    }

    #[test]
    fn mutation_recomputes_segments() {
        let mut profile = sample();
        profile.replace(2, Point::new(100.0, 10.0)).unwrap();
        assert_eq!(profile.segments()[1].slope_percent, 0.0);

        profile.insert(1, Point::new(25.0, 15.0)).unwrap();
        assert_eq!(profile.len(), 4);
        assert_relative_eq!(profile.segments()[0].slope_percent, 20.0);

        profile.push(Point::new(110.0, 12.0));
        assert_eq!(profile.total_rise(), 2.0);

        assert!(matches!(
            profile.replace(9, Point::default()),
            Err(SlopeError::PointIndex { index: 9, len: 5 })
        ));
        assert!(profile.insert(6, Point::default()).is_err());
    }

    #[test]
    fn stats_track_steepest_segment() {
        let profile =
            Profile::from_pairs([(0.0, 0.0), (10.0, 1.0), (20.0, -2.0), (30.0, -1.0)]).unwrap();
        let stats = profile.slope_stats().unwrap();
        assert_relative_eq!(stats.min_percent, -30.0);
        assert_relative_eq!(stats.max_percent, 10.0);
        assert_eq!(stats.steepest_segment, 1);
    }
}
