//! Slope conversions between rise/run, percent grade, angle and ratio.
//! Every function is total: singular inputs resolve to signed infinity or a
//! fixed +/-90 degree angle so a live form always has something to render.

use crate::profile::Point;

pub fn rise_run(distance: f64, h1: f64, h2: f64) -> (f64, f64) {
    (h2 - h1, distance)
}

/// Percent grade; a zero run yields infinity carrying the sign of `rise`.
pub fn percent_from_rise_run(rise: f64, run: f64) -> f64 {
    if run == 0.0 {
        return f64::INFINITY.copysign(rise);
    }
    (rise / run) * 100.0
}

/// Angle in degrees. A zero run is vertical: +90 for a positive rise, -90 otherwise
/// (including the degenerate 0/0 case).
pub fn angle_from_rise_run(rise: f64, run: f64) -> f64 {
    if run == 0.0 {
        return if rise > 0.0 { 90.0 } else { -90.0 };
    }
    (rise / run).atan().to_degrees()
}

/// Run-over-rise ratio; flat slopes have an infinite ratio.
pub fn ratio_from_rise_run(rise: f64, run: f64) -> f64 {
    if rise == 0.0 {
        return f64::INFINITY;
    }
    (run / rise).abs()
}

pub fn percent_from_angle(angle_deg: f64) -> f64 {
    angle_deg.to_radians().tan() * 100.0
}

pub fn angle_from_percent(percent: f64) -> f64 {
    (percent / 100.0).atan().to_degrees()
}

pub fn ratio_from_percent(percent: f64) -> f64 {
    if percent == 0.0 {
        return f64::INFINITY;
    }
    100.0 / percent.abs()
}

pub fn percent_from_ratio(ratio: f64) -> f64 {
    if ratio == 0.0 {
        return f64::INFINITY.copysign(ratio);
    }
    100.0 / ratio
}

pub fn rise_from_percent_and_run(percent: f64, run: f64) -> f64 {
    (percent / 100.0) * run
}

pub fn rise_from_angle_and_run(angle_deg: f64, run: f64) -> f64 {
    angle_deg.to_radians().tan() * run
}

pub fn run_from_rise_and_percent(rise: f64, percent: f64) -> f64 {
    if percent == 0.0 {
        return f64::INFINITY;
    }
    rise * 100.0 / percent
}

/// Percent grade and angle of the line from `start` to `end`.
pub fn slope_from_points(start: &Point, end: &Point) -> (f64, f64) {
    let rise = end.z - start.z;
    let run = end.x - start.x;
    (
        percent_from_rise_run(rise, run),
        angle_from_rise_run(rise, run),
    )
}

/// Renders a run-over-rise ratio as `1:<ratio>`.
pub fn display_ratio(ratio: f64) -> String {
    if ratio.is_infinite() {
        return "1:∞".to_string();
    }
    format!("1:{:.1}", ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rise_run_from_heights() {
        assert_eq!(rise_run(100.0, 10.0, 18.0), (8.0, 100.0));
        assert_eq!(rise_run(40.0, 5.0, 1.0), (-4.0, 40.0));
    }

    #[test]
    fn percent_matches_rise_over_run() {
        for &(rise, run) in &[(8.0, 100.0), (-3.5, 20.0), (1.0, -4.0), (0.0, 7.0)] {
            assert_eq!(percent_from_rise_run(rise, run), (rise / run) * 100.0);
            assert_relative_eq!(
                angle_from_percent(percent_from_rise_run(rise, run)),
                angle_from_rise_run(rise, run),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn zero_run_is_signed_infinity() {
        assert_eq!(percent_from_rise_run(2.0, 0.0), f64::INFINITY);
        assert_eq!(percent_from_rise_run(-2.0, 0.0), f64::NEG_INFINITY);
        assert_eq!(percent_from_rise_run(0.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn zero_run_angle_is_vertical() {
        assert_eq!(angle_from_rise_run(1.0, 0.0), 90.0);
        assert_eq!(angle_from_rise_run(-1.0, 0.0), -90.0);
        assert_eq!(angle_from_rise_run(0.0, 0.0), -90.0);
    }

    #[test]
    fn flat_ratio_is_infinite() {
        assert_eq!(ratio_from_rise_run(0.0, 10.0), f64::INFINITY);
        assert_eq!(ratio_from_rise_run(-2.0, 10.0), 5.0);
        assert_eq!(ratio_from_percent(0.0), f64::INFINITY);
        assert_eq!(ratio_from_percent(-8.0), 12.5);
    }

    #[test]
    fn ratio_percent_roundtrip() {
        for &r in &[0.25, 1.0, 12.5, 333.0, 1e6] {
            assert_relative_eq!(ratio_from_percent(percent_from_ratio(r)), r, max_relative = 1e-12);
        }
        assert_eq!(percent_from_ratio(0.0), f64::INFINITY);
        assert_eq!(percent_from_ratio(-0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn angle_percent_conversions() {
        assert_relative_eq!(percent_from_angle(45.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(angle_from_percent(100.0), 45.0, epsilon = 1e-12);
        assert_relative_eq!(angle_from_percent(8.0), 4.573921259, epsilon = 1e-6);
    }

    #[test]
    fn rise_and_run_helpers() {
        assert_relative_eq!(rise_from_percent_and_run(8.0, 100.0), 8.0);
        assert_relative_eq!(rise_from_angle_and_run(45.0, 10.0), 10.0, epsilon = 1e-9);
        assert_relative_eq!(run_from_rise_and_percent(8.0, 8.0), 100.0);
        assert_eq!(run_from_rise_and_percent(8.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn slope_between_points() {
        let (percent, angle) = slope_from_points(&Point::new(50.0, 10.0), &Point::new(100.0, 18.0));
        assert_relative_eq!(percent, 16.0);
        assert_relative_eq!(angle, (0.16f64).atan().to_degrees());
    }

    #[test]
    fn ratio_display() {
        assert_eq!(display_ratio(f64::INFINITY), "1:∞");
        assert_eq!(display_ratio(12.5), "1:12.5");
        assert_eq!(display_ratio(3.0), "1:3.0");
    }
}
