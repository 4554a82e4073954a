//! Evenly spaced waypoint sampling along a route geometry.

use crate::model::{RouteGeometry, WaypointSample};

/// Number of samples taken when the configuration does not say otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 6;

/// Pick up to `count` evenly spaced points along `geometry`.
///
/// With `step = len / count`, the samples sit at indices `step, 2*step, ...`
/// strictly below `len`, at most `count` of them. A zero `count`, or a
/// geometry with fewer than `count` points, yields no samples.
pub fn sample(geometry: &RouteGeometry, count: usize) -> Vec<WaypointSample> {
    sample_indices(geometry.len(), count)
}

fn sample_indices(len: usize, count: usize) -> Vec<WaypointSample> {
    if count == 0 {
        return Vec::new();
    }
    let step = len / count;
    if step == 0 {
        return Vec::new();
    }

    (step..len)
        .step_by(step)
        .take(count)
        .map(|index| WaypointSample {
            sequence_index: index,
            fraction_along_route: index as f64 / len as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn indices(len: usize, count: usize) -> Vec<usize> {
        sample_indices(len, count)
            .into_iter()
            .map(|s| s.sequence_index)
            .collect()
    }

    #[rstest]
    #[case(120, 6, vec![20, 40, 60, 80, 100])]
    #[case(6, 6, vec![1, 2, 3, 4, 5])]
    #[case(13, 6, vec![2, 4, 6, 8, 10, 12])]
    #[case(100, 3, vec![33, 66, 99])]
    #[case(11, 6, vec![1, 2, 3, 4, 5, 6])]
    #[case(19, 10, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10])]
    #[case(7, 4, vec![1, 2, 3, 4])]
    #[case(5, 6, vec![])]
    #[case(0, 6, vec![])]
    #[case(50, 0, vec![])]
    fn sampled_indices(#[case] len: usize, #[case] count: usize, #[case] expected: Vec<usize>) {
        assert_eq!(indices(len, count), expected);
    }

    #[test]
    fn fractions_are_index_over_length() {
        let samples = sample_indices(120, 6);
        let fractions: Vec<f64> = samples.iter().map(|s| s.fraction_along_route).collect();
        let expected = [1.0 / 6.0, 1.0 / 3.0, 0.5, 2.0 / 3.0, 5.0 / 6.0];
        for (got, want) in fractions.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
        assert_eq!(samples[0].fraction_along_route, 20.0 / 120.0);
    }

    #[rstest]
    fn samples_are_strictly_increasing_and_bounded(
        #[values(1, 7, 11, 19, 64, 120, 1001)] len: usize,
        #[values(1, 2, 6, 10)] count: usize,
    ) {
        let samples = sample_indices(len, count);
        assert!(samples.len() <= count);
        for pair in samples.windows(2) {
            assert!(pair[0].sequence_index < pair[1].sequence_index);
            assert!(pair[0].fraction_along_route < pair[1].fraction_along_route);
        }
        for s in &samples {
            assert!(s.sequence_index < len);
            assert!(s.fraction_along_route > 0.0 && s.fraction_along_route <= 1.0);
        }
    }

    #[test]
    fn sample_reads_geometry_length() {
        let geometry = RouteGeometry::new(vec![
            crate::model::Coordinate { lat: 0.0, lon: 0.0 };
            12
        ]);
        assert_eq!(sample(&geometry, 6).len(), 5);
        assert!(sample(&RouteGeometry::default(), 6).is_empty());
    }
}
