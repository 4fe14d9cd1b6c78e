use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterMeasure {
    #[default]
    Avg,
    Median,
}

/// Transformation applied to intensities before they are used as weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    None,
    #[default]
    Linear,
    Log10,
    Log2,
    Sqrt,
    Cbrt,
}

impl Weighting {
    /// Weight of a point with the given intensity, never negative.
    pub fn weight(
        &self,
        intensity: f64,
    ) -> f64 {
        let w = match self {
            Weighting::None => 1.0,
            Weighting::Linear => intensity,
            Weighting::Log10 => intensity.log10(),
            Weighting::Log2 => intensity.log2(),
            Weighting::Sqrt => intensity.sqrt(),
            Weighting::Cbrt => intensity.cbrt(),
        };
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }
}

/// Computes one representative value (the center) out of many weighted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CenterFunction {
    pub measure: CenterMeasure,
    pub weighting: Weighting,
}

impl CenterFunction {
    pub fn new(
        measure: CenterMeasure,
        weighting: Weighting,
    ) -> Self {
        CenterFunction { measure, weighting }
    }

    /// `values` and `intensities` have the same length, `extra_weights`
    /// (if any) multiply the intensity based weights.
    ///
    /// Weights apply to both measures. When all the weights are zero the
    /// unweighted mean (or median) is used.
    pub fn calc_center(
        &self,
        values: &[f64],
        intensities: &[f64],
        extra_weights: Option<&[f64]>,
    ) -> f64 {
        debug_assert_eq!(values.len(), intensities.len());
        if values.is_empty() {
            return f64::NAN;
        }
        let weights: Vec<f64> = intensities
            .iter()
            .enumerate()
            .map(|(i, &intensity)| {
                let w = self.weighting.weight(intensity);
                match extra_weights {
                    Some(extra) => w * extra[i].max(0.0),
                    None => w,
                }
            })
            .collect();

        match self.measure {
            CenterMeasure::Median => weighted_median(values, &weights),
            CenterMeasure::Avg => {
                let weight_sum: f64 = weights.iter().sum();
                if weight_sum > 0.0 {
                    values
                        .iter()
                        .zip(weights.iter())
                        .map(|(v, w)| v * w)
                        .sum::<f64>()
                        / weight_sum
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            },
        }
    }
}

/// Smallest value holding at least half of the total weight below (and at) it.
///
/// Exactly half splits the difference with the next value, so equal
/// weights give the usual median.
fn weighted_median(
    values: &[f64],
    weights: &[f64],
) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return median(values);
    }
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let half = total / 2.0;
    let mut cumulative = 0.0;
    for (pos, &i) in order.iter().enumerate() {
        cumulative += weights[i];
        if cumulative > half {
            return values[i];
        }
        if cumulative == half {
            return match order.get(pos + 1) {
                Some(&next) => (values[i] + values[next]) / 2.0,
                None => values[i],
            };
        }
    }
    // Rounding left the cumulative sum just short of half
    values[order[order.len() - 1]]
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(
        a: f64,
        b: f64,
    ) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_linear_weighting() {
        let center = CenterFunction::new(CenterMeasure::Avg, Weighting::Linear);
        assert_close(center.calc_center(&[100.0, 101.0], &[1.0, 3.0], None), 100.75);
        assert_close(
            center.calc_center(&[100.0, 101.0], &[1.0, 3.0], Some(&[3.0, 1.0])),
            100.5,
        );
    }

    #[test]
    fn test_unweighted_fallback() {
        // log10 of 1 is 0, so no point carries weight
        let center = CenterFunction::new(CenterMeasure::Avg, Weighting::Log10);
        assert_close(center.calc_center(&[100.0, 102.0], &[1.0, 0.5], None), 101.0);
        let none = CenterFunction::new(CenterMeasure::Avg, Weighting::None);
        assert_close(none.calc_center(&[100.0, 102.0], &[1.0, 1000.0], None), 101.0);
    }

    #[test]
    fn test_median() {
        let center = CenterFunction::new(CenterMeasure::Median, Weighting::Linear);
        assert_close(center.calc_center(&[3.0, 1.0, 2.0], &[1.0, 1.0, 1.0], None), 2.0);
        assert_close(center.calc_center(&[4.0, 1.0, 2.0, 3.0], &[1.0; 4], None), 2.5);
    }

    #[test]
    fn test_weighted_median() {
        let center = CenterFunction::new(CenterMeasure::Median, Weighting::Linear);
        // 10 of the 13 units of weight sit on 3.0
        assert_close(center.calc_center(&[1.0, 2.0, 3.0], &[1.0, 2.0, 10.0], None), 3.0);
        // Extra weights flip it back to the low end
        assert_close(
            center.calc_center(&[1.0, 2.0, 3.0], &[1.0, 2.0, 10.0], Some(&[100.0, 1.0, 1.0])),
            1.0,
        );
        // No usable weight, plain median
        let log = CenterFunction::new(CenterMeasure::Median, Weighting::Log10);
        assert_close(log.calc_center(&[1.0, 2.0, 9.0], &[1.0, 1.0, 1.0], None), 2.0);
    }

    #[test]
    fn test_weights_never_negative() {
        assert_eq!(Weighting::Log10.weight(0.1), 0.0);
        assert_eq!(Weighting::Log2.weight(0.0), 0.0);
        assert_eq!(Weighting::Sqrt.weight(-4.0), 0.0);
        assert_close(Weighting::Sqrt.weight(16.0), 4.0);
    }
}
