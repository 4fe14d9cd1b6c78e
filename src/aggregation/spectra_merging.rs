use log::trace;
use serde::{
    Deserialize,
    Serialize,
};

use super::aggregators::{
    ClusterAggregator,
    MergePoint,
    MergedPeak,
    MergedPeakAggregator,
};
use super::center::CenterFunction;
use crate::errors::{
    IonStreamError,
    Result,
};
use crate::ms::sorting::sort_by_mz;
use crate::ms::{
    MassSpectrum,
    MzTolerance,
    SpectrumArrays,
};

/// How the intensities of the points merged into one peak are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityMergingType {
    #[default]
    Summed,
    Maximum,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergingParameters {
    pub tolerance: MzTolerance,
    pub intensity_merging: IntensityMergingType,
    pub center_function: CenterFunction,
    /// Points at or below this intensity are dropped before merging.
    pub input_noise_level: Option<f64>,
    /// Merged peaks at or below this intensity are dropped.
    pub output_noise_level: Option<f64>,
    /// Merged peaks at or below this fraction of the most intense merged
    /// peak are dropped. Applied after the absolute output noise level.
    pub output_noise_level_relative: Option<f64>,
    /// Merged peaks made of fewer points are dropped.
    pub min_num_peaks: usize,
}

impl Default for MergingParameters {
    fn default() -> Self {
        MergingParameters {
            tolerance: MzTolerance::ms1_default(),
            intensity_merging: IntensityMergingType::Summed,
            center_function: CenterFunction::default(),
            input_noise_level: None,
            output_noise_level: None,
            output_noise_level_relative: None,
            min_num_peaks: 1,
        }
    }
}

fn above(
    level: Option<f64>,
    intensity: f64,
) -> bool {
    match level {
        Some(level) => intensity > level,
        None => true,
    }
}

/// Pools the points of all spectra, sorted by m/z, tagged with their source.
fn pool_points<S: MassSpectrum>(
    spectra: &[S],
    params: &MergingParameters,
    source_weights: Option<&[f64]>,
) -> Vec<MergePoint> {
    let capacity = spectra.iter().map(|x| x.len()).sum();
    let mut points = Vec::with_capacity(capacity);
    for (source, spectrum) in spectra.iter().enumerate() {
        let weight = source_weights.map_or(1.0, |w| w[source]);
        for (&mz, &intensity) in spectrum.mzs().iter().zip(spectrum.intensities()) {
            if above(params.input_noise_level, intensity) {
                points.push(MergePoint {
                    mz,
                    intensity,
                    source,
                    weight,
                });
            }
        }
    }
    // Stable, so ties keep the order of the sources
    points.sort_by(|a, b| a.mz.total_cmp(&b.mz));
    points
}

/// Merges the points of many spectra into peaks.
///
/// Seeds are taken from the lowest remaining m/z upwards. A seed absorbs the
/// following unassigned points that lie within tolerance of the running
/// center of the peak; the center is recomputed after every absorbed point.
/// Two rules keep peaks from growing without bound:
///   - a peak never spans more than twice the tolerance (at the seed) above its seed,
///   - a peak holds at most one point per source spectrum.
///
/// Peaks come out in the order of their seeds, not necessarily sorted by center.
pub fn merge_to_peaks<S: MassSpectrum>(
    spectra: &[S],
    params: &MergingParameters,
    source_weights: Option<&[f64]>,
) -> Result<Vec<MergedPeak>> {
    if let Some(relative) = params.output_noise_level_relative {
        if !(0.0..=1.0).contains(&relative) {
            return Err(IonStreamError::InvalidArgument(format!(
                "Relative output noise level must be within [0, 1], got {}",
                relative
            )));
        }
    }
    if let Some(weights) = source_weights {
        if weights.len() != spectra.len() {
            return Err(IonStreamError::InvalidArgument(format!(
                "Got {} source weights for {} spectra",
                weights.len(),
                spectra.len()
            )));
        }
    }

    let points = pool_points(spectra, params, source_weights);
    let mut assigned = vec![false; points.len()];
    let mut peaks = Vec::new();

    for seed_index in 0..points.len() {
        if assigned[seed_index] {
            continue;
        }
        assigned[seed_index] = true;
        let seed = &points[seed_index];
        let max_mz = seed.mz + 2.0 * params.tolerance.tolerance_at(seed.mz);

        let mut agg =
            MergedPeakAggregator::new(params.center_function, params.intensity_merging);
        agg.add(seed);

        for candidate_index in (seed_index + 1)..points.len() {
            if assigned[candidate_index] {
                continue;
            }
            let candidate = &points[candidate_index];
            if candidate.mz > max_mz {
                break;
            }
            // Every member is <= candidate, so the center is as well.
            let center = agg.center();
            if candidate.mz - center > params.tolerance.tolerance_at(center) {
                break;
            }
            if agg.contains_source(candidate.source) {
                continue;
            }
            agg.add(candidate);
            assigned[candidate_index] = true;
        }

        let peak = agg.aggregate();
        if peak.num_peaks >= params.min_num_peaks && above(params.output_noise_level, peak.intensity)
        {
            peaks.push(peak);
        } else {
            trace!("Dropping merged peak {:?}", peak);
        }
    }

    if let Some(relative) = params.output_noise_level_relative {
        let max_intensity = peaks.iter().map(|x| x.intensity).fold(0.0, f64::max);
        let min_intensity = max_intensity * relative;
        peaks.retain(|x| x.intensity > min_intensity);
    }

    Ok(peaks)
}

/// Merges many spectra into one, sorted by m/z.
pub fn merge_spectra<S: MassSpectrum>(
    spectra: &[S],
    params: &MergingParameters,
    source_weights: Option<&[f64]>,
) -> Result<SpectrumArrays> {
    let peaks = merge_to_peaks(spectra, params, source_weights)?;
    let (mut mzs, mut intensities): (Vec<f64>, Vec<f64>) =
        peaks.iter().map(|x| (x.mz, x.intensity)).unzip();
    sort_by_mz(&mut mzs, &mut intensities);
    SpectrumArrays::try_new(mzs, intensities)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{
        Rng,
        SeedableRng,
    };

    use super::*;

    fn spectrum(
        mzs: &[f64],
        intensities: &[f64],
    ) -> SpectrumArrays {
        SpectrumArrays::try_new(mzs.to_vec(), intensities.to_vec()).unwrap()
    }

    fn params(absolute: f64) -> MergingParameters {
        MergingParameters {
            tolerance: MzTolerance::new(absolute, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_spectrum_is_unchanged() {
        let input = spectrum(
            &[100.0, 100.001, 100.002, 250.0, 250.004],
            &[5.0, 50.0, 1.0, 20.0, 30.0],
        );
        let mut p = params(0.005);
        let out = merge_spectra(&[input.clone()], &p, None).unwrap();
        assert_eq!(out, input);

        p.input_noise_level = Some(4.0);
        let out = merge_spectra(&[input], &p, None).unwrap();
        assert_eq!(out.mzs(), &[100.0, 100.001, 250.0, 250.004]);
        assert_eq!(out.intensities(), &[5.0, 50.0, 20.0, 30.0]);
    }

    #[test]
    fn test_merges_across_sources() {
        let a = spectrum(&[100.0, 200.0], &[10.0, 5.0]);
        let b = spectrum(&[100.002, 300.0], &[30.0, 7.0]);

        let out = merge_spectra(&[a.clone(), b.clone()], &params(0.005), None).unwrap();
        assert_eq!(out.len(), 3);
        assert!((out.mzs()[0] - 100.0015).abs() < 1e-9);
        assert_eq!(out.intensities(), &[40.0, 5.0, 7.0]);

        let mut p = params(0.005);
        p.intensity_merging = IntensityMergingType::Maximum;
        let out = merge_spectra(&[a.clone(), b.clone()], &p, None).unwrap();
        assert_eq!(out.intensities(), &[30.0, 5.0, 7.0]);

        // Only keep peaks seen in both spectra
        p.min_num_peaks = 2;
        let out = merge_spectra(&[a.clone(), b.clone()], &p, None).unwrap();
        assert_eq!(out.len(), 1);

        // Heavier weight on the first spectrum drags the center towards it
        let out = merge_spectra(&[a, b], &params(0.005), Some(&[3.0, 1.0])).unwrap();
        assert!((out.mzs()[0] - 100.001).abs() < 1e-9);
    }

    #[test]
    fn test_same_source_points_never_merge() {
        let a = spectrum(&[100.0, 100.001, 100.0022], &[1.0, 1.0, 1.0]);
        let out = merge_spectra(&[a], &params(0.005), None).unwrap();
        assert_eq!(out.len(), 3);

        // 100.0 and 100.02 are 2 x tolerance apart, same source
        let a = spectrum(&[100.0, 100.02], &[1.0, 1.0]);
        let b = spectrum(&[100.01], &[1.0]);
        let peaks = merge_to_peaks(&[a, b], &params(0.005), None).unwrap();
        assert!(peaks.iter().all(|x| x.num_peaks < 3));
    }

    #[test]
    fn test_span_is_capped_at_twice_the_tolerance() {
        // The center drifts up while absorbing heavy points; without the cap
        // the last point would be within tolerance of the drifted center.
        let spectra = [
            spectrum(&[100.0], &[1.0]),
            spectrum(&[100.004], &[100.0]),
            spectrum(&[100.008], &[100.0]),
            spectrum(&[100.0105], &[100.0]),
        ];
        let peaks = merge_to_peaks(&spectra, &params(0.005), None).unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].num_peaks, 3);
        assert_eq!(peaks[0].intensity, 201.0);
        assert_eq!(peaks[1].num_peaks, 1);
        assert_eq!(peaks[1].mz, 100.0105);
    }

    #[test]
    fn test_output_noise_level() {
        let a = spectrum(&[100.0, 200.0], &[10.0, 5.0]);
        let b = spectrum(&[100.002, 200.001], &[30.0, 1.0]);
        let mut p = params(0.005);
        p.output_noise_level = Some(10.0);
        let out = merge_spectra(&[a, b], &p, None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.intensities(), &[40.0]);
    }

    #[test]
    fn test_relative_output_noise_level() {
        let a = spectrum(&[100.0, 200.0, 300.0], &[60.0, 5.0, 10.0]);
        let b = spectrum(&[100.002, 200.001], &[40.0, 4.0]);
        let mut p = params(0.005);

        // Max is 100, anything at or below 10 goes
        p.output_noise_level_relative = Some(0.1);
        let out = merge_spectra(&[a.clone(), b.clone()], &p, None).unwrap();
        assert_eq!(out.mzs().len(), 1);
        assert_eq!(out.intensities(), &[100.0]);

        p.output_noise_level_relative = Some(0.05);
        let out = merge_spectra(&[a.clone(), b.clone()], &p, None).unwrap();
        assert_eq!(out.intensities(), &[100.0, 9.0, 10.0]);

        // The stricter of both levels wins
        p.output_noise_level = Some(9.5);
        let out = merge_spectra(&[a.clone(), b.clone()], &p, None).unwrap();
        assert_eq!(out.intensities(), &[100.0, 10.0]);

        p.output_noise_level_relative = Some(1.5);
        let out = merge_spectra(&[a, b], &p, None);
        assert!(matches!(out, Err(IonStreamError::InvalidArgument(_))));
    }

    #[test]
    fn test_edge_cases() {
        let none: [SpectrumArrays; 0] = [];
        assert!(merge_spectra(&none, &params(0.005), None).unwrap().is_empty());

        let empties = [SpectrumArrays::empty(), SpectrumArrays::empty()];
        assert!(merge_spectra(&empties, &params(0.005), None).unwrap().is_empty());

        let out = merge_spectra(&empties, &params(0.005), Some(&[1.0]));
        assert!(matches!(out, Err(IonStreamError::InvalidArgument(_))));
    }

    #[test]
    fn test_random_merges_conserve_intensity() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let num_spectra = rng.gen_range(1..8);
            let spectra: Vec<SpectrumArrays> = (0..num_spectra)
                .map(|_| {
                    let n = rng.gen_range(0..20);
                    let mut mzs: Vec<f64> =
                        (0..n).map(|_| rng.gen_range(100.0..100.2)).collect();
                    mzs.sort_by(|a, b| a.total_cmp(b));
                    let ints = (0..n).map(|_| rng.gen_range(1.0..100.0)).collect();
                    SpectrumArrays::try_new(mzs, ints).unwrap()
                })
                .collect();
            let p = params(0.005);

            let peaks = merge_to_peaks(&spectra, &p, None).unwrap();
            let total_in: f64 = spectra.iter().map(|x| x.tic()).sum();
            let total_out: f64 = peaks.iter().map(|x| x.intensity).sum();
            assert!((total_in - total_out).abs() < 1e-6 * total_in.max(1.0));
            assert_eq!(
                peaks.iter().map(|x| x.num_peaks).sum::<usize>(),
                spectra.iter().map(|x| x.len()).sum::<usize>()
            );
            assert!(peaks.iter().all(|x| x.num_peaks <= num_spectra));

            let merged = merge_spectra(&spectra, &p, None).unwrap();
            assert!(merged.mzs().windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(merged.len(), peaks.len());
        }
    }
}
