use super::center::{
    CenterFunction,
    CenterMeasure,
};
use super::spectra_merging::IntensityMergingType;

/// A trait for aggregating points into a single point.
///
/// Types <T,R> are:
/// T: The type of the points to be aggregated.
/// R: The type of the aggregated point.
pub trait ClusterAggregator<T, R>: Send + Sync {
    fn add(
        &mut self,
        elem: &T,
    );
    fn aggregate(&self) -> R;
}

/// A data point waiting to be merged, tagged with the spectrum it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePoint {
    pub mz: f64,
    pub intensity: f64,
    pub source: usize,
    /// Extra weight of the source spectrum, only used for the m/z center.
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedPeak {
    pub mz: f64,
    pub intensity: f64,
    pub num_peaks: usize,
}

/// Collects the members of one merged peak.
///
/// For averages the center is updated incrementally, so asking for the
/// center after every added point stays cheap.
#[derive(Debug, Clone)]
pub struct MergedPeakAggregator {
    center_function: CenterFunction,
    merging_type: IntensityMergingType,
    mzs: Vec<f64>,
    intensities: Vec<f64>,
    weights: Vec<f64>,
    sources: Vec<usize>,
    weighted_mz_sum: f64,
    weight_sum: f64,
    mz_sum: f64,
}

impl MergedPeakAggregator {
    pub fn new(
        center_function: CenterFunction,
        merging_type: IntensityMergingType,
    ) -> Self {
        MergedPeakAggregator {
            center_function,
            merging_type,
            mzs: Vec::new(),
            intensities: Vec::new(),
            weights: Vec::new(),
            sources: Vec::new(),
            weighted_mz_sum: 0.0,
            weight_sum: 0.0,
            mz_sum: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.mzs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mzs.is_empty()
    }

    pub fn contains_source(
        &self,
        source: usize,
    ) -> bool {
        self.sources.contains(&source)
    }

    /// Current m/z center of the members, NaN when empty.
    pub fn center(&self) -> f64 {
        match self.mzs.len() {
            0 => return f64::NAN,
            1 => return self.mzs[0],
            _ => {},
        }
        match self.center_function.measure {
            CenterMeasure::Avg => {
                if self.weight_sum > 0.0 {
                    self.weighted_mz_sum / self.weight_sum
                } else {
                    self.mz_sum / self.mzs.len() as f64
                }
            },
            CenterMeasure::Median => {
                self.center_function
                    .calc_center(&self.mzs, &self.intensities, Some(&self.weights))
            },
        }
    }

    fn merged_intensity(&self) -> f64 {
        match self.merging_type {
            IntensityMergingType::Summed => self.intensities.iter().sum(),
            IntensityMergingType::Maximum => self.intensities.iter().copied().fold(0.0, f64::max),
            IntensityMergingType::Average => {
                if self.intensities.is_empty() {
                    0.0
                } else {
                    self.intensities.iter().sum::<f64>() / self.intensities.len() as f64
                }
            },
        }
    }
}

impl ClusterAggregator<MergePoint, MergedPeak> for MergedPeakAggregator {
    fn add(
        &mut self,
        elem: &MergePoint,
    ) {
        let w = self.center_function.weighting.weight(elem.intensity) * elem.weight.max(0.0);
        self.weighted_mz_sum += elem.mz * w;
        self.weight_sum += w;
        self.mz_sum += elem.mz;
        self.mzs.push(elem.mz);
        self.intensities.push(elem.intensity);
        self.weights.push(elem.weight);
        self.sources.push(elem.source);
    }

    fn aggregate(&self) -> MergedPeak {
        MergedPeak {
            mz: self.center(),
            intensity: self.merged_intensity(),
            num_peaks: self.mzs.len(),
        }
    }
}
