use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    IonStreamError,
    Result,
};
use crate::ms::{
    MzRange,
    Scan,
};

/// How the data points of one scan that fall in the same target range
/// are resolved into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityMode {
    /// Keep the most intense point.
    #[default]
    Highest,
    /// Sum the intensities, m/z is the intensity weighted mean.
    Sum,
}

/// Accumulates the trace of one m/z target range, one slot per selected scan.
///
/// A slot is filled by the first point added to it, even one with zero
/// intensity. Once all scans were seen, [BuildingIonSeries::finish] turns
/// it into an [IonTimeSeries].
#[derive(Debug, Clone)]
pub struct BuildingIonSeries {
    mz_range: MzRange,
    mode: IntensityMode,
    mzs: Vec<f64>,
    intensities: Vec<f64>,
    filled: Vec<bool>,
}

impl BuildingIonSeries {
    pub fn new(
        mz_range: MzRange,
        num_scans: usize,
        mode: IntensityMode,
    ) -> Self {
        BuildingIonSeries {
            mz_range,
            mode,
            mzs: vec![0.0; num_scans],
            intensities: vec![0.0; num_scans],
            filled: vec![false; num_scans],
        }
    }

    pub fn mz_range(&self) -> MzRange {
        self.mz_range
    }

    pub fn mode(&self) -> IntensityMode {
        self.mode
    }

    pub fn num_scans(&self) -> usize {
        self.mzs.len()
    }

    pub fn add_value(
        &mut self,
        scan_index: usize,
        mz: f64,
        intensity: f64,
    ) {
        debug_assert!(scan_index < self.mzs.len());
        let current = self.intensities[scan_index];
        if !self.filled[scan_index] {
            self.filled[scan_index] = true;
            self.mzs[scan_index] = mz;
            self.intensities[scan_index] = intensity;
            return;
        }
        match self.mode {
            IntensityMode::Highest => {
                if intensity > current {
                    self.mzs[scan_index] = mz;
                    self.intensities[scan_index] = intensity;
                }
            },
            IntensityMode::Sum => {
                let total = current + intensity;
                if total > 0.0 {
                    self.mzs[scan_index] =
                        (self.mzs[scan_index] * current + mz * intensity) / total;
                }
                self.intensities[scan_index] = total;
            },
        }
    }

    pub fn mz_at(
        &self,
        scan_index: usize,
    ) -> Option<f64> {
        match self.filled.get(scan_index) {
            Some(true) => Some(self.mzs[scan_index]),
            _ => None,
        }
    }

    pub fn intensity_at(
        &self,
        scan_index: usize,
    ) -> f64 {
        self.intensities.get(scan_index).copied().unwrap_or(0.0)
    }

    /// Number of scans that got at least one data point.
    pub fn num_values(&self) -> usize {
        self.filled.iter().filter(|&&x| x).count()
    }

    fn check_scans(
        &self,
        scans: &[&Scan],
    ) -> Result<()> {
        if scans.len() != self.mzs.len() {
            return Err(IonStreamError::InvalidArgument(format!(
                "Ion series was built for {} scans but {} were given",
                self.mzs.len(),
                scans.len()
            )));
        }
        Ok(())
    }

    /// Keeps only the scans that have data.
    pub fn finish(
        self,
        scans: &[&Scan],
    ) -> Result<IonTimeSeries> {
        self.check_scans(scans)?;
        let mut out = IonTimeSeries::with_capacity(self.mz_range, self.num_values());
        for (i, scan) in scans.iter().enumerate() {
            if self.filled[i] {
                out.push(scan, self.mzs[i], self.intensities[i]);
            }
        }
        Ok(out)
    }

    /// Keeps one entry per scan, zero intensity where there was no data.
    pub fn finish_full(
        self,
        scans: &[&Scan],
    ) -> Result<IonTimeSeries> {
        self.check_scans(scans)?;
        let mut out = IonTimeSeries::with_capacity(self.mz_range, scans.len());
        for (i, scan) in scans.iter().enumerate() {
            out.push(scan, self.mzs[i], self.intensities[i]);
        }
        Ok(out)
    }
}

/// A chromatographic trace of one m/z range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IonTimeSeries {
    pub mz_range: MzRange,
    pub scan_numbers: Vec<u32>,
    pub retention_times: Vec<f32>,
    pub mzs: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl IonTimeSeries {
    fn with_capacity(
        mz_range: MzRange,
        capacity: usize,
    ) -> Self {
        IonTimeSeries {
            mz_range,
            scan_numbers: Vec::with_capacity(capacity),
            retention_times: Vec::with_capacity(capacity),
            mzs: Vec::with_capacity(capacity),
            intensities: Vec::with_capacity(capacity),
        }
    }

    fn push(
        &mut self,
        scan: &Scan,
        mz: f64,
        intensity: f64,
    ) {
        self.scan_numbers.push(scan.scan_number());
        self.retention_times.push(scan.retention_time());
        self.mzs.push(mz);
        self.intensities.push(intensity);
    }

    pub fn len(&self) -> usize {
        self.scan_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scan_numbers.is_empty()
    }

    /// Index of the most intense point.
    pub fn apex_index(&self) -> Option<usize> {
        self.intensities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    /// Trapezoid area over retention time.
    pub fn area(&self) -> f64 {
        self.retention_times
            .windows(2)
            .zip(self.intensities.windows(2))
            .map(|(rt, int)| (rt[1] - rt[0]) as f64 * (int[0] + int[1]) / 2.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ms::{
        Polarity,
        SpectrumArrays,
    };

    fn scans(n: u32) -> Vec<Scan> {
        (0..n)
            .map(|i| Scan::new(i + 10, i as f32, 1, Polarity::Positive, SpectrumArrays::empty()))
            .collect()
    }

    fn range() -> MzRange {
        MzRange::try_new(99.0, 101.0).unwrap()
    }

    #[test]
    fn test_highest_keeps_max() {
        let mut series = BuildingIonSeries::new(range(), 3, IntensityMode::Highest);
        series.add_value(1, 100.0, 10.0);
        series.add_value(1, 100.5, 30.0);
        series.add_value(1, 99.5, 20.0);
        assert_eq!(series.mz_at(1), Some(100.5));
        assert_eq!(series.intensity_at(1), 30.0);
        assert_eq!(series.mz_at(0), None);
        assert_eq!(series.num_values(), 1);
    }

    #[test]
    fn test_sum_weights_mz() {
        let mut series = BuildingIonSeries::new(range(), 1, IntensityMode::Sum);
        series.add_value(0, 100.0, 10.0);
        series.add_value(0, 101.0, 30.0);
        assert_eq!(series.intensity_at(0), 40.0);
        assert!((series.mz_at(0).unwrap() - 100.75).abs() < 1e-12);
    }

    #[test]
    fn test_finish_sparse_and_full() {
        let scans = scans(3);
        let scan_refs: Vec<&Scan> = scans.iter().collect();

        let mut series = BuildingIonSeries::new(range(), 3, IntensityMode::Highest);
        series.add_value(0, 100.0, 5.0);
        series.add_value(2, 100.1, 7.0);

        let sparse = series.clone().finish(&scan_refs).unwrap();
        assert_eq!(sparse.scan_numbers, vec![10, 12]);
        assert_eq!(sparse.retention_times, vec![0.0, 2.0]);
        assert_eq!(sparse.intensities, vec![5.0, 7.0]);
        assert_eq!(sparse.apex_index(), Some(1));
        assert!((sparse.area() - 12.0).abs() < 1e-9);

        let full = series.finish_full(&scan_refs).unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(full.intensities, vec![5.0, 0.0, 7.0]);
    }

    #[test]
    fn test_zero_intensity_point_fills_slot() {
        let scans = scans(2);
        let scan_refs: Vec<&Scan> = scans.iter().collect();

        for mode in [IntensityMode::Highest, IntensityMode::Sum] {
            let mut series = BuildingIonSeries::new(range(), 2, mode);
            series.add_value(1, 100.2, 0.0);
            assert_eq!(series.mz_at(1), Some(100.2));
            assert_eq!(series.intensity_at(1), 0.0);
            assert_eq!(series.num_values(), 1);

            let sparse = series.finish(&scan_refs).unwrap();
            assert_eq!(sparse.scan_numbers, vec![11]);
            assert_eq!(sparse.intensities, vec![0.0]);
        }

        // A later real point still wins the slot
        let mut series = BuildingIonSeries::new(range(), 2, IntensityMode::Highest);
        series.add_value(0, 100.2, 0.0);
        series.add_value(0, 100.4, 3.0);
        assert_eq!(series.mz_at(0), Some(100.4));

        let mut series = BuildingIonSeries::new(range(), 2, IntensityMode::Sum);
        series.add_value(0, 100.2, 0.0);
        series.add_value(0, 100.4, 3.0);
        assert_eq!(series.mz_at(0), Some(100.4));
        assert_eq!(series.intensity_at(0), 3.0);
    }

    #[test]
    fn test_finish_checks_scan_count() {
        let scans = scans(2);
        let scan_refs: Vec<&Scan> = scans.iter().collect();
        let series = BuildingIonSeries::new(range(), 3, IntensityMode::Highest);
        assert!(matches!(
            series.finish(&scan_refs),
            Err(IonStreamError::InvalidArgument(_))
        ));
    }
}
