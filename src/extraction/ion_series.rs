use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use log::{
    debug,
    info,
};

use super::building_ion_series::{
    BuildingIonSeries,
    IntensityMode,
    IonTimeSeries,
};
use crate::errors::{
    IonStreamError,
    Result,
};
use crate::ms::{
    MzRange,
    MzTolerance,
    ScanDataAccess,
    ScanDataType,
    ScanProvider,
    ScanSelection,
};
use crate::search::{
    binary_search,
    DefaultTo,
};
use crate::task::ProgressMonitor;
use crate::utils::{
    ContextTimer,
    LogLevel,
};

/// Extracts the traces of many m/z ranges in a single pass over the scans.
///
/// The target ranges have to be sorted by their lower bound (they can overlap).
/// For every scan, the data points and the ranges are walked together:
/// ranges whose upper bound is below the current point can never match a
/// later (higher m/z) point, so they are skipped for the rest of the scan.
/// This keeps a scan at O(points + ranges) instead of O(points x ranges),
/// as long as the ranges do not overlap much.
pub struct ExtractMzRangesIonSeriesFunction<'a, P: ScanProvider + ?Sized> {
    access: ScanDataAccess<'a, P>,
    mz_ranges: Vec<MzRange>,
    mode: IntensityMode,
    total_scans: usize,
    processed_scans: AtomicUsize,
}

impl<'a, P: ScanProvider + ?Sized> ExtractMzRangesIonSeriesFunction<'a, P> {
    /// Fails with [IonStreamError::MalformedInput] if the ranges are not
    /// sorted by lower bound.
    pub fn new(
        provider: &'a P,
        selection: &ScanSelection,
        data_type: ScanDataType,
        mz_ranges: Vec<MzRange>,
        mode: IntensityMode,
    ) -> Result<Self> {
        if let Some(i) = mz_ranges
            .windows(2)
            .position(|w| w[0].lower() > w[1].lower())
        {
            return Err(IonStreamError::MalformedInput(format!(
                "Target m/z ranges must be sorted by lower bound, range {} ({}) comes after {}",
                i + 1,
                mz_ranges[i + 1].lower(),
                mz_ranges[i].lower()
            )));
        }

        let access = ScanDataAccess::new(provider, selection, data_type);
        let total_scans = access.number_of_scans();
        Ok(ExtractMzRangesIonSeriesFunction {
            access,
            mz_ranges,
            mode,
            total_scans,
            processed_scans: AtomicUsize::new(0),
        })
    }

    pub fn total_scans(&self) -> usize {
        self.total_scans
    }

    pub fn processed_scans(&self) -> usize {
        self.processed_scans.load(Ordering::Relaxed)
    }

    pub fn progress(&self) -> f64 {
        if self.total_scans == 0 {
            return 0.0;
        }
        self.processed_scans() as f64 / self.total_scans as f64
    }

    /// Runs the extraction, one accumulator per target range in input order.
    ///
    /// Cancellation is checked once per scan. A canceled run returns an
    /// empty vector, partial results are never handed out.
    pub fn calculate<M: ProgressMonitor + ?Sized>(
        &mut self,
        monitor: &M,
    ) -> Result<Vec<BuildingIonSeries>> {
        let mut timer = ContextTimer::new("extract_ion_series", true, LogLevel::DEBUG);
        self.access.reset();
        self.processed_scans.store(0, Ordering::Relaxed);

        let num_ranges = self.mz_ranges.len();
        let mut series: Vec<BuildingIonSeries> = self
            .mz_ranges
            .iter()
            .map(|range| BuildingIonSeries::new(*range, self.total_scans, self.mode))
            .collect();

        if num_ranges == 0 {
            return Ok(series);
        }

        let lowest_mz = self
            .mz_ranges
            .iter()
            .map(|x| x.lower())
            .fold(f64::INFINITY, f64::min);

        let mut scan_index = 0;
        while self.access.next_scan()?.is_some() {
            if monitor.is_canceled() {
                info!(
                    "Extraction canceled after {} of {} scans",
                    scan_index, self.total_scans
                );
                return Ok(Vec::new());
            }

            let mzs = self.access.current_mzs();
            let intensities = self.access.current_intensities();

            let start = binary_search(mzs, lowest_mz, DefaultTo::GreaterEquals)?;
            if start >= 0 {
                let mut current_tree = 0;
                for dp_index in (start as usize)..mzs.len() {
                    let mz = mzs[dp_index];
                    while current_tree < num_ranges && mz > self.mz_ranges[current_tree].upper() {
                        current_tree += 1;
                    }
                    if current_tree >= num_ranges {
                        break;
                    }

                    // Ranges may overlap, so every range after the current one
                    // could also contain this point.
                    for tree in current_tree..num_ranges {
                        let range = &self.mz_ranges[tree];
                        if mz < range.lower() {
                            break;
                        }
                        if mz <= range.upper() {
                            series[tree].add_value(scan_index, mz, intensities[dp_index]);
                        }
                    }
                }
            }

            scan_index += 1;
            self.processed_scans.store(scan_index, Ordering::Relaxed);
            monitor.set_progress(self.progress());
        }

        timer.stop(true);
        debug!(
            "Extracted {} ranges over {} scans",
            num_ranges, self.total_scans
        );
        Ok(series)
    }

    /// Same as [ExtractMzRangesIonSeriesFunction::calculate] but also
    /// finalizes every accumulator, dropping the scans without data.
    pub fn calculate_series<M: ProgressMonitor + ?Sized>(
        &mut self,
        monitor: &M,
    ) -> Result<Vec<IonTimeSeries>> {
        let building = self.calculate(monitor)?;
        let scans = self.access.selected_scans();
        building.into_iter().map(|x| x.finish(&scans)).collect()
    }
}

/// Target ranges around each m/z, sorted the way the extraction needs them.
pub fn ranges_around(
    mzs: &[f64],
    tolerance: &MzTolerance,
) -> Vec<MzRange> {
    let mut out: Vec<MzRange> = mzs.iter().map(|&mz| tolerance.range_at(mz)).collect();
    out.sort_by(|a, b| a.lower().total_cmp(&b.lower()));
    out
}
