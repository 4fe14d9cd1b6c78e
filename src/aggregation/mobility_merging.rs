use std::collections::BTreeMap;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use indicatif::ParallelProgressIterator;
use log::{
    debug,
    info,
    warn,
};
use rayon::prelude::*;

use super::center::CenterFunction;
use super::spectra_merging::{
    merge_spectra,
    IntensityMergingType,
    MergingParameters,
};
use crate::errors::{
    IonStreamError,
    Result,
};
use crate::ms::{
    Frame,
    MassList,
    MassSpectrum,
    MobilityScan,
    MobilityScanRecord,
    MobilityScanStorage,
    MzTolerance,
    Scan,
    ScanSelection,
    SpectrumArrays,
    SpectrumSlice,
};
use crate::task::ProgressMonitor;
use crate::utils::{
    ContextTimer,
    LogLevel,
};

/// Collapses the mobility scan mass lists of each frame into a single
/// mass list for the frame.
#[derive(Debug, Clone)]
pub struct MobilityScanMerger {
    params: MergingParameters,
    merged_mass_list_name: String,
    selection: ScanSelection,
}

impl MobilityScanMerger {
    pub fn new(
        params: MergingParameters,
        merged_mass_list_name: impl Into<String>,
    ) -> Self {
        MobilityScanMerger {
            params,
            merged_mass_list_name: merged_mass_list_name.into(),
            selection: ScanSelection::all(),
        }
    }

    /// Only frames matching `selection` are merged, the rest are left alone.
    pub fn with_selection(
        mut self,
        selection: ScanSelection,
    ) -> Self {
        self.selection = selection;
        self
    }

    pub fn params(&self) -> &MergingParameters {
        &self.params
    }

    /// Fails with [IonStreamError::MissingPrerequisite] if mass detection
    /// did not run on the mobility scans of the frame.
    pub fn merge_frame(
        &self,
        frame: &Frame,
    ) -> Result<MassList> {
        let storage = frame.mobility_scans();
        if !storage.has_mass_lists() {
            return Err(IonStreamError::MissingPrerequisite(format!(
                "Frame {} has no mobility scan mass lists, run mass detection on the \
                 mobility scans first",
                frame.frame_number()
            )));
        }

        let mass_lists: Vec<SpectrumSlice> =
            storage.iter().filter_map(|x| x.mass_list()).collect();
        let merged = merge_spectra(&mass_lists, &self.params, None)?;
        Ok(MassList::new(self.merged_mass_list_name.as_str(), merged))
    }

    /// Merges every selected frame, frames are independent so this runs
    /// in parallel. Each merged mass list comes paired with the index of
    /// its frame in `frames`.
    ///
    /// Returns `Ok(None)` when the monitor reports a cancellation, nothing
    /// of a canceled run should be published. Any selected frame without
    /// mass lists fails the whole run.
    pub fn merge_frames<M: ProgressMonitor + ?Sized>(
        &self,
        frames: &[Frame],
        monitor: &M,
    ) -> Result<Option<Vec<(usize, MassList)>>> {
        let mut timer = ContextTimer::new("merge_mobility_scans", true, LogLevel::INFO);
        let selected: Vec<(usize, &Frame)> = frames
            .iter()
            .enumerate()
            .filter(|(_, frame)| self.selection.matches(frame.scan()))
            .collect();
        if selected.len() < frames.len() {
            debug!(
                "Skipping {} frames outside the selection",
                frames.len() - selected.len()
            );
        }
        let total = selected.len();
        let done = AtomicUsize::new(0);

        let progbar = indicatif::ProgressBar::new(total as u64);
        let merged = selected
            .par_iter()
            .progress_with(progbar)
            .map(|&(index, frame)| -> Result<Option<(usize, MassList)>> {
                if monitor.is_canceled() {
                    return Ok(None);
                }
                let out = self.merge_frame(frame)?;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                monitor.set_progress(finished as f64 / total as f64);
                Ok(Some((index, out)))
            })
            .collect::<Result<Vec<_>>>()?;
        timer.stop(true);

        if monitor.is_canceled() || merged.iter().any(|x| x.is_none()) {
            warn!("Mobility scan merging was canceled, discarding all merged frames");
            return Ok(None);
        }

        let merged: Vec<(usize, MassList)> = merged.into_iter().flatten().collect();
        info!(
            "Merged {} frames into '{}' ({} points)",
            merged.len(),
            self.merged_mass_list_name,
            merged.iter().map(|(_, x)| x.len()).sum::<usize>()
        );
        Ok(Some(merged))
    }

    /// Merges many frames into one.
    ///
    /// Mobility scans are pooled across frames into bins of
    /// `mobility_scan_bin` consecutive mobility scan numbers, every bin
    /// becomes one mobility scan of the merged frame. A bin uses the mass
    /// lists of its scans when all of them have one and the raw spectra
    /// when none do.
    ///
    /// The merged frame carries:
    ///   - the lowest input frame number,
    ///   - the midpoint of the lowest and highest input retention times,
    ///   - for each bin, the mobility of the central mobility scan of the
    ///     input frame with the most mobility scans,
    ///   - the merge of the frame spectra, without any noise filtering.
    ///
    /// Returns `Ok(None)` when the monitor reports a cancellation.
    pub fn merge_frames_binned<M: ProgressMonitor + ?Sized>(
        &self,
        frames: &[Frame],
        mobility_scan_bin: usize,
        monitor: &M,
    ) -> Result<Option<Frame>> {
        let Some(first) = frames.first() else {
            return Err(IonStreamError::InvalidArgument(
                "No frames to merge".to_string(),
            ));
        };
        if mobility_scan_bin == 0 {
            return Err(IonStreamError::InvalidArgument(
                "Mobility scan bin width must be at least 1".to_string(),
            ));
        }
        let ms_level = first.scan().ms_level();
        let polarity = first.scan().polarity();
        for frame in frames {
            if frame.scan().ms_level() != ms_level || frame.scan().polarity() != polarity {
                return Err(IonStreamError::InvalidArgument(format!(
                    "Cannot merge frame {} (MS{}, {:?}) with frame {} (MS{}, {:?})",
                    frame.frame_number(),
                    frame.scan().ms_level(),
                    frame.scan().polarity(),
                    first.frame_number(),
                    ms_level,
                    polarity
                )));
            }
        }

        let mut timer = ContextTimer::new("merge_frames_binned", true, LogLevel::DEBUG);
        let mut bins: BTreeMap<usize, Vec<MobilityScan>> = BTreeMap::new();
        for frame in frames {
            for scan in frame.mobility_scans().iter() {
                let bin = scan.mobility_scan_number() as usize / mobility_scan_bin;
                bins.entry(bin).or_default().push(scan);
            }
        }
        let bins: Vec<(usize, Vec<MobilityScan>)> = bins.into_iter().collect();
        let total = bins.len();
        let done = AtomicUsize::new(0);

        let merged_bins = bins
            .par_iter()
            .map(|(bin, scans)| -> Result<Option<SpectrumArrays>> {
                if monitor.is_canceled() {
                    return Ok(None);
                }
                let mass_lists: Vec<SpectrumSlice> =
                    scans.iter().filter_map(|x| x.mass_list()).collect();
                let merged = if mass_lists.is_empty() {
                    let spectra: Vec<SpectrumSlice> = scans.iter().map(|x| x.spectrum()).collect();
                    merge_spectra(&spectra, &self.params, None)?
                } else if mass_lists.len() == scans.len() {
                    merge_spectra(&mass_lists, &self.params, None)?
                } else {
                    return Err(IonStreamError::MissingPrerequisite(format!(
                        "Only {} of {} mobility scans in bin {} have a mass list",
                        mass_lists.len(),
                        scans.len(),
                        bin
                    )));
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                monitor.set_progress(finished as f64 / total as f64);
                Ok(Some(merged))
            })
            .collect::<Result<Vec<_>>>()?;

        if monitor.is_canceled() || merged_bins.iter().any(|x| x.is_none()) {
            warn!("Frame merging was canceled");
            return Ok(None);
        }

        let reference = frames
            .iter()
            .map(|x| x.mobility_scans())
            .max_by_key(|x| x.len());
        let mut records = Vec::with_capacity(total);
        let merged_bins = merged_bins.into_iter().flatten();
        for (i, ((bin, _), spectrum)) in bins.iter().zip(merged_bins).enumerate() {
            let central = bin * mobility_scan_bin + mobility_scan_bin / 2;
            let mobility = reference
                .and_then(|x| x.mobility_scan(central.min(x.len().saturating_sub(1))))
                .map(|x| x.mobility())
                .ok_or_else(|| {
                    IonStreamError::MalformedInput(format!("No mobility for bin {}", bin))
                })?;
            records.push(MobilityScanRecord {
                mobility_scan_number: i as u32,
                mobility,
                spectrum,
            });
        }
        let mobility_scans = MobilityScanStorage::try_new(records)?;

        let frame_spectra: Vec<SpectrumSlice> = frames
            .iter()
            .map(|x| SpectrumSlice::new(x.scan().mzs(), x.scan().intensities()))
            .collect();
        let summed_params = MergingParameters {
            input_noise_level: None,
            output_noise_level: None,
            output_noise_level_relative: None,
            min_num_peaks: 1,
            ..self.params
        };
        let spectrum = merge_spectra(&frame_spectra, &summed_params, None)?;

        let (lowest_rt, highest_rt) = frames.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(low, high), frame| {
                let rt = frame.scan().retention_time();
                (low.min(rt), high.max(rt))
            },
        );
        let frame_number = frames
            .iter()
            .map(|x| x.frame_number())
            .min()
            .unwrap_or(first.frame_number());
        let scan = Scan::new(
            frame_number,
            (lowest_rt + highest_rt) / 2.0,
            ms_level,
            polarity,
            spectrum,
        );
        timer.stop(true);
        info!(
            "Merged {} frames ({:.2}-{:.2}) into {} mobility scans",
            frames.len(),
            lowest_rt,
            highest_rt,
            mobility_scans.len()
        );
        Ok(Some(Frame::new(scan, mobility_scans)))
    }
}

/// Sums the raw spectra of all mobility scans within `mobility_range`
/// (inclusive), optionally restricted to frames within `rt_range`.
pub fn extract_summed_mobility_scan(
    frames: &[Frame],
    tolerance: MzTolerance,
    mobility_range: (f64, f64),
    rt_range: Option<(f32, f32)>,
) -> Result<SpectrumArrays> {
    let (lower, upper) = mobility_range;
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(IonStreamError::InvalidArgument(format!(
            "Invalid mobility range {:?}",
            mobility_range
        )));
    }
    let frame_selection = ScanSelection {
        rt_range,
        ..Default::default()
    };
    let spectra: Vec<SpectrumSlice> = frames
        .iter()
        .filter(|frame| frame_selection.matches(frame.scan()))
        .flat_map(|frame| {
            frame
                .mobility_scans()
                .scans_in_mobility_range(lower, upper)
                .map(|x| x.spectrum())
        })
        .collect();
    let params = MergingParameters {
        tolerance,
        intensity_merging: IntensityMergingType::Summed,
        center_function: CenterFunction::default(),
        ..Default::default()
    };
    merge_spectra(&spectra, &params, None)
}

/// Attaches merged mass lists to the frames they were computed from.
pub fn publish_merged(
    frames: &mut [Frame],
    merged: Vec<(usize, MassList)>,
) -> Result<()> {
    if let Some((index, _)) = merged.iter().find(|(index, _)| *index >= frames.len()) {
        return Err(IonStreamError::InvalidArgument(format!(
            "Got a merged mass list for frame index {} of {} frames",
            index,
            frames.len()
        )));
    }
    for (index, mass_list) in merged {
        frames[index].add_mass_list(mass_list)?;
    }
    Ok(())
}
