use indicatif::ParallelProgressIterator;
use log::{
    debug,
    info,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use super::scan::{
    Frame,
    Scan,
};
use super::selection::ScanSelection;
use super::spectrum::{
    MassList,
    MassSpectrum,
    SpectrumArrays,
};
use crate::errors::Result;
use crate::utils::{
    ContextTimer,
    LogLevel,
};

/// Turns a raw spectrum into the list of masses worth keeping.
pub trait MassDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the kept (m/z, intensity) pairs, still sorted by m/z.
    fn detect(
        &self,
        mzs: &[f64],
        intensities: &[f64],
    ) -> (Vec<f64>, Vec<f64>);

    /// When false the detector would keep every point,
    /// so callers can reuse the raw data directly.
    fn filters_active(&self) -> bool {
        true
    }

    fn detect_spectrum<S: MassSpectrum>(
        &self,
        spectrum: &S,
    ) -> Result<SpectrumArrays>
    where
        Self: Sized,
    {
        if !self.filters_active() {
            return SpectrumArrays::try_new(
                spectrum.mzs().to_vec(),
                spectrum.intensities().to_vec(),
            );
        }
        let (mzs, intensities) = self.detect(spectrum.mzs(), spectrum.intensities());
        SpectrumArrays::try_new(mzs, intensities)
    }
}

fn keep_where(
    mzs: &[f64],
    intensities: &[f64],
    keep: impl Fn(f64) -> bool,
) -> (Vec<f64>, Vec<f64>) {
    mzs.iter()
        .zip(intensities.iter())
        .filter(|(_, &intensity)| keep(intensity))
        .map(|(&mz, &intensity)| (mz, intensity))
        .unzip()
}

/// Keeps the points at least `noise_factor` times as intense as the
/// weakest point of the spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorOfLowestMassDetector {
    pub noise_factor: f64,
}

impl MassDetector for FactorOfLowestMassDetector {
    fn name(&self) -> &'static str {
        "factor_of_lowest"
    }

    fn detect(
        &self,
        mzs: &[f64],
        intensities: &[f64],
    ) -> (Vec<f64>, Vec<f64>) {
        let Some(lowest) = intensities.iter().copied().reduce(f64::min) else {
            return (Vec::new(), Vec::new());
        };
        let threshold = lowest * self.noise_factor;
        keep_where(mzs, intensities, |x| x >= threshold)
    }
}

/// Keeps the points above an absolute noise level, for already centroided data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentroidMassDetector {
    pub noise_level: f64,
}

impl MassDetector for CentroidMassDetector {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn detect(
        &self,
        mzs: &[f64],
        intensities: &[f64],
    ) -> (Vec<f64>, Vec<f64>) {
        keep_where(mzs, intensities, |x| x > self.noise_level)
    }

    fn filters_active(&self) -> bool {
        self.noise_level > 0.0
    }
}

/// Serializable choice of detector, used by the config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MassDetectorKind {
    FactorOfLowest(FactorOfLowestMassDetector),
    Centroid(CentroidMassDetector),
}

impl MassDetector for MassDetectorKind {
    fn name(&self) -> &'static str {
        match self {
            MassDetectorKind::FactorOfLowest(x) => x.name(),
            MassDetectorKind::Centroid(x) => x.name(),
        }
    }

    fn detect(
        &self,
        mzs: &[f64],
        intensities: &[f64],
    ) -> (Vec<f64>, Vec<f64>) {
        match self {
            MassDetectorKind::FactorOfLowest(x) => x.detect(mzs, intensities),
            MassDetectorKind::Centroid(x) => x.detect(mzs, intensities),
        }
    }

    fn filters_active(&self) -> bool {
        match self {
            MassDetectorKind::FactorOfLowest(x) => x.filters_active(),
            MassDetectorKind::Centroid(x) => x.filters_active(),
        }
    }
}

/// Adds a mass list called `mass_list_name` to every selected scan.
///
/// Returns the number of scans that got a mass list.
pub fn detect_scan_masses<D: MassDetector>(
    scans: &mut [Scan],
    detector: &D,
    selection: &ScanSelection,
    mass_list_name: &str,
) -> Result<usize> {
    let mut timer = ContextTimer::new("mass_detection::scans", true, LogLevel::DEBUG);
    let progbar = indicatif::ProgressBar::new(scans.len() as u64);
    let detected = scans
        .par_iter_mut()
        .progress_with(progbar)
        .filter(|scan| selection.matches(scan))
        .map(|scan| -> Result<usize> {
            let data = detector.detect_spectrum(&*scan)?;
            scan.add_mass_list(MassList::new(mass_list_name, data))?;
            Ok(1)
        })
        .sum::<Result<usize>>()?;
    timer.stop(true);
    info!(
        "Mass detection ({}) added '{}' to {} scans",
        detector.name(),
        mass_list_name,
        detected
    );
    Ok(detected)
}

fn detect_frame<D: MassDetector>(
    frame: &mut Frame,
    detector: &D,
    mass_list_name: &str,
) -> Result<()> {
    let frame_data = detector.detect_spectrum(frame.scan())?;
    let mobility_data = frame
        .mobility_scans()
        .iter()
        .map(|x| detector.detect_spectrum(&x.spectrum()))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Frame {}: {} mobility scans with {} detected points",
        frame.frame_number(),
        mobility_data.len(),
        mobility_data.iter().map(|x| x.len()).sum::<usize>()
    );

    frame
        .mobility_scans_mut()
        .set_mass_lists(mass_list_name, &mobility_data)?;
    frame.add_mass_list(MassList::new(mass_list_name, frame_data))
}

/// Mass detection on frames, both on the summed frame spectrum and on
/// every one of its mobility scans.
pub fn detect_frame_masses<D: MassDetector>(
    frames: &mut [Frame],
    detector: &D,
    selection: &ScanSelection,
    mass_list_name: &str,
) -> Result<usize> {
    let mut timer = ContextTimer::new("mass_detection::frames", true, LogLevel::DEBUG);
    let progbar = indicatif::ProgressBar::new(frames.len() as u64);
    let detected = frames
        .par_iter_mut()
        .progress_with(progbar)
        .filter(|frame| selection.matches(frame.scan()))
        .map(|frame| detect_frame(frame, detector, mass_list_name).map(|_| 1usize))
        .sum::<Result<usize>>()?;
    timer.stop(true);
    info!(
        "Mass detection ({}) added '{}' to {} frames",
        detector.name(),
        mass_list_name,
        detected
    );
    Ok(detected)
}
