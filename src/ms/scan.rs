use serde::{
    Deserialize,
    Serialize,
};

use super::mobility::MobilityScanStorage;
use super::spectrum::{
    MassList,
    MassSpectrum,
    SpectrumArrays,
};
use crate::errors::{
    IonStreamError,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Unknown,
}

/// One acquired spectrum.
///
/// The raw data of a scan never changes after it is built,
/// the only thing that can be added later are mass lists
/// (and each name can only be added once).
#[derive(Debug, Clone, Deserialize)]
pub struct Scan {
    scan_number: u32,
    /// Retention time in minutes.
    retention_time: f32,
    ms_level: u8,
    #[serde(default)]
    polarity: Polarity,
    spectrum: SpectrumArrays,
    #[serde(default)]
    mass_lists: Vec<MassList>,
}

impl Scan {
    pub fn new(
        scan_number: u32,
        retention_time: f32,
        ms_level: u8,
        polarity: Polarity,
        spectrum: SpectrumArrays,
    ) -> Self {
        Scan {
            scan_number,
            retention_time,
            ms_level,
            polarity,
            spectrum,
            mass_lists: Vec::new(),
        }
    }

    pub fn scan_number(&self) -> u32 {
        self.scan_number
    }

    pub fn retention_time(&self) -> f32 {
        self.retention_time
    }

    pub fn ms_level(&self) -> u8 {
        self.ms_level
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn spectrum(&self) -> &SpectrumArrays {
        &self.spectrum
    }

    pub fn mass_list(
        &self,
        name: &str,
    ) -> Option<&MassList> {
        self.mass_lists.iter().find(|x| x.name() == name)
    }

    pub fn mass_lists(&self) -> &[MassList] {
        &self.mass_lists
    }

    pub fn add_mass_list(
        &mut self,
        mass_list: MassList,
    ) -> Result<()> {
        if self.mass_list(mass_list.name()).is_some() {
            return Err(IonStreamError::InvalidArgument(format!(
                "Scan {} already has a mass list named '{}'",
                self.scan_number,
                mass_list.name()
            )));
        }
        self.mass_lists.push(mass_list);
        Ok(())
    }
}

impl MassSpectrum for Scan {
    fn mzs(&self) -> &[f64] {
        self.spectrum.mzs()
    }

    fn intensities(&self) -> &[f64] {
        self.spectrum.intensities()
    }
}

/// An ion mobility frame, the summed spectrum plus all of its mobility scans.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    scan: Scan,
    mobility_scans: MobilityScanStorage,
}

impl Frame {
    pub fn new(
        scan: Scan,
        mobility_scans: MobilityScanStorage,
    ) -> Self {
        Frame {
            scan,
            mobility_scans,
        }
    }

    pub fn frame_number(&self) -> u32 {
        self.scan.scan_number()
    }

    pub fn scan(&self) -> &Scan {
        &self.scan
    }

    pub fn mobility_scans(&self) -> &MobilityScanStorage {
        &self.mobility_scans
    }

    pub fn mobility_scans_mut(&mut self) -> &mut MobilityScanStorage {
        &mut self.mobility_scans
    }

    pub fn add_mass_list(
        &mut self,
        mass_list: MassList,
    ) -> Result<()> {
        self.scan.add_mass_list(mass_list)
    }
}
