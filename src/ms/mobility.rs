use serde::Deserialize;

use super::spectrum::{
    MassSpectrum,
    SpectrumArrays,
    SpectrumSlice,
};
use crate::errors::{
    IonStreamError,
    Result,
};

/// Many spectra packed in two flat columns.
///
/// Scan `i` lives in `mzs[offsets[i]..offsets[i + 1]]`, so
/// `offsets.len() == number of scans + 1` and `offsets[0] == 0`.
///
/// Example values
///    - offsets.       `[0, 0, 3, 5]` -> scan 0 is empty, scan 1 has 3 points ...
///    - mzs.           `[100.1, 200.2, 300.3, 50.0, 60.0]`
///    - intensities.   `[12.0, 11.0, 3.0, 4.0, 1.0]`
#[derive(Debug, Clone)]
struct PackedSpectra {
    mzs: Vec<f64>,
    intensities: Vec<f64>,
    offsets: Vec<usize>,
    base_peak_indices: Vec<Option<usize>>,
}

impl PackedSpectra {
    fn pack<'a, S, I>(spectra: I) -> Self
    where
        S: MassSpectrum + 'a,
        I: IntoIterator<Item = &'a S>,
    {
        let mut out = PackedSpectra {
            mzs: Vec::new(),
            intensities: Vec::new(),
            offsets: vec![0],
            base_peak_indices: Vec::new(),
        };
        for spectrum in spectra {
            out.mzs.extend_from_slice(spectrum.mzs());
            out.intensities.extend_from_slice(spectrum.intensities());
            out.offsets.push(out.mzs.len());
            out.base_peak_indices.push(spectrum.base_peak_index());
        }
        out
    }

    fn num_spectra(&self) -> usize {
        self.offsets.len() - 1
    }

    fn spectrum(
        &self,
        index: usize,
    ) -> SpectrumSlice<'_> {
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        SpectrumSlice::new(&self.mzs[start..end], &self.intensities[start..end])
    }

    fn max_spectrum_len(&self) -> usize {
        self.offsets
            .windows(2)
            .map(|w| w[1] - w[0])
            .max()
            .unwrap_or(0)
    }
}

/// One mobility scan as it shows up in the input data.
#[derive(Debug, Clone, Deserialize)]
pub struct MobilityScanRecord {
    pub mobility_scan_number: u32,
    pub mobility: f64,
    pub spectrum: SpectrumArrays,
}

/// Storage for all the mobility scans of a frame, and optionally
/// one mass list per mobility scan.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Vec<MobilityScanRecord>")]
pub struct MobilityScanStorage {
    mobilities: Vec<f64>,
    raw: PackedSpectra,
    mass_lists: Option<(String, PackedSpectra)>,
}

impl MobilityScanStorage {
    /// Mobility scan numbers have to start at 0 and be consecutive,
    /// so that the position of a scan in the storage is its number.
    pub fn try_new(records: Vec<MobilityScanRecord>) -> Result<Self> {
        for (i, record) in records.iter().enumerate() {
            if record.mobility_scan_number as usize != i {
                return Err(IonStreamError::MalformedInput(format!(
                    "Mobility scan numbers must start at 0 and be consecutive, \
                     found {} at position {}",
                    record.mobility_scan_number, i
                )));
            }
            if record.mobility.is_nan() {
                return Err(IonStreamError::MalformedInput(format!(
                    "Mobility scan {} has a NaN mobility",
                    i
                )));
            }
        }

        let mobilities = records.iter().map(|x| x.mobility).collect();
        let raw = PackedSpectra::pack(records.iter().map(|x| &x.spectrum));
        debug_assert_eq!(raw.num_spectra(), records.len());
        Ok(MobilityScanStorage {
            mobilities,
            raw,
            mass_lists: None,
        })
    }

    pub fn len(&self) -> usize {
        self.mobilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mobilities.is_empty()
    }

    pub fn raw_data_point_count(&self) -> usize {
        self.raw.mzs.len()
    }

    pub fn max_raw_data_points(&self) -> usize {
        self.raw.max_spectrum_len()
    }

    pub fn mobility_scan(
        &self,
        index: usize,
    ) -> Option<MobilityScan<'_>> {
        if index < self.len() {
            Some(MobilityScan {
                storage: self,
                index,
            })
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = MobilityScan<'_>> + '_ {
        (0..self.len()).map(move |index| MobilityScan {
            storage: self,
            index,
        })
    }

    /// Mobility scans whose mobility lies within `[lower, upper]`.
    pub fn scans_in_mobility_range(
        &self,
        lower: f64,
        upper: f64,
    ) -> impl Iterator<Item = MobilityScan<'_>> + '_ {
        self.iter()
            .filter(move |x| x.mobility() >= lower && x.mobility() <= upper)
    }

    pub fn has_mass_lists(&self) -> bool {
        self.mass_lists.is_some()
    }

    pub fn mass_list_name(&self) -> Option<&str> {
        self.mass_lists.as_ref().map(|(name, _)| name.as_str())
    }

    /// Stores one mass list per mobility scan, in mobility scan order.
    ///
    /// Can only be done once per frame.
    pub fn set_mass_lists(
        &mut self,
        name: &str,
        mass_lists: &[SpectrumArrays],
    ) -> Result<()> {
        if let Some(existing) = self.mass_list_name() {
            return Err(IonStreamError::InvalidArgument(format!(
                "Mobility scan mass lists were already set ('{}')",
                existing
            )));
        }
        if mass_lists.len() != self.len() {
            return Err(IonStreamError::InvalidArgument(format!(
                "Got {} mass lists for {} mobility scans",
                mass_lists.len(),
                self.len()
            )));
        }
        let packed = PackedSpectra::pack(mass_lists);
        debug_assert_eq!(packed.num_spectra(), self.len());
        self.mass_lists = Some((name.to_string(), packed));
        Ok(())
    }
}

impl TryFrom<Vec<MobilityScanRecord>> for MobilityScanStorage {
    type Error = IonStreamError;

    fn try_from(value: Vec<MobilityScanRecord>) -> Result<Self> {
        MobilityScanStorage::try_new(value)
    }
}

/// Lightweight view of a single mobility scan inside a [MobilityScanStorage].
#[derive(Debug, Clone, Copy)]
pub struct MobilityScan<'a> {
    storage: &'a MobilityScanStorage,
    index: usize,
}

impl<'a> MobilityScan<'a> {
    pub fn mobility_scan_number(&self) -> u32 {
        self.index as u32
    }

    pub fn mobility(&self) -> f64 {
        self.storage.mobilities[self.index]
    }

    pub fn spectrum(&self) -> SpectrumSlice<'a> {
        self.storage.raw.spectrum(self.index)
    }

    pub fn base_peak_index(&self) -> Option<usize> {
        self.storage.raw.base_peak_indices[self.index]
    }

    pub fn mass_list(&self) -> Option<SpectrumSlice<'a>> {
        self.storage
            .mass_lists
            .as_ref()
            .map(|(_, packed)| packed.spectrum(self.index))
    }
}
