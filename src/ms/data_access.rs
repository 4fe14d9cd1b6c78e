use serde::{
    Deserialize,
    Serialize,
};

use super::raw_data::ScanProvider;
use super::scan::Scan;
use super::selection::ScanSelection;
use super::spectrum::MassSpectrum;
use crate::errors::{
    IonStreamError,
    Result,
};

/// Which columns of a scan a processing step reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDataType {
    Raw,
    MassList(String),
}

/// Sequential cursor over the selected scans of a file.
///
/// Usage is
/// ```ignore
/// while let Some(scan) = access.next_scan()? {
///     let mzs = access.current_mzs();
///     ...
/// }
/// ```
pub struct ScanDataAccess<'a, P: ScanProvider + ?Sized> {
    provider: &'a P,
    data_type: ScanDataType,
    selected: Vec<usize>,
    cursor: usize,
    current_mzs: &'a [f64],
    current_intensities: &'a [f64],
}

impl<'a, P: ScanProvider + ?Sized> ScanDataAccess<'a, P> {
    pub fn new(
        provider: &'a P,
        selection: &ScanSelection,
        data_type: ScanDataType,
    ) -> Self {
        let selected = selection.select(provider);
        ScanDataAccess {
            provider,
            data_type,
            selected,
            cursor: 0,
            current_mzs: &[],
            current_intensities: &[],
        }
    }

    /// Number of scans in the selection, not in the file.
    pub fn number_of_scans(&self) -> usize {
        self.selected.len()
    }

    pub fn data_type(&self) -> &ScanDataType {
        &self.data_type
    }

    /// Moves to the next selected scan and loads its data.
    ///
    /// Fails with [IonStreamError::MissingPrerequisite] when the requested
    /// mass list was never added to the scan.
    pub fn next_scan(&mut self) -> Result<Option<&'a Scan>> {
        let Some(&index) = self.selected.get(self.cursor) else {
            self.current_mzs = &[];
            self.current_intensities = &[];
            return Ok(None);
        };
        self.cursor += 1;

        let provider: &'a P = self.provider;
        let scan = provider.scan(index).ok_or_else(|| {
            IonStreamError::InvalidArgument(format!(
                "Scan index {} is out of bounds for '{}'",
                index,
                provider.name()
            ))
        })?;

        match &self.data_type {
            ScanDataType::Raw => {
                self.current_mzs = scan.mzs();
                self.current_intensities = scan.intensities();
            },
            ScanDataType::MassList(name) => {
                let mass_list = scan.mass_list(name).ok_or_else(|| {
                    IonStreamError::MissingPrerequisite(format!(
                        "Scan {} in '{}' has no mass list named '{}', run mass detection first",
                        scan.scan_number(),
                        provider.name(),
                        name
                    ))
                })?;
                self.current_mzs = mass_list.mzs();
                self.current_intensities = mass_list.intensities();
            },
        }
        Ok(Some(scan))
    }

    pub fn current_mzs(&self) -> &'a [f64] {
        self.current_mzs
    }

    pub fn current_intensities(&self) -> &'a [f64] {
        self.current_intensities
    }

    /// The selected scans, regardless of the cursor position.
    pub fn selected_scans(&self) -> Vec<&'a Scan> {
        let provider: &'a P = self.provider;
        self.selected
            .iter()
            .filter_map(|&i| provider.scan(i))
            .collect()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.current_mzs = &[];
        self.current_intensities = &[];
    }
}
