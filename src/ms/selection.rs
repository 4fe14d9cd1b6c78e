use serde::{
    Deserialize,
    Serialize,
};

use super::raw_data::ScanProvider;
use super::scan::{
    Polarity,
    Scan,
};

/// Filter deciding which scans of a file take part in a processing step.
///
/// Every `None` field matches everything. Ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSelection {
    pub ms_level: Option<u8>,
    pub rt_range: Option<(f32, f32)>,
    pub polarity: Option<Polarity>,
    pub scan_number_range: Option<(u32, u32)>,
}

impl ScanSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_ms_level(
        mut self,
        ms_level: u8,
    ) -> Self {
        self.ms_level = Some(ms_level);
        self
    }

    pub fn with_rt_range(
        mut self,
        start: f32,
        end: f32,
    ) -> Self {
        self.rt_range = Some((start, end));
        self
    }

    pub fn with_polarity(
        mut self,
        polarity: Polarity,
    ) -> Self {
        self.polarity = Some(polarity);
        self
    }

    pub fn with_scan_number_range(
        mut self,
        first: u32,
        last: u32,
    ) -> Self {
        self.scan_number_range = Some((first, last));
        self
    }

    pub fn matches(
        &self,
        scan: &Scan,
    ) -> bool {
        if let Some(level) = self.ms_level {
            if scan.ms_level() != level {
                return false;
            }
        }
        if let Some((start, end)) = self.rt_range {
            let rt = scan.retention_time();
            if rt < start || rt > end {
                return false;
            }
        }
        if let Some(polarity) = self.polarity {
            if scan.polarity() != polarity {
                return false;
            }
        }
        if let Some((first, last)) = self.scan_number_range {
            let number = scan.scan_number();
            if number < first || number > last {
                return false;
            }
        }
        true
    }

    /// Indices (not scan numbers) of the matching scans, in acquisition order.
    pub fn select<P: ScanProvider + ?Sized>(
        &self,
        provider: &P,
    ) -> Vec<usize> {
        (0..provider.number_of_scans())
            .filter(|&i| provider.scan(i).is_some_and(|scan| self.matches(scan)))
            .collect()
    }
}
