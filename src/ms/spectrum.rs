use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::{
    IonStreamError,
    Result,
};

/// Closed m/z interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MzRange {
    lower: f64,
    upper: f64,
}

impl MzRange {
    pub fn try_new(
        lower: f64,
        upper: f64,
    ) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() {
            return Err(IonStreamError::InvalidArgument(
                "m/z range bounds cannot be NaN".to_string(),
            ));
        }
        if lower > upper {
            return Err(IonStreamError::InvalidArgument(format!(
                "m/z range lower bound {} is above its upper bound {}",
                lower, upper
            )));
        }
        Ok(MzRange { lower, upper })
    }

    /// Range that contains every finite m/z value.
    pub fn all() -> Self {
        MzRange {
            lower: f64::MIN,
            upper: f64::MAX,
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(
        &self,
        mz: f64,
    ) -> bool {
        self.lower <= mz && mz <= self.upper
    }
}

/// m/z tolerance as the larger of an absolute and a relative (ppm) window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MzTolerance {
    pub absolute: f64,
    pub ppm: f64,
}

impl MzTolerance {
    pub fn new(
        absolute: f64,
        ppm: f64,
    ) -> Self {
        MzTolerance { absolute, ppm }
    }

    pub fn ms1_default() -> Self {
        MzTolerance::new(0.005, 15.0)
    }

    pub fn ms2_default() -> Self {
        MzTolerance::new(0.008, 25.0)
    }

    /// Half width of the window around `mz`.
    pub fn tolerance_at(
        &self,
        mz: f64,
    ) -> f64 {
        let relative = mz.abs() * self.ppm / 1e6;
        self.absolute.abs().max(relative.abs())
    }

    pub fn range_at(
        &self,
        mz: f64,
    ) -> MzRange {
        let tol = self.tolerance_at(mz);
        MzRange {
            lower: mz - tol,
            upper: mz + tol,
        }
    }

    pub fn within(
        &self,
        reference: f64,
        other: f64,
    ) -> bool {
        (reference - other).abs() <= self.tolerance_at(reference)
    }
}

impl Default for MzTolerance {
    fn default() -> Self {
        MzTolerance::ms1_default()
    }
}

/// Read access to a sorted (m/z, intensity) pair of columns.
pub trait MassSpectrum {
    fn mzs(&self) -> &[f64];
    fn intensities(&self) -> &[f64];

    fn len(&self) -> usize {
        self.mzs().len()
    }

    fn is_empty(&self) -> bool {
        self.mzs().is_empty()
    }

    fn tic(&self) -> f64 {
        self.intensities().iter().sum()
    }

    fn base_peak_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &intensity) in self.intensities().iter().enumerate() {
            match best {
                Some((_, best_intensity)) if best_intensity >= intensity => {},
                _ => best = Some((i, intensity)),
            }
        }
        best.map(|(i, _)| i)
    }
}

pub(crate) fn validate_spectrum(
    mzs: &[f64],
    intensities: &[f64],
) -> Result<()> {
    if mzs.len() != intensities.len() {
        return Err(IonStreamError::MalformedInput(format!(
            "Got {} m/z values but {} intensities",
            mzs.len(),
            intensities.len()
        )));
    }
    if let Some(i) = intensities.iter().position(|x| x.is_nan()) {
        return Err(IonStreamError::MalformedInput(format!(
            "Intensity at index {} is NaN",
            i
        )));
    }
    if let Some(i) = mzs.iter().position(|x| x.is_nan()) {
        return Err(IonStreamError::MalformedInput(format!(
            "m/z at index {} is NaN",
            i
        )));
    }
    if let Some(i) = mzs.windows(2).position(|w| w[0] > w[1]) {
        return Err(IonStreamError::MalformedInput(format!(
            "m/z values are not sorted ascending at index {} ({} > {})",
            i,
            mzs[i],
            mzs[i + 1]
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct UncheckedSpectrum {
    mzs: Vec<f64>,
    intensities: Vec<f64>,
}

/// Owned, validated spectrum columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSpectrum")]
pub struct SpectrumArrays {
    mzs: Vec<f64>,
    intensities: Vec<f64>,
}

impl SpectrumArrays {
    pub fn try_new(
        mzs: Vec<f64>,
        intensities: Vec<f64>,
    ) -> Result<Self> {
        validate_spectrum(&mzs, &intensities)?;
        Ok(SpectrumArrays { mzs, intensities })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.mzs, self.intensities)
    }
}

impl TryFrom<UncheckedSpectrum> for SpectrumArrays {
    type Error = IonStreamError;

    fn try_from(value: UncheckedSpectrum) -> Result<Self> {
        SpectrumArrays::try_new(value.mzs, value.intensities)
    }
}

impl MassSpectrum for SpectrumArrays {
    fn mzs(&self) -> &[f64] {
        &self.mzs
    }

    fn intensities(&self) -> &[f64] {
        &self.intensities
    }
}

/// Borrowed view over columns that were validated when they were stored.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumSlice<'a> {
    mzs: &'a [f64],
    intensities: &'a [f64],
}

impl<'a> SpectrumSlice<'a> {
    pub(crate) fn new(
        mzs: &'a [f64],
        intensities: &'a [f64],
    ) -> Self {
        debug_assert_eq!(mzs.len(), intensities.len());
        SpectrumSlice { mzs, intensities }
    }

    pub fn mz_values(&self) -> &'a [f64] {
        self.mzs
    }

    pub fn intensity_values(&self) -> &'a [f64] {
        self.intensities
    }

    pub fn to_owned_arrays(&self) -> SpectrumArrays {
        SpectrumArrays {
            mzs: self.mzs.to_vec(),
            intensities: self.intensities.to_vec(),
        }
    }
}

impl MassSpectrum for SpectrumSlice<'_> {
    fn mzs(&self) -> &[f64] {
        self.mzs
    }

    fn intensities(&self) -> &[f64] {
        self.intensities
    }
}

/// A named, sorted spectrum derived from a scan, eg. by mass detection or merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassList {
    name: String,
    data: SpectrumArrays,
}

impl MassList {
    pub fn new(
        name: impl Into<String>,
        data: SpectrumArrays,
    ) -> Self {
        MassList {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &SpectrumArrays {
        &self.data
    }
}

impl MassSpectrum for MassList {
    fn mzs(&self) -> &[f64] {
        self.data.mzs()
    }

    fn intensities(&self) -> &[f64] {
        self.data.intensities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unsorted_mzs() {
        let out = SpectrumArrays::try_new(vec![1.0, 3.0, 2.0], vec![1.0, 1.0, 1.0]);
        assert!(matches!(out, Err(IonStreamError::MalformedInput(_))));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let out = SpectrumArrays::try_new(vec![1.0, 3.0], vec![1.0]);
        assert!(matches!(out, Err(IonStreamError::MalformedInput(_))));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SpectrumArrays =
            serde_json::from_str(r#"{"mzs": [1.0, 2.0], "intensities": [3.0, 4.0]}"#).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.tic(), 7.0);
        assert_eq!(ok.base_peak_index(), Some(1));

        let bad: std::result::Result<SpectrumArrays, _> =
            serde_json::from_str(r#"{"mzs": [2.0, 1.0], "intensities": [3.0, 4.0]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_base_peak_prefers_first_max() {
        let spec = SpectrumArrays::try_new(vec![1.0, 2.0, 3.0], vec![5.0, 9.0, 9.0]).unwrap();
        assert_eq!(spec.base_peak_index(), Some(1));
        assert_eq!(SpectrumArrays::empty().base_peak_index(), None);
    }

    #[test]
    fn test_tolerance_uses_larger_window() {
        let tol = MzTolerance::new(0.005, 15.0);
        // 15 ppm of 100 is 0.0015, absolute wins
        assert!((tol.tolerance_at(100.0) - 0.005).abs() < 1e-12);
        // 15 ppm of 1000 is 0.015, ppm wins
        assert!((tol.tolerance_at(1000.0) - 0.015).abs() < 1e-12);

        let range = tol.range_at(1000.0);
        assert!(range.contains(1000.015 - 1e-9));
        assert!(!range.contains(1000.016));
        assert!(tol.within(1000.0, 999.99));
    }

    #[test]
    fn test_mz_range_validation() {
        assert!(MzRange::try_new(2.0, 1.0).is_err());
        assert!(MzRange::try_new(f64::NAN, 1.0).is_err());
        let range = MzRange::try_new(1.0, 1.0).unwrap();
        assert!(range.contains(1.0));
        assert_eq!(range.span(), 0.0);
    }
}
