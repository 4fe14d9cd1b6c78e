use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use crate::aggregation::MergingParameters;
use crate::errors::Result;
use crate::extraction::{
    ranges_around,
    IntensityMode,
};
use crate::ms::{
    FactorOfLowestMassDetector,
    MassDetectorKind,
    MzRange,
    MzTolerance,
    ScanSelection,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MassDetectionConfig {
    pub detector: MassDetectorKind,
    pub mass_list_name: String,
    pub ms_level: Option<u8>,
}

impl Default for MassDetectionConfig {
    fn default() -> Self {
        MassDetectionConfig {
            detector: MassDetectorKind::FactorOfLowest(FactorOfLowestMassDetector {
                noise_factor: 2.5,
            }),
            mass_list_name: "masses".into(),
            ms_level: None,
        }
    }
}

impl MassDetectionConfig {
    pub fn selection(&self) -> ScanSelection {
        ScanSelection {
            ms_level: self.ms_level,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Each target m/z becomes a range of +- tolerance.
    pub target_mzs: Vec<f64>,
    pub tolerance: MzTolerance,
    pub intensity_mode: IntensityMode,
    pub ms_level: Option<u8>,
    pub rt_range: Option<(f32, f32)>,
    /// Read the detected (or merged) mass lists instead of the raw spectra.
    pub use_mass_lists: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            target_mzs: Vec::new(),
            tolerance: MzTolerance::ms1_default(),
            intensity_mode: IntensityMode::Highest,
            ms_level: Some(1),
            rt_range: None,
            use_mass_lists: true,
        }
    }
}

impl ExtractionConfig {
    pub fn selection(&self) -> ScanSelection {
        ScanSelection {
            ms_level: self.ms_level,
            rt_range: self.rt_range,
            ..Default::default()
        }
    }

    pub fn target_ranges(&self) -> Vec<MzRange> {
        ranges_around(&self.target_mzs, &self.tolerance)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MergingConfig {
    pub params: MergingParameters,
    pub merged_mass_list_name: String,
}

impl Default for MergingConfig {
    fn default() -> Self {
        MergingConfig {
            params: MergingParameters::default(),
            merged_mass_list_name: "merged".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    // Appended to the input file stem, None skips the output.
    pub traces_csv: Option<String>,
    pub merged_json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            traces_csv: Some("traces.csv".into()),
            merged_json: Some("merged.json".into()),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mass_detection: MassDetectionConfig,
    pub extraction: ExtractionConfig,
    pub merging: MergingConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::IntensityMergingType;

    #[test]
    fn test_template_parses_back() {
        let config = Config::default();
        let template = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&template).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [extraction]
            target_mzs = [500.0, 300.0]
            tolerance = { absolute = 0.01, ppm = 10.0 }
            intensity_mode = "sum"
            ms_level = 1
            use_mass_lists = false

            [merging.params]
            tolerance = { absolute = 0.008, ppm = 25.0 }
            intensity_merging = "maximum"
            center_function = { measure = "avg", weighting = "log10" }
            min_num_peaks = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.mass_detection, MassDetectionConfig::default());
        assert_eq!(config.extraction.intensity_mode, IntensityMode::Sum);
        let ranges = config.extraction.target_ranges();
        assert_eq!(ranges.len(), 2);
        assert!(ranges[0].contains(300.0));
        assert!(ranges[1].contains(500.0));
        assert_eq!(
            config.merging.params.intensity_merging,
            IntensityMergingType::Maximum
        );
        assert_eq!(config.merging.params.input_noise_level, None);
    }

    #[test]
    fn test_detector_selection() {
        let config: Config = toml::from_str(
            r#"
            [mass_detection]
            detector = { type = "centroid", noise_level = 100.0 }
            mass_list_name = "centroids"
            ms_level = 2
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.mass_detection.detector,
            MassDetectorKind::Centroid(_)
        ));
        assert_eq!(config.mass_detection.selection().ms_level, Some(2));
    }
}
