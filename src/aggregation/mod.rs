pub mod aggregators;
pub mod center;
pub mod mobility_merging;
pub mod spectra_merging;

pub use center::{
    CenterFunction,
    CenterMeasure,
    Weighting,
};
pub use mobility_merging::{
    extract_summed_mobility_scan,
    publish_merged,
    MobilityScanMerger,
};
pub use spectra_merging::{
    merge_spectra,
    merge_to_peaks,
    IntensityMergingType,
    MergingParameters,
};
