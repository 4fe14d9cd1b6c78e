pub mod data_access;
pub mod mass_detection;
pub mod mobility;
pub mod raw_data;
pub mod scan;
pub mod selection;
pub mod sorting;
pub mod spectrum;

pub use data_access::{
    ScanDataAccess,
    ScanDataType,
};
pub use mass_detection::{
    detect_frame_masses,
    detect_scan_masses,
    CentroidMassDetector,
    FactorOfLowestMassDetector,
    MassDetector,
    MassDetectorKind,
};
pub use mobility::{
    MobilityScan,
    MobilityScanRecord,
    MobilityScanStorage,
};
pub use raw_data::{
    ImsRawDataFile,
    RawDataFile,
    RawFileInput,
    ScanProvider,
};
pub use scan::{
    Frame,
    Polarity,
    Scan,
};
pub use selection::ScanSelection;
pub use spectrum::{
    MassList,
    MassSpectrum,
    MzRange,
    MzTolerance,
    SpectrumArrays,
    SpectrumSlice,
};
