pub mod building_ion_series;
pub mod ion_series;

pub use building_ion_series::{
    BuildingIonSeries,
    IntensityMode,
    IonTimeSeries,
};
pub use ion_series::{
    ranges_around,
    ExtractMzRangesIonSeriesFunction,
};
