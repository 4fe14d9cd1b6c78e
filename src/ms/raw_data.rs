use serde::Deserialize;

use super::scan::{
    Frame,
    Scan,
};

/// Random access to the scans of an acquisition, in acquisition order.
pub trait ScanProvider: Sync {
    fn name(&self) -> &str;
    fn number_of_scans(&self) -> usize;
    fn scan(
        &self,
        index: usize,
    ) -> Option<&Scan>;
}

/// A plain LC-MS acquisition.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDataFile {
    name: String,
    scans: Vec<Scan>,
}

impl RawDataFile {
    pub fn new(
        name: impl Into<String>,
        scans: Vec<Scan>,
    ) -> Self {
        RawDataFile {
            name: name.into(),
            scans,
        }
    }

    pub fn scans(&self) -> &[Scan] {
        &self.scans
    }

    /// Mutable access is limited to what [Scan] allows, appending mass lists.
    pub fn scans_mut(&mut self) -> &mut [Scan] {
        &mut self.scans
    }
}

impl ScanProvider for RawDataFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn number_of_scans(&self) -> usize {
        self.scans.len()
    }

    fn scan(
        &self,
        index: usize,
    ) -> Option<&Scan> {
        self.scans.get(index)
    }
}

/// An ion mobility acquisition, every scan is a [Frame].
#[derive(Debug, Clone, Deserialize)]
pub struct ImsRawDataFile {
    name: String,
    frames: Vec<Frame>,
}

impl ImsRawDataFile {
    pub fn new(
        name: impl Into<String>,
        frames: Vec<Frame>,
    ) -> Self {
        ImsRawDataFile {
            name: name.into(),
            frames,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        &mut self.frames
    }
}

impl ScanProvider for ImsRawDataFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn number_of_scans(&self) -> usize {
        self.frames.len()
    }

    fn scan(
        &self,
        index: usize,
    ) -> Option<&Scan> {
        self.frames.get(index).map(|x| x.scan())
    }
}

/// What a JSON input file can hold.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawFileInput {
    Lcms(RawDataFile),
    Ims(ImsRawDataFile),
}

impl RawFileInput {
    pub fn name(&self) -> &str {
        match self {
            RawFileInput::Lcms(x) => x.name(),
            RawFileInput::Ims(x) => x.name(),
        }
    }
}
