use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
    Write,
};
use std::path::Path;

use log::{
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::Result;
use crate::extraction::IonTimeSeries;
use crate::ms::{
    Frame,
    MassSpectrum,
    RawFileInput,
};

/// Reads a JSON acquisition, validating every spectrum on the way in.
pub fn read_raw_file(path: impl AsRef<Path>) -> Result<RawFileInput> {
    info!("Reading raw data from: {}", path.as_ref().display());
    let reader = BufReader::new(File::open(path)?);
    let input: RawFileInput = serde_json::from_reader(reader)?;
    Ok(input)
}

/// One point of one trace, the long format used for the csv output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceRow {
    pub trace: usize,
    pub mz_lower: f64,
    pub mz_upper: f64,
    pub scan_number: u32,
    pub rt: f32,
    pub mz: f64,
    pub intensity: f64,
}

pub fn write_traces_csv(
    traces: &[IonTimeSeries],
    path: impl AsRef<Path>,
) -> Result<usize> {
    info!("Writting traces to csv: {}", path.as_ref().display());
    let mut wtr = csv::Writer::from_path(path)?;
    let mut written = 0;
    for (i, trace) in traces.iter().enumerate() {
        for j in 0..trace.len() {
            wtr.serialize(TraceRow {
                trace: i,
                mz_lower: trace.mz_range.lower(),
                mz_upper: trace.mz_range.upper(),
                scan_number: trace.scan_numbers[j],
                rt: trace.retention_times[j],
                mz: trace.mzs[j],
                intensity: trace.intensities[j],
            })?;
            written += 1;
        }
    }
    wtr.flush()?;
    Ok(written)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedFrameRecord {
    pub frame_number: u32,
    pub rt: f32,
    pub mzs: Vec<f64>,
    pub intensities: Vec<f64>,
}

/// Writes the `mass_list_name` mass list of every frame as a json array.
///
/// Frames missing that mass list are skipped with a warning.
pub fn write_merged_json(
    frames: &[Frame],
    mass_list_name: &str,
    path: impl AsRef<Path>,
) -> Result<usize> {
    info!(
        "Writting merged frames to json: {}",
        path.as_ref().display()
    );
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all("[".as_bytes())?;
    let mut written = 0;
    for frame in frames {
        let Some(mass_list) = frame.scan().mass_list(mass_list_name) else {
            warn!(
                "Frame {} has no mass list '{}'",
                frame.frame_number(),
                mass_list_name
            );
            continue;
        };
        let record = MergedFrameRecord {
            frame_number: frame.frame_number(),
            rt: frame.scan().retention_time(),
            mzs: mass_list.mzs().to_vec(),
            intensities: mass_list.intensities().to_vec(),
        };
        if written > 0 {
            file.write_all(",\n".as_bytes())?;
        }
        serde_json::to_writer(&mut file, &record)?;
        written += 1;
    }
    file.write_all("]".as_bytes())?;
    file.flush()?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::ms::{
        MassList,
        MobilityScanStorage,
        MzRange,
        Polarity,
        Scan,
        ScanProvider,
        SpectrumArrays,
    };

    fn tmp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ionstream_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_read_lcms_file() {
        let path = tmp_path("lcms.json");
        std::fs::write(
            &path,
            r#"{
                "kind": "lcms",
                "name": "sample",
                "scans": [
                    {"scan_number": 1, "retention_time": 0.5, "ms_level": 1,
                     "polarity": "positive",
                     "spectrum": {"mzs": [100.0, 200.0], "intensities": [1.0, 2.0]}},
                    {"scan_number": 2, "retention_time": 0.6, "ms_level": 2,
                     "spectrum": {"mzs": [], "intensities": []}}
                ]
            }"#,
        )
        .unwrap();

        let input = read_raw_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(input.name(), "sample");
        let RawFileInput::Lcms(file) = input else {
            panic!("Expected an lcms file");
        };
        assert_eq!(file.number_of_scans(), 2);
        assert_eq!(file.scans()[0].polarity(), Polarity::Positive);
        assert_eq!(file.scans()[1].polarity(), Polarity::Unknown);
    }

    #[test]
    fn test_read_rejects_unsorted_spectra() {
        let path = tmp_path("unsorted.json");
        std::fs::write(
            &path,
            r#"{"kind": "lcms", "name": "bad", "scans": [
                {"scan_number": 1, "retention_time": 0.5, "ms_level": 1,
                 "spectrum": {"mzs": [200.0, 100.0], "intensities": [1.0, 2.0]}}
            ]}"#,
        )
        .unwrap();
        let out = read_raw_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(out.is_err());
    }

    #[test]
    fn test_write_traces_csv() {
        let trace = IonTimeSeries {
            mz_range: MzRange::try_new(99.99, 100.01).unwrap(),
            scan_numbers: vec![1, 3],
            retention_times: vec![0.1, 0.3],
            mzs: vec![100.0, 100.001],
            intensities: vec![5.0, 7.0],
        };
        let path = tmp_path("traces.csv");
        let written = write_traces_csv(&[trace], &path).unwrap();
        assert_eq!(written, 2);

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<TraceRow> = rdr.deserialize().collect::<std::result::Result<_, _>>().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].scan_number, 3);
        assert_eq!(rows[1].intensity, 7.0);
        assert_eq!(rows[0].mz_upper, 100.01);
    }

    #[test]
    fn test_write_merged_json_skips_missing() {
        let mut with_list = Frame::new(
            Scan::new(1, 0.1, 1, Polarity::Positive, SpectrumArrays::empty()),
            MobilityScanStorage::try_new(vec![]).unwrap(),
        );
        let data = SpectrumArrays::try_new(vec![100.0], vec![9.0]).unwrap();
        with_list
            .add_mass_list(MassList::new("merged", data))
            .unwrap();
        let without_list = Frame::new(
            Scan::new(2, 0.2, 1, Polarity::Positive, SpectrumArrays::empty()),
            MobilityScanStorage::try_new(vec![]).unwrap(),
        );

        let path = tmp_path("merged.json");
        let written = write_merged_json(&[with_list, without_list], "merged", &path).unwrap();
        assert_eq!(written, 1);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let records: Vec<MergedFrameRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].frame_number, 1);
        assert_eq!(records[0].intensities, vec![9.0]);
    }
}
