extern crate log;
extern crate pretty_env_logger;

use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use clap::Parser;
use ionstream::aggregation::MobilityScanMerger;
use ionstream::config::{
    Config,
    ExtractionConfig,
};
use ionstream::extraction::{
    ExtractMzRangesIonSeriesFunction,
    IonTimeSeries,
};
use ionstream::ms::{
    detect_frame_masses,
    detect_scan_masses,
    RawFileInput,
    ScanDataType,
    ScanProvider,
};
use ionstream::task::{
    run_all,
    ProcessingStep,
    ProcessingTask,
    TaskHandle,
};
use ionstream::{
    io,
    utils,
    IonStreamError,
    Result,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: String,
    #[arg(short, long, default_value = "ionstream_output")]
    output_dir: String,
    #[arg(long, action)]
    write_template: bool,
    /// Acquisitions to process (.json)
    files: Vec<String>,
}

#[derive(Debug)]
struct FileSummary {
    name: String,
    traces: Vec<IonTimeSeries>,
    merged_frames: Option<usize>,
}

struct FileProcessing {
    path: PathBuf,
    config: Config,
    output_dir: PathBuf,
}

impl FileProcessing {
    fn output_path(
        &self,
        suffix: &Option<String>,
    ) -> Option<PathBuf> {
        let stem = self.path.file_stem()?.to_string_lossy();
        suffix
            .as_ref()
            .map(|suffix| self.output_dir.join(format!("{}.{}", stem, suffix)))
    }
}

fn extract_traces<P: ScanProvider>(
    provider: &P,
    config: &ExtractionConfig,
    mass_list_name: &str,
    handle: &TaskHandle,
) -> Result<Vec<IonTimeSeries>> {
    if config.target_mzs.is_empty() {
        log::info!("No target m/z values configured, skipping extraction");
        return Ok(Vec::new());
    }
    let data_type = if config.use_mass_lists {
        ScanDataType::MassList(mass_list_name.to_string())
    } else {
        ScanDataType::Raw
    };
    let mut extractor = ExtractMzRangesIonSeriesFunction::new(
        provider,
        &config.selection(),
        data_type,
        config.target_ranges(),
        config.intensity_mode,
    )?;
    log::info!(
        "Extracting {} ranges from {} scans of {}",
        config.target_mzs.len(),
        extractor.total_scans(),
        provider.name()
    );
    extractor.calculate_series(handle)
}

impl ProcessingStep for FileProcessing {
    type Output = FileSummary;

    fn name(&self) -> String {
        format!("Processing {}", self.path.display())
    }

    fn run(
        &mut self,
        handle: &TaskHandle,
    ) -> Result<FileSummary> {
        let detection = &self.config.mass_detection;
        let input = io::read_raw_file(&self.path)?;
        let name = input.name().to_string();

        let (traces, merged_frames) = match input {
            RawFileInput::Lcms(mut file) => {
                detect_scan_masses(
                    file.scans_mut(),
                    &detection.detector,
                    &detection.selection(),
                    &detection.mass_list_name,
                )?;
                let traces = extract_traces(
                    &file,
                    &self.config.extraction,
                    &detection.mass_list_name,
                    handle,
                )?;
                (traces, None)
            },
            RawFileInput::Ims(mut file) => {
                detect_frame_masses(
                    file.frames_mut(),
                    &detection.detector,
                    &detection.selection(),
                    &detection.mass_list_name,
                )?;
                let merging = &self.config.merging;
                let merger =
                    MobilityScanMerger::new(merging.params, merging.merged_mass_list_name.as_str())
                        .with_selection(detection.selection());
                let Some(merged) = merger.merge_frames(file.frames(), handle)? else {
                    return Ok(FileSummary {
                        name,
                        traces: Vec::new(),
                        merged_frames: None,
                    });
                };
                let num_merged = merged.len();
                ionstream::aggregation::publish_merged(file.frames_mut(), merged)?;

                if let Some(out_path) = self.output_path(&self.config.output.merged_json) {
                    io::write_merged_json(
                        file.frames(),
                        &merging.merged_mass_list_name,
                        out_path,
                    )?;
                }

                let traces = extract_traces(
                    &file,
                    &self.config.extraction,
                    &merging.merged_mass_list_name,
                    handle,
                )?;
                (traces, Some(num_merged))
            },
        };

        if let Some(out_path) = self.output_path(&self.config.output.traces_csv) {
            io::write_traces_csv(&traces, out_path)?;
        }

        Ok(FileSummary {
            name,
            traces,
            merged_frames,
        })
    }
}

fn write_template(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        return Err(IonStreamError::InvalidArgument(format!(
            "File already exists: {}",
            path
        )));
    }
    let config_str = Config::default().to_toml()?;
    fs::write(path, config_str)?;
    println!("Wrote default config to {}", path);
    Ok(())
}

fn report(summary: &FileSummary) {
    println!("{}: {} traces", summary.name, summary.traces.len());
    if let Some(n) = summary.merged_frames {
        println!("{}: {} merged frames", summary.name, n);
    }
    let npoints = utils::get_stats(
        &summary
            .traces
            .iter()
            .map(|x| x.len() as f64)
            .collect::<Vec<_>>(),
    );
    let areas = utils::get_stats(&summary.traces.iter().map(|x| x.area()).collect::<Vec<_>>());
    println!("npoints: {:?}", npoints);
    println!("areas: {:?}", areas);
}

fn run(args: Args) -> Result<usize> {
    if args.write_template {
        write_template(&args.config)?;
        return Ok(0);
    }

    let config = Config::from_toml(&args.config)?;

    let out_path_dir = PathBuf::from(&args.output_dir);
    if !out_path_dir.exists() {
        fs::create_dir_all(&out_path_dir)?;
    }

    let mut tasks: Vec<ProcessingTask<FileProcessing>> = args
        .files
        .iter()
        .map(|path| {
            ProcessingTask::new(FileProcessing {
                path: PathBuf::from(path),
                config: config.clone(),
                output_dir: out_path_dir.clone(),
            })
        })
        .collect();

    let mut timer = utils::ContextTimer::new("ionstream", true, utils::LogLevel::INFO);
    let results = run_all(&mut tasks);
    timer.stop(true);

    let mut failed = 0;
    for (task, result) in tasks.iter().zip(results) {
        match result {
            Some(summary) => report(&summary),
            None => {
                log::error!("{:?}", task.status());
                failed += 1;
            },
        }
    }
    Ok(failed)
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(0) => {},
        Ok(failed) => {
            log::error!("{} files failed", failed);
            std::process::exit(1);
        },
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        },
    }
}
