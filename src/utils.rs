use std::time::{
    Duration,
    Instant,
};

use log::{
    debug,
    info,
    trace,
};
use num_traits::AsPrimitive;

pub struct ContextTimer {
    start: Instant,
    name: String,
    level: LogLevel,
    pub cumtime: Duration,
}

#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    INFO,
    DEBUG,
    TRACE,
}

impl ContextTimer {
    pub fn new(
        name: &str,
        report_start: bool,
        level: LogLevel,
    ) -> ContextTimer {
        let out = ContextTimer {
            start: Instant::now(),
            name: name.to_string(),
            level,
            cumtime: Duration::new(0, 0),
        };
        if report_start {
            out.start_msg();
        }
        out
    }

    fn start_msg(&self) {
        match self.level {
            LogLevel::INFO => info!("Started: '{}'", self.name),
            LogLevel::DEBUG => debug!("Started: '{}'", self.name),
            LogLevel::TRACE => trace!("Started: '{}'", self.name),
        }
    }

    pub fn stop(
        &mut self,
        report: bool,
    ) -> Duration {
        let duration = self.start.elapsed();
        self.cumtime += duration;
        if report {
            self.report();
        }
        duration
    }

    pub fn report(&self) {
        let elapsed = self.cumtime.as_secs_f64();
        match self.level {
            LogLevel::INFO => info!("Time elapsed in '{}' is: {:.02}s", self.name, elapsed),
            LogLevel::DEBUG => debug!("Time elapsed in '{}' is: {:.02}s", self.name, elapsed),
            LogLevel::TRACE => trace!("Time elapsed in '{}' is: {:.02}s", self.name, elapsed),
        }
    }
}

// Weighted mean/variance accumulated without storing the values.
// Merge formulas from https://doi.org/10.1007/s00180-015-0637-z

/// Running weighted mean and variance.
///
/// `W` is the type of the weights, anything that converts losslessly
/// enough to f64 (u32 intensities, u64 counts, f64 ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct RollingSDCalculator<W> {
    n: u64,
    w_sum: W,
    mean: f64,
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl<W> RollingSDCalculator<W>
where
    W: std::ops::Add<Output = W> + Copy + Default + AsPrimitive<f64>,
{
    pub fn add(
        &mut self,
        x: f64,
        w: W,
    ) {
        self.merge(&Self {
            n: 1,
            w_sum: w,
            mean: x,
            m2: 0.0,
            min: Some(x),
            max: Some(x),
        });
    }

    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get_mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (divides by the weight sum).
    pub fn get_variance(&self) -> f64 {
        let w: f64 = self.w_sum.as_();
        if w > 0.0 {
            self.m2 / w
        } else {
            0.0
        }
    }

    pub fn get_sd(&self) -> f64 {
        self.get_variance().sqrt()
    }

    pub fn get_min(&self) -> Option<f64> {
        self.min
    }

    pub fn get_max(&self) -> Option<f64> {
        self.max
    }

    pub fn merge(
        &mut self,
        other: &Self,
    ) {
        let a_weight: f64 = self.w_sum.as_();
        let b_weight: f64 = other.w_sum.as_();
        let combined_weight = a_weight + b_weight;
        if combined_weight <= 0.0 {
            // Zero weight points still count for min/max
            self.n += other.n;
            self.min = min_option(self.min, other.min);
            self.max = max_option(self.max, other.max);
            return;
        }

        let delta = other.mean - self.mean;
        self.mean = (a_weight * self.mean + b_weight * other.mean) / combined_weight;
        self.m2 += other.m2 + delta * delta * a_weight * b_weight / combined_weight;
        self.n += other.n;
        self.w_sum = self.w_sum + other.w_sum;
        self.min = min_option(self.min, other.min);
        self.max = max_option(self.max, other.max);
    }
}

fn min_option(
    a: Option<f64>,
    b: Option<f64>,
) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn max_option(
    a: Option<f64>,
    b: Option<f64>,
) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub mean: f64,
    pub sd: f64,
    pub n: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn get_stats(data: &[f64]) -> Stats {
    let mut sd_calc = RollingSDCalculator::<u64>::default();
    for x in data.iter() {
        sd_calc.add(*x, 1);
    }
    Stats {
        mean: sd_calc.get_mean(),
        sd: sd_calc.get_sd(),
        n: sd_calc.len(),
        min: sd_calc.get_min(),
        max: sd_calc.get_max(),
    }
}
