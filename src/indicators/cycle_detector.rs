//! # Cycle Detector
//!
//! Estimates the dominant market cycle length inside a caller-supplied band.
//! Prices run through a highpass/lowpass pair whose periods are
//! cross-assigned (highpass at the upper bound, lowpass at the lower bound)
//! so only the target cycle band survives. The band-limited series is
//! normalized by a running peak, a single LMS update fits an adaptive filter
//! to the most recent window, and the filter's power spectrum is scanned
//! over every integer period in the band. The period with the highest power
//! wins; ties keep the first period seen.
//!
//! The running peak lives on the detector instance, so reusing one detector
//! across successive windows keeps the normalization scale between calls.
//! The free function builds a fresh detector per call.
//!
//! ## Parameters
//! - **lower_bound**: Shortest period scanned (defaults to 18). Must be >= 1
//!   and < `upper_bound`.
//! - **upper_bound**: Longest period scanned (defaults to 40).
//! - **length**: Adaptive filter window size (defaults to 40). Must be >= 1.
//!
//! ## Errors
//! - **EmptyData**: cycle_detector: No input data.
//! - **AllValuesNaN**: cycle_detector: All input values are NaN.
//! - **InvalidBounds**: cycle_detector: `lower_bound` is 0 or >= `upper_bound`.
//! - **InvalidLength**: cycle_detector: `length` is 0.
//! - **NotEnoughValidData**: cycle_detector: Fewer than `length` samples.
//!
//! ## Returns
//! - **`Ok(CycleDetectorOutput)`** with the dominant cycle (0 when no period
//!   stood out) plus the intermediate highpass and lowpass series.
//! - **`Err(CycleDetectorError)`** otherwise.

use crate::indicators::highpass::{highpass, HighPassError, HighPassInput, HighPassParams};
use crate::indicators::supersmoother::{
    supersmoother, SuperSmootherError, SuperSmootherInput, SuperSmootherParams,
};
use crate::utilities::data_loader::{source_type, Candles};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum CycleDetectorData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct CycleDetectorOutput {
    pub dominant_cycle: usize,
    pub close_prices: Vec<f64>,
    pub hp: Vec<f64>,
    pub lp: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct CycleDetectorParams {
    pub lower_bound: Option<usize>,
    pub upper_bound: Option<usize>,
    pub length: Option<usize>,
}

impl Default for CycleDetectorParams {
    fn default() -> Self {
        Self {
            lower_bound: Some(18),
            upper_bound: Some(40),
            length: Some(40),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleDetectorInput<'a> {
    pub data: CycleDetectorData<'a>,
    pub params: CycleDetectorParams,
}

impl<'a> CycleDetectorInput<'a> {
    #[inline]
    pub fn from_candles(
        candles: &'a Candles,
        source: &'a str,
        params: CycleDetectorParams,
    ) -> Self {
        Self {
            data: CycleDetectorData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: CycleDetectorParams) -> Self {
        Self {
            data: CycleDetectorData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", CycleDetectorParams::default())
    }
    #[inline]
    pub fn get_lower_bound(&self) -> usize {
        self.params.lower_bound.unwrap_or(18)
    }
    #[inline]
    pub fn get_upper_bound(&self) -> usize {
        self.params.upper_bound.unwrap_or(40)
    }
    #[inline]
    pub fn get_length(&self) -> usize {
        self.params.length.unwrap_or(40)
    }
}

impl<'a> AsRef<[f64]> for CycleDetectorInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            CycleDetectorData::Slice(slice) => slice,
            CycleDetectorData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct CycleDetectorBuilder {
    lower_bound: Option<usize>,
    upper_bound: Option<usize>,
    length: Option<usize>,
}

impl CycleDetectorBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn lower_bound(mut self, n: usize) -> Self {
        self.lower_bound = Some(n);
        self
    }
    #[inline(always)]
    pub fn upper_bound(mut self, n: usize) -> Self {
        self.upper_bound = Some(n);
        self
    }
    #[inline(always)]
    pub fn length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
    }
    #[inline(always)]
    fn params(self) -> CycleDetectorParams {
        CycleDetectorParams {
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            length: self.length,
        }
    }
    #[inline(always)]
    pub fn apply(self, candles: &Candles) -> Result<CycleDetectorOutput, CycleDetectorError> {
        cycle_detector(&CycleDetectorInput::from_candles(
            candles,
            "close",
            self.params(),
        ))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<CycleDetectorOutput, CycleDetectorError> {
        cycle_detector(&CycleDetectorInput::from_slice(data, self.params()))
    }
    #[inline(always)]
    pub fn into_detector(self) -> Result<CycleDetector, CycleDetectorError> {
        CycleDetector::try_new(self.params())
    }
}

#[derive(Debug, Error)]
pub enum CycleDetectorError {
    #[error("cycle_detector: Empty data provided.")]
    EmptyData,
    #[error("cycle_detector: All values are NaN.")]
    AllValuesNaN,
    #[error(
        "cycle_detector: Invalid bounds: lower_bound = {lower_bound}, upper_bound = {upper_bound}"
    )]
    InvalidBounds {
        lower_bound: usize,
        upper_bound: usize,
    },
    #[error("cycle_detector: Invalid length: length = {length}")]
    InvalidLength { length: usize },
    #[error("cycle_detector: Not enough valid data: needed = {needed}, valid = {valid}")]
    NotEnoughValidData { needed: usize, valid: usize },
    #[error("cycle_detector: Highpass error: {0}")]
    HighpassError(#[from] HighPassError),
    #[error("cycle_detector: SuperSmoother error: {0}")]
    SuperSmootherError(#[from] SuperSmootherError),
}

/// Reusable detector holding the running peak between calls.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    lower_bound: usize,
    upper_bound: usize,
    length: usize,
    peak: f64,
}

impl CycleDetector {
    pub fn try_new(params: CycleDetectorParams) -> Result<Self, CycleDetectorError> {
        let lower_bound = params.lower_bound.unwrap_or(18);
        let upper_bound = params.upper_bound.unwrap_or(40);
        let length = params.length.unwrap_or(40);
        if lower_bound == 0 || lower_bound >= upper_bound {
            return Err(CycleDetectorError::InvalidBounds {
                lower_bound,
                upper_bound,
            });
        }
        if length == 0 {
            return Err(CycleDetectorError::InvalidLength { length });
        }
        Ok(Self {
            lower_bound,
            upper_bound,
            length,
            peak: 0.1,
        })
    }

    /// Current normalization peak. Starts at the 0.1 floor and only grows.
    #[inline]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn calculate_cycles(
        &mut self,
        prices: &[f64],
    ) -> Result<CycleDetectorOutput, CycleDetectorError> {
        let len = prices.len();
        if len == 0 {
            return Err(CycleDetectorError::EmptyData);
        }
        if prices.iter().all(|v| v.is_nan()) {
            return Err(CycleDetectorError::AllValuesNaN);
        }

        let hp = highpass(&HighPassInput::from_slice(
            prices,
            HighPassParams {
                period: Some(self.upper_bound),
            },
        ))?
        .values;
        let lp = supersmoother(&SuperSmootherInput::from_slice(
            &hp,
            SuperSmootherParams {
                period: Some(self.lower_bound),
            },
        ))?
        .values;

        let mut current = 0.0;
        for &v in &lp {
            let magnitude = v.abs();
            if magnitude > current {
                current = magnitude;
            }
        }
        if current > self.peak {
            self.peak = current;
        }
        let signal: Vec<f64> = if self.peak != 0.0 {
            lp.iter().map(|&v| v / self.peak).collect()
        } else {
            vec![0.0; lp.len()]
        };

        if signal.len() < self.length {
            return Err(CycleDetectorError::NotEnoughValidData {
                needed: self.length,
                valid: signal.len(),
            });
        }

        // Window of the first `length` samples in reverse order.
        let mut xx = vec![0.0; self.length];
        for i in 0..self.length {
            xx[i] = signal[self.length - 1 - i];
        }
        let mut coefficients = vec![0.0; self.length];

        let mut dominant_cycle = 0usize;
        // All-zero window: no update, no scan, dominant cycle stays 0.
        if xx.iter().any(|&v| v != 0.0) {
            let mu = 1.0 / self.length as f64;
            let mut estimate = 0.0;
            for k in 0..self.length {
                estimate += xx[k] * coefficients[k];
            }
            let error = xx[self.length - 1] - estimate;
            for k in 0..self.length {
                coefficients[k] += mu * error * xx[k];
            }

            let mut max_power = 0.0;
            for period in self.lower_bound..=self.upper_bound {
                let mut real = 0.0;
                let mut imag = 0.0;
                for k in 0..self.length {
                    let angle = 2.0 * PI * (k + 1) as f64 / period as f64;
                    real += coefficients[k] * angle.cos();
                    imag += coefficients[k] * angle.sin();
                }
                let denom = (1.0 - real) * (1.0 - real) + imag * imag;
                let power = if denom != 0.0 { 0.1 / denom } else { 0.0 };
                if power > max_power {
                    max_power = power;
                    dominant_cycle = period;
                }
            }
        }

        Ok(CycleDetectorOutput {
            dominant_cycle,
            close_prices: prices.to_vec(),
            hp,
            lp,
        })
    }
}

#[inline]
pub fn cycle_detector(
    input: &CycleDetectorInput,
) -> Result<CycleDetectorOutput, CycleDetectorError> {
    let data: &[f64] = input.as_ref();
    let mut detector = CycleDetector::try_new(input.params.clone())?;
    detector.calculate_cycles(data)
}
