//! # Highpass Filter
//!
//! Two-pole recursive filter that strips slow trend components from a price
//! series and leaves the cyclical residual. The first two outputs are seeded
//! to zero, so the series keeps the input length with no NaN warmup.
//!
//! This filter defines the coefficient family used by the whole cycle
//! pipeline: `a1 = exp(-1.414*pi/period)` and
//! `b1 = 2*a1*cos(1.414*180/period)`. The `b1` angle is evaluated exactly as
//! written (no degree-to-radian conversion); the mixed convention is part of
//! the published response.
//!
//! ## Parameters
//! - **period**: Filter time constant (defaults to 14). Must be >= 1.
//!
//! ## Errors
//! - **EmptyData**: highpass: No input data.
//! - **AllValuesNaN**: highpass: All input values are NaN.
//! - **InvalidPeriod**: highpass: `period` is 0.
//!
//! ## Returns
//! - **`Ok(HighPassOutput)`** on success, `values` matching the input length.
//! - **`Err(HighPassError)`** otherwise.

use crate::utilities::data_loader::{source_type, Candles};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum HighPassData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct HighPassOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct HighPassParams {
    pub period: Option<usize>,
}

impl Default for HighPassParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct HighPassInput<'a> {
    pub data: HighPassData<'a>,
    pub params: HighPassParams,
}

impl<'a> HighPassInput<'a> {
    #[inline]
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: HighPassParams) -> Self {
        Self {
            data: HighPassData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: HighPassParams) -> Self {
        Self {
            data: HighPassData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", HighPassParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

impl<'a> AsRef<[f64]> for HighPassInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            HighPassData::Slice(slice) => slice,
            HighPassData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HighPassBuilder {
    period: Option<usize>,
}

impl HighPassBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn period(mut self, n: usize) -> Self {
        self.period = Some(n);
        self
    }
    #[inline(always)]
    pub fn apply(self, candles: &Candles) -> Result<HighPassOutput, HighPassError> {
        let params = HighPassParams { period: self.period };
        highpass(&HighPassInput::from_candles(candles, "close", params))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<HighPassOutput, HighPassError> {
        let params = HighPassParams { period: self.period };
        highpass(&HighPassInput::from_slice(data, params))
    }
    #[inline(always)]
    pub fn into_stream(self) -> Result<HighPassStream, HighPassError> {
        HighPassStream::try_new(HighPassParams { period: self.period })
    }
}

#[derive(Debug, Error)]
pub enum HighPassError {
    #[error("highpass: Empty data provided.")]
    EmptyData,
    #[error("highpass: All values are NaN.")]
    AllValuesNaN,
    #[error("highpass: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
}

#[inline]
pub fn highpass(input: &HighPassInput) -> Result<HighPassOutput, HighPassError> {
    let data: &[f64] = input.as_ref();
    let len = data.len();
    let period = input.get_period();

    if len == 0 {
        return Err(HighPassError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(HighPassError::AllValuesNaN);
    }
    if period == 0 {
        return Err(HighPassError::InvalidPeriod {
            period,
            data_len: len,
        });
    }

    // Below three samples the recursion never engages.
    if len < 3 {
        return Ok(HighPassOutput {
            values: vec![0.0; len],
        });
    }

    let a1 = (-1.414 * PI / period as f64).exp();
    // Angle stays in the published mixed units; do not convert.
    let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
    let c1 = (1.0 + b1) / 4.0;
    let c2 = b1;
    let c3 = -(a1 * a1);

    let mut values = vec![0.0; len];
    for i in 2..len {
        values[i] = c1 * (data[i] - 2.0 * data[i - 1] + data[i - 2])
            + c2 * values[i - 1]
            + c3 * values[i - 2];
    }

    Ok(HighPassOutput { values })
}

/// Incremental evaluation with the same zero-seeded boundary as [`highpass`].
#[derive(Debug, Clone)]
pub struct HighPassStream {
    c1: f64,
    c2: f64,
    c3: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    seen: usize,
}

impl HighPassStream {
    pub fn try_new(params: HighPassParams) -> Result<Self, HighPassError> {
        let period = params.period.unwrap_or(14);
        if period == 0 {
            return Err(HighPassError::InvalidPeriod {
                period,
                data_len: 0,
            });
        }
        let a1 = (-1.414 * PI / period as f64).exp();
        let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
        Ok(Self {
            c1: (1.0 + b1) / 4.0,
            c2: b1,
            c3: -(a1 * a1),
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            seen: 0,
        })
    }

    #[inline(always)]
    pub fn update(&mut self, value: f64) -> f64 {
        let out = if self.seen < 2 {
            0.0
        } else {
            self.c1 * (value - 2.0 * self.x1 + self.x2) + self.c2 * self.y1 + self.c3 * self.y2
        };
        self.x2 = self.x1;
        self.x1 = value;
        self.y2 = self.y1;
        self.y1 = out;
        self.seen += 1;
        out
    }
}
