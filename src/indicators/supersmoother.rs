//! # SuperSmoother Filter
//!
//! Two-pole lowpass that removes high-frequency noise while keeping lag low.
//! Usually applied to the highpass residual to isolate the cycle band, but
//! works directly on prices as well. The first two outputs pass the input
//! through unchanged.
//!
//! Shares the pipeline coefficient family (`1.414` damping, `b1` angle in
//! the published mixed units) with [`crate::indicators::highpass`].
//!
//! ## Parameters
//! - **period**: Filter time constant (defaults to 14). Must be >= 1.
//!
//! ## Errors
//! - **EmptyData**: supersmoother: No input data.
//! - **AllValuesNaN**: supersmoother: All input values are NaN.
//! - **InvalidPeriod**: supersmoother: `period` is 0.
//!
//! ## Returns
//! - **`Ok(SuperSmootherOutput)`** on success, `values` matching the input
//!   length.
//! - **`Err(SuperSmootherError)`** otherwise.

use crate::utilities::data_loader::{source_type, Candles};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum SuperSmootherData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct SuperSmootherOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct SuperSmootherParams {
    pub period: Option<usize>,
}

impl Default for SuperSmootherParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct SuperSmootherInput<'a> {
    pub data: SuperSmootherData<'a>,
    pub params: SuperSmootherParams,
}

impl<'a> SuperSmootherInput<'a> {
    #[inline]
    pub fn from_candles(
        candles: &'a Candles,
        source: &'a str,
        params: SuperSmootherParams,
    ) -> Self {
        Self {
            data: SuperSmootherData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: SuperSmootherParams) -> Self {
        Self {
            data: SuperSmootherData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", SuperSmootherParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

impl<'a> AsRef<[f64]> for SuperSmootherInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            SuperSmootherData::Slice(slice) => slice,
            SuperSmootherData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SuperSmootherBuilder {
    period: Option<usize>,
}

impl SuperSmootherBuilder {
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
    pub fn apply(self, candles: &Candles) -> Result<SuperSmootherOutput, SuperSmootherError> {
        let params = SuperSmootherParams { period: self.period };
        supersmoother(&SuperSmootherInput::from_candles(candles, "close", params))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<SuperSmootherOutput, SuperSmootherError> {
        let params = SuperSmootherParams { period: self.period };
        supersmoother(&SuperSmootherInput::from_slice(data, params))
    }
    #[inline(always)]
    pub fn into_stream(self) -> Result<SuperSmootherStream, SuperSmootherError> {
        SuperSmootherStream::try_new(SuperSmootherParams { period: self.period })
    }
}

#[derive(Debug, Error)]
pub enum SuperSmootherError {
    #[error("supersmoother: Empty data provided.")]
    EmptyData,
    #[error("supersmoother: All values are NaN.")]
    AllValuesNaN,
    #[error("supersmoother: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
}

#[inline]
pub fn supersmoother(
    input: &SuperSmootherInput,
) -> Result<SuperSmootherOutput, SuperSmootherError> {
    let data: &[f64] = input.as_ref();
    let len = data.len();
    let period = input.get_period();

    if len == 0 {
        return Err(SuperSmootherError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(SuperSmootherError::AllValuesNaN);
    }
    if period == 0 {
        return Err(SuperSmootherError::InvalidPeriod {
            period,
            data_len: len,
        });
    }

    // A single sample has nothing to smooth against.
    if len < 2 {
        return Ok(SuperSmootherOutput {
            values: data.to_vec(),
        });
    }

    let a1 = (-1.414 * PI / period as f64).exp();
    let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
    let c1 = 1.0 - b1 + a1 * a1;
    let c2 = b1;
    let c3 = -(a1 * a1);

    let mut values = vec![0.0; len];
    values[0] = data[0];
    values[1] = data[1];
    for i in 2..len {
        values[i] =
            c1 * (data[i] + data[i - 1]) / 2.0 + c2 * values[i - 1] + c3 * values[i - 2];
    }

    Ok(SuperSmootherOutput { values })
}

/// Incremental evaluation with the same pass-through seeding as
/// [`supersmoother`].
#[derive(Debug, Clone)]
pub struct SuperSmootherStream {
    c1: f64,
    c2: f64,
    c3: f64,
    x1: f64,
    y1: f64,
    y2: f64,
    seen: usize,
}

impl SuperSmootherStream {
    pub fn try_new(params: SuperSmootherParams) -> Result<Self, SuperSmootherError> {
        let period = params.period.unwrap_or(14);
        if period == 0 {
            return Err(SuperSmootherError::InvalidPeriod {
                period,
                data_len: 0,
            });
        }
        let a1 = (-1.414 * PI / period as f64).exp();
        let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
        Ok(Self {
            c1: 1.0 - b1 + a1 * a1,
            c2: b1,
            c3: -(a1 * a1),
            x1: 0.0,
            y1: 0.0,
            y2: 0.0,
            seen: 0,
        })
    }

    #[inline(always)]
    pub fn update(&mut self, value: f64) -> f64 {
        let out = if self.seen < 2 {
            value
        } else {
            self.c1 * (value + self.x1) / 2.0 + self.c2 * self.y1 + self.c3 * self.y2
        };
        self.x1 = value;
        self.y2 = self.y1;
        self.y1 = out;
        self.seen += 1;
        out
    }
}
