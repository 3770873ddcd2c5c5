//! # Griffiths Predictor
//!
//! Adaptive one-step-ahead predictor over the band-limited price signal.
//! Prices run through the cross-assigned highpass/lowpass pair, the result
//! is normalized by a running peak, and an LMS filter of `length` weights
//! adapts sample by sample. Each bar's prediction is taken before the
//! weight update, so the series is a true out-of-sample one-step forecast.
//!
//! After the in-sample pass the filter extrapolates `bars_fwd` bars ahead
//! by feeding each forecast back into its own history window. Compounded
//! error over the horizon is expected; the feedback loop is the forecast
//! mechanism, not a defect.
//!
//! Input shorter than `length` is a valid degenerate case: the adaptive
//! loop never runs and every output stays zero.
//!
//! ## Parameters
//! - **length**: LMS window and weight count (defaults to 18). Must be >= 1.
//! - **lower_bound**: Lowpass period (defaults to 18). Must be >= 1 and
//!   < `upper_bound`.
//! - **upper_bound**: Highpass period (defaults to 40).
//! - **bars_fwd**: Forecast horizon in bars (defaults to 2). 0 disables the
//!   extrapolation.
//!
//! ## Errors
//! - **EmptyData**: griffiths_predictor: No input data.
//! - **AllValuesNaN**: griffiths_predictor: All input values are NaN.
//! - **InvalidBounds**: griffiths_predictor: Degenerate cycle band.
//! - **InvalidLength**: griffiths_predictor: `length` is 0.
//!
//! ## Returns
//! - **`Ok(GriffithsPredictorOutput)`**: `predictions` matching the input
//!   length plus `future_signals` of `bars_fwd` entries.
//! - **`Err(GriffithsPredictorError)`** otherwise.

use crate::indicators::highpass::{highpass, HighPassError, HighPassInput, HighPassParams};
use crate::indicators::supersmoother::{
    supersmoother, SuperSmootherError, SuperSmootherInput, SuperSmootherParams,
};
use crate::utilities::data_loader::{source_type, Candles};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum GriffithsPredictorData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct GriffithsPredictorOutput {
    pub predictions: Vec<f64>,
    pub future_signals: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct GriffithsPredictorParams {
    pub length: Option<usize>,
    pub lower_bound: Option<usize>,
    pub upper_bound: Option<usize>,
    pub bars_fwd: Option<usize>,
}

impl Default for GriffithsPredictorParams {
    fn default() -> Self {
        Self {
            length: Some(18),
            lower_bound: Some(18),
            upper_bound: Some(40),
            bars_fwd: Some(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GriffithsPredictorInput<'a> {
    pub data: GriffithsPredictorData<'a>,
    pub params: GriffithsPredictorParams,
}

impl<'a> GriffithsPredictorInput<'a> {
    #[inline]
    pub fn from_candles(
        candles: &'a Candles,
        source: &'a str,
        params: GriffithsPredictorParams,
    ) -> Self {
        Self {
            data: GriffithsPredictorData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: GriffithsPredictorParams) -> Self {
        Self {
            data: GriffithsPredictorData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", GriffithsPredictorParams::default())
    }
    #[inline]
    pub fn get_length(&self) -> usize {
        self.params.length.unwrap_or(18)
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
    pub fn get_bars_fwd(&self) -> usize {
        self.params.bars_fwd.unwrap_or(2)
    }
}

impl<'a> AsRef<[f64]> for GriffithsPredictorInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            GriffithsPredictorData::Slice(slice) => slice,
            GriffithsPredictorData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct GriffithsPredictorBuilder {
    length: Option<usize>,
    lower_bound: Option<usize>,
    upper_bound: Option<usize>,
    bars_fwd: Option<usize>,
}

impl GriffithsPredictorBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn length(mut self, n: usize) -> Self {
        self.length = Some(n);
        self
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
    pub fn bars_fwd(mut self, n: usize) -> Self {
        self.bars_fwd = Some(n);
        self
    }
    #[inline(always)]
    fn params(self) -> GriffithsPredictorParams {
        GriffithsPredictorParams {
            length: self.length,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            bars_fwd: self.bars_fwd,
        }
    }
    #[inline(always)]
    pub fn apply(
        self,
        candles: &Candles,
    ) -> Result<GriffithsPredictorOutput, GriffithsPredictorError> {
        griffiths_predictor(&GriffithsPredictorInput::from_candles(
            candles,
            "close",
            self.params(),
        ))
    }
    #[inline(always)]
    pub fn apply_slice(
        self,
        data: &[f64],
    ) -> Result<GriffithsPredictorOutput, GriffithsPredictorError> {
        griffiths_predictor(&GriffithsPredictorInput::from_slice(data, self.params()))
    }
    #[inline(always)]
    pub fn into_predictor(self) -> Result<GriffithsPredictor, GriffithsPredictorError> {
        GriffithsPredictor::try_new(self.params())
    }
}

#[derive(Debug, Error)]
pub enum GriffithsPredictorError {
    #[error("griffiths_predictor: Empty data provided.")]
    EmptyData,
    #[error("griffiths_predictor: All values are NaN.")]
    AllValuesNaN,
    #[error(
        "griffiths_predictor: Invalid bounds: lower_bound = {lower_bound}, upper_bound = {upper_bound}"
    )]
    InvalidBounds {
        lower_bound: usize,
        upper_bound: usize,
    },
    #[error("griffiths_predictor: Invalid length: length = {length}")]
    InvalidLength { length: usize },
    #[error("griffiths_predictor: Highpass error: {0}")]
    HighpassError(#[from] HighPassError),
    #[error("griffiths_predictor: SuperSmoother error: {0}")]
    SuperSmootherError(#[from] SuperSmootherError),
}

/// Reusable predictor holding the running peak between calls.
#[derive(Debug, Clone)]
pub struct GriffithsPredictor {
    length: usize,
    lower_bound: usize,
    upper_bound: usize,
    bars_fwd: usize,
    peak: f64,
}

impl GriffithsPredictor {
    pub fn try_new(params: GriffithsPredictorParams) -> Result<Self, GriffithsPredictorError> {
        let length = params.length.unwrap_or(18);
        let lower_bound = params.lower_bound.unwrap_or(18);
        let upper_bound = params.upper_bound.unwrap_or(40);
        let bars_fwd = params.bars_fwd.unwrap_or(2);
        if lower_bound == 0 || lower_bound >= upper_bound {
            return Err(GriffithsPredictorError::InvalidBounds {
                lower_bound,
                upper_bound,
            });
        }
        if length == 0 {
            return Err(GriffithsPredictorError::InvalidLength { length });
        }
        Ok(Self {
            length,
            lower_bound,
            upper_bound,
            bars_fwd,
            peak: 0.1,
        })
    }

    /// Current normalization peak. Starts at the 0.1 floor and only grows.
    #[inline]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    pub fn predict(
        &mut self,
        prices: &[f64],
    ) -> Result<GriffithsPredictorOutput, GriffithsPredictorError> {
        let len = prices.len();
        if len == 0 {
            return Err(GriffithsPredictorError::EmptyData);
        }
        if prices.iter().all(|v| v.is_nan()) {
            return Err(GriffithsPredictorError::AllValuesNaN);
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

        let mu = 1.0 / self.length as f64;
        let mut xx = vec![0.0; self.length];
        let mut coef = vec![0.0; self.length];
        let mut predictions = vec![0.0; len];

        for t in self.length..lp.len() {
            let magnitude = lp[t].abs();
            if magnitude > self.peak {
                self.peak = magnitude;
            }
            let signal = if self.peak != 0.0 { lp[t] / self.peak } else { 0.0 };

            xx.copy_within(1.., 0);
            xx[self.length - 1] = signal;

            let mut prediction = 0.0;
            for k in 0..self.length {
                prediction += xx[k] * coef[k];
            }
            predictions[t] = prediction;

            let error = signal - prediction;
            for k in 0..self.length {
                coef[k] += mu * error * xx[k];
            }
        }

        // Each forecast re-enters the window as if it had been observed.
        let mut future_signals = vec![0.0; self.bars_fwd];
        for slot in future_signals.iter_mut() {
            let mut future = 0.0;
            for k in 0..self.length {
                future += xx[k] * coef[k];
            }
            *slot = future;
            xx.copy_within(1.., 0);
            xx[self.length - 1] = future;
        }

        Ok(GriffithsPredictorOutput {
            predictions,
            future_signals,
        })
    }
}

#[inline]
pub fn griffiths_predictor(
    input: &GriffithsPredictorInput,
) -> Result<GriffithsPredictorOutput, GriffithsPredictorError> {
    let data: &[f64] = input.as_ref();
    let mut predictor = GriffithsPredictor::try_new(input.params.clone())?;
    predictor.predict(data)
}
