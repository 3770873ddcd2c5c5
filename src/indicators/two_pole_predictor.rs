//! # Two-Pole Predictor
//!
//! Fixed-coefficient counterpart to the adaptive Griffiths predictor. The
//! band-limit chain is pinned at highpass 15 / lowpass 30, and the forecast
//! comes from a normalized two-pole recursion driven by a single pole
//! parameter `q` (default 0.35; values in (0, 1) are expected but not
//! checked, the caller owns that choice). The first two outputs are 0.
//!
//! ## Errors
//! - **EmptyData**: two_pole_predictor: No input data.
//! - **AllValuesNaN**: two_pole_predictor: All input values are NaN.

use crate::indicators::highpass::{highpass, HighPassError, HighPassInput, HighPassParams};
use crate::indicators::supersmoother::{
    supersmoother, SuperSmootherError, SuperSmootherInput, SuperSmootherParams,
};
use crate::utilities::data_loader::{source_type, Candles};
use thiserror::Error;

const HIGHPASS_PERIOD: usize = 15;
const LOWPASS_PERIOD: usize = 30;

#[derive(Debug, Clone)]
pub enum TwoPolePredictorData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct TwoPolePredictorOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct TwoPolePredictorParams {
    pub q: Option<f64>,
}

impl Default for TwoPolePredictorParams {
    fn default() -> Self {
        Self { q: Some(0.35) }
    }
}

#[derive(Debug, Clone)]
pub struct TwoPolePredictorInput<'a> {
    pub data: TwoPolePredictorData<'a>,
    pub params: TwoPolePredictorParams,
}

impl<'a> TwoPolePredictorInput<'a> {
    #[inline]
    pub fn from_candles(
        candles: &'a Candles,
        source: &'a str,
        params: TwoPolePredictorParams,
    ) -> Self {
        Self {
            data: TwoPolePredictorData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: TwoPolePredictorParams) -> Self {
        Self {
            data: TwoPolePredictorData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", TwoPolePredictorParams::default())
    }
    #[inline]
    pub fn get_q(&self) -> f64 {
        self.params.q.unwrap_or(0.35)
    }
}

impl<'a> AsRef<[f64]> for TwoPolePredictorInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            TwoPolePredictorData::Slice(slice) => slice,
            TwoPolePredictorData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TwoPolePredictorBuilder {
    q: Option<f64>,
}

impl TwoPolePredictorBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn q(mut self, q: f64) -> Self {
        self.q = Some(q);
        self
    }
    #[inline(always)]
    pub fn apply(self, candles: &Candles) -> Result<TwoPolePredictorOutput, TwoPolePredictorError> {
        let params = TwoPolePredictorParams { q: self.q };
        two_pole_predictor(&TwoPolePredictorInput::from_candles(candles, "close", params))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<TwoPolePredictorOutput, TwoPolePredictorError> {
        let params = TwoPolePredictorParams { q: self.q };
        two_pole_predictor(&TwoPolePredictorInput::from_slice(data, params))
    }
}

#[derive(Debug, Error)]
pub enum TwoPolePredictorError {
    #[error("two_pole_predictor: Empty data provided.")]
    EmptyData,
    #[error("two_pole_predictor: All values are NaN.")]
    AllValuesNaN,
    #[error("two_pole_predictor: Highpass error: {0}")]
    HighpassError(#[from] HighPassError),
    #[error("two_pole_predictor: SuperSmoother error: {0}")]
    SuperSmootherError(#[from] SuperSmootherError),
}

#[inline]
pub fn two_pole_predictor(
    input: &TwoPolePredictorInput,
) -> Result<TwoPolePredictorOutput, TwoPolePredictorError> {
    let data: &[f64] = input.as_ref();
    let len = data.len();
    let q = input.get_q();

    if len == 0 {
        return Err(TwoPolePredictorError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(TwoPolePredictorError::AllValuesNaN);
    }

    let hp = highpass(&HighPassInput::from_slice(
        data,
        HighPassParams {
            period: Some(HIGHPASS_PERIOD),
        },
    ))?
    .values;
    let lp = supersmoother(&SuperSmootherInput::from_slice(
        &hp,
        SuperSmootherParams {
            period: Some(LOWPASS_PERIOD),
        },
    ))?
    .values;

    let c1 = 1.8 * q;
    let c2 = -(q * q);
    let sum_coeffs = 1.0 - c1 - c2;
    let c0 = 1.0 / sum_coeffs;
    let c1 = c1 / sum_coeffs;
    let c2 = c2 / sum_coeffs;

    let mut values = vec![0.0; len];
    for i in 2..len {
        values[i] = c0 * lp[i] - c1 * lp[i - 1] - c2 * lp[i - 2];
    }

    Ok(TwoPolePredictorOutput { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::data_loader::read_candles_from_csv;

    #[test]
    fn test_two_pole_predictor_accuracy() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = TwoPolePredictorInput::with_default_candles(&candles);
        let result = two_pole_predictor(&input).expect("two_pole_predictor failed");

        assert_eq!(result.values.len(), candles.close.len());
        assert_eq!(result.values[0], 0.0);
        assert_eq!(result.values[1], 0.0);

        let expected_last_five = [
            -31.61766992005152,
            327.0458365938632,
            -567.730352965003,
            488.1361487532375,
            166.95535018809858,
        ];
        let start = result.values.len() - 5;
        for (i, &value) in result.values[start..].iter().enumerate() {
            assert!(
                (value - expected_last_five[i]).abs() < 1e-6,
                "two_pole_predictor mismatch at index {}: expected {}, got {}",
                i,
                expected_last_five[i],
                value
            );
        }
    }

    #[test]
    fn test_two_pole_predictor_short_series_is_zero() {
        let data = [42.0, 43.0];
        let result = two_pole_predictor(&TwoPolePredictorInput::from_slice(
            &data,
            TwoPolePredictorParams::default(),
        ))
        .expect("two_pole_predictor failed");
        assert_eq!(result.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_two_pole_predictor_partial_params_uses_default() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = TwoPolePredictorInput::from_candles(
            &candles,
            "close",
            TwoPolePredictorParams { q: None },
        );
        let with_none = two_pole_predictor(&input).expect("two_pole_predictor failed");
        let with_default =
            two_pole_predictor(&TwoPolePredictorInput::with_default_candles(&candles))
                .expect("two_pole_predictor failed");
        assert_eq!(with_none.values, with_default.values);
    }

    #[test]
    fn test_two_pole_predictor_builder_q_passthrough() {
        let data: Vec<f64> = (0..120)
            .map(|i| (i as f64 * 0.25).sin() * 75.0 + 1500.0)
            .collect();
        let from_builder = TwoPolePredictorBuilder::new()
            .q(0.5)
            .apply_slice(&data)
            .expect("builder apply failed");
        let direct = two_pole_predictor(&TwoPolePredictorInput::from_slice(
            &data,
            TwoPolePredictorParams { q: Some(0.5) },
        ))
        .expect("two_pole_predictor failed");
        assert_eq!(from_builder.values, direct.values);
    }

    #[test]
    fn test_two_pole_predictor_accepts_out_of_range_q() {
        let data: Vec<f64> = (0..60).map(|i| 10.0 + (i as f64 * 0.5).cos()).collect();
        let result = two_pole_predictor(&TwoPolePredictorInput::from_slice(
            &data,
            TwoPolePredictorParams { q: Some(1.5) },
        ))
        .expect("q is not validated");
        assert!(result.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_two_pole_predictor_empty_data() {
        let data: [f64; 0] = [];
        let input = TwoPolePredictorInput::from_slice(&data, TwoPolePredictorParams::default());
        assert!(matches!(
            two_pole_predictor(&input),
            Err(TwoPolePredictorError::EmptyData)
        ));
    }

    #[test]
    fn test_two_pole_predictor_all_nan() {
        let data = [f64::NAN, f64::NAN, f64::NAN, f64::NAN];
        let input = TwoPolePredictorInput::from_slice(&data, TwoPolePredictorParams::default());
        assert!(matches!(
            two_pole_predictor(&input),
            Err(TwoPolePredictorError::AllValuesNaN)
        ));
    }
}
