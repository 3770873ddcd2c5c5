//! # Ultimate Strength Index
//!
//! RSI-style oscillator built on the UltimateSmoother. Per-bar up and down
//! strength are smoothed through two independent UltimateSmoother instances
//! with the same period, then combined into
//! `(usu - usd) / (usu + usd)`, bounded in [-1, 1].
//!
//! The ratio is only taken where the denominator is positive AND both
//! smoothed strengths exceed 0.01; everywhere else the oscillator reads 0.
//! The dual floor keeps flat and one-sided markets from amplifying noise,
//! so a clean monotonic ramp reads 0, not +1 (its down strength never
//! leaves the floor).
//!
//! ## Parameters
//! - **period**: Smoothing period for both strength series (defaults
//!   to 14). Must be >= 1.
//!
//! ## Errors
//! - **EmptyData**: usi: No input data.
//! - **AllValuesNaN**: usi: All input values are NaN.
//! - **InvalidPeriod**: usi: `period` is 0.
//!
//! ## Returns
//! - **`Ok(UsiOutput)`** on success, `values` matching the input length.
//! - **`Err(UsiError)`** otherwise.

use crate::indicators::ultimate_smoother::{
    ultimate_smoother, UltimateSmootherError, UltimateSmootherInput, UltimateSmootherParams,
    UltimateSmootherStream,
};
use crate::utilities::data_loader::{source_type, Candles};
use rayon::prelude::*;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum UsiData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct UsiOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct UsiParams {
    pub period: Option<usize>,
}

impl Default for UsiParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct UsiInput<'a> {
    pub data: UsiData<'a>,
    pub params: UsiParams,
}

impl<'a> UsiInput<'a> {
    #[inline]
    pub fn from_candles(candles: &'a Candles, source: &'a str, params: UsiParams) -> Self {
        Self {
            data: UsiData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: UsiParams) -> Self {
        Self {
            data: UsiData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", UsiParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

impl<'a> AsRef<[f64]> for UsiInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            UsiData::Slice(slice) => slice,
            UsiData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct UsiBuilder {
    period: Option<usize>,
}

impl UsiBuilder {
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
    pub fn apply(self, candles: &Candles) -> Result<UsiOutput, UsiError> {
        let params = UsiParams { period: self.period };
        usi(&UsiInput::from_candles(candles, "close", params))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<UsiOutput, UsiError> {
        let params = UsiParams { period: self.period };
        usi(&UsiInput::from_slice(data, params))
    }
    #[inline(always)]
    pub fn into_stream(self) -> Result<UsiStream, UsiError> {
        UsiStream::try_new(UsiParams { period: self.period })
    }
}

#[derive(Debug, Error)]
pub enum UsiError {
    #[error("usi: Empty data provided.")]
    EmptyData,
    #[error("usi: All values are NaN.")]
    AllValuesNaN,
    #[error("usi: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
    #[error("usi: UltimateSmoother error: {0}")]
    UltimateSmootherError(#[from] UltimateSmootherError),
}

/// Splits a price series into up-strength and down-strength series.
/// Index 0 of both is 0; a flat bar contributes 0 to both.
pub fn calculate_su_sd(prices: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = prices.len();
    let mut su = vec![0.0; n];
    let mut sd = vec![0.0; n];
    for i in 1..n {
        if prices[i] > prices[i - 1] {
            su[i] = prices[i] - prices[i - 1];
        } else if prices[i] < prices[i - 1] {
            sd[i] = prices[i - 1] - prices[i];
        }
    }
    (su, sd)
}

/// Indices `i` where the sign class (-1, 0, +1) changes between `values[i]`
/// and `values[i + 1]`.
pub fn zero_crossings(values: &[f64]) -> Vec<usize> {
    #[inline]
    fn sign(v: f64) -> i8 {
        if v > 0.0 {
            1
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    }
    let mut crossings = Vec::new();
    for i in 0..values.len().saturating_sub(1) {
        if sign(values[i]) != sign(values[i + 1]) {
            crossings.push(i);
        }
    }
    crossings
}

#[inline]
pub fn usi(input: &UsiInput) -> Result<UsiOutput, UsiError> {
    let data: &[f64] = input.as_ref();
    let len = data.len();
    let period = input.get_period();

    if len == 0 {
        return Err(UsiError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(UsiError::AllValuesNaN);
    }
    if period == 0 {
        return Err(UsiError::InvalidPeriod {
            period,
            data_len: len,
        });
    }

    let (su, sd) = calculate_su_sd(data);
    let smoother_params = UltimateSmootherParams {
        period: Some(period),
    };
    let usu = ultimate_smoother(&UltimateSmootherInput::from_slice(
        &su,
        smoother_params.clone(),
    ))?
    .values;
    let usd = ultimate_smoother(&UltimateSmootherInput::from_slice(&sd, smoother_params))?.values;

    let mut values = vec![0.0; len];
    for i in 0..len {
        let denom = usu[i] + usd[i];
        if denom > 0.0 && usu[i] > 0.01 && usd[i] > 0.01 {
            values[i] = (usu[i] - usd[i]) / denom;
        }
    }

    Ok(UsiOutput { values })
}

/// Incremental evaluation composing two [`UltimateSmootherStream`]s.
#[derive(Debug, Clone)]
pub struct UsiStream {
    up: UltimateSmootherStream,
    down: UltimateSmootherStream,
    prev: Option<f64>,
}

impl UsiStream {
    pub fn try_new(params: UsiParams) -> Result<Self, UsiError> {
        let period = params.period.unwrap_or(14);
        if period == 0 {
            return Err(UsiError::InvalidPeriod {
                period,
                data_len: 0,
            });
        }
        let smoother_params = UltimateSmootherParams {
            period: Some(period),
        };
        Ok(Self {
            up: UltimateSmootherStream::try_new(smoother_params.clone())?,
            down: UltimateSmootherStream::try_new(smoother_params)?,
            prev: None,
        })
    }

    #[inline(always)]
    pub fn update(&mut self, price: f64) -> f64 {
        let (su, sd) = match self.prev {
            Some(prev) => {
                if price > prev {
                    (price - prev, 0.0)
                } else if price < prev {
                    (0.0, prev - price)
                } else {
                    (0.0, 0.0)
                }
            }
            None => (0.0, 0.0),
        };
        self.prev = Some(price);
        let usu = self.up.update(su);
        let usd = self.down.update(sd);
        let denom = usu + usd;
        if denom > 0.0 && usu > 0.01 && usd > 0.01 {
            (usu - usd) / denom
        } else {
            0.0
        }
    }
}

#[derive(Clone, Debug)]
pub struct UsiBatchRange {
    pub period: (usize, usize, usize),
}

impl Default for UsiBatchRange {
    fn default() -> Self {
        Self {
            period: (14, 14, 0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UsiBatchBuilder {
    range: UsiBatchRange,
}

impl UsiBatchBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }
    #[inline(always)]
    pub fn period_range(mut self, start: usize, end: usize, step: usize) -> Self {
        self.range.period = (start, end, step);
        self
    }
    #[inline(always)]
    pub fn period_static(mut self, period: usize) -> Self {
        self.range.period = (period, period, 0);
        self
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<UsiBatchOutput, UsiError> {
        usi_batch_slice(data, &self.range)
    }
    #[inline(always)]
    pub fn apply_candles(
        self,
        candles: &Candles,
        source: &str,
    ) -> Result<UsiBatchOutput, UsiError> {
        usi_batch(candles, source, &self.range)
    }
}

/// Row-major sweep output: one row per parameter combo.
#[derive(Clone, Debug)]
pub struct UsiBatchOutput {
    pub values: Vec<f64>,
    pub combos: Vec<UsiParams>,
    pub rows: usize,
    pub cols: usize,
}

impl UsiBatchOutput {
    pub fn row_for_params(&self, params: &UsiParams) -> Option<usize> {
        let period = params.period.unwrap_or(14);
        self.combos
            .iter()
            .position(|c| c.period.unwrap_or(14) == period)
    }
    pub fn values_for(&self, params: &UsiParams) -> Option<&[f64]> {
        self.row_for_params(params).map(|row| {
            let start = row * self.cols;
            &self.values[start..start + self.cols]
        })
    }
}

fn expand_grid(range: &UsiBatchRange) -> Vec<UsiParams> {
    fn axis_usize((start, end, step): (usize, usize, usize)) -> Vec<usize> {
        if step == 0 || start == end {
            return vec![start];
        }
        let mut values = Vec::new();
        let mut current = start;
        while current <= end {
            values.push(current);
            current += step;
        }
        values
    }
    axis_usize(range.period)
        .into_iter()
        .map(|p| UsiParams { period: Some(p) })
        .collect()
}

fn smooth_into(data: &[f64], period: usize, out: &mut [f64]) {
    let a1 = (-1.414 * PI / period as f64).exp();
    let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
    let c2 = b1;
    let c3 = -(a1 * a1);
    let c1 = (1.0 + c2 - c3) / 4.0;

    let seed = out.len().min(3);
    out[..seed].copy_from_slice(&data[..seed]);
    for i in 3..out.len() {
        out[i] = (1.0 - c1) * data[i] + (2.0 * c1 - c2) * data[i - 1]
            - (c1 + c3) * data[i - 2]
            + c2 * out[i - 1]
            + c3 * out[i - 2];
    }
}

pub fn usi_batch(
    candles: &Candles,
    source: &str,
    range: &UsiBatchRange,
) -> Result<UsiBatchOutput, UsiError> {
    let data = source_type(candles, source);
    usi_batch_slice(data, range)
}

pub fn usi_batch_slice(data: &[f64], range: &UsiBatchRange) -> Result<UsiBatchOutput, UsiError> {
    let len = data.len();
    if len == 0 {
        return Err(UsiError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(UsiError::AllValuesNaN);
    }

    let combos = expand_grid(range);
    for combo in &combos {
        let period = combo.period.unwrap_or(14);
        if period == 0 {
            return Err(UsiError::InvalidPeriod {
                period,
                data_len: len,
            });
        }
    }

    // The strength split does not depend on the period; share it across rows.
    let (su, sd) = calculate_su_sd(data);

    let rows = combos.len();
    let cols = len;
    let mut values = vec![0.0; rows * cols];

    values
        .par_chunks_mut(cols)
        .zip(combos.par_iter())
        .for_each(|(row, combo)| {
            let period = combo.period.unwrap_or(14);
            let mut usu = vec![0.0; cols];
            let mut usd = vec![0.0; cols];
            smooth_into(&su, period, &mut usu);
            smooth_into(&sd, period, &mut usd);
            for i in 0..cols {
                let denom = usu[i] + usd[i];
                if denom > 0.0 && usu[i] > 0.01 && usd[i] > 0.01 {
                    row[i] = (usu[i] - usd[i]) / denom;
                }
            }
        });

    Ok(UsiBatchOutput {
        values,
        combos,
        rows,
        cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::data_loader::read_candles_from_csv;

    #[test]
    fn test_usi_accuracy() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UsiInput::with_default_candles(&candles);
        let result = usi(&input).expect("usi failed");

        assert_eq!(result.values.len(), candles.close.len());

        let expected_last_five = [
            -0.714927309207159,
            0.13932632000283826,
            0.12719647568921036,
            -0.150277898649472,
            0.2149477171505978,
        ];
        let start = result.values.len() - 5;
        for (i, &value) in result.values[start..].iter().enumerate() {
            assert!(
                (value - expected_last_five[i]).abs() < 1e-9,
                "usi mismatch at index {}: expected {}, got {}",
                i,
                expected_last_five[i],
                value
            );
        }
    }

    #[test]
    fn test_usi_accuracy_period_28() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UsiInput::from_candles(&candles, "close", UsiParams { period: Some(28) });
        let result = usi(&input).expect("usi failed");

        // The dual floor parks long stretches of the slower variant at 0.
        let start = result.values.len() - 5;
        for &value in &result.values[start..start + 4] {
            assert_eq!(value, 0.0);
        }
        let last = result.values[result.values.len() - 1];
        assert!(
            (last - 0.5120766678075361).abs() < 1e-9,
            "usi(28) last value mismatch: {}",
            last
        );
    }

    #[test]
    fn test_calculate_su_sd_ramp() {
        let prices: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let (su, sd) = calculate_su_sd(&prices);
        assert_eq!(su, vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(sd, vec![0.0; 10]);
    }

    #[test]
    fn test_usi_one_sided_series_is_zero() {
        let ramp: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let result = usi(&UsiInput::from_slice(&ramp, UsiParams::default())).expect("usi failed");
        assert!(result.values.iter().all(|&v| v == 0.0));

        let flat = vec![5.0; 30];
        let result = usi(&UsiInput::from_slice(&flat, UsiParams::default())).expect("usi failed");
        assert!(result.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_usi_bounded_with_sign_flips() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let result = usi(&UsiInput::with_default_candles(&candles)).expect("usi failed");
        assert!(result.values.iter().all(|&v| (-1.0..=1.0).contains(&v)));

        let crossings = zero_crossings(&result.values);
        assert_eq!(crossings.len(), 520);
        assert_eq!(&crossings[..5], &[4, 5, 6, 11, 12]);
        assert_eq!(crossings[crossings.len() - 1], 1093);
    }

    #[test]
    fn test_usi_noisy_uptrend() {
        let prices: Vec<f64> = (0..120)
            .map(|i| 100.0 + 0.5 * i as f64 + 2.0 * (0.9 * i as f64).sin())
            .collect();
        let result = usi(&UsiInput::from_slice(&prices, UsiParams::default())).expect("usi failed");
        assert!(result.values.iter().all(|&v| (-1.0..=1.0).contains(&v)));

        let expected_last_five = [
            0.8537546953560758,
            -0.8734565484705311,
            0.0,
            0.0,
            0.7709977458635824,
        ];
        let start = result.values.len() - 5;
        for (i, &value) in result.values[start..].iter().enumerate() {
            assert!(
                (value - expected_last_five[i]).abs() < 1e-9,
                "usi mismatch at index {}: expected {}, got {}",
                i,
                expected_last_five[i],
                value
            );
        }
    }

    #[test]
    fn test_zero_crossings_sign_classes() {
        let values = [1.0, -1.0, -2.0, 0.0, 3.0];
        assert_eq!(zero_crossings(&values), vec![0, 2, 3]);
        assert!(zero_crossings(&[]).is_empty());
        assert!(zero_crossings(&[1.0]).is_empty());
    }

    #[test]
    fn test_usi_stream_matches_batch() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let batch = usi(&UsiInput::with_default_candles(&candles)).expect("usi failed");

        let mut stream = UsiStream::try_new(UsiParams::default()).expect("stream init failed");
        for (i, &price) in candles.close.iter().enumerate() {
            let value = stream.update(price);
            assert!(
                (value - batch.values[i]).abs() < 1e-9,
                "stream diverged at index {}: batch {}, stream {}",
                i,
                batch.values[i],
                value
            );
        }
    }

    #[test]
    fn test_usi_batch_matches_single() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let batch = UsiBatchBuilder::new()
            .period_range(10, 30, 2)
            .apply_candles(&candles, "close")
            .expect("batch failed");

        assert_eq!(batch.rows, 11);
        assert_eq!(batch.cols, candles.close.len());

        let row = batch
            .values_for(&UsiParams { period: Some(14) })
            .expect("period 14 missing from sweep");
        let single = usi(&UsiInput::with_default_candles(&candles)).expect("usi failed");
        for (i, (&a, &b)) in row.iter().zip(single.values.iter()).enumerate() {
            assert!(
                (a - b).abs() < 1e-12,
                "batch row diverged from single run at index {}",
                i
            );
        }
    }

    #[test]
    fn test_usi_partial_params_uses_default() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UsiInput::from_candles(&candles, "close", UsiParams { period: None });
        let with_none = usi(&input).expect("usi failed");
        let with_default =
            usi(&UsiInput::with_default_candles(&candles)).expect("usi failed");
        assert_eq!(with_none.values, with_default.values);
    }

    #[test]
    fn test_usi_empty_data() {
        let data: [f64; 0] = [];
        let input = UsiInput::from_slice(&data, UsiParams::default());
        assert!(matches!(usi(&input), Err(UsiError::EmptyData)));
    }

    #[test]
    fn test_usi_all_nan() {
        let data = [f64::NAN, f64::NAN, f64::NAN];
        let input = UsiInput::from_slice(&data, UsiParams::default());
        assert!(matches!(usi(&input), Err(UsiError::AllValuesNaN)));
    }

    #[test]
    fn test_usi_zero_period() {
        let data = [1.0, 2.0, 3.0];
        let input = UsiInput::from_slice(&data, UsiParams { period: Some(0) });
        match usi(&input) {
            Err(UsiError::InvalidPeriod { period, data_len }) => {
                assert_eq!(period, 0);
                assert_eq!(data_len, 3);
            }
            _ => panic!("Expected InvalidPeriod error"),
        }
    }

    #[test]
    fn test_usi_builder() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let from_builder = UsiBuilder::new()
            .period(14)
            .apply(&candles)
            .expect("builder apply failed");
        let direct = usi(&UsiInput::with_default_candles(&candles)).expect("usi failed");
        assert_eq!(from_builder.values, direct.values);
    }
}
