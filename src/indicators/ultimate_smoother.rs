//! # Ultimate Smoother
//!
//! Lowpass smoother built by subtracting a highpass response from unity,
//! which keeps the passband essentially lag-free. The first three outputs
//! pass the input through unchanged while the recursion warms up.
//!
//! Uses the shared pipeline coefficient family (`1.414` damping, `b1`
//! angle in the published mixed units).
//!
//! ## Parameters
//! - **period**: Critical period (defaults to 14). Must be >= 1.
//!
//! ## Errors
//! - **EmptyData**: ultimate_smoother: No input data.
//! - **AllValuesNaN**: ultimate_smoother: All input values are NaN.
//! - **InvalidPeriod**: ultimate_smoother: `period` is 0.
//!
//! ## Returns
//! - **`Ok(UltimateSmootherOutput)`** on success, `values` matching the
//!   input length.
//! - **`Err(UltimateSmootherError)`** otherwise.

use crate::utilities::data_loader::{source_type, Candles};
use rayon::prelude::*;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum UltimateSmootherData<'a> {
    Candles {
        candles: &'a Candles,
        source: &'a str,
    },
    Slice(&'a [f64]),
}

#[derive(Debug, Clone)]
pub struct UltimateSmootherOutput {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct UltimateSmootherParams {
    pub period: Option<usize>,
}

impl Default for UltimateSmootherParams {
    fn default() -> Self {
        Self { period: Some(14) }
    }
}

#[derive(Debug, Clone)]
pub struct UltimateSmootherInput<'a> {
    pub data: UltimateSmootherData<'a>,
    pub params: UltimateSmootherParams,
}

impl<'a> UltimateSmootherInput<'a> {
    #[inline]
    pub fn from_candles(
        candles: &'a Candles,
        source: &'a str,
        params: UltimateSmootherParams,
    ) -> Self {
        Self {
            data: UltimateSmootherData::Candles { candles, source },
            params,
        }
    }
    #[inline]
    pub fn from_slice(slice: &'a [f64], params: UltimateSmootherParams) -> Self {
        Self {
            data: UltimateSmootherData::Slice(slice),
            params,
        }
    }
    #[inline]
    pub fn with_default_candles(candles: &'a Candles) -> Self {
        Self::from_candles(candles, "close", UltimateSmootherParams::default())
    }
    #[inline]
    pub fn get_period(&self) -> usize {
        self.params.period.unwrap_or(14)
    }
}

impl<'a> AsRef<[f64]> for UltimateSmootherInput<'a> {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] {
        match &self.data {
            UltimateSmootherData::Slice(slice) => slice,
            UltimateSmootherData::Candles { candles, source } => source_type(candles, source),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct UltimateSmootherBuilder {
    period: Option<usize>,
}

impl UltimateSmootherBuilder {
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
    pub fn apply(self, candles: &Candles) -> Result<UltimateSmootherOutput, UltimateSmootherError> {
        let params = UltimateSmootherParams { period: self.period };
        ultimate_smoother(&UltimateSmootherInput::from_candles(candles, "close", params))
    }
    #[inline(always)]
    pub fn apply_slice(self, data: &[f64]) -> Result<UltimateSmootherOutput, UltimateSmootherError> {
        let params = UltimateSmootherParams { period: self.period };
        ultimate_smoother(&UltimateSmootherInput::from_slice(data, params))
    }
    #[inline(always)]
    pub fn into_stream(self) -> Result<UltimateSmootherStream, UltimateSmootherError> {
        UltimateSmootherStream::try_new(UltimateSmootherParams { period: self.period })
    }
}

#[derive(Debug, Error)]
pub enum UltimateSmootherError {
    #[error("ultimate_smoother: Empty data provided.")]
    EmptyData,
    #[error("ultimate_smoother: All values are NaN.")]
    AllValuesNaN,
    #[error("ultimate_smoother: Invalid period: period = {period}, data length = {data_len}")]
    InvalidPeriod { period: usize, data_len: usize },
}

#[inline]
pub fn ultimate_smoother(
    input: &UltimateSmootherInput,
) -> Result<UltimateSmootherOutput, UltimateSmootherError> {
    let data: &[f64] = input.as_ref();
    let len = data.len();
    let period = input.get_period();

    if len == 0 {
        return Err(UltimateSmootherError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(UltimateSmootherError::AllValuesNaN);
    }
    if period == 0 {
        return Err(UltimateSmootherError::InvalidPeriod {
            period,
            data_len: len,
        });
    }

    let a1 = (-1.414 * PI / period as f64).exp();
    let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
    let c2 = b1;
    let c3 = -(a1 * a1);
    let c1 = (1.0 + c2 - c3) / 4.0;

    let mut values = vec![0.0; len];
    let seed = len.min(3);
    values[..seed].copy_from_slice(&data[..seed]);
    for i in 3..len {
        values[i] = (1.0 - c1) * data[i] + (2.0 * c1 - c2) * data[i - 1]
            - (c1 + c3) * data[i - 2]
            + c2 * values[i - 1]
            + c3 * values[i - 2];
    }

    Ok(UltimateSmootherOutput { values })
}

/// Incremental evaluation with the same three-sample warmup as
/// [`ultimate_smoother`].
#[derive(Debug, Clone)]
pub struct UltimateSmootherStream {
    c1: f64,
    c2: f64,
    c3: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    seen: usize,
}

impl UltimateSmootherStream {
    pub fn try_new(params: UltimateSmootherParams) -> Result<Self, UltimateSmootherError> {
        let period = params.period.unwrap_or(14);
        if period == 0 {
            return Err(UltimateSmootherError::InvalidPeriod {
                period,
                data_len: 0,
            });
        }
        let a1 = (-1.414 * PI / period as f64).exp();
        let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
        let c2 = b1;
        let c3 = -(a1 * a1);
        Ok(Self {
            c1: (1.0 + c2 - c3) / 4.0,
            c2,
            c3,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            seen: 0,
        })
    }

    #[inline(always)]
    pub fn update(&mut self, value: f64) -> f64 {
        let out = if self.seen < 3 {
            value
        } else {
            (1.0 - self.c1) * value + (2.0 * self.c1 - self.c2) * self.x1
                - (self.c1 + self.c3) * self.x2
                + self.c2 * self.y1
                + self.c3 * self.y2
        };
        self.x2 = self.x1;
        self.x1 = value;
        self.y2 = self.y1;
        self.y1 = out;
        self.seen += 1;
        out
    }
}

#[derive(Clone, Debug)]
pub struct UltimateSmootherBatchRange {
    pub period: (usize, usize, usize),
}

impl Default for UltimateSmootherBatchRange {
    fn default() -> Self {
        Self {
            period: (14, 14, 0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UltimateSmootherBatchBuilder {
    range: UltimateSmootherBatchRange,
}

impl UltimateSmootherBatchBuilder {
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
    pub fn apply_slice(
        self,
        data: &[f64],
    ) -> Result<UltimateSmootherBatchOutput, UltimateSmootherError> {
        ultimate_smoother_batch_slice(data, &self.range)
    }
    #[inline(always)]
    pub fn apply_candles(
        self,
        candles: &Candles,
        source: &str,
    ) -> Result<UltimateSmootherBatchOutput, UltimateSmootherError> {
        ultimate_smoother_batch(candles, source, &self.range)
    }
}

/// Row-major sweep output: one row per parameter combo.
#[derive(Clone, Debug)]
pub struct UltimateSmootherBatchOutput {
    pub values: Vec<f64>,
    pub combos: Vec<UltimateSmootherParams>,
    pub rows: usize,
    pub cols: usize,
}

impl UltimateSmootherBatchOutput {
    pub fn row_for_params(&self, params: &UltimateSmootherParams) -> Option<usize> {
        let period = params.period.unwrap_or(14);
        self.combos
            .iter()
            .position(|c| c.period.unwrap_or(14) == period)
    }
    pub fn values_for(&self, params: &UltimateSmootherParams) -> Option<&[f64]> {
        self.row_for_params(params).map(|row| {
            let start = row * self.cols;
            &self.values[start..start + self.cols]
        })
    }
}

fn expand_grid(range: &UltimateSmootherBatchRange) -> Vec<UltimateSmootherParams> {
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
        .map(|p| UltimateSmootherParams { period: Some(p) })
        .collect()
}

pub fn ultimate_smoother_batch(
    candles: &Candles,
    source: &str,
    range: &UltimateSmootherBatchRange,
) -> Result<UltimateSmootherBatchOutput, UltimateSmootherError> {
    let data = source_type(candles, source);
    ultimate_smoother_batch_slice(data, range)
}

pub fn ultimate_smoother_batch_slice(
    data: &[f64],
    range: &UltimateSmootherBatchRange,
) -> Result<UltimateSmootherBatchOutput, UltimateSmootherError> {
    let len = data.len();
    if len == 0 {
        return Err(UltimateSmootherError::EmptyData);
    }
    if data.iter().all(|v| v.is_nan()) {
        return Err(UltimateSmootherError::AllValuesNaN);
    }

    let combos = expand_grid(range);
    for combo in &combos {
        let period = combo.period.unwrap_or(14);
        if period == 0 {
            return Err(UltimateSmootherError::InvalidPeriod {
                period,
                data_len: len,
            });
        }
    }

    let rows = combos.len();
    let cols = len;
    let mut values = vec![0.0; rows * cols];

    values
        .par_chunks_mut(cols)
        .zip(combos.par_iter())
        .for_each(|(row, combo)| {
            let period = combo.period.unwrap_or(14);
            let a1 = (-1.414 * PI / period as f64).exp();
            let b1 = 2.0 * a1 * (1.414 * 180.0 / period as f64).cos();
            let c2 = b1;
            let c3 = -(a1 * a1);
            let c1 = (1.0 + c2 - c3) / 4.0;

            let seed = cols.min(3);
            row[..seed].copy_from_slice(&data[..seed]);
            for i in 3..cols {
                row[i] = (1.0 - c1) * data[i] + (2.0 * c1 - c2) * data[i - 1]
                    - (c1 + c3) * data[i - 2]
                    + c2 * row[i - 1]
                    + c3 * row[i - 2];
            }
        });

    Ok(UltimateSmootherBatchOutput {
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
    fn test_ultimate_smoother_accuracy() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UltimateSmootherInput::with_default_candles(&candles);
        let result = ultimate_smoother(&input).expect("ultimate_smoother failed");

        assert_eq!(result.values.len(), candles.close.len());

        let expected_last_five = [
            16527.38203592252,
            16549.009165073898,
            16579.376634657252,
            16545.188115609555,
            16578.367411957894,
        ];
        let start = result.values.len() - 5;
        for (i, &value) in result.values[start..].iter().enumerate() {
            assert!(
                (value - expected_last_five[i]).abs() < 1e-6,
                "ultimate_smoother mismatch at index {}: expected {}, got {}",
                i,
                expected_last_five[i],
                value
            );
        }
    }

    #[test]
    fn test_ultimate_smoother_accuracy_period_28() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UltimateSmootherInput::from_candles(
            &candles,
            "close",
            UltimateSmootherParams { period: Some(28) },
        );
        let result = ultimate_smoother(&input).expect("ultimate_smoother failed");

        let expected_last_five = [
            16274.519662404453,
            16821.126340945706,
            16376.921935582594,
            16583.155138500006,
            16665.188985607805,
        ];
        let start = result.values.len() - 5;
        for (i, &value) in result.values[start..].iter().enumerate() {
            assert!(
                (value - expected_last_five[i]).abs() < 1e-6,
                "ultimate_smoother(28) mismatch at index {}: expected {}, got {}",
                i,
                expected_last_five[i],
                value
            );
        }
    }

    #[test]
    fn test_ultimate_smoother_warmup_passthrough() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let result = ultimate_smoother(&UltimateSmootherInput::with_default_candles(&candles))
            .expect("ultimate_smoother failed");
        for i in 0..3 {
            assert_eq!(result.values[i], candles.close[i]);
        }
    }

    #[test]
    fn test_ultimate_smoother_short_series_unchanged() {
        let data = [4.0, 5.0, 6.0];
        let result = ultimate_smoother(&UltimateSmootherInput::from_slice(
            &data,
            UltimateSmootherParams::default(),
        ))
        .expect("ultimate_smoother failed");
        assert_eq!(result.values, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_ultimate_smoother_partial_params_uses_default() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let input = UltimateSmootherInput::from_candles(
            &candles,
            "close",
            UltimateSmootherParams { period: None },
        );
        let with_none = ultimate_smoother(&input).expect("ultimate_smoother failed");
        let with_default =
            ultimate_smoother(&UltimateSmootherInput::with_default_candles(&candles))
                .expect("ultimate_smoother failed");
        assert_eq!(with_none.values, with_default.values);
    }

    #[test]
    fn test_ultimate_smoother_empty_data() {
        let data: [f64; 0] = [];
        let input = UltimateSmootherInput::from_slice(&data, UltimateSmootherParams::default());
        assert!(matches!(
            ultimate_smoother(&input),
            Err(UltimateSmootherError::EmptyData)
        ));
    }

    #[test]
    fn test_ultimate_smoother_all_nan() {
        let data = [f64::NAN, f64::NAN, f64::NAN];
        let input = UltimateSmootherInput::from_slice(&data, UltimateSmootherParams::default());
        assert!(matches!(
            ultimate_smoother(&input),
            Err(UltimateSmootherError::AllValuesNaN)
        ));
    }

    #[test]
    fn test_ultimate_smoother_zero_period() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let input =
            UltimateSmootherInput::from_slice(&data, UltimateSmootherParams { period: Some(0) });
        match ultimate_smoother(&input) {
            Err(UltimateSmootherError::InvalidPeriod { period, data_len }) => {
                assert_eq!(period, 0);
                assert_eq!(data_len, 4);
            }
            _ => panic!("Expected InvalidPeriod error"),
        }
    }

    #[test]
    fn test_ultimate_smoother_stream_matches_batch() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let batch = ultimate_smoother(&UltimateSmootherInput::with_default_candles(&candles))
            .expect("ultimate_smoother failed");

        let mut stream = UltimateSmootherStream::try_new(UltimateSmootherParams::default())
            .expect("stream init failed");
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
    fn test_ultimate_smoother_builder_apply_slice() {
        let data: Vec<f64> = (0..90)
            .map(|i| (i as f64 * 0.17).sin() * 40.0 + 500.0)
            .collect();
        let from_builder = UltimateSmootherBuilder::new()
            .period(20)
            .apply_slice(&data)
            .expect("builder apply failed");
        let direct = ultimate_smoother(&UltimateSmootherInput::from_slice(
            &data,
            UltimateSmootherParams { period: Some(20) },
        ))
        .expect("ultimate_smoother failed");
        assert_eq!(from_builder.values, direct.values);
    }

    #[test]
    fn test_ultimate_smoother_batch_matches_single() {
        let file_path = "src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv";
        let candles = read_candles_from_csv(file_path).expect("Failed to load test candles");
        let batch = UltimateSmootherBatchBuilder::new()
            .period_range(10, 30, 2)
            .apply_candles(&candles, "close")
            .expect("batch failed");

        assert_eq!(batch.rows, 11);
        assert_eq!(batch.cols, candles.close.len());
        assert_eq!(batch.values.len(), batch.rows * batch.cols);

        let row = batch
            .values_for(&UltimateSmootherParams { period: Some(14) })
            .expect("period 14 missing from sweep");
        let single = ultimate_smoother(&UltimateSmootherInput::with_default_candles(&candles))
            .expect("ultimate_smoother failed");
        for (i, (&a, &b)) in row.iter().zip(single.values.iter()).enumerate() {
            assert!(
                (a - b).abs() < 1e-12,
                "batch row diverged from single run at index {}",
                i
            );
        }
    }

    #[test]
    fn test_ultimate_smoother_batch_static_period() {
        let data: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.4).cos() * 9.0).collect();
        let batch = UltimateSmootherBatchBuilder::new()
            .period_static(21)
            .apply_slice(&data)
            .expect("batch failed");
        assert_eq!(batch.rows, 1);
        assert_eq!(
            batch.row_for_params(&UltimateSmootherParams { period: Some(21) }),
            Some(0)
        );
        assert!(batch
            .row_for_params(&UltimateSmootherParams { period: Some(22) })
            .is_none());
    }
}
