/// Binary to generate reference outputs for indicator testing
/// This is used by external tests to verify their outputs match Rust
use cycle_ta::indicators::cycle_detector::{cycle_detector, CycleDetectorInput, CycleDetectorParams};
use cycle_ta::indicators::griffiths_predictor::{
    griffiths_predictor, GriffithsPredictorInput, GriffithsPredictorParams,
};
use cycle_ta::indicators::highpass::{highpass, HighPassInput, HighPassParams};
use cycle_ta::indicators::supersmoother::{supersmoother, SuperSmootherInput, SuperSmootherParams};
use cycle_ta::indicators::two_pole_predictor::{
    two_pole_predictor, TwoPolePredictorInput, TwoPolePredictorParams,
};
use cycle_ta::indicators::ultimate_smoother::{
    ultimate_smoother, UltimateSmootherInput, UltimateSmootherParams,
};
use cycle_ta::indicators::usi::{usi, zero_crossings, UsiInput, UsiParams};
use cycle_ta::utilities::data_loader::read_candles_from_csv;
use serde_json::json;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <indicator_name> [source]", args[0]);
        eprintln!("Available indicators: highpass, supersmoother, ultimate_smoother, cycle_detector, griffiths_predictor, two_pole_predictor, usi");
        eprintln!("Available sources: open, high, low, close, volume, hl2, hlc3, ohlc4, hlcc4");
        std::process::exit(1);
    }

    let indicator = &args[1];
    let source = args.get(2).map(|s| s.as_str()).unwrap_or("close");

    // Load test data
    let candles = read_candles_from_csv("src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv")?;

    let output = match indicator.as_str() {
        "highpass" => {
            let params = HighPassParams::default();
            let period = params.period.unwrap_or(14);
            let input = HighPassInput::from_candles(&candles, source, params);
            let result = highpass(&input)?;
            json!({
                "indicator": "highpass",
                "source": source,
                "params": {
                    "period": period
                },
                "values": result.values,
                "length": result.values.len()
            })
        },
        "supersmoother" => {
            let params = SuperSmootherParams::default();
            let period = params.period.unwrap_or(14);
            let input = SuperSmootherInput::from_candles(&candles, source, params);
            let result = supersmoother(&input)?;
            json!({
                "indicator": "supersmoother",
                "source": source,
                "params": {
                    "period": period
                },
                "values": result.values,
                "length": result.values.len()
            })
        },
        "ultimate_smoother" => {
            let params = UltimateSmootherParams::default();
            let period = params.period.unwrap_or(14);
            let input = UltimateSmootherInput::from_candles(&candles, source, params);
            let result = ultimate_smoother(&input)?;
            json!({
                "indicator": "ultimate_smoother",
                "source": source,
                "params": {
                    "period": period
                },
                "values": result.values,
                "length": result.values.len()
            })
        },
        "cycle_detector" => {
            let params = CycleDetectorParams::default();
            let lower_bound = params.lower_bound.unwrap_or(18);
            let upper_bound = params.upper_bound.unwrap_or(40);
            let length = params.length.unwrap_or(40);
            let input = CycleDetectorInput::from_candles(&candles, source, params);
            let result = cycle_detector(&input)?;
            json!({
                "indicator": "cycle_detector",
                "source": source,
                "params": {
                    "lower_bound": lower_bound,
                    "upper_bound": upper_bound,
                    "length": length
                },
                "dominant_cycle": result.dominant_cycle,
                "hp": result.hp,
                "lp": result.lp,
                "length": result.lp.len()
            })
        },
        "griffiths_predictor" => {
            let params = GriffithsPredictorParams::default();
            let length = params.length.unwrap_or(18);
            let lower_bound = params.lower_bound.unwrap_or(18);
            let upper_bound = params.upper_bound.unwrap_or(40);
            let bars_fwd = params.bars_fwd.unwrap_or(2);
            let input = GriffithsPredictorInput::from_candles(&candles, source, params);
            let result = griffiths_predictor(&input)?;
            json!({
                "indicator": "griffiths_predictor",
                "source": source,
                "params": {
                    "length": length,
                    "lower_bound": lower_bound,
                    "upper_bound": upper_bound,
                    "bars_fwd": bars_fwd
                },
                "predictions": result.predictions,
                "future_signals": result.future_signals,
                "length": result.predictions.len()
            })
        },
        "two_pole_predictor" => {
            let params = TwoPolePredictorParams::default();
            let q = params.q.unwrap_or(0.35);
            let input = TwoPolePredictorInput::from_candles(&candles, source, params);
            let result = two_pole_predictor(&input)?;
            json!({
                "indicator": "two_pole_predictor",
                "source": source,
                "params": {
                    "q": q
                },
                "values": result.values,
                "length": result.values.len()
            })
        },
        "usi" => {
            let params = UsiParams::default();
            let period = params.period.unwrap_or(14);
            let input = UsiInput::from_candles(&candles, source, params);
            let result = usi(&input)?;
            let crossings = zero_crossings(&result.values);
            json!({
                "indicator": "usi",
                "source": source,
                "params": {
                    "period": period
                },
                "values": result.values,
                "zero_crossings": crossings,
                "length": result.values.len()
            })
        },
        _ => {
            eprintln!("Unknown indicator: {}", indicator);
            std::process::exit(1);
        }
    };

    // Output as JSON
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
