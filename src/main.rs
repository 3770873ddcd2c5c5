#![allow(warnings)]

mod indicators;
mod utilities;

use indicators::cycle_detector::{cycle_detector, CycleDetectorInput};
use indicators::griffiths_predictor::{griffiths_predictor, GriffithsPredictorInput};
use indicators::usi::{usi, UsiInput};
use std::error::Error;
use utilities::data_loader::read_candles_from_csv;

fn main() -> Result<(), Box<dyn Error>> {
    let candles = read_candles_from_csv("src/data/2021-01-01-2023-12-31-Kraken_Spot-1d.csv")?;

    let cycles = cycle_detector(&CycleDetectorInput::with_default_candles(&candles))?;
    println!("dominant cycle: {}", cycles.dominant_cycle);

    let forecast = griffiths_predictor(&GriffithsPredictorInput::with_default_candles(&candles))?;
    println!("forecast: {:?}", forecast.future_signals);

    let strength = usi(&UsiInput::with_default_candles(&candles))?;
    if let Some(last) = strength.values.last() {
        println!("usi: {:.6}", last);
    }

    Ok(())
}
