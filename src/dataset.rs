//! Raw flight history loading and reproducible train/holdout splitting

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::models::{Airline, FlightRecord, FlightType, Month, TrainingRecord};

/// Columns of the raw dataset that feed the encoder; the rest are ignored
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Fecha-I")]
    scheduled: String,
    #[serde(rename = "Fecha-O")]
    observed: String,
    #[serde(rename = "OPERA")]
    airline: Airline,
    #[serde(rename = "TIPOVUELO")]
    flight_type: FlightType,
    #[serde(rename = "MES")]
    month: Month,
}

impl RawRow {
    fn into_record(self) -> Result<TrainingRecord> {
        let flight = FlightRecord::new(self.airline, self.flight_type, self.month);
        TrainingRecord::parse(flight, &self.scheduled, &self.observed)
    }
}

/// Read every row of a flight history CSV
pub fn load_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingRecord>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let records = read_records(&mut reader)?;
    info!("loaded {} flight records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<TrainingRecord>> {
    let mut records = Vec::new();
    for row in reader.deserialize::<RawRow>() {
        records.push(row?.into_record()?);
    }
    Ok(records)
}

/// Shuffle row indices with a fixed seed and cut off `ceil(test_size * n)` for the holdout
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let n_test = ((n as f64) * test_size).ceil() as usize;
    let n_test = n_test.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    (train, indices)
}
