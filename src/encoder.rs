//! One-hot feature encoding aligned to a fixed feature whitelist
//!
//! Raw flights are expanded into `OPERA_*`, `TIPOVUELO_*` and `MES_*` indicator
//! columns for the categories present in the batch, then projected onto the
//! ordered [`FeatureSet`] the classifier was trained with. The projection is
//! what keeps the matrix width stable no matter which categories show up.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DelayError, Result};
use crate::models::{FlightRecord, TrainingRecord};

pub const AIRLINE_PREFIX: &str = "OPERA";
pub const FLIGHT_TYPE_PREFIX: &str = "TIPOVUELO";
pub const MONTH_PREFIX: &str = "MES";

/// A flight counts as delayed when it left more than this many minutes late
pub const THRESHOLD_IN_MINUTES: f64 = 15.0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_TARGET: &str = "delay";

/// Ordered, versioned list of feature columns shared by training and serving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub version: u32,
    pub names: Vec<String>,
}

impl FeatureSet {
    pub const TOP_TEN_VERSION: u32 = 1;

    pub fn new(version: u32, names: Vec<String>) -> Self {
        FeatureSet { version, names }
    }

    /// The ten most informative indicators found during model exploration
    pub fn top_ten() -> Self {
        let names = [
            "OPERA_Latin American Wings",
            "MES_7",
            "MES_10",
            "OPERA_Grupo LATAM",
            "MES_12",
            "TIPOVUELO_I",
            "MES_4",
            "MES_11",
            "OPERA_Sky Airline",
            "OPERA_Copa Air",
        ];
        FeatureSet::new(
            Self::TOP_TEN_VERSION,
            names.iter().map(|n| n.to_string()).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::top_ten()
    }
}

/// Numeric feature rows together with the column names they were aligned to
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f32>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.values.row(index)
    }

    /// Subset of rows, in the order given, keeping every column
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        FeatureMatrix {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }
}

/// A named label column produced alongside the features during training
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub values: Vec<u8>,
}

/// Dummy columns for a batch, keyed by `<PREFIX>_<category>`
#[derive(Debug, Default)]
struct OneHotFrame {
    rows: usize,
    columns: BTreeMap<String, Vec<f32>>,
}

impl OneHotFrame {
    fn new(rows: usize) -> Self {
        OneHotFrame {
            rows,
            columns: BTreeMap::new(),
        }
    }

    /// Add one indicator column per distinct value in `values`
    fn push_dummies<I>(&mut self, prefix: &str, values: I)
    where
        I: IntoIterator<Item = String>,
    {
        let values: Vec<String> = values.into_iter().collect();
        let categories: BTreeSet<&String> = values.iter().collect();
        for category in categories {
            let column = values
                .iter()
                .map(|v| if v == category { 1.0 } else { 0.0 })
                .collect();
            self.columns.insert(format!("{}_{}", prefix, category), column);
        }
    }

    /// Zero-fill missing whitelist columns, then keep only the whitelist in order
    fn align(mut self, features: &FeatureSet) -> Array2<f32> {
        for name in &features.names {
            if !self.columns.contains_key(name) {
                self.columns.insert(name.clone(), vec![0.0; self.rows]);
            }
        }

        let dropped = self.columns.len().saturating_sub(features.len());
        debug!(
            rows = self.rows,
            kept = features.len(),
            dropped,
            "aligned one-hot columns to feature set"
        );

        let selected: Vec<&Vec<f32>> = features
            .names
            .iter()
            .filter_map(|name| self.columns.get(name))
            .collect();
        Array2::from_shape_fn((self.rows, selected.len()), |(r, c)| selected[c][r])
    }
}

/// Turns flight records into the fixed-width matrix the classifier expects
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureEncoder {
    features: FeatureSet,
}

impl FeatureEncoder {
    pub fn new(features: FeatureSet) -> Self {
        FeatureEncoder { features }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn encode(&self, flights: &[FlightRecord]) -> FeatureMatrix {
        let mut frame = OneHotFrame::new(flights.len());
        frame.push_dummies(
            AIRLINE_PREFIX,
            flights.iter().map(|f| f.airline.name().to_string()),
        );
        frame.push_dummies(
            FLIGHT_TYPE_PREFIX,
            flights.iter().map(|f| f.flight_type.code().to_string()),
        );
        frame.push_dummies(MONTH_PREFIX, flights.iter().map(|f| f.month.to_string()));

        FeatureMatrix {
            columns: self.features.names.clone(),
            values: frame.align(&self.features),
        }
    }

    /// Encode historical flights and derive the delay label for each one
    pub fn encode_with_target(
        &self,
        records: &[TrainingRecord],
        target: &str,
    ) -> (FeatureMatrix, Target) {
        let flights: Vec<FlightRecord> = records.iter().map(|r| r.flight).collect();
        let features = self.encode(&flights);
        let values = records
            .iter()
            .map(|r| delay_label(get_min_diff(r)))
            .collect();
        (
            features,
            Target {
                name: target.to_string(),
                values,
            },
        )
    }
}

/// Minutes between the scheduled and the observed departure
pub fn get_min_diff(record: &TrainingRecord) -> f64 {
    (record.observed - record.scheduled).num_seconds() as f64 / 60.0
}

pub fn delay_label(min_diff: f64) -> u8 {
    if min_diff > THRESHOLD_IN_MINUTES {
        1
    } else {
        0
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        DelayError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

impl TrainingRecord {
    /// Build a record from `Fecha-I` / `Fecha-O` strings
    pub fn parse(flight: FlightRecord, scheduled: &str, observed: &str) -> Result<Self> {
        Ok(TrainingRecord {
            flight,
            scheduled: parse_timestamp(scheduled)?,
            observed: parse_timestamp(observed)?,
        })
    }
}
