//! Gradient-boosted delay classifier and its on-disk artifact
//!
//! [`DelayModel`] owns the feature encoder and, once trained or loaded, a
//! [`ModelArtifact`]. The artifact bundles the boosted ensemble with the
//! [`FeatureSet`] it was trained on, so serving always encodes flights with the
//! exact columns the ensemble expects.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use gbdt::config::Config as BoostConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, TrainingConfig};
use crate::dataset::train_test_split;
use crate::encoder::{FeatureEncoder, FeatureMatrix, FeatureSet, Target};
use crate::error::{DelayError, Result};
use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::models::{FlightRecord, TrainingRecord};

pub const ARTIFACT_VERSION: u32 = 1;

const LOSS: &str = "LogLikelyhood";

/// Trained ensemble plus everything needed to feed it correctly
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub features: FeatureSet,
    pub threshold: f32,
    pub scale_pos_weight: f32,
    booster: GBDT,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
}

impl ModelArtifact {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!("saved model artifact to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut content = String::new();
        BufReader::new(File::open(path.as_ref())?).read_to_string(&mut content)?;

        let header: ArtifactHeader = serde_json::from_str(&content)?;
        if header.format_version != ARTIFACT_VERSION {
            return Err(DelayError::UnsupportedArtifact {
                found: header.format_version,
                expected: ARTIFACT_VERSION,
            });
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn probabilities(&self, features: &FeatureMatrix) -> Vec<f32> {
        if features.nrows() == 0 {
            return Vec::new();
        }
        let data: DataVec = features
            .values()
            .rows()
            .into_iter()
            .map(|row| Data::new_test_data(row.to_vec(), None))
            .collect();
        self.booster.predict(&data)
    }

    fn predict_labels(&self, features: &FeatureMatrix) -> Vec<u8> {
        self.probabilities(features)
            .into_iter()
            .map(|p| if p > self.threshold { 1 } else { 0 })
            .collect()
    }
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct FitReport {
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub scale_pos_weight: f32,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

pub struct DelayModel {
    model_path: PathBuf,
    training: TrainingConfig,
    encoder: FeatureEncoder,
    artifact: Option<ModelArtifact>,
}

impl DelayModel {
    /// Create a classifier with no trained model
    pub fn new<P: Into<PathBuf>>(model_path: P, training: TrainingConfig) -> Self {
        DelayModel {
            model_path: model_path.into(),
            training,
            encoder: FeatureEncoder::default(),
            artifact: None,
        }
    }

    pub fn load(config: &AppConfig) -> Result<Self> {
        Self::from_path(&config.model.path, config.training.clone())
    }

    /// Load the artifact at `model_path` if there is one.
    ///
    /// A missing file leaves the classifier without a model; an unreadable or
    /// incompatible file is an error.
    pub fn from_path<P: Into<PathBuf>>(model_path: P, training: TrainingConfig) -> Result<Self> {
        let mut model = Self::new(model_path, training);
        if !model.model_path.exists() {
            warn!(
                "no model artifact at {}; predictions are unavailable until one is trained",
                model.model_path.display()
            );
            return Ok(model);
        }

        let artifact = ModelArtifact::load(&model.model_path)?;
        info!(
            "loaded model from {} (feature set v{}, {} features)",
            model.model_path.display(),
            artifact.features.version,
            artifact.features.len()
        );
        model.encoder = FeatureEncoder::new(artifact.features.clone());
        model.artifact = Some(artifact);
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn features(&self) -> &FeatureSet {
        self.encoder.features()
    }

    pub fn preprocess(&self, flights: &[FlightRecord]) -> FeatureMatrix {
        self.encoder.encode(flights)
    }

    pub fn preprocess_with_target(
        &self,
        records: &[TrainingRecord],
        target: &str,
    ) -> (FeatureMatrix, Target) {
        self.encoder.encode_with_target(records, target)
    }

    /// Predict a 0/1 delay label for every row, in order
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| DelayError::ModelUnavailable {
                path: self.model_path.clone(),
            })?;
        check_columns(&artifact.features, features)?;

        let labels = artifact.predict_labels(features);
        debug!(rows = labels.len(), "predicted delays");
        Ok(labels)
    }

    /// Train a fresh model, report holdout metrics and persist the artifact
    pub fn fit(&mut self, features: &FeatureMatrix, labels: &[u8]) -> Result<FitReport> {
        let n = features.nrows();
        if n == 0 {
            return Err(DelayError::EmptyDataset);
        }
        if labels.len() != n {
            return Err(DelayError::LengthMismatch {
                features: n,
                labels: labels.len(),
            });
        }
        check_columns(self.encoder.features(), features)?;

        let positives = labels.iter().filter(|&&l| l == 1).count();
        let negatives = n - positives;
        if positives == 0 || negatives == 0 {
            return Err(DelayError::DegenerateLabels {
                negatives,
                positives,
            });
        }
        let scale = negatives as f32 / positives as f32;

        let t = &self.training;
        let (train_idx, holdout_idx) = train_test_split(n, t.test_size, t.seed);
        if train_idx.is_empty() {
            return Err(DelayError::EmptyDataset);
        }
        info!(
            "training on {} rows, holding out {} (scale_pos_weight={:.4})",
            train_idx.len(),
            holdout_idx.len(),
            scale
        );

        let mut train_data: DataVec = train_idx
            .iter()
            .map(|&i| {
                let (weight, label) = if labels[i] == 1 {
                    (scale, 1.0)
                } else {
                    (1.0, -1.0)
                };
                Data::new_training_data(features.row(i).to_vec(), weight, label, None)
            })
            .collect();

        let mut booster = GBDT::new(&self.boost_config(features.ncols()));
        booster.fit(&mut train_data);

        let artifact = ModelArtifact {
            format_version: ARTIFACT_VERSION,
            features: self.encoder.features().clone(),
            threshold: t.threshold,
            scale_pos_weight: scale,
            booster,
        };

        let holdout = features.select_rows(&holdout_idx);
        let truth: Vec<u8> = holdout_idx.iter().map(|&i| labels[i]).collect();
        let predicted = artifact.predict_labels(&holdout);
        let confusion = ConfusionMatrix::from_predictions(&truth, &predicted);
        let report = ClassificationReport::from_confusion(&confusion);
        info!("Confusion Matrix:\n{}", confusion);
        info!("Classification Report:\n{}", report);

        artifact.save(&self.model_path)?;
        self.artifact = Some(artifact);

        Ok(FitReport {
            train_rows: train_idx.len(),
            holdout_rows: holdout_idx.len(),
            scale_pos_weight: scale,
            confusion,
            report,
        })
    }

    fn boost_config(&self, feature_size: usize) -> BoostConfig {
        let t = &self.training;
        let mut cfg = BoostConfig::new();
        cfg.set_feature_size(feature_size);
        cfg.set_max_depth(t.max_depth);
        cfg.set_iterations(t.iterations);
        cfg.set_shrinkage(t.learning_rate);
        cfg.set_min_leaf_size(t.min_leaf_size);
        cfg.set_loss(LOSS);
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg.set_training_optimization_level(2);
        cfg.set_debug(false);
        cfg
    }
}

fn check_columns(expected: &FeatureSet, features: &FeatureMatrix) -> Result<()> {
    if features.columns() != expected.names.as_slice() {
        return Err(DelayError::FeatureMismatch {
            expected: expected.names.clone(),
            found: features.columns().to_vec(),
        });
    }
    Ok(())
}
