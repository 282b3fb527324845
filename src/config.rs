//! Configuration loading and trainer dispatch
//!
//! A configuration is a JSON document with a language, an optional column
//! layout for the tabular reader, and one entry per processing mode. Each mode
//! lists one trainer per model:
//!
//! ```json
//! {
//!   "language": "english",
//!   "columns": [{ "field": "FORM", "index": 1 }, { "field": "LEMMA", "index": 2 }],
//!   "modes": {
//!     "dep": {
//!       "bootstrap": true,
//!       "trainers": [
//!         { "algorithm": "adagrad-hinge", "binomial": false, "average": false,
//!           "learning-rate": 0.02, "ridge": 0.1, "label-cutoff": 4,
//!           "feature-cutoff": 3, "bias": 0.0, "reset": false }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! Algorithm names are checked while loading, so an unknown name fails before
//! any model is touched.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::trace;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::learner::{Algorithm, Learner, StringModel};
use crate::tsv::FieldIndex;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not a valid algorithm name")]
    UnknownAlgorithm(String),
    #[error("no configuration for mode `{0}`")]
    UnknownMode(String),
    #[error("mode `{mode}` has no trainer for model {index}")]
    MissingTrainer { mode: String, index: usize },
    #[error("{algorithm} trainer is missing the `{attribute}` attribute")]
    MissingAttribute {
        algorithm: Algorithm,
        attribute: &'static str,
    },
    #[error("column layout is missing the {0} field")]
    MissingField(&'static str),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read configuration: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    language: Option<String>,
    #[serde(default)]
    columns: Vec<RawColumn>,
    #[serde(default)]
    modes: FxHashMap<String, RawMode>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    field: String,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct RawMode {
    #[serde(default)]
    bootstrap: bool,
    #[serde(default)]
    trainers: Vec<RawTrainer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawTrainer {
    algorithm: String,
    #[serde(default)]
    binomial: bool,
    #[serde(default)]
    average: bool,
    learning_rate: f64,
    ridge: Option<f64>,
    #[serde(default)]
    label_cutoff: usize,
    #[serde(default)]
    feature_cutoff: usize,
    #[serde(default)]
    bias: f32,
    #[serde(default)]
    reset: bool,
}

/// Resolved trainer entry for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub learner: Learner,
    pub label_cutoff: usize,
    pub feature_cutoff: usize,
    pub bias: f32,
    pub reset: bool,
}

impl TrainerConfig {
    /// Apply the bias and cutoffs to a model before training
    pub fn init_model<M: StringModel + ?Sized>(&self, model: &mut M) {
        model.set_bias(self.bias);
        model.vectorize(self.label_cutoff, self.feature_cutoff, self.reset);
    }
}

impl TryFrom<RawTrainer> for TrainerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawTrainer) -> Result<Self, Self::Error> {
        let algorithm: Algorithm = raw.algorithm.trim().parse()?;
        let learner = match algorithm {
            Algorithm::Perceptron => Learner::Perceptron {
                binomial: raw.binomial,
                average: raw.average,
                learning_rate: raw.learning_rate,
            },
            Algorithm::AdagradHinge => Learner::AdaGradHinge {
                binomial: raw.binomial,
                average: raw.average,
                learning_rate: raw.learning_rate,
                ridge: raw.ridge.ok_or(ConfigError::MissingAttribute {
                    algorithm,
                    attribute: "ridge",
                })?,
            },
        };
        trace!("resolved trainer {:?}", learner);

        Ok(Self {
            learner,
            label_cutoff: raw.label_cutoff,
            feature_cutoff: raw.feature_cutoff,
            bias: raw.bias,
            reset: raw.reset,
        })
    }
}

/// Settings for one processing mode
#[derive(Debug, Clone, PartialEq)]
pub struct ModeConfig {
    pub bootstrap: bool,
    pub trainers: Vec<TrainerConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub language: Option<String>,
    pub field_index: Option<FieldIndex>,
    modes: FxHashMap<String, ModeConfig>,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::resolve(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Self::resolve(serde_json::from_reader(reader)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let field_index = if raw.columns.is_empty() {
            None
        } else {
            Some(field_index(&raw.columns)?)
        };

        let mut modes = FxHashMap::default();
        for (name, mode) in raw.modes {
            let trainers = mode
                .trainers
                .into_iter()
                .map(TrainerConfig::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            modes.insert(
                name,
                ModeConfig {
                    bootstrap: mode.bootstrap,
                    trainers,
                },
            );
        }

        Ok(Self {
            language: raw.language,
            field_index,
            modes,
        })
    }

    pub fn mode(&self, mode: &str) -> Result<&ModeConfig, ConfigError> {
        self.modes
            .get(mode)
            .ok_or_else(|| ConfigError::UnknownMode(mode.to_string()))
    }

    pub fn is_bootstrap(&self, mode: &str) -> Result<bool, ConfigError> {
        Ok(self.mode(mode)?.bootstrap)
    }

    /// Column layout for the tabular reader, CoNLL-X when none is configured
    pub fn tsv_index(&self) -> FieldIndex {
        self.field_index.unwrap_or_default()
    }

    /// Initialize each model from its trainer entry and return its learner.
    ///
    /// The i-th model uses the i-th trainer of the mode.
    pub fn learners<M: StringModel>(
        &self,
        mode: &str,
        models: &mut [M],
    ) -> Result<Vec<Learner>, ConfigError> {
        let trainers = &self.mode(mode)?.trainers;
        if models.len() > trainers.len() {
            return Err(ConfigError::MissingTrainer {
                mode: mode.to_string(),
                index: trainers.len(),
            });
        }

        Ok(models
            .iter_mut()
            .zip(trainers)
            .map(|(model, trainer)| {
                trainer.init_model(model);
                trainer.learner
            })
            .collect())
    }
}

/// Map named columns onto a `FieldIndex`; unrelated fields are ignored
fn field_index(columns: &[RawColumn]) -> Result<FieldIndex, ConfigError> {
    let by_name: FxHashMap<&str, usize> = columns
        .iter()
        .map(|c| (c.field.trim(), c.index))
        .collect();
    let required = |name: &'static str| {
        by_name
            .get(name)
            .copied()
            .ok_or(ConfigError::MissingField(name))
    };

    let mut index = FieldIndex::new(
        required("FORM")?,
        required("LEMMA")?,
        required("POS")?,
        required("FEATS")?,
        required("HEAD")?,
        required("DEPREL")?,
    );
    if let Some(id) = by_name.get("ID") {
        index.id = *id;
    }
    Ok(index)
}
