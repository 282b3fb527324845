//! Learner descriptors and the model contract
//!
//! Algorithm names are resolved into `Algorithm` once, when a configuration is
//! loaded. A `Learner` is plain data describing which optimizer to run and
//! with which hyperparameters; the optimizers themselves live elsewhere.

use std::fmt;
use std::str::FromStr;


use crate::config::ConfigError;

/// Training algorithms that can be named in a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Perceptron,
    AdagradHinge,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Perceptron => "perceptron",
            Algorithm::AdagradHinge => "adagrad-hinge",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perceptron" => Ok(Algorithm::Perceptron),
            "adagrad-hinge" => Ok(Algorithm::AdagradHinge),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a trainer needs from the model it optimizes
pub trait StringModel {
    fn set_bias(&mut self, bias: f32);

    /// Build the label and feature vectors, dropping entries under the cutoffs
    fn vectorize(&mut self, label_cutoff: usize, feature_cutoff: usize, reset: bool);
}

/// A configured optimizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Learner {
    Perceptron {
        binomial: bool,
        average: bool,
        learning_rate: f64,
    },
    AdaGradHinge {
        binomial: bool,
        average: bool,
        learning_rate: f64,
        ridge: f64,
    },
}

impl Learner {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Learner::Perceptron { .. } => Algorithm::Perceptron,
            Learner::AdaGradHinge { .. } => Algorithm::AdagradHinge,
        }
    }

    /// Binomial (one-vs-rest) rather than multinomial
    pub fn is_binomial(&self) -> bool {
        match *self {
            Learner::Perceptron { binomial, .. } | Learner::AdaGradHinge { binomial, .. } => {
                binomial
            }
        }
    }

    pub fn is_average(&self) -> bool {
        match *self {
            Learner::Perceptron { average, .. } | Learner::AdaGradHinge { average, .. } => average,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            Learner::Perceptron { learning_rate, .. }
            | Learner::AdaGradHinge { learning_rate, .. } => learning_rate,
        }
    }
}
