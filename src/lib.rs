//! Deptree: mutable dependency trees for feature extraction
//!
//! One `Tree` holds the tokens of one sentence, their labeled head/dependent
//! links and per-token feature maps, and answers the navigation queries
//! (heads, siblings, dependents, lowest common ancestors) that feature
//! extractors for taggers and parsers ask.

pub mod config; // Configuration loading and trainer dispatch
pub mod features; // Ordered `key=value|...` annotations
pub mod learner; // Algorithm selection and the model contract
pub mod tree; // Arena-backed dependency tree and navigation
pub mod tsv; // Tabular sentence reader

pub use config::{Config, ConfigError, ModeConfig, TrainerConfig};
pub use features::{FeatureMap, ParseError};
pub use learner::{Algorithm, Learner, StringModel};
pub use tree::{Ancestors, Node, NodeId, ROOT, Tree, TreeError};
pub use tsv::{FieldIndex, ReadError, TsvReader};
