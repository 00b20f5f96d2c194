//! Versioned model artifact and process-wide registry.
//!
//! The artifact is the offline training product: feature schema, class
//! labels, ensemble member parameters and the optional vision probe, as one
//! serde document. The registry guarantees at most one load per model
//! version; concurrent callers block on the same cell and share the loaded
//! artifact read-only behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{TriageError, TriageResult};
use crate::features::FEATURE_SCHEMA;
use crate::types::DiseaseClass;

/// Version string of the built-in weighted-matrix artifact.
pub const BUILTIN_MODEL_VERSION: &str = "triage-wm-1";

/// Parameters of a single ensemble member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberParams {
    /// Multinomial logistic model: class scores = W·x + b.
    Logistic {
        name: String,
        /// classes × features
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
    /// One-hidden-layer network with ReLU activation.
    ShallowNetwork {
        name: String,
        /// hidden × features
        hidden_weights: Vec<Vec<f64>>,
        hidden_bias: Vec<f64>,
        /// classes × hidden
        output_weights: Vec<Vec<f64>>,
        output_bias: Vec<f64>,
    },
    /// Averaged decision trees with class-score leaves.
    TreeEnsemble { name: String, trees: Vec<DecisionTree> },
    /// RBF kernel machine, one-vs-rest.
    KernelMachine {
        name: String,
        gamma: f64,
        /// support vectors × features
        support_vectors: Vec<Vec<f64>>,
        /// classes × support vectors
        dual_coefs: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    /// Bootstrap-aggregated logistic bags, averaged.
    BaggedLogistic { name: String, bags: Vec<LogisticBag> },
}

impl MemberParams {
    pub fn name(&self) -> &str {
        match self {
            MemberParams::Logistic { name, .. }
            | MemberParams::ShallowNetwork { name, .. }
            | MemberParams::TreeEnsemble { name, .. }
            | MemberParams::KernelMachine { name, .. }
            | MemberParams::BaggedLogistic { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticBag {
    /// classes × features
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node 0 is the root.
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Non-negative class scores, normalized at evaluation.
        scores: Vec<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleParams {
    pub members: Vec<MemberParams>,
}

/// Pretrained linear probe over preprocessed radiograph pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionParams {
    /// Images are resized to `input_size` × `input_size` before scoring.
    pub input_size: u32,
    /// Vision label set, typically {disease-positive, normal}.
    pub classes: Vec<DiseaseClass>,
    /// classes × (input_size²)
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Offline-trained, versioned model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    /// Ordered feature names the contained models were trained on.
    pub feature_schema: Vec<String>,
    pub classes: Vec<DiseaseClass>,
    #[serde(default)]
    pub ensemble: Option<EnsembleParams>,
    #[serde(default)]
    pub vision: Option<VisionParams>,
}

impl ModelArtifact {
    /// Built-in artifact backing the weighted-matrix scorer: current feature
    /// schema, full class set, no trained members, no vision probe.
    pub fn builtin(version: &str) -> Self {
        Self {
            version: version.to_string(),
            feature_schema: FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect(),
            classes: DiseaseClass::ALL.to_vec(),
            ensemble: None,
            vision: None,
        }
    }

    pub fn load_from_path(path: &Path) -> TriageResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TriageError::ModelLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        let artifact: Self = serde_json::from_str(&raw)
            .map_err(|e| TriageError::ModelLoad(format!("invalid artifact: {e}")))?;
        artifact.validate_internal()?;
        Ok(artifact)
    }

    /// Internal consistency: member dimensions against the artifact's own
    /// schema and class list. The engine-schema comparison happens at
    /// predictor construction.
    pub fn validate_internal(&self) -> TriageResult<()> {
        if self.classes.is_empty() {
            return Err(TriageError::ModelLoad("artifact has no classes".to_string()));
        }
        if self.feature_schema.is_empty() {
            return Err(TriageError::ModelLoad(
                "artifact has an empty feature schema".to_string(),
            ));
        }
        let features = self.feature_schema.len();
        let classes = self.classes.len();

        if let Some(ensemble) = &self.ensemble {
            if ensemble.members.is_empty() {
                return Err(TriageError::ModelLoad(
                    "ensemble artifact has no members".to_string(),
                ));
            }
            for member in &ensemble.members {
                validate_member(member, features, classes)?;
            }
        }
        if let Some(vision) = &self.vision {
            let pixels = (vision.input_size as usize).pow(2);
            if vision.classes.is_empty()
                || vision.weights.len() != vision.classes.len()
                || vision.bias.len() != vision.classes.len()
                || vision.weights.iter().any(|row| row.len() != pixels)
            {
                return Err(TriageError::ModelLoad(
                    "vision probe dimensions are inconsistent".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_matrix(
    member: &str,
    what: &str,
    matrix: &[Vec<f64>],
    rows: usize,
    cols: usize,
) -> TriageResult<()> {
    if matrix.len() != rows || matrix.iter().any(|row| row.len() != cols) {
        return Err(TriageError::ModelLoad(format!(
            "member {member}: {what} is not a {rows}×{cols} matrix"
        )));
    }
    Ok(())
}

fn validate_member(member: &MemberParams, features: usize, classes: usize) -> TriageResult<()> {
    match member {
        MemberParams::Logistic { name, weights, bias } => {
            validate_matrix(name, "weights", weights, classes, features)?;
            if bias.len() != classes {
                return Err(TriageError::ModelLoad(format!(
                    "member {name}: bias length {} != {classes}",
                    bias.len()
                )));
            }
        }
        MemberParams::ShallowNetwork {
            name,
            hidden_weights,
            hidden_bias,
            output_weights,
            output_bias,
        } => {
            let hidden = hidden_weights.len();
            if hidden == 0 {
                return Err(TriageError::ModelLoad(format!(
                    "member {name}: empty hidden layer"
                )));
            }
            validate_matrix(name, "hidden_weights", hidden_weights, hidden, features)?;
            validate_matrix(name, "output_weights", output_weights, classes, hidden)?;
            if hidden_bias.len() != hidden || output_bias.len() != classes {
                return Err(TriageError::ModelLoad(format!(
                    "member {name}: bias dimensions are inconsistent"
                )));
            }
        }
        MemberParams::TreeEnsemble { name, trees } => {
            if trees.is_empty() {
                return Err(TriageError::ModelLoad(format!("member {name}: no trees")));
            }
            for tree in trees {
                for node in &tree.nodes {
                    match node {
                        TreeNode::Split {
                            feature,
                            left,
                            right,
                            ..
                        } => {
                            if *feature >= features
                                || *left >= tree.nodes.len()
                                || *right >= tree.nodes.len()
                            {
                                return Err(TriageError::ModelLoad(format!(
                                    "member {name}: tree node references out of range"
                                )));
                            }
                        }
                        TreeNode::Leaf { scores } => {
                            if scores.len() != classes {
                                return Err(TriageError::ModelLoad(format!(
                                    "member {name}: leaf score length {} != {classes}",
                                    scores.len()
                                )));
                            }
                        }
                    }
                }
            }
        }
        MemberParams::KernelMachine {
            name,
            gamma,
            support_vectors,
            dual_coefs,
            intercepts,
        } => {
            if *gamma <= 0.0 || support_vectors.is_empty() {
                return Err(TriageError::ModelLoad(format!(
                    "member {name}: kernel machine needs gamma > 0 and support vectors"
                )));
            }
            validate_matrix(
                name,
                "support_vectors",
                support_vectors,
                support_vectors.len(),
                features,
            )?;
            validate_matrix(name, "dual_coefs", dual_coefs, classes, support_vectors.len())?;
            if intercepts.len() != classes {
                return Err(TriageError::ModelLoad(format!(
                    "member {name}: intercept length {} != {classes}",
                    intercepts.len()
                )));
            }
        }
        MemberParams::BaggedLogistic { name, bags } => {
            if bags.is_empty() {
                return Err(TriageError::ModelLoad(format!("member {name}: no bags")));
            }
            for bag in bags {
                validate_matrix(name, "bag weights", &bag.weights, classes, features)?;
                if bag.bias.len() != classes {
                    return Err(TriageError::ModelLoad(format!(
                        "member {name}: bag bias length {} != {classes}",
                        bag.bias.len()
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Process-wide artifact registry, one guarded load per model version.
pub struct ModelRegistry {
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<ModelArtifact>>>>>,
}

static GLOBAL_REGISTRY: Lazy<ModelRegistry> = Lazy::new(ModelRegistry::new);

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Shared process-wide registry.
    pub fn global() -> &'static ModelRegistry {
        &GLOBAL_REGISTRY
    }

    fn cell(&self, version: &str) -> Arc<OnceCell<Arc<ModelArtifact>>> {
        let mut cells = self.cells.lock();
        cells
            .entry(version.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Load the artifact for `version` at most once; concurrent callers for
    /// the same version all receive the single loaded instance. A failed
    /// load leaves the cell empty so a corrected deployment can retry.
    pub fn get_or_load(&self, version: &str, path: &Path) -> TriageResult<Arc<ModelArtifact>> {
        self.get_or_init(version, || ModelArtifact::load_from_path(path))
    }

    pub fn get_or_init<F>(&self, version: &str, init: F) -> TriageResult<Arc<ModelArtifact>>
    where
        F: FnOnce() -> TriageResult<ModelArtifact>,
    {
        let cell = self.cell(version);
        let loaded = cell.get_or_try_init(|| {
            let artifact = init()?;
            if artifact.version != version {
                return Err(TriageError::ModelLoad(format!(
                    "artifact version {} does not match configured version {version}",
                    artifact.version
                )));
            }
            info!(version = %artifact.version, "model artifact loaded");
            Ok(Arc::new(artifact))
        })?;
        Ok(Arc::clone(loaded))
    }

    /// Already-loaded artifact for `version`, if any.
    pub fn get(&self, version: &str) -> Option<Arc<ModelArtifact>> {
        let cells = self.cells.lock();
        cells.get(version).and_then(|c| c.get().cloned())
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
