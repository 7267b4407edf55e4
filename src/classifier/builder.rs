use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

use log::{error, info};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

use super::error::ClassifierError;
use super::model::Classifier;
use crate::model_manager::ModelManager;

/// Default side length of the square model input, matching the common
/// ImageNet-style export.
const DEFAULT_INPUT_SIZE: u32 = 224;

/// Tuning knobs applied when the inference session is created.
///
/// A thread count of zero leaves the choice to ONNX Runtime. Graph
/// optimisation is on by default; turning it off can help when inspecting a
/// freshly exported model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub disable_optimizations: bool,
}

static ORT_INIT: Once = Once::new();

/// Initialises the process-wide ONNX Runtime environment exactly once;
/// subsequent calls are no-ops.
fn ensure_runtime_initialized() {
    ORT_INIT.call_once(|| {
        ort::init()
            .with_name("labelkiosk")
            .commit()
            .expect("Failed to initialize ONNX Runtime environment");
    });
}

fn create_session_builder(config: &RuntimeConfig) -> ort::Result<SessionBuilder> {
    ensure_runtime_initialized();
    let mut builder = Session::builder()?;
    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    let level = if config.disable_optimizations {
        GraphOptimizationLevel::Disable
    } else {
        GraphOptimizationLevel::Level3
    };
    builder.with_optimization_level(level)
}

/// A builder for constructing a Classifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    labels_path: Option<String>,
    session: Option<Session>,
    labels: Option<Vec<String>>,
    input_name: Option<String>,
    input_size: Option<u32>,
    apply_softmax: bool,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self {
            model_path: None,
            labels_path: None,
            session: None,
            labels: None,
            input_name: None,
            input_size: None,
            apply_softmax: true,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the square input resolution the image is resized to before
    /// inference. Defaults to 224.
    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = Some(input_size);
        self
    }

    /// Treats the model output as ready-made probabilities instead of logits,
    /// skipping the softmax applied by default.
    pub fn without_softmax(mut self) -> Self {
        self.apply_softmax = false;
        self
    }

    /// Loads a model previously fetched through the [`ModelManager`], looked
    /// up by its cache name.
    ///
    /// # Errors
    /// Fails with `BuildError` if the artifact is not downloaded yet, or if
    /// the model or its label vocabulary fails to load.
    pub fn with_downloaded_model(
        self,
        manager: &ModelManager,
        name: &str,
    ) -> Result<Self, ClassifierError> {
        if !manager.is_downloaded(name) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{}' is not downloaded. Please download it first using ModelManager::ensure_downloaded()",
                name
            )));
        }
        let model_path = manager.model_path(name);
        let labels_path = manager.labels_path(name);
        self.with_model_file(&model_path, &labels_path)
    }

    /// Sets the model and label-vocabulary files for the classifier.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `labels_path` - Path to the JSON label vocabulary (an ordered array
    ///   of strings)
    ///
    /// # Errors
    /// * `BuildError` if the paths are already set, a file is missing, the
    ///   model fails to load, or the model structure is invalid
    /// * `ValidationError` if the vocabulary is empty or contains duplicate
    ///   or blank labels
    pub fn with_model_file(
        mut self,
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();

        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError(
                "Model and labels paths already set".to_string(),
            ));
        }
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        if !labels_path.exists() {
            return Err(ClassifierError::BuildError(format!(
                "Labels file not found: {}",
                labels_path.display()
            )));
        }

        // Load the vocabulary
        let labels = Self::load_labels(labels_path)?;
        info!("Loaded {} labels from {}", labels.len(), labels_path.display());

        // Create session using the singleton environment
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        // Validate model structure
        let input_name = Self::validate_model(&session)?;
        info!("Model structure validated successfully (input '{}')", input_name);

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.labels_path = Some(labels_path.to_string_lossy().to_string());
        self.session = Some(session);
        self.labels = Some(labels);
        self.input_name = Some(input_name);
        Ok(self)
    }

    fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
        let text = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read labels file: {}", e);
            ClassifierError::BuildError(format!("Failed to read labels file: {}", e))
        })?;
        let labels: Vec<String> = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse labels file: {}", e);
            ClassifierError::BuildError(format!("Failed to parse labels file: {}", e))
        })?;
        Self::validate_labels(&labels)?;
        Ok(labels)
    }

    /// Validates the vocabulary according to the following rules:
    /// - At least one label
    /// - No label may be empty or whitespace-only
    /// - Labels must be unique
    fn validate_labels(labels: &[String]) -> Result<(), ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Label vocabulary cannot be empty".into(),
            ));
        }
        if let Some(pos) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ClassifierError::ValidationError(format!(
                "Label {} cannot be empty",
                pos + 1
            )));
        }
        let mut seen = HashSet::new();
        for label in labels {
            if !seen.insert(label.as_str()) {
                return Err(ClassifierError::ValidationError(format!(
                    "Duplicate label '{}' in vocabulary",
                    label
                )));
            }
        }
        Ok(())
    }

    /// Validates that the model has the expected input/output structure and
    /// returns the image input name.
    fn validate_model(session: &Session) -> Result<String, ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ClassifierError::ModelError(format!(
                "Model must have exactly 1 image input, found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class scores".to_string(),
            ));
        }

        Ok(inputs[0].name.clone())
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Errors
    /// `BuildError` if no model and labels files were set.
    pub fn build(mut self) -> Result<Classifier, ClassifierError> {
        if self.model_path.is_none() || self.labels_path.is_none() {
            return Err(ClassifierError::BuildError(
                "Model and labels paths must be set".to_string(),
            ));
        }

        let session = self
            .session
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let labels = self
            .labels
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No label vocabulary loaded".into()))?;
        let input_name = self
            .input_name
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No model input name resolved".into()))?;

        Ok(Classifier {
            model_path: self.model_path.take().unwrap(),
            labels_path: self.labels_path.take().unwrap(),
            session: Arc::new(session),
            labels: Arc::new(labels),
            input_name,
            input_size: self.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            apply_softmax: self.apply_softmax,
        })
    }
}
