use std::collections::HashMap;
use std::sync::Arc;

use image::RgbImage;
use ndarray::ArrayViewD;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::image::{decode_image, to_input_tensor};

/// The outcome of a single inference call: the winning label, its index in
/// the vocabulary, and the full per-label probability vector in vocabulary
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub class_index: usize,
    pub probabilities: Vec<f32>,
}

/// A thread-safe image classifier backed by a pre-trained ONNX model.
///
/// The model artifact and its label vocabulary are loaded once at build time
/// and never mutated afterwards, so a single instance can be shared across
/// sessions behind `Arc` without locking.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use labelkiosk::Classifier;
///
/// let classifier = Classifier::builder()
///     .with_model_file("model.onnx", "labels.json")?
///     .build()?;
///
/// let bytes = std::fs::read("photo.jpg")?;
/// let prediction = classifier.predict_bytes(&bytes)?;
/// println!("{} ({:.1}%)", prediction.label,
///     prediction.probabilities[prediction.class_index] * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    pub model_path: String,
    pub labels_path: String,
    pub session: Arc<Session>,
    pub(crate) labels: Arc<Vec<String>>,
    pub(crate) input_name: String,
    pub(crate) input_size: u32,
    pub(crate) apply_softmax: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// The label vocabulary, in the fixed order the model was trained with.
    /// Immutable for the process lifetime.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_classes: self.labels.len(),
            class_labels: self.labels.as_ref().clone(),
            input_size: self.input_size,
        }
    }

    /// Decodes raw upload/capture bytes and classifies the result.
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        if bytes.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Input image cannot be empty".into(),
            ));
        }
        let img = decode_image(bytes)?;
        self.predict(&img)
    }

    /// Classifies a decoded, colour-normalised image.
    ///
    /// Returns the predicted label, its vocabulary index and the full
    /// probability vector. The call is synchronous and may be slow for large
    /// models; there is no timeout.
    pub fn predict(&self, img: &RgbImage) -> Result<Prediction, ClassifierError> {
        let input = to_input_tensor(img, self.input_size);
        let input_dyn = input.into_dyn();
        let input_view = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input_view).map_err(|e| {
                ClassifierError::ModelError(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor: ArrayViewD<f32> = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e))
        })?;

        let raw: Vec<f32> = output_tensor.iter().copied().collect();
        if raw.len() != self.labels.len() {
            // A count disagreement is a contract violation between the model
            // artifact and the vocabulary; it must not be silently truncated.
            return Err(ClassifierError::PredictionError(format!(
                "Model produced {} scores for {} labels",
                raw.len(),
                self.labels.len()
            )));
        }

        let probabilities = if self.apply_softmax { softmax(&raw) } else { raw };

        let class_index = argmax(&probabilities).ok_or_else(|| {
            ClassifierError::PredictionError("Empty probability vector".to_string())
        })?;

        Ok(Prediction {
            label: self.labels[class_index].clone(),
            class_index,
            probabilities,
        })
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&x| x / sum).collect()
}

/// Index of the largest value; ties resolve to the lowest index so the
/// result is deterministic across runs.
fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.cmp(&a.0))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
