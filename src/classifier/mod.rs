mod builder;
mod error;
pub mod image;
mod model;

pub use builder::{ClassifierBuilder, RuntimeConfig};
pub use error::ClassifierError;
pub use self::image::{decode_image, is_supported_extension, SUPPORTED_EXTENSIONS};
pub use model::{Classifier, Prediction};

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the label vocabulary file
    pub labels_path: String,
    /// Number of classes the classifier distinguishes
    pub num_classes: usize,
    /// Labels of the classes, in vocabulary order
    pub class_labels: Vec<String>,
    /// Square input resolution the image is resized to
    pub input_size: u32,
}
