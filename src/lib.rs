//! An interactive image-classification demo kernel built on ONNX models.
//!
//! The crate wires four pieces together: a [`Classifier`] that wraps a
//! pre-trained ONNX image model and its label vocabulary, a deterministic
//! probability [`rank`](ranking::rank), a [`ContentRegistry`] mapping labels to
//! curated text/image/video references, and a [`session`] layer that turns UI
//! events into plain render data. Rendering itself is left to the caller.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use labelkiosk::{Classifier, ContentRegistry};
//! use labelkiosk::session::{handle_event, SessionEvent, SessionState};
//!
//! let classifier = Classifier::builder()
//!     .with_model_file("model.onnx", "labels.json")?
//!     .build()?;
//!
//! let registry = ContentRegistry::from_path("content.json")?;
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let event = SessionEvent::ImageUploaded {
//!     file_name: "photo.jpg".into(),
//!     bytes,
//! };
//! let (state, render) = handle_event(SessionState::new(), event, &classifier, &registry);
//!
//! for entry in &render.ranked {
//!     println!("{}: {:.1}%", entry.label, entry.probability * 100.0);
//! }
//! # let _ = state;
//! # Ok(())
//! # }
//! ```
//!
//! # Sharing across sessions
//!
//! The [`Classifier`] is immutable once built and `Send + Sync`; a host serving
//! several users shares one instance behind `Arc` while giving each session its
//! own [`SessionState`](session::SessionState).

pub mod classifier;
pub mod content;
pub mod model_manager;
pub mod ranking;
pub mod session;
pub mod video;

pub use classifier::{
    Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo, Prediction, RuntimeConfig,
};
pub use content::{ContentEntry, ContentRegistry, ResolvedContent};
pub use model_manager::{ModelError, ModelManager, ModelSource};
pub use ranking::{rank, RankError};

pub fn init_logger() {
    env_logger::init();
}
