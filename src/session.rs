//! Per-session state and the explicit interaction handler.
//!
//! Each UI event (camera capture, file upload, label-selector change) maps to
//! exactly one [`handle_event`] call: current state plus event in, updated
//! state plus a plain [`RenderData`] bundle out. The rendering surface
//! consumes the bundle however it likes; nothing here touches a UI framework.

use log::{debug, warn};

use crate::classifier::{is_supported_extension, Classifier, ClassifierError, Prediction};
use crate::content::{ContentRegistry, ResolvedContent};
use crate::ranking::rank;
use crate::video::thumbnail_url;

/// Transient state for one user's interactive lifetime. Created empty;
/// never persisted across sessions; owned exclusively by its session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Raw bytes of the most recently captured or uploaded image.
    pub image_bytes: Option<Vec<u8>>,
    /// Label of the last successful inference. When set, it is always a
    /// member of the model's vocabulary.
    pub last_predicted_label: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One user interaction.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A frame from the camera widget. Raw bytes, no file name.
    ImageCaptured(Vec<u8>),
    /// A file from the upload widget; the name is checked against the
    /// supported extension set before decoding.
    ImageUploaded { file_name: String, bytes: Vec<u8> },
    /// The user picked a label in the content selector. Overrides which
    /// label's content is shown without touching the prediction.
    LabelSelected(String),
}

/// Non-fatal conditions surfaced to the user instead of failing the
/// interaction. Prior session state is preserved in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Upload had an extension outside {jpg, jpeg, png, webp, tiff}.
    UnsupportedFormat(String),
    /// The bytes could not be decoded into an image.
    InvalidImage(String),
    /// Inference itself failed.
    PredictionFailed(String),
    /// No image has been provided yet.
    AwaitingImage,
    /// The chosen label has no curated content.
    NoContent(String),
}

/// One row of the probability display.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub label: String,
    pub probability: f32,
    /// True for the entry equal to the session's last predicted label.
    pub highlighted: bool,
}

/// A curated video reference with its derived thumbnail, when one could be
/// derived. `thumbnail: None` means render a plain hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLink {
    pub url: String,
    pub thumbnail: Option<String>,
}

/// Everything the presentation layer needs to draw one interaction pass.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    pub prediction: Option<Prediction>,
    pub ranked: Vec<RankedEntry>,
    /// The label whose content is shown: the selected one if the event was a
    /// selection, otherwise the predicted one.
    pub selected_label: Option<String>,
    pub content: ResolvedContent,
    pub videos: Vec<VideoLink>,
    pub notice: Option<Notice>,
}

/// The seam between the interaction handler and the model provider. Lets
/// tests drive the handler without a model artifact.
pub trait Predictor {
    fn labels(&self) -> &[String];
    fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError>;
}

impl Predictor for Classifier {
    fn labels(&self) -> &[String] {
        Classifier::labels(self)
    }

    fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        Classifier::predict_bytes(self, bytes)
    }
}

/// Processes one interaction: takes the current session state and the event,
/// returns the updated state and the render bundle.
///
/// Inference re-runs on every pass that has an image available, mirroring
/// the one-pass-per-event execution model. Per-interaction errors (bad
/// upload, undecodable bytes, failed inference) degrade to a [`Notice`] and
/// leave the prior state intact.
pub fn handle_event(
    mut state: SessionState,
    event: SessionEvent,
    predictor: &dyn Predictor,
    registry: &ContentRegistry,
) -> (SessionState, RenderData) {
    let mut selected_override: Option<String> = None;
    let mut candidate: Option<Vec<u8>> = None;

    match event {
        SessionEvent::ImageCaptured(bytes) => {
            debug!("Camera capture: {} bytes", bytes.len());
            candidate = Some(bytes);
        }
        SessionEvent::ImageUploaded { file_name, bytes } => {
            if !is_supported_extension(&file_name) {
                warn!("Rejected upload '{}': unsupported extension", file_name);
                let render = RenderData {
                    notice: Some(Notice::UnsupportedFormat(file_name)),
                    ..Default::default()
                };
                return (state, render);
            }
            debug!("Upload '{}': {} bytes", file_name, bytes.len());
            candidate = Some(bytes);
        }
        SessionEvent::LabelSelected(label) => {
            debug!("Label selected: {}", label);
            selected_override = Some(label);
        }
    }

    let render = run_pass(&mut state, candidate, selected_override, predictor, registry);
    (state, render)
}

/// One synchronous pass: predict (if an image is at hand), rank, resolve
/// content, derive thumbnails.
///
/// A freshly supplied image only replaces the stored one once it survives
/// decoding and inference; on failure the prior state stays intact.
fn run_pass(
    state: &mut SessionState,
    candidate: Option<Vec<u8>>,
    selected_override: Option<String>,
    predictor: &dyn Predictor,
    registry: &ContentRegistry,
) -> RenderData {
    let mut render = RenderData::default();

    let fresh = candidate.is_some();
    let bytes = candidate.or_else(|| state.image_bytes.clone());

    match bytes {
        None => {
            render.notice = Some(Notice::AwaitingImage);
        }
        Some(bytes) => match predictor.predict_bytes(&bytes) {
            Ok(prediction) => {
                if fresh {
                    state.image_bytes = Some(bytes);
                }
                // The vocabulary invariant for last_predicted_label holds
                // because the label comes from the predictor itself.
                state.last_predicted_label = Some(prediction.label.clone());

                match rank(predictor.labels(), &prediction.probabilities) {
                    Ok(ranked) => {
                        render.ranked = ranked
                            .into_iter()
                            .map(|(label, probability)| RankedEntry {
                                highlighted: state.last_predicted_label.as_deref()
                                    == Some(label.as_str()),
                                label,
                                probability,
                            })
                            .collect();
                    }
                    Err(e) => {
                        warn!("Ranking failed: {}", e);
                        render.notice = Some(Notice::PredictionFailed(e.to_string()));
                    }
                }
                render.prediction = Some(prediction);
            }
            Err(e @ ClassifierError::UnsupportedFormat(_)) => {
                render.notice = Some(Notice::UnsupportedFormat(e.to_string()));
            }
            Err(ClassifierError::ImageError(msg)) => {
                warn!("Image decode failed: {}", msg);
                render.notice = Some(Notice::InvalidImage(msg));
            }
            Err(e) => {
                warn!("Prediction failed: {}", e);
                render.notice = Some(Notice::PredictionFailed(e.to_string()));
            }
        },
    }

    // Content follows the selected label when there is one, the predicted
    // label otherwise. A selection never becomes last_predicted_label.
    let content_label = selected_override.or_else(|| state.last_predicted_label.clone());
    if let Some(label) = content_label {
        let content = registry.resolve(&label);
        if content.is_empty() && render.notice.is_none() {
            render.notice = Some(Notice::NoContent(label.clone()));
        }
        render.videos = content
            .videos
            .iter()
            .map(|url| VideoLink {
                url: url.clone(),
                thumbnail: thumbnail_url(url),
            })
            .collect();
        render.content = content;
        render.selected_label = Some(label);
    }

    render
}
