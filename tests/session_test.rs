use labelkiosk::classifier::{ClassifierError, Prediction};
use labelkiosk::content::{ContentEntry, ContentRegistry};
use labelkiosk::session::{handle_event, Notice, Predictor, SessionEvent, SessionState};

/// Drives the interaction handler without a model artifact. Bytes equal to
/// `b"unreadable"` simulate a decode failure.
struct StubPredictor {
    labels: Vec<String>,
    probabilities: Vec<f32>,
}

impl StubPredictor {
    fn new(labels: &[&str], probabilities: &[f32]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            probabilities: probabilities.to_vec(),
        }
    }
}

impl Predictor for StubPredictor {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction, ClassifierError> {
        if bytes == b"unreadable" {
            return Err(ClassifierError::ImageError("not an image".into()));
        }
        let class_index = self
            .probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        Ok(Prediction {
            label: self.labels[class_index].clone(),
            class_index,
            probabilities: self.probabilities.clone(),
        })
    }
}

fn abc_predictor() -> StubPredictor {
    StubPredictor::new(&["A", "B", "C"], &[0.2, 0.5, 0.3])
}

fn registry_for_b() -> ContentRegistry {
    let mut registry = ContentRegistry::new();
    registry.insert(
        "B",
        ContentEntry {
            texts: vec!["about B".into()],
            images: vec!["https://example.com/b.jpg".into()],
            videos: vec!["https://youtu.be/7xmgRLTjxIw?si=abc".into()],
        },
    );
    registry
}

#[test]
fn test_capture_ranks_and_highlights_prediction() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let event = SessionEvent::ImageCaptured(b"frame".to_vec());
    let (state, render) = handle_event(SessionState::new(), event, &predictor, &registry);

    assert_eq!(state.last_predicted_label.as_deref(), Some("B"));
    assert_eq!(state.image_bytes.as_deref(), Some(b"frame".as_slice()));

    let order: Vec<(&str, f32)> = render
        .ranked
        .iter()
        .map(|e| (e.label.as_str(), e.probability))
        .collect();
    assert_eq!(order, vec![("B", 0.5), ("C", 0.3), ("A", 0.2)]);

    let highlighted: Vec<&str> = render
        .ranked
        .iter()
        .filter(|e| e.highlighted)
        .map(|e| e.label.as_str())
        .collect();
    assert_eq!(highlighted, vec!["B"]);
}

#[test]
fn test_predicted_label_drives_content_and_thumbnails() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let event = SessionEvent::ImageUploaded {
        file_name: "photo.jpg".into(),
        bytes: b"pixels".to_vec(),
    };
    let (_, render) = handle_event(SessionState::new(), event, &predictor, &registry);

    assert_eq!(render.selected_label.as_deref(), Some("B"));
    assert_eq!(render.content.texts, vec!["about B"]);
    assert_eq!(render.videos.len(), 1);
    assert_eq!(
        render.videos[0].thumbnail.as_deref(),
        Some("https://img.youtube.com/vi/7xmgRLTjxIw/hqdefault.jpg")
    );
    assert!(render.notice.is_none());
}

#[test]
fn test_label_without_content_yields_no_content_notice() {
    let predictor = StubPredictor::new(&["A", "B", "C"], &[0.1, 0.2, 0.7]);
    let registry = registry_for_b(); // no entry for "C"

    let event = SessionEvent::ImageCaptured(b"frame".to_vec());
    let (state, render) = handle_event(SessionState::new(), event, &predictor, &registry);

    assert_eq!(state.last_predicted_label.as_deref(), Some("C"));
    assert!(render.content.is_empty());
    assert_eq!(render.notice, Some(Notice::NoContent("C".to_string())));
}

#[test]
fn test_selecting_label_overrides_content_but_not_prediction() {
    let predictor = abc_predictor();
    let mut registry = registry_for_b();
    registry.insert(
        "A",
        ContentEntry {
            texts: vec!["about A".into()],
            ..Default::default()
        },
    );

    let (state, _) = handle_event(
        SessionState::new(),
        SessionEvent::ImageCaptured(b"frame".to_vec()),
        &predictor,
        &registry,
    );
    let (state, render) = handle_event(
        state,
        SessionEvent::LabelSelected("A".into()),
        &predictor,
        &registry,
    );

    // Content follows the selection; the prediction and its highlight don't.
    assert_eq!(render.selected_label.as_deref(), Some("A"));
    assert_eq!(render.content.texts, vec!["about A"]);
    assert_eq!(state.last_predicted_label.as_deref(), Some("B"));
    let highlighted: Vec<&str> = render
        .ranked
        .iter()
        .filter(|e| e.highlighted)
        .map(|e| e.label.as_str())
        .collect();
    assert_eq!(highlighted, vec!["B"]);
}

#[test]
fn test_selected_label_outside_vocabulary_degrades() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let (state, _) = handle_event(
        SessionState::new(),
        SessionEvent::ImageCaptured(b"frame".to_vec()),
        &predictor,
        &registry,
    );
    let (state, render) = handle_event(
        state,
        SessionEvent::LabelSelected("not-a-label".into()),
        &predictor,
        &registry,
    );

    assert!(render.content.is_empty());
    // The invariant holds: only real predictions become last_predicted_label.
    assert_eq!(state.last_predicted_label.as_deref(), Some("B"));
}

#[test]
fn test_unsupported_extension_rejected_before_decode() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let event = SessionEvent::ImageUploaded {
        file_name: "animation.gif".into(),
        bytes: b"pixels".to_vec(),
    };
    let (state, render) = handle_event(SessionState::new(), event, &predictor, &registry);

    assert!(matches!(render.notice, Some(Notice::UnsupportedFormat(_))));
    assert!(state.image_bytes.is_none());
    assert!(render.ranked.is_empty());
}

#[test]
fn test_decode_failure_preserves_prior_state() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let (state, _) = handle_event(
        SessionState::new(),
        SessionEvent::ImageCaptured(b"frame".to_vec()),
        &predictor,
        &registry,
    );
    let (state, render) = handle_event(
        state,
        SessionEvent::ImageCaptured(b"unreadable".to_vec()),
        &predictor,
        &registry,
    );

    assert!(matches!(render.notice, Some(Notice::InvalidImage(_))));
    // The previous image and prediction survive the failed interaction.
    assert_eq!(state.image_bytes.as_deref(), Some(b"frame".as_slice()));
    assert_eq!(state.last_predicted_label.as_deref(), Some("B"));
}

#[test]
fn test_selection_before_any_image() {
    let predictor = abc_predictor();
    let registry = registry_for_b();

    let (state, render) = handle_event(
        SessionState::new(),
        SessionEvent::LabelSelected("B".into()),
        &predictor,
        &registry,
    );

    assert!(state.image_bytes.is_none());
    assert!(state.last_predicted_label.is_none());
    assert!(render.ranked.is_empty());
    // Browsing content without an image still works.
    assert_eq!(render.content.texts, vec!["about B"]);
    assert_eq!(render.notice, Some(Notice::AwaitingImage));
}
