use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use labelkiosk::session::{handle_event, Notice, SessionEvent, SessionState};
use labelkiosk::{Classifier, ContentRegistry, ModelManager, ModelSource};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image file to classify (jpg, jpeg, png, webp, tiff)
    image: PathBuf,

    /// URL of the ONNX model artifact
    #[arg(long)]
    model_url: String,

    /// URL of the JSON label vocabulary
    #[arg(long)]
    labels_url: String,

    /// Cache name for the downloaded artifact
    #[arg(long, default_value = "default")]
    name: String,

    /// Expected sha256 of the model file
    #[arg(long)]
    model_hash: Option<String>,

    /// Expected sha256 of the labels file
    #[arg(long)]
    labels_hash: Option<String>,

    /// JSON file mapping labels to curated content
    #[arg(long)]
    content: Option<PathBuf>,

    /// Show content for this label instead of the predicted one
    #[arg(long)]
    select: Option<String>,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    fresh: bool,
}

async fn ensure_model_downloaded(
    manager: &ModelManager,
    source: &ModelSource,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        info!("Fresh download requested - removing any existing model files...");
        manager.remove_download(&source.name)?;
    }
    manager.ensure_downloaded(source).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting Image Kiosk Demo ===");

    let manager = ModelManager::new_default()?;
    let source = ModelSource {
        name: args.name.clone(),
        model_url: args.model_url.clone(),
        labels_url: args.labels_url.clone(),
        model_hash: args.model_hash.clone(),
        labels_hash: args.labels_hash.clone(),
    };

    // Model fetch failures are fatal to startup; everything after this point
    // degrades per interaction instead.
    ensure_model_downloaded(&manager, &source, args.fresh).await?;

    let start_time = Instant::now();
    info!("Building classifier...");

    let classifier = Classifier::builder()
        .with_downloaded_model(&manager, &args.name)?
        .build()?;

    let build_time = start_time.elapsed();
    info!("=== Classifier Built Successfully (took {:.2?}) ===", build_time);
    println!(
        "Known labels: {}",
        classifier.labels().join(", ")
    );

    let registry = match &args.content {
        Some(path) => {
            let registry = ContentRegistry::from_path(path)?;
            let unknown = registry.validate_against(classifier.labels());
            if !unknown.is_empty() {
                info!("Registry entries without a matching label: {:?}", unknown);
            }
            registry
        }
        None => ContentRegistry::new(),
    };

    let bytes = std::fs::read(&args.image)?;
    let event = SessionEvent::ImageUploaded {
        file_name: args.image.to_string_lossy().to_string(),
        bytes,
    };

    let infer_start = Instant::now();
    let (state, render) = handle_event(SessionState::new(), event, &classifier, &registry);
    info!("Inference pass took {:.2?}", infer_start.elapsed());

    let (state, render) = match &args.select {
        Some(label) => handle_event(
            state,
            SessionEvent::LabelSelected(label.clone()),
            &classifier,
            &registry,
        ),
        None => (state, render),
    };

    if let Some(prediction) = &render.prediction {
        println!("\nPredicted: {}", prediction.label);
        println!("Probabilities (sorted):");
        for entry in &render.ranked {
            let marker = if entry.highlighted { " <--" } else { "" };
            println!(
                "  {}: {:.2}%{}",
                entry.label,
                entry.probability * 100.0,
                marker
            );
        }
    }

    if let Some(label) = &render.selected_label {
        println!("\nContent for '{}':", label);
        for text in &render.content.texts {
            println!("  text:  {}", text);
        }
        for image in &render.content.images {
            println!("  image: {}", image);
        }
        for video in &render.videos {
            match &video.thumbnail {
                Some(thumb) => println!("  video: {} (thumbnail: {})", video.url, thumb),
                None => println!("  video: {}", video.url),
            }
        }
    }

    match &render.notice {
        Some(Notice::NoContent(label)) => {
            println!("\nNo content yet for label '{}'.", label);
        }
        Some(notice) => {
            eprintln!("\nNotice: {:?}", notice);
        }
        None => {}
    }

    let _ = state;
    info!("=== Demo Complete ({:.2?} total) ===", start_time.elapsed());
    Ok(())
}
