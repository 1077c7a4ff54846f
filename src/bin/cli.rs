//! Command-line front end: hat every face in a photo and save the result.
//!
//! Usage:
//!   hatter <image>                               # SeetaFace detector, writes <stem>-hatted.png
//!   hatter <image> --detections faces.json       # Replay detections from another tool
//!   hatter <image> --debug -o debug.png          # Include the debug overlay
//!   hatter <image> --json                        # JSON summary on stdout

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use hatter::{
    export, DirAssetLoader, FaceDetector, Pipeline, SeetaDetector, Settings, SidecarDetector,
    SourceImage,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hatter")]
#[command(author, version, about = "Put a hat on every face in a photo", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Output image (default: <image stem>-hatted.png next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read faces and landmarks from a JSON file instead of running a detector
    #[arg(long, conflicts_with = "detector_model")]
    detections: Option<PathBuf>,

    /// SeetaFace detector model path
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Directory holding prop manifests
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Prop id to place
    #[arg(long)]
    prop: Option<String>,

    /// Settings file (JSON, TOML or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw face boxes, landmarks and anchors into the output
    #[arg(long)]
    debug: bool,

    /// Print a JSON summary instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    image: String,
    output: String,
    width: u32,
    height: u32,
    prop: String,
    faces_detected: usize,
    faces: Vec<FaceOutput>,
}

#[derive(Serialize)]
struct FaceOutput {
    /// Face index (0-based, matches the debug labels)
    index: usize,
    score: f32,
    bounding_box: hatter::BoundingBox,
    anchors: hatter::AnchorPair,
    scale: f32,
    rotation_degrees: f32,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build();
    let runtime = match runtime {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(&args)) {
        if e.is_no_face() {
            eprintln!("No faces detected");
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

async fn run(args: &Args) -> hatter::Result<()> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref dir) = args.assets {
        settings.assets.dir = dir.clone();
    }
    if let Some(ref prop) = args.prop {
        settings.assets.prop = prop.clone();
    }
    if let Some(ref model) = args.detector_model {
        settings.seeta.model = model.clone();
    }

    let detector: Rc<dyn FaceDetector> = match args.detections {
        Some(ref path) => Rc::new(SidecarDetector::open(path).await?),
        None => {
            tracing::info!(model = %settings.seeta.model.display(), "loading face detector");
            Rc::new(SeetaDetector::new(&settings.seeta)?)
        }
    };

    let mut pipeline = Pipeline::new(detector, settings.detection);
    pipeline
        .load_assets(&DirAssetLoader::new(&settings.assets.dir), &settings.assets.prop)
        .await?;

    tracing::info!(path = %args.image.display(), "loading image");
    let image = SourceImage::open(&args.image)?;
    let (width, height) = (image.width(), image.height());
    pipeline.process(image).await?;

    let raster = pipeline.export(args.debug)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| export::output_path(&args.image, &settings.output.suffix));
    export::save_png(&raster, &output_path)?;

    let faces = pipeline
        .faces()
        .iter()
        .zip(pipeline.scene().map(|s| s.placements()).unwrap_or_default())
        .map(|(face, placement)| FaceOutput {
            index: placement.face_index,
            score: face.score,
            bounding_box: face.bbox,
            anchors: placement.anchors,
            scale: placement.transform.scale,
            rotation_degrees: placement.transform.rotation.to_degrees(),
        })
        .collect::<Vec<_>>();

    let output = Output {
        image: args.image.display().to_string(),
        output: output_path.display().to_string(),
        width,
        height,
        prop: settings.assets.prop.clone(),
        faces_detected: faces.len(),
        faces,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_human_readable(&output));
    }

    Ok(())
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!("Image: {} ({}x{})\n", output.image, output.width, output.height));
    s.push_str(&format!("Prop: {}\n", output.prop));
    s.push_str(&format!("Faces hatted: {}\n", output.faces_detected));

    for face in &output.faces {
        s.push_str(&format!("\n--- Face {} ---\n", face.index));
        s.push_str(&format!(
            "Bounding box: {:.0}x{:.0} at ({:.0}, {:.0}), score {:.2}\n",
            face.bounding_box.width,
            face.bounding_box.height,
            face.bounding_box.x,
            face.bounding_box.y,
            face.score
        ));
        s.push_str(&format!(
            "Anchors: L ({:.1}, {:.1})  R ({:.1}, {:.1})\n",
            face.anchors.left.x, face.anchors.left.y, face.anchors.right.x, face.anchors.right.y
        ));
        s.push_str(&format!(
            "Scale: {:.3}  Rotation: {:.1} deg\n",
            face.scale, face.rotation_degrees
        ));
    }

    s.push_str(&format!("\nSaved: {}\n", output.output));
    s
}
