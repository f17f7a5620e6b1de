use std::process;

use clap::Parser;

use facecheck_core::detection::domain::face_locator::FaceLocator;
use facecheck_core::detection::domain::landmark_extractor::LandmarkExtractor;
use facecheck_core::detection::infrastructure::model_resolver::{ModelResolver, ModelSource};
use facecheck_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use facecheck_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facecheck_core::imaging::infrastructure::base64_frame_decoder::Base64FrameDecoder;
use facecheck_core::pipeline::classify_frame_use_case::ClassifyFrameUseCase;
use facecheck_core::pipeline::verify_face_use_case::VerifyFaceUseCase;
use facecheck_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use facecheck_server::config::Cli;
use facecheck_server::{create_router, AppState, HttpOptions};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli.validate()?;

    // Models load before the runtime starts; the resolver downloads with a
    // blocking client.
    let use_case = build_use_case(&cli)?;
    let options = HttpOptions {
        cors_origins: cli.cors_origins.clone(),
        max_body_bytes: cli.max_body_bytes,
    };
    let app = create_router(AppState::new(use_case), &options);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(app, &cli))
}

async fn serve(app: axum::Router, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log_banner(cli, &listener.local_addr()?.to_string());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shutdown complete");
    Ok(())
}

fn build_use_case(cli: &Cli) -> Result<VerifyFaceUseCase, Box<dyn std::error::Error>> {
    let resolver = match &cli.model_cache_dir {
        Some(dir) => ModelResolver::new(dir.clone()),
        None => ModelResolver::with_default_cache()?,
    };
    let yolo_path = resolver.resolve_or(
        cli.yolo_model.as_deref(),
        ModelSource {
            name: YOLO_MODEL_NAME,
            url: YOLO_MODEL_URL,
        },
    )?;

    // Locator and extractor run concurrently, so each gets its own session
    let locator: Box<dyn FaceLocator> = match &cli.blazeface_model {
        Some(path) => Box::new(OnnxBlazefaceDetector::new(path, cli.confidence)?),
        None => Box::new(OnnxYoloDetector::new(&yolo_path, cli.confidence)?),
    };
    let extractor: Box<dyn LandmarkExtractor> =
        Box::new(OnnxYoloDetector::new(&yolo_path, cli.confidence)?);

    let classifier = ClassifyFrameUseCase::new(locator, extractor, cli.policy());
    Ok(VerifyFaceUseCase::new(
        Box::new(Base64FrameDecoder::new()),
        classifier,
    ))
}

fn log_banner(cli: &Cli, addr: &str) {
    let policy = cli.policy();
    let locator = if cli.blazeface_model.is_some() {
        "BlazeFace"
    } else {
        "YOLO"
    };
    log::info!("facecheck {} listening on http://{addr}", env!("CARGO_PKG_VERSION"));
    log::info!("  POST /verify-face  (face locator: {locator}, landmarks: YOLO)");
    log::info!("  Checks:");
    log::info!("    camera blocked   mean brightness < {}", policy.min_brightness);
    log::info!("    face count       0 or more than {}", policy.max_faces);
    log::info!("    head tilt        |roll| > {}deg", policy.roll_threshold_deg);
    log::info!("    looking away     |yaw| > {}deg", policy.yaw_threshold_deg);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal");
}
