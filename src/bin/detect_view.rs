//! detect_view - run object detection on an image and write the result view
//!
//! This tool:
//! 1. Decodes the uploaded image (intrinsic size is needed for normalization)
//! 2. Sends it to the configured provider (or replays a recorded response)
//! 3. Writes an HTML result view with boxes, statistics and class toggles
//!
//! With `--interactive` it keeps the view open and reads commands from stdin.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use detection_viewer::detect::{FixtureBackend, SharedBackend};
use detection_viewer::models;
use detection_viewer::ui::{LoadingGuard, Ui};
use detection_viewer::view::{write_document, Phase, RequestToken, ResultView, ViewSnapshot};
use detection_viewer::{
    BackendRegistry, DetectConfig, DetectionCapability, DetectionResult, ImageUpload,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image to upload.
    image: Option<PathBuf>,
    /// Output path of the HTML result view.
    #[arg(long, default_value = "detection_result.html")]
    out: PathBuf,
    /// Also write the normalized detections as JSON.
    #[arg(long)]
    json: Option<PathBuf>,
    /// Model forwarded to the custom endpoint (defaults to the first listed model).
    #[arg(long, env = "DETECT_MODEL")]
    model: Option<String>,
    /// Hide a class in the written view. Repeatable.
    #[arg(long = "hide")]
    hide: Vec<String>,
    /// Replay a recorded provider response instead of calling a provider.
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Keep the view open and read commands from stdin.
    #[arg(long)]
    interactive: bool,
    /// Loading indicator style: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
}

enum Event {
    Command(String),
    Completed(RequestToken, Result<DetectionResult>),
    Shutdown,
}

/// Where detection backends come from.
enum Source {
    Replay(PathBuf),
    Config(DetectConfig),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = Ui::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());

    let source = match &args.replay {
        Some(path) => {
            log::info!("replaying recorded response {}", path.display());
            Source::Replay(path.clone())
        }
        None => Source::Config(DetectConfig::load()?),
    };
    let registry = build_registry(&source)?;
    log::info!("detection backend: {}", registry.list().join(", "));
    let model = resolve_model(&args, &source, &registry);

    let mut view = ResultView::new();
    let out = args.out.clone();
    view.subscribe(Box::new(move |snapshot: &ViewSnapshot<'_>| {
        if let Err(e) = write_document(snapshot, &out) {
            log::error!("{:#}", e);
        }
    }));

    if args.interactive {
        return run_interactive(&args, &ui, Arc::new(source), model, view);
    }

    let path = args
        .image
        .as_deref()
        .ok_or_else(|| anyhow!("an image path is required unless --interactive is set"))?;
    let upload = ImageUpload::from_path(path)?;
    let backend = open_backend(&source, &model)?;
    let token = view.select_image(upload.clone(), model);
    let outcome = {
        let loading = ui.loading("detecting objects");
        let outcome = detect_with(&backend, &upload);
        if let Err(e) = &outcome {
            loading.fail(&e.to_string());
        }
        outcome
    };
    view.complete(token, outcome);
    for label in &args.hide {
        view.toggle(label);
    }

    if let Phase::Failed { message } = view.phase() {
        return Err(anyhow!("{} (upload the image again to retry)", message));
    }
    if let Some(json_path) = &args.json {
        write_json(view.result(), json_path)?;
    }
    print_stats(&view);
    log::info!("result view written to {}", args.out.display());
    Ok(())
}

fn build_registry(source: &Source) -> Result<BackendRegistry> {
    match source {
        Source::Replay(path) => {
            let mut registry = BackendRegistry::new();
            registry.register(FixtureBackend::from_file(path)?);
            Ok(registry)
        }
        Source::Config(config) => BackendRegistry::from_config(config),
    }
}

/// Fresh backend for one request, with the model selection applied.
///
/// Every request owns its backend, so a superseded request never holds up
/// the one that replaced it.
fn open_backend(source: &Source, model: &Option<String>) -> Result<SharedBackend> {
    let backend = build_registry(source)?
        .default_backend()
        .ok_or_else(|| anyhow!("no detection backend configured"))?;
    backend
        .lock()
        .map_err(|_| anyhow!("backend lock poisoned"))?
        .select_model(model.clone());
    Ok(backend)
}

/// Model forwarded with requests; `None` when the active backend takes none.
fn resolve_model(args: &Args, source: &Source, registry: &BackendRegistry) -> Option<String> {
    let supported = registry
        .default_supports(DetectionCapability::ModelSelection)
        .unwrap_or(false);
    if !supported {
        if let Some(model) = &args.model {
            log::warn!("active backend does not take a model; ignoring '{}'", model);
        }
        return None;
    }
    if args.model.is_some() {
        return args.model.clone();
    }
    let Source::Config(config) = source else {
        return None;
    };
    if let Some(model) = &config.custom.model {
        return Some(model.clone());
    }
    let url = match config.models_listing_url()? {
        Ok(url) => url,
        Err(e) => {
            log::warn!("{:#}", e);
            return None;
        }
    };
    match models::fetch_models(&url, config.timeout) {
        Ok(listing) => {
            let chosen = models::default_model(&listing).map(|m| m.model_name.clone());
            if let Some(name) = &chosen {
                log::info!("auto-selected model {}", name);
            } else {
                log::warn!("no models available at {}", url);
            }
            chosen
        }
        Err(e) => {
            log::warn!("error fetching models: {:#}", e);
            None
        }
    }
}

fn detect_with(backend: &SharedBackend, upload: &ImageUpload) -> Result<DetectionResult> {
    let mut guard = backend
        .lock()
        .map_err(|_| anyhow!("backend lock poisoned"))?;
    guard.detect(upload)
}

fn run_interactive(
    args: &Args,
    ui: &Ui,
    source: Arc<Source>,
    model: Option<String>,
    mut view: ResultView,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let stdin_tx = tx.clone();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if stdin_tx.send(Event::Command(line)).is_err() {
                return;
            }
        }
        let _ = stdin_tx.send(Event::Shutdown);
    });

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Event::Shutdown);
    })?;

    let mut loading: Option<(RequestToken, LoadingGuard)> = None;
    if let Some(path) = &args.image {
        loading = start_detection(&mut view, ui, &source, &model, path, &tx);
    }
    print_help();

    for event in rx {
        match event {
            Event::Completed(token, outcome) => {
                if loading.as_ref().map(|(t, _)| *t) == Some(token) {
                    if let Some((_, guard)) = loading.take() {
                        if let Err(e) = &outcome {
                            guard.fail(&e.to_string());
                        }
                    }
                }
                if view.complete(token, outcome) {
                    match view.phase() {
                        Phase::Failed { message } => {
                            println!("error: {} (use `new <path>` to retry)", message)
                        }
                        _ => print_stats(&view),
                    }
                }
            }
            Event::Command(line) => {
                let line = line.trim();
                let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
                let rest = rest.trim();
                match command {
                    "" => {}
                    "toggle" if !rest.is_empty() => {
                        if view.stats().iter().any(|entry| entry.label == rest) {
                            view.toggle(rest);
                            print_stats(&view);
                        } else {
                            println!("unknown class '{}'", rest);
                        }
                    }
                    "show" => print_stats(&view),
                    "save" => {
                        write_document(&view.snapshot(), &args.out)?;
                        if let Some(json_path) = &args.json {
                            write_json(view.result(), json_path)?;
                        }
                        println!("saved {}", args.out.display());
                    }
                    "new" if !rest.is_empty() => {
                        cancel_loading(&mut loading);
                        loading = start_detection(
                            &mut view,
                            ui,
                            &source,
                            &model,
                            Path::new(rest),
                            &tx,
                        );
                    }
                    "reset" => {
                        cancel_loading(&mut loading);
                        view.reset();
                        println!("ready for a new image");
                    }
                    "quit" | "exit" => break,
                    _ => print_help(),
                }
            }
            Event::Shutdown => break,
        }
    }
    cancel_loading(&mut loading);
    log::info!("session closed");
    Ok(())
}

fn cancel_loading(loading: &mut Option<(RequestToken, LoadingGuard)>) {
    if let Some((_, guard)) = loading.take() {
        guard.cancel();
    }
}

fn start_detection(
    view: &mut ResultView,
    ui: &Ui,
    source: &Arc<Source>,
    model: &Option<String>,
    path: &Path,
    tx: &mpsc::Sender<Event>,
) -> Option<(RequestToken, LoadingGuard)> {
    let upload = match ImageUpload::from_path(path) {
        Ok(upload) => upload,
        Err(e) => {
            let message = format!("{:#}", e);
            println!("error: {} (use `new <path>` to retry)", message);
            view.fail_selection(message);
            return None;
        }
    };
    let token = view.select_image(upload.clone(), model.clone());
    let guard = ui.loading(&format!("detecting objects in {}", upload.file_name()));
    let source = Arc::clone(source);
    let model = model.clone();
    let tx = tx.clone();
    thread::spawn(move || {
        let outcome =
            open_backend(&source, &model).and_then(|backend| detect_with(&backend, &upload));
        let _ = tx.send(Event::Completed(token, outcome));
    });
    Some((token, guard))
}

fn write_json(result: &DetectionResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)
        .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))
}

fn print_stats(view: &ResultView) {
    let snapshot = view.snapshot();
    for row in &snapshot.rows {
        let mark = if row.visible { "[x]" } else { "[ ]" };
        let bar = "#".repeat((row.bar_percent / 5.0).round() as usize);
        println!("{} {:<16} {:<20} {}", mark, row.label, bar, row.count);
    }
    println!("total {} · visible {}", snapshot.total, snapshot.visible);
}

fn print_help() {
    println!("commands: toggle <label> | show | save | new <path> | reset | quit");
}
