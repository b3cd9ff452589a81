use anyhow::Result;
use holdem_advisor::{ConsoleSink, OutputSink, TracingSink};
use holdem_capture::{FrameSource, ReplaySource, WindowSource};
use holdem_scout::{spawn_stdin_listener, Monitor, MonitorConfig, OutputKind};
use holdem_vision::{DirectoryTemplates, FrameExtractor};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

const USAGE: &str = "Usage: holdem-scout [config.json] [--replay <screenshots_dir>]";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "holdem_scout=debug,holdem_capture=debug,holdem_vision=debug".into()
            }),
        )
        .init();

    let mut config_path = PathBuf::from("holdem-scout.json");
    let mut replay_dir: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--replay" => match args.next() {
                Some(dir) => replay_dir = Some(PathBuf::from(dir)),
                None => {
                    eprintln!("{}", USAGE);
                    std::process::exit(2);
                }
            },
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => config_path = PathBuf::from(arg),
        }
    }

    let config = MonitorConfig::load(&config_path)?;
    config.validate()?;

    let source: Arc<dyn FrameSource> = match &replay_dir {
        Some(dir) => Arc::new(ReplaySource::new(dir)?),
        None => Arc::new(WindowSource::new(config.window_titles.iter())),
    };

    let templates = DirectoryTemplates {
        dir: config.templates_dir.clone(),
    };
    let extractor =
        FrameExtractor::from_source(&templates, config.detector.clone(), config.grouper.clone())?;
    if extractor.template_count() == 0 {
        warn!(
            "No glyph templates in {}; nothing will be detected",
            config.templates_dir.display()
        );
    }

    let sink: Arc<dyn OutputSink> = match config.output {
        OutputKind::Console => Arc::new(ConsoleSink),
        OutputKind::Log => Arc::new(TracingSink),
    };
    let mut monitor = Monitor::new(config, source, Arc::new(extractor)).with_sink(sink);

    spawn_stdin_listener(monitor.triggers());
    println!("Press Enter to request advice for every table, or type a table name.");

    let stop = monitor.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            stop.store(true, Ordering::Relaxed);
        }
    });

    monitor.run().await;
    Ok(())
}
