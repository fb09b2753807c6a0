use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use lucent_renderer::{
    export, output_path, render, LogObserver, RenderConfig, RenderObserver, RenderScene, Stage,
};

mod cli;

use cli::Args;

fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn load_config(args: &Args) -> Result<RenderConfig> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderConfig::default(),
    };

    if let Some(threads) = args.threads {
        config.scheduling.threads = threads;
    }
    if let Some(strategy) = args.strategy {
        config.scheduling.strategy = strategy.into();
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.into());

    let config = load_config(&args)?;
    let scene = lucent_core::load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let observer = LogObserver;
    observer.stage_started(Stage::Build);
    let start = Instant::now();
    let scene = RenderScene::build(scene, &config.acceleration);
    observer.stage_finished(Stage::Build, start.elapsed());

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    let cancel = AtomicBool::new(false);
    for (index, camera) in scene.cameras.iter().enumerate() {
        let image = render(&scene, index, &config, &observer, &cancel)
            .with_context(|| format!("Failed to render camera {}", index))?;

        let stage = Stage::Export { camera: index };
        observer.stage_started(stage);
        let start = Instant::now();
        let path = output_path(&args.output_dir, &camera.image_name, config.output.format);
        export(&image, &path, config.output.format)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        observer.stage_finished(stage, start.elapsed());
    }

    if scene.cameras.is_empty() {
        log::warn!("Scene has no cameras; nothing rendered");
    }
    Ok(())
}
