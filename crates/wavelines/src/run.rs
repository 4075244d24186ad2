use std::thread;

use anyhow::{Context, Result};
use lineconfig::ConfigDocument;
use renderer::dpi::{LogicalPosition, LogicalSize, PhysicalSize};
use renderer::{render_still, PreviewOptions, PreviewRuntime};
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, RunArgs, SnapshotArgs};
use crate::config::{ConfigSource, ConfigWatcher};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let source = ConfigSource::locate(args.config.as_deref())?;
    let initial = source.read()?;
    let document = source.parse(initial.as_deref())?;
    tracing::debug!(config = %source.path.display(), "resolved wavelines config");

    let (width, height) = args
        .size
        .unwrap_or((document.preview.width, document.preview.height));
    let options = PreviewOptions {
        title: document.preview.title.clone(),
        size: LogicalSize::new(width, height),
        device_pixel_ratio: document.preview.device_pixel_ratio,
        config: document.lines.clone(),
    };

    let runtime = PreviewRuntime::spawn(options).context("failed to open preview window")?;
    tracing::info!(width, height, "preview window running");

    let mut interval = document.preview.reload_interval;
    let mut watcher = ConfigWatcher::new(source, initial);
    while !runtime.is_finished() {
        thread::sleep(interval);
        match watcher.poll() {
            Ok(Some(document)) => {
                interval = document.preview.reload_interval;
                tracing::info!("configuration changed; applying");
                if let Err(err) = runtime.apply(document.lines) {
                    tracing::debug!("reload dropped: {err:#}");
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("configuration reload failed: {err:#}"),
        }
    }

    runtime.shutdown()
}

pub fn snapshot(args: SnapshotArgs) -> Result<()> {
    let document = ConfigSource::locate(args.config.as_deref())?.load()?;
    let (width, height) = args
        .size
        .unwrap_or((document.preview.width, document.preview.height));
    let pointer = args.pointer.map(|(x, y)| LogicalPosition::new(x, y));

    let image = render_still(
        &document.lines,
        PhysicalSize::new(width, height),
        args.time,
        pointer,
    );
    image
        .save(&args.out)
        .with_context(|| format!("failed to write snapshot {}", args.out.display()))?;

    tracing::info!(
        path = %args.out.display(),
        width,
        height,
        time = args.time,
        "snapshot written"
    );
    Ok(())
}

pub fn check_config(args: CheckArgs) -> Result<()> {
    let source = ConfigSource::locate(args.config.as_deref())?;
    let document = source.load()?;
    println!("{}", describe(&document)?);
    Ok(())
}

fn describe(document: &ConfigDocument) -> Result<String> {
    serde_json::to_string_pretty(&document.resolved()).context("failed to encode configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_emits_resolved_json() {
        let json = describe(&ConfigDocument::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bands"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["interactive"], serde_json::Value::Bool(true));
        assert_eq!(value["mix_blend_mode"], "screen");
    }
}
