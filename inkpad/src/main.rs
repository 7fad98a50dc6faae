#![warn(clippy::pedantic)]

mod replay;
mod settings;

use anyhow::Result as AnyResult;
use az::SaturatingAs;
use inkpad_core::{renderer::RasterRenderer, transform::Matrix, viewport::Viewport, Editor};

const USAGE: &str =
    "usage: inkpad [--config PATH] [--scale FACTOR] [--write-default-config] COMMANDS.jsonl OUT_PREFIX";

#[derive(Default)]
struct Args {
    config: Option<std::path::PathBuf>,
    scale: Option<f32>,
    write_default_config: bool,
    positional: Vec<std::path::PathBuf>,
}
impl Args {
    fn parse(mut args: impl Iterator<Item = std::ffi::OsString>) -> AnyResult<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.to_str() {
                Some("--config") => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--config needs a path\n{USAGE}"))?;
                    parsed.config = Some(path.into());
                }
                Some("--scale") => {
                    let scale = args
                        .next()
                        .and_then(|s| s.to_str()?.parse::<f32>().ok())
                        .filter(|s| s.is_finite() && *s > 0.0)
                        .ok_or_else(|| anyhow::anyhow!("--scale needs a positive number\n{USAGE}"))?;
                    parsed.scale = Some(scale);
                }
                Some("--write-default-config") => parsed.write_default_config = true,
                Some("--help" | "-h") => anyhow::bail!(USAGE),
                _ => parsed.positional.push(arg.into()),
            }
        }
        Ok(parsed)
    }
}

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let args = Args::parse(std::env::args_os().skip(1))?;
    if args.write_default_config {
        let path = settings::Settings::save_default()?;
        log::info!("wrote default settings to {}", path.display());
    }
    let settings = match &args.config {
        Some(path) => settings::Settings::load_or_default(path),
        None => settings::Settings::from_preferences(),
    };
    if settings.did_fail_to_load() {
        log::info!("using default settings");
    }

    let [commands_path, out_prefix] = args.positional.as_slice() else {
        if args.write_default_config && args.positional.is_empty() {
            return Ok(());
        }
        anyhow::bail!(USAGE);
    };

    let commands = replay::read_commands(commands_path)?;
    let mut editor = Editor::new(settings.config);
    let _announcements = editor
        .history_mut()
        .events()
        .subscribe(|event| log::trace!("{}: {}", event.action.as_ref(), event.description));
    let total = commands.len();
    let mut failed = 0usize;
    for command in commands {
        let kind = command.kind();
        if let Err(e) = editor.dispatch(command) {
            log::warn!("command {kind} rejected: {e}");
            failed += 1;
        }
    }
    log::info!(
        "replayed {} of {total} commands, {} components",
        total - failed,
        editor.scene().len()
    );

    let region = editor.scene().import_export_rect();
    let scale = args.scale.unwrap_or(1.0);
    let size = [
        (region.w * scale).ceil().saturating_as::<u32>(),
        (region.h * scale).ceil().saturating_as::<u32>(),
    ];
    let viewport = Viewport {
        canvas_to_screen: Matrix::translation(-region.x, -region.y).then(&Matrix::scaling(scale)),
        screen_size: size,
    };

    // Warm the cache, so the saved frame is drawn from cached blocks where it pays off.
    editor.render(&mut RasterRenderer::try_new(size[0], size[1])?, &viewport);
    let mut target = RasterRenderer::try_new(size[0], size[1])?;
    editor.render(&mut target, &viewport);
    let mut png_path = out_prefix.clone().into_os_string();
    png_path.push(".png");
    target
        .to_straight_alpha()
        .save_with_format(&png_path, image::ImageFormat::Png)?;
    let mut svg_path = out_prefix.clone().into_os_string();
    svg_path.push(".svg");
    std::fs::write(&svg_path, editor.to_svg())?;

    let stats = editor.cache().stats();
    log::info!(
        "cache: {} hits, {} misses, {} live blocks, {} live frames, {} evictions, {} in {} blocks",
        stats.hits,
        stats.misses,
        stats.live_blocks,
        stats.live_frames,
        stats.evictions,
        human_bytes::human_bytes(stats.bytes as f64),
        stats.resident_blocks,
    );
    log::info!("{}", editor.describe(&viewport));
    Ok(())
}
