//! Glitchterm demo host.
//!
//! Drives an `Engine` at a fixed frame rate, feeds it scripted terminal output
//! from a producer thread and paints each frame with crossterm. `--headless`
//! skips the terminal and prints the final frame as plain text.
use anyhow::Result;
use clap::Parser;
use core_engine::Engine;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod paint;
mod story;
mod terminal;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "glitchterm", version, about = "Corrupted terminal effect demo")]
struct Args {
    /// Configuration file (overrides discovery of `glitchterm.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Stop after this many ticks (runs until `q` when omitted).
    #[arg(long)]
    ticks: Option<u64>,
    /// Override the configured ambient seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Starting corruption level in `[0, 100]`.
    #[arg(long)]
    level: Option<f32>,
    /// Viewport height; defaults to the terminal height.
    #[arg(long)]
    height: Option<usize>,
    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Print the last frame as plain text instead of drawing to the terminal.
    #[arg(long)]
    headless: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("glitchterm.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }
    let file_appender = tracing_appender::rolling::never(log_dir, "glitchterm.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
        .ok()
        // Another subscriber is installed; dropping the guard shuts the writer down.
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = terminal::restore();
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn build_engine(args: &Args, height: usize) -> Result<Engine> {
    let mut cfg = core_config::load_from(args.config.clone())?;
    if let Some(seed) = args.seed {
        cfg.file.scheduler.seed = seed;
    }
    let mut engine = Engine::from_config(&cfg, height);
    if let Some(level) = args.level {
        let change = engine.set_corruption_level(level);
        if change.was_clamped() {
            warn!(target: "runtime", requested = level, applied = change.level(), "level_arg_clamped");
        }
    }
    Ok(engine)
}

enum Control {
    Continue,
    Quit,
}

fn handle_key(engine: &mut Engine, key: KeyEvent) -> Control {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Control::Quit;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            engine.adjust_corruption_level(10.0);
        }
        KeyCode::Char('-') => {
            engine.adjust_corruption_level(-10.0);
        }
        KeyCode::Char('x') => {
            engine.clear_all_effects();
        }
        KeyCode::Up => engine.scroll_up(Some(1)),
        KeyCode::Down => engine.scroll_down(Some(1)),
        KeyCode::PageUp => engine.scroll_up(None),
        KeyCode::PageDown => engine.scroll_down(None),
        KeyCode::End => engine.scroll_to_bottom(),
        _ => {}
    }
    Control::Continue
}

fn run_interactive(engine: &mut Engine, args: &Args, frame_time: Duration) -> Result<()> {
    let _guard = terminal::TerminalGuard::enter("glitchterm")?;
    let mut out = stdout();
    let (mut width, _) = crossterm::terminal::size()?;
    loop {
        let started = Instant::now();
        engine.tick();
        let frame = engine.frame();
        engine.record_cursor(frame.len().saturating_sub(1), paint::cursor_col(&frame));
        paint::draw(&mut out, &frame, width)?;
        out.flush()?;

        if args.ticks.is_some_and(|limit| engine.now() >= limit) {
            return Ok(());
        }
        let budget = frame_time.saturating_sub(started.elapsed());
        if event::poll(budget)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Control::Quit = handle_key(engine, key) {
                        return Ok(());
                    }
                }
                Event::Resize(w, h) => {
                    width = w;
                    if args.height.is_none() {
                        engine.resize(h as usize);
                    }
                }
                _ => {}
            }
        }
    }
}

fn run_headless(engine: &mut Engine, args: &Args) -> Result<()> {
    let limit = args.ticks.unwrap_or(300);
    while engine.now() < limit {
        engine.tick();
    }
    let mut out = stdout();
    for descriptor in engine.frame() {
        writeln!(out, "{}", descriptor.text())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    let args = Args::parse();
    info!(target: "runtime", headless = args.headless, "startup");

    let height = match args.height {
        Some(h) => h,
        None if args.headless => 24,
        None => crossterm::terminal::size().map(|(_, h)| h as usize).unwrap_or(24),
    };
    let mut engine = build_engine(&args, height)?;
    let producer = if args.headless {
        story::play(&engine.handle(), Duration::ZERO)?;
        None
    } else {
        Some(story::spawn(engine.handle(), Duration::from_millis(600)))
    };

    let frame_time = Duration::from_secs(1) / args.fps.max(1);
    let result = if args.headless {
        run_headless(&mut engine, &args)
    } else {
        run_interactive(&mut engine, &args, frame_time)
    };

    let metrics = engine.scheduler().metrics().snapshot();
    info!(
        target: "runtime",
        ticks = engine.now(),
        accepted = metrics.accepted,
        ambient = metrics.ambient_spawns,
        rejected = metrics.rejected_total(),
        level = engine.corruption_level(),
        "shutdown"
    );
    drop(engine);
    if let Some(producer) = producer
        && producer.join().is_err()
    {
        warn!(target: "runtime", "producer_panicked");
    }
    result
}
