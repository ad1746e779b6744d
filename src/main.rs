use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use kiss3d::light::Light;
use kiss3d::window::Window;

use mr_orrery::config::SceneConfig;
use mr_orrery::debug::{wait_for_debugger, wants_debugger};
use mr_orrery::gui::{Kiss3dHost, Simulation};
use mr_orrery::host::MemoryHost;
use mr_orrery::model::BodyRegistry;
use mr_orrery::scene::OrreryApp;

const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);

/// Interactive solar-system scene.
#[derive(Debug, Parser)]
struct Args {
    /// Body data file
    #[arg(long, default_value = "solar-bodies.json")]
    data: PathBuf,
    /// Scene configuration file; defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,
    /// Build the scene without a window and print the resulting graph
    #[arg(long)]
    headless: bool,
    /// Seconds to simulate in headless mode
    #[arg(long, default_value_t = 1.0)]
    seconds: f64,
    /// In headless mode, fail loads of model files missing from disk
    #[arg(long)]
    check_assets: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Debugger flags come in several shapes (`--inspect-brk=9229`), so they
    // are pulled out before clap sees the rest.
    let (debug_flags, args): (Vec<OsString>, Vec<OsString>) =
        std::env::args_os().partition(|arg| wants_debugger([arg]));
    let args = Args::parse_from(args);

    let config = match &args.config {
        Some(path) => SceneConfig::read_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if !debug_flags.is_empty() {
        wait_for_debugger(config.debug_attach_delay());
    }

    let registry = BodyRegistry::read_file(&args.data)
        .with_context(|| format!("reading body data {}", args.data.display()))?;
    tracing::info!("loaded {} bodies from {}", registry.len(), args.data.display());

    if args.headless {
        return run_headless(registry, config, &args);
    }

    let mut window = Window::new("Solar System");
    window.set_light(Light::StickToCamera);
    window.set_framerate_limit(Some(60));

    let host = Kiss3dHost::new(&mut window);
    let mut app = OrreryApp::new(host, registry, config);
    app.start().context("creating scene root")?;

    let simulation = Simulation::new(app);
    window.render_loop(simulation);
    Ok(())
}

fn run_headless(registry: BodyRegistry, config: SceneConfig, args: &Args) -> anyhow::Result<()> {
    let host = MemoryHost::new().check_files(args.check_assets);
    let mut app = OrreryApp::new(host, registry, config);
    app.start().context("creating scene root")?;

    let frames = (args.seconds.max(0.0) / HEADLESS_FRAME.as_secs_f64()).ceil() as usize;
    for _ in 0..frames.max(1) {
        app.update(HEADLESS_FRAME);
    }

    print!("{}", app.host().describe());
    println!(
        "{} bodies built, {} still loading",
        app.built_bodies().count(),
        app.pending_bodies()
    );
    Ok(())
}
