use std::path::PathBuf;

use clap::Parser;

use mr_orrery::config::SceneConfig;
use mr_orrery::model::BodyRegistry;
use mr_orrery::scene::BodyGeometry;

/// Prints how a body from the data file will be placed in the scene.
#[derive(Debug, Parser)]
struct Args {
    /// Body key or display name, case-insensitive
    name: String,
    #[arg(long, default_value = "solar-bodies.json")]
    data: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let registry = BodyRegistry::read_file(&args.data)?;
    let config = match &args.config {
        Some(path) => SceneConfig::read_file(path)?,
        None => SceneConfig::default(),
    };

    let wanted = args.name.to_lowercase();
    let mut found = false;
    for (key, record) in registry.iter() {
        if key.to_lowercase() != wanted && record.name.to_lowercase() != wanted {
            continue;
        }
        found = true;

        let geometry = BodyGeometry::new(record, &config);

        println!("Placement of {} ({:?})", key, record.name);
        println!("- Model: {}", config.asset_path(&record.model).display());
        println!("- Diameter: {}", record.diameter);
        println!("- Scale factor: {}", geometry.scale);
        println!("- Orbital plane tilt: {}", geometry.plane_tilt.angle().to_degrees());
        println!("- Axial tilt: {}", geometry.axial_tilt.angle().to_degrees());
        println!("- Orbital position: {:?}", geometry.orbital_position.as_slice());
        println!("- Label position: {:?}", geometry.label.position.as_slice());
        println!("- Visible: {}", record.visible);
        println!("- Responds to pointer: {}", record.is_interactive());
        println!();
    }

    if !found {
        anyhow::bail!("no body named {:?} in {}", args.name, args.data.display());
    }
    Ok(())
}
