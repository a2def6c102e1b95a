use circsim::{Scenario, ScenarioConfig};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "two_body_bounce.yaml")]
    file_name: String,
}

// load here to keep main clean
fn load_scenario_from_yaml() -> Result<ScenarioConfig> {
    let args = Args::parse();
    let file_name = args.file_name;

    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(&file_name);
    let file = File::open(&config_path)?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)?;

    Ok(scenario_cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scenario_cfg = load_scenario_from_yaml()?;
    let mut scenario = Scenario::build_scenario(scenario_cfg)?;
    info!(
        bodies = scenario.world.bodies().len(),
        t_end = scenario.t_end,
        tick_interval = scenario.tick_interval,
        "scenario loaded"
    );

    // run the tick loop to the configured end time
    let mut t = 0.0;
    while t < scenario.t_end {
        let dt = scenario.tick_interval.min(scenario.t_end - t);
        scenario.world.update(dt);
        t += dt;
    }
    info!(t, "simulation finished");

    // final state of every root body
    for &id in scenario.world.bodies() {
        let p = scenario.world.store().world_position(id);
        let v = scenario.world.store().world_velocity(id);
        let angle = scenario.world.store().world_angle(id);
        println!(
            "body {id:?}: position = ({:.4}, {:.4}), velocity = ({:.4}, {:.4}), angle = {angle:.4}",
            p.x, p.y, v.x, v.y
        );
    }

    Ok(())
}
