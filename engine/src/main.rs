use hexrain_engine::config::SimConfig;
use hexrain_engine::orchestrator::Orchestrator;
use hexrain_engine::sim_loop::run_session;
use hexrain_shared::config::SceneConfig;

/// Scene config from `HEXRAIN_CONFIG`, or defaults if unset or unreadable.
fn load_scene_config() -> SceneConfig {
    let Ok(path) = std::env::var("HEXRAIN_CONFIG") else {
        return SceneConfig::default();
    };
    match SceneConfig::load_from_path(std::path::Path::new(&path)) {
        Ok(config) => {
            tracing::info!("Loaded scene config from {}", path);
            config
        }
        Err(e) => {
            tracing::warn!("{}; using default scene config", e);
            SceneConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let sim = SimConfig::from_args(&args);

    // Validate configuration before starting
    if let Err(e) = sim.validate() {
        eprintln!("Invalid simulation configuration: {}", e);
        std::process::exit(1);
    }

    let scene = match Orchestrator::new(load_scene_config(), sim.rng_seed) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Invalid scene configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting hexrain simulation: {}s at {} fps, seed {}",
        sim.session_secs,
        sim.frame_rate_hz,
        sim.rng_seed
    );

    let summary = run_session(scene, sim).await;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Could not serialize summary: {}", e),
    }
}
