use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::orchestrator::{Orchestrator, SceneState};

/// Input events fed to the frame loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    PointerDown { x: f64, y: f64 },
    PointerUp,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub at_secs: f64,
    pub state: SceneState,
}

/// What happened during a headless session
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimSummary {
    pub frames: u64,
    pub elapsed_secs: f64,
    pub font_loaded: bool,
    pub final_state: SceneState,
    pub letters_remaining: usize,
    pub letters_absorbed: u32,
    pub formation_particles: usize,
    pub units_completed: usize,
    pub settled: bool,
    pub scene_events: u64,
    pub transitions: Vec<StateChange>,
}

/// Race a font file read against `timeout`. Failure or timeout only means
/// the renderer falls back to its default face.
pub async fn load_font(path: Option<&Path>, timeout: Duration) -> bool {
    let Some(path) = path else {
        return false;
    };
    match tokio::time::timeout(timeout, tokio::fs::read(path)).await {
        Ok(Ok(bytes)) => {
            info!("Font loaded from {} ({} bytes)", path.display(), bytes.len());
            true
        }
        Ok(Err(e)) => {
            warn!("Font load failed, continuing anyway: {}", e);
            false
        }
        Err(_) => {
            warn!("Font load exceeded {:?}, continuing anyway", timeout);
            false
        }
    }
}

/// Scripted press at the viewport center, released after the hold time.
async fn run_script(cmd_tx: mpsc::Sender<SimCommand>, center: (f64, f64), sim: SimConfig) {
    tokio::time::sleep(Duration::from_secs_f64(sim.press_at_secs)).await;
    let _ = cmd_tx
        .send(SimCommand::PointerDown {
            x: center.0,
            y: center.1,
        })
        .await;

    tokio::time::sleep(Duration::from_secs_f64(sim.hold_secs)).await;
    let _ = cmd_tx.send(SimCommand::PointerUp).await;
}

fn apply(scene: &mut Orchestrator, cmd: SimCommand) {
    match cmd {
        SimCommand::PointerDown { x, y } => scene.pointer_down(x, y),
        SimCommand::PointerUp => scene.pointer_up(),
    }
}

/// Run one session at a fixed frame rate until both hexagrams have risen or
/// the session time runs out.
pub async fn run_session(mut scene: Orchestrator, sim: SimConfig) -> SimSummary {
    let font_loaded = load_font(
        sim.font_path.as_deref(),
        Duration::from_millis(sim.font_timeout_ms),
    )
    .await;
    scene.init_rain();

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<SimCommand>(16);
    let script = tokio::spawn(run_script(cmd_tx, scene.camera().viewport_center(), sim.clone()));

    let frame_duration = Duration::from_secs_f64(1.0 / sim.frame_rate_hz as f64);
    let mut frame_interval = tokio::time::interval(frame_duration);
    frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let start = Instant::now();
    let mut frames: u64 = 0;
    let mut scene_events: u64 = 0;
    let mut last_state = scene.state();
    let mut transitions = Vec::new();
    let mut absorbed: u32 = 0;

    loop {
        tokio::select! {
            _ = frame_interval.tick() => {
                let now = start.elapsed().as_secs_f64();
                scene.frame(now);
                frames += 1;
                scene_events += scene.drain_events().len() as u64;
                absorbed = absorbed.max(scene.attractor().absorbed_count());

                if scene.state() != last_state {
                    last_state = scene.state();
                    transitions.push(StateChange { at_secs: now, state: last_state });
                }
                if scene.is_settled() || now >= sim.session_secs {
                    break;
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                apply(&mut scene, cmd);
                if scene.state() != last_state {
                    last_state = scene.state();
                    transitions.push(StateChange {
                        at_secs: start.elapsed().as_secs_f64(),
                        state: last_state,
                    });
                }
            }
        }
    }

    script.abort();
    let elapsed_secs = start.elapsed().as_secs_f64();
    info!("Session ended after {} frames in {:?}", frames, last_state);

    SimSummary {
        frames,
        elapsed_secs,
        font_loaded,
        final_state: scene.state(),
        letters_remaining: scene.pool().letter_count(),
        letters_absorbed: absorbed,
        formation_particles: scene.pool().formation_particle_count(),
        units_completed: scene.completed_units(),
        settled: scene.is_settled(),
        scene_events,
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexrain_shared::config::SceneConfig;

    #[tokio::test(start_paused = true)]
    async fn missing_font_does_not_block() {
        let loaded = load_font(
            Some(Path::new("/nonexistent/hexrain-font.ttf")),
            Duration::from_millis(300),
        )
        .await;
        assert!(!loaded);
        assert!(!load_font(None, Duration::from_millis(300)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_session_presses_and_releases() {
        let scene = Orchestrator::new(SceneConfig::default(), 42).unwrap();
        let sim = SimConfig {
            session_secs: 3.0,
            ..Default::default()
        };

        let summary = run_session(scene, sim).await;

        assert!(summary.frames > 100);
        assert!(summary.scene_events > 0);
        let states: Vec<SceneState> = summary.transitions.iter().map(|t| t.state).collect();
        assert_eq!(&states[..2], &[SceneState::Attracting, SceneState::Absorbing]);
        assert!(summary.transitions[0].at_secs >= 0.5);
        assert!(summary.elapsed_secs >= 3.0);
    }
}
