//! JSON-scripted sweep scenarios: drive the built scene for a scripted
//! number of ticks per phase and check formation state at each phase
//! boundary. Also the home of the determinism check, which runs one script
//! against two independently built scenes.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct SweepScenario {
    pub name: String,
    #[serde(default = "default_tick_us")]
    pub tick_us: u64,
    pub phases: Vec<ScenarioPhase>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioPhase {
    pub ticks: u32,
    pub expect: PhaseExpect,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhaseExpect {
    pub heading: String,
    pub descents: u32,
    #[serde(default)]
    pub first_x: Option<f32>,
    #[serde(default)]
    pub last_x: Option<f32>,
    #[serde(default)]
    pub front_row_y: Option<f32>,
}

pub fn load_scenario_from_path(path: &Path) -> Result<SweepScenario, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let scenario: SweepScenario = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse scenario JSON {}: {e}", path.display()))?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

fn validate_scenario(scenario: &SweepScenario) -> Result<(), String> {
    if scenario.name.is_empty() {
        return Err("Scenario validation failed: name is empty".to_string());
    }
    if scenario.tick_us == 0 {
        return Err("Scenario validation failed: tick_us must be > 0".to_string());
    }
    if scenario.phases.is_empty() {
        return Err("Scenario validation failed: phases list is empty".to_string());
    }
    for (i, phase) in scenario.phases.iter().enumerate() {
        match phase.expect.heading.as_str() {
            "rightward" | "leftward" => {}
            other => {
                return Err(format!(
                    "Scenario validation failed: phase {} has unknown heading '{}'",
                    i, other
                ));
            }
        }
    }
    Ok(())
}

const fn default_tick_us() -> u64 {
    33_333
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManifest;
    use crate::game::GameScene;
    use crate::scene::Scene;
    use crate::stage::Stage;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "si_scenario_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn built_game() -> (GameScene, Stage) {
        let mut scene = GameScene::new();
        scene.initialize();
        let mut manifest = AssetManifest::new();
        scene.load(&mut manifest).expect("load declarations");
        let mut stage = Stage::new(800, 600);
        scene.build(&mut stage).expect("build stage");
        (scene, stage)
    }

    fn sprite_x(stage: &Stage, id: &str) -> f32 {
        stage.sprite(stage.find_sprite(id).expect("sprite exists")).x
    }

    fn sprite_y(stage: &Stage, id: &str) -> f32 {
        stage.sprite(stage.find_sprite(id).expect("sprite exists")).y
    }

    const OPENING_SWEEP_JSON: &str = r#"{
      "name": "opening-sweep",
      "tick_us": 33333,
      "phases": [
        { "ticks": 75,
          "expect": { "heading": "leftward", "descents": 1,
                      "last_x": 775.0, "front_row_y": 74.0 } },
        { "ticks": 152,
          "expect": { "heading": "rightward", "descents": 2,
                      "first_x": 23.0, "front_row_y": 98.0 } },
        { "ticks": 152,
          "expect": { "heading": "leftward", "descents": 3,
                      "last_x": 775.0, "front_row_y": 122.0 } }
      ]
    }"#;

    #[test]
    fn scenario_file_parses_with_default_tick() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "name": "minimal",
              "phases": [
                { "ticks": 1, "expect": { "heading": "rightward", "descents": 0 } }
              ]
            }"#,
        )
        .expect("write scenario file");

        let scenario = load_scenario_from_path(&path).expect("scenario should load");
        assert_eq!(scenario.name, "minimal");
        assert_eq!(scenario.tick_us, 33_333);
        assert_eq!(scenario.phases.len(), 1);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn scenario_rejects_unknown_heading() {
        let path = temp_file_path("bad_heading");
        fs::write(
            &path,
            r#"{
              "name": "bad",
              "phases": [
                { "ticks": 1, "expect": { "heading": "sideways", "descents": 0 } }
              ]
            }"#,
        )
        .expect("write scenario file");

        let err = load_scenario_from_path(&path).expect_err("bad heading should fail");
        assert!(err.contains("unknown heading"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn opening_sweep_follows_the_script() {
        let path = temp_file_path("opening");
        fs::write(&path, OPENING_SWEEP_JSON).expect("write scenario file");
        let scenario = load_scenario_from_path(&path).expect("scenario should load");

        let (mut scene, mut stage) = built_game();
        for phase in &scenario.phases {
            for _ in 0..phase.ticks {
                scene.update(&mut stage);
                stage.step_animations(scenario.tick_us);
            }

            assert_eq!(scene.sweep.heading.label(), phase.expect.heading);
            assert_eq!(scene.sweep.descents, phase.expect.descents);
            if let Some(first_x) = phase.expect.first_x {
                assert_eq!(sprite_x(&stage, "alien-0-0"), first_x);
            }
            if let Some(last_x) = phase.expect.last_x {
                assert_eq!(sprite_x(&stage, "alien-4-10"), last_x);
            }
            if let Some(front_row_y) = phase.expect.front_row_y {
                assert_eq!(sprite_y(&stage, "alien-0-0"), front_row_y);
            }
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn scenario_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(&path, OPENING_SWEEP_JSON).expect("write scenario file");
        let scenario = load_scenario_from_path(&path).expect("scenario should load");

        let run = |scenario: &SweepScenario| {
            let (mut scene, mut stage) = built_game();
            for phase in &scenario.phases {
                for _ in 0..phase.ticks {
                    scene.update(&mut stage);
                    stage.step_animations(scenario.tick_us);
                }
            }
            (scene, stage)
        };

        let (scene_a, stage_a) = run(&scenario);
        let (scene_b, stage_b) = run(&scenario);

        assert_eq!(scene_a.sweep.heading, scene_b.sweep.heading);
        assert_eq!(scene_a.sweep.descents, scene_b.sweep.descents);
        for (a, b) in stage_a.sprites().iter().zip(stage_b.sprites().iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
            assert_eq!(a.sheet_frame, b.sheet_frame);
        }

        let _ = fs::remove_file(path);
    }
}
