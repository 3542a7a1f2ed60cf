//! The one game scene: a 5x11 grid of animated aliens over a tiled
//! starfield, four barriers, and the base. Each fixed tick the alien
//! formation sweeps sideways and descends when it reaches a turnaround edge.

use crate::assets::AssetManifest;
use crate::formation::{FormationSweep, Heading};
use crate::layout::{centered_row_positions, centered_row_start};
use crate::scene::Scene;
use crate::stage::{GroupId, SpriteSpec, Stage};
use si_core::animation::AnimationClip;

const BACKGROUND_KEY: &str = "background";
const BACKGROUND_PATH: &str = "assets/images/deep-space.jpg";
const BASE_KEY: &str = "base";
const BASE_PATH: &str = "assets/images/base.png";
const BARRIER_KEY: &str = "barrier";
const BARRIER_PATH: &str = "assets/images/barrier.png";
const ALIENS_KEY: &str = "aliens";
const ALIENS_PATH: &str = "assets/images/aliens.png";

const BACKGROUND_TILE_SCALE: f32 = 2.0;

const ALIEN_FRAME_PX: u32 = 96;
const ALIEN_FRAME_RATE: u32 = 1;
const ALIEN_SCALE: f32 = 0.5;
const ALIEN_COLUMNS: u32 = 11;
// 48px scaled alien + 12px gap.
const ALIEN_COLUMN_STRIDE: f32 = 60.0;
const ALIEN_ROW_YS: [f32; 5] = [50.0, 122.0, 194.0, 266.0, 338.0];
const ALIEN_ROW_CLIPS: [&str; 5] = [
    "alien-red",
    "alien-yellow",
    "alien-yellow",
    "alien-blue",
    "alien-blue",
];
// Two strip frames per color variant.
const ALIEN_CLIPS: [(&str, [u32; 2]); 3] = [
    ("alien-red", [0, 1]),
    ("alien-yellow", [2, 3]),
    ("alien-blue", [4, 5]),
];

const BARRIER_COUNT: u32 = 4;
const BARRIER_STRIDE: f32 = 176.0;
const BARRIER_Y: f32 = 450.0;
const BARRIER_SCALE: f32 = 0.5;

const BASE_X: f32 = 400.0;
const BASE_Y: f32 = 550.0;
const BASE_SCALE: f32 = 0.5;

pub struct GameScene {
    pub sweep: FormationSweep,
    aliens: Option<GroupId>,
}

impl GameScene {
    pub fn new() -> Self {
        Self {
            sweep: FormationSweep::default(),
            aliens: None,
        }
    }
}

impl Default for GameScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for GameScene {
    fn initialize(&mut self) {
        // The formation opens marching right.
        self.sweep.heading = Heading::Rightward;
    }

    fn load(&mut self, manifest: &mut AssetManifest) -> Result<(), String> {
        manifest.declare_image(BACKGROUND_KEY, BACKGROUND_PATH)?;
        manifest.declare_image(BASE_KEY, BASE_PATH)?;
        manifest.declare_image(BARRIER_KEY, BARRIER_PATH)?;
        manifest.declare_sheet(ALIENS_KEY, ALIENS_PATH, ALIEN_FRAME_PX, ALIEN_FRAME_PX)?;
        Ok(())
    }

    fn build(&mut self, stage: &mut Stage) -> Result<(), String> {
        stage.set_tile_background(BACKGROUND_KEY, BACKGROUND_TILE_SCALE);

        for (name, frames) in ALIEN_CLIPS {
            let clip = AnimationClip::from_frame_rate(ALIENS_KEY, &frames, ALIEN_FRAME_RATE, true)?;
            stage.register_animation(name, clip)?;
        }

        let surface_w = stage.surface_size().0 as f32;

        let group = stage.create_group();
        let columns = centered_row_positions(surface_w, ALIEN_COLUMN_STRIDE, ALIEN_COLUMNS);
        for (row, &y) in ALIEN_ROW_YS.iter().enumerate() {
            for (col, &x) in columns.iter().enumerate() {
                let sprite = stage.add_sprite(SpriteSpec {
                    id: format!("alien-{}-{}", row, col),
                    texture: ALIENS_KEY.to_string(),
                    sheet_frame: 0,
                    x,
                    y,
                    scale: ALIEN_SCALE,
                })?;
                stage.add_to_group(group, sprite);
                stage.play(sprite, ALIEN_ROW_CLIPS[row])?;
            }
        }
        self.aliens = Some(group);

        let barrier_start = centered_row_start(surface_w, BARRIER_STRIDE, BARRIER_COUNT);
        for k in 0..BARRIER_COUNT {
            stage.add_sprite(SpriteSpec {
                id: format!("barrier-{}", k),
                texture: BARRIER_KEY.to_string(),
                sheet_frame: 0,
                x: barrier_start + BARRIER_STRIDE * k as f32,
                y: BARRIER_Y,
                scale: BARRIER_SCALE,
            })?;
        }

        stage.add_sprite(SpriteSpec {
            id: "base".to_string(),
            texture: BASE_KEY.to_string(),
            sheet_frame: 0,
            x: BASE_X,
            y: BASE_Y,
            scale: BASE_SCALE,
        })?;

        Ok(())
    }

    fn update(&mut self, stage: &mut Stage) {
        if let Some(group) = self.aliens {
            self.sweep.step(stage, group);
        }
    }
}
