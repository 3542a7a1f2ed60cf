//! CPU-side stage state: sprites, groups, tiled background, and the clip
//! registry. The stage is fully constructible and steppable without a window
//! or GPU, which is what makes the formation logic unit-testable; the driver
//! reads it each frame to rebuild the sprite mesh.

use std::collections::HashMap;

use si_core::animation::{AnimationClip, AnimationState};

/// Handle to a sprite on the stage. Only meaningful for the stage that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(usize);

/// Handle to a sprite group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(usize);

/// Everything needed to place one sprite.
#[derive(Debug, Clone)]
pub struct SpriteSpec {
    pub id: String,
    pub texture: String,
    pub sheet_frame: u32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// One placed sprite. `x`/`y` is the sprite's center in surface pixels;
/// `sheet_frame` is ignored by the renderer for plain (non-sheet) textures.
#[derive(Debug, Clone)]
pub struct StageSprite {
    pub id: String,
    pub texture: String,
    pub sheet_frame: u32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub active: bool,
    pub animation: Option<AnimationState>,
}

/// Full-surface backdrop whose texture repeats at `tile_scale`.
#[derive(Debug, Clone)]
pub struct TileBackground {
    pub texture: String,
    pub tile_scale: f32,
}

pub struct Stage {
    surface: (u32, u32),
    background: Option<TileBackground>,
    sprites: Vec<StageSprite>,
    sprite_ids: HashMap<String, SpriteId>,
    groups: Vec<Vec<SpriteId>>,
    clips: HashMap<String, AnimationClip>,
}

impl Stage {
    pub fn new(surface_width: u32, surface_height: u32) -> Self {
        Self {
            surface: (surface_width, surface_height),
            background: None,
            sprites: Vec::new(),
            sprite_ids: HashMap::new(),
            groups: Vec::new(),
            clips: HashMap::new(),
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    pub fn set_tile_background(&mut self, texture: &str, tile_scale: f32) {
        self.background = Some(TileBackground {
            texture: texture.to_string(),
            tile_scale,
        });
    }

    pub fn background(&self) -> Option<&TileBackground> {
        self.background.as_ref()
    }

    // --- Animation registry -----------------------------------------------

    pub fn register_animation(&mut self, name: &str, clip: AnimationClip) -> Result<(), String> {
        if self.clips.contains_key(name) {
            return Err(format!(
                "Stage validation failed: duplicate animation '{}'",
                name
            ));
        }
        if clip.frames.is_empty() {
            return Err(format!(
                "Stage validation failed: animation '{}' has no frames",
                name
            ));
        }
        self.clips.insert(name.to_string(), clip);
        Ok(())
    }

    // --- Sprites ----------------------------------------------------------

    pub fn add_sprite(&mut self, spec: SpriteSpec) -> Result<SpriteId, String> {
        if self.sprite_ids.contains_key(&spec.id) {
            return Err(format!(
                "Stage validation failed: duplicate sprite id '{}'",
                spec.id
            ));
        }
        let id = SpriteId(self.sprites.len());
        self.sprite_ids.insert(spec.id.clone(), id);
        self.sprites.push(StageSprite {
            id: spec.id,
            texture: spec.texture,
            sheet_frame: spec.sheet_frame,
            x: spec.x,
            y: spec.y,
            scale: spec.scale,
            active: true,
            animation: None,
        });
        Ok(id)
    }

    pub fn sprite(&self, id: SpriteId) -> &StageSprite {
        &self.sprites[id.0]
    }

    #[allow(dead_code)]
    pub fn sprite_mut(&mut self, id: SpriteId) -> &mut StageSprite {
        &mut self.sprites[id.0]
    }

    #[allow(dead_code)]
    pub fn find_sprite(&self, id: &str) -> Option<SpriteId> {
        self.sprite_ids.get(id).copied()
    }

    /// All sprites in insertion order, which is also paint order.
    pub fn sprites(&self) -> &[StageSprite] {
        &self.sprites
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Bind a registered clip to a sprite: the sprite switches to the clip's
    /// sheet, shows the clip's first frame, and advances on `step_animations`.
    pub fn play(&mut self, sprite: SpriteId, clip_name: &str) -> Result<(), String> {
        let (sheet, first_frame) = {
            let clip = self.clips.get(clip_name).ok_or_else(|| {
                format!(
                    "Stage validation failed: sprite '{}' references unknown animation '{}'",
                    self.sprites[sprite.0].id, clip_name
                )
            })?;
            (clip.sheet.clone(), clip.frames.first().map(|f| f.sheet_frame))
        };

        let sprite_ref = &mut self.sprites[sprite.0];
        sprite_ref.texture = sheet;
        if let Some(frame) = first_frame {
            sprite_ref.sheet_frame = frame;
        }
        sprite_ref.animation = Some(AnimationState::new(clip_name));
        Ok(())
    }

    /// Advance every bound animation by `dt_us` and refresh the sprites'
    /// sheet frames.
    pub fn step_animations(&mut self, dt_us: u64) {
        let clips = &self.clips;
        for sprite in &mut self.sprites {
            let Some(anim) = sprite.animation.as_mut() else {
                continue;
            };
            match clips.get(&anim.clip_name) {
                Some(clip) => sprite.sheet_frame = anim.tick(dt_us, clip),
                None => log::warn!(
                    "Sprite '{}' references unknown animation clip '{}'",
                    sprite.id,
                    anim.clip_name
                ),
            }
        }
    }

    pub fn active_animation_count(&self) -> usize {
        self.sprites.iter().filter(|s| s.animation.is_some()).count()
    }

    // --- Groups -----------------------------------------------------------

    pub fn create_group(&mut self) -> GroupId {
        self.groups.push(Vec::new());
        GroupId(self.groups.len() - 1)
    }

    pub fn add_to_group(&mut self, group: GroupId, sprite: SpriteId) {
        self.groups[group.0].push(sprite);
    }

    #[allow(dead_code)]
    pub fn group_len(&self, group: GroupId) -> usize {
        self.groups[group.0].len()
    }

    /// Translate every group member's x, active or not.
    pub fn group_inc_x(&mut self, group: GroupId, delta: f32) {
        let members = &self.groups[group.0];
        for member in members {
            self.sprites[member.0].x += delta;
        }
    }

    /// Translate every group member's y, active or not.
    pub fn group_inc_y(&mut self, group: GroupId, delta: f32) {
        let members = &self.groups[group.0];
        for member in members {
            self.sprites[member.0].y += delta;
        }
    }

    /// First member in insertion order whose `active` flag is set.
    pub fn group_first_active(&self, group: GroupId) -> Option<SpriteId> {
        self.groups[group.0]
            .iter()
            .copied()
            .find(|id| self.sprites[id.0].active)
    }

    /// Last member in insertion order whose `active` flag is set.
    pub fn group_last_active(&self, group: GroupId) -> Option<SpriteId> {
        self.groups[group.0]
            .iter()
            .copied()
            .rev()
            .find(|id| self.sprites[id.0].active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, x: f32, y: f32) -> SpriteSpec {
        SpriteSpec {
            id: id.to_string(),
            texture: "aliens".to_string(),
            sheet_frame: 0,
            x,
            y,
            scale: 1.0,
        }
    }

    #[test]
    fn duplicate_sprite_id_rejected() {
        let mut stage = Stage::new(800, 600);
        stage.add_sprite(spec("alien-0-0", 100.0, 50.0)).expect("first add");
        let err = stage
            .add_sprite(spec("alien-0-0", 160.0, 50.0))
            .expect_err("duplicate id should fail");
        assert!(err.contains("duplicate sprite id"));
    }

    #[test]
    fn find_sprite_resolves_by_name() {
        let mut stage = Stage::new(800, 600);
        let id = stage.add_sprite(spec("base", 400.0, 550.0)).expect("add");
        assert_eq!(stage.find_sprite("base"), Some(id));
        assert_eq!(stage.find_sprite("missing"), None);
    }

    #[test]
    fn duplicate_animation_rejected() {
        let mut stage = Stage::new(800, 600);
        let clip = AnimationClip::from_frame_rate("aliens", &[0, 1], 1, true).expect("clip");
        stage.register_animation("alien-red", clip.clone()).expect("first register");
        let err = stage
            .register_animation("alien-red", clip)
            .expect_err("duplicate animation should fail");
        assert!(err.contains("duplicate animation"));
    }

    #[test]
    fn empty_clip_rejected() {
        let mut stage = Stage::new(800, 600);
        let clip = AnimationClip {
            sheet: "aliens".to_string(),
            frames: Vec::new(),
            looping: true,
        };
        let err = stage
            .register_animation("empty", clip)
            .expect_err("empty clip should fail");
        assert!(err.contains("no frames"));
    }

    #[test]
    fn play_unknown_clip_fails() {
        let mut stage = Stage::new(800, 600);
        let id = stage.add_sprite(spec("alien-0-0", 100.0, 50.0)).expect("add");
        let err = stage
            .play(id, "alien-green")
            .expect_err("unknown clip should fail");
        assert!(err.contains("unknown animation"));
    }

    #[test]
    fn play_binds_sheet_and_first_frame() {
        let mut stage = Stage::new(800, 600);
        let clip = AnimationClip::from_frame_rate("aliens", &[4, 5], 1, true).expect("clip");
        stage.register_animation("alien-blue", clip).expect("register");

        let mut sprite = spec("alien-3-0", 100.0, 266.0);
        sprite.texture = "something-else".to_string();
        sprite.sheet_frame = 7;
        let id = stage.add_sprite(sprite).expect("add");

        stage.play(id, "alien-blue").expect("play");
        assert_eq!(stage.sprite(id).texture, "aliens");
        assert_eq!(stage.sprite(id).sheet_frame, 4);
        let anim = stage.sprite(id).animation.as_ref().expect("bound state");
        assert_eq!(anim.clip_name, "alien-blue");
    }

    #[test]
    fn step_animations_advances_bound_sprites() {
        let mut stage = Stage::new(800, 600);
        let clip = AnimationClip::from_frame_rate("aliens", &[0, 1], 1, true).expect("clip");
        stage.register_animation("alien-red", clip).expect("register");
        let id = stage.add_sprite(spec("alien-0-0", 100.0, 50.0)).expect("add");
        stage.play(id, "alien-red").expect("play");

        // 30 ticks stay just under the 1s frame duration, the 31st crosses it.
        for _ in 0..30 {
            stage.step_animations(33_333);
        }
        assert_eq!(stage.sprite(id).sheet_frame, 0);
        stage.step_animations(33_333);
        assert_eq!(stage.sprite(id).sheet_frame, 1);
    }

    #[test]
    fn group_translation_moves_all_members() {
        let mut stage = Stage::new(800, 600);
        let group = stage.create_group();
        let a = stage.add_sprite(spec("a", 100.0, 50.0)).expect("add");
        let b = stage.add_sprite(spec("b", 160.0, 50.0)).expect("add");
        stage.add_to_group(group, a);
        stage.add_to_group(group, b);
        assert_eq!(stage.group_len(group), 2);
        stage.sprite_mut(b).active = false;

        stage.group_inc_x(group, 1.0);
        stage.group_inc_y(group, 24.0);

        // Inactive members move with the group.
        assert_eq!(stage.sprite(a).x, 101.0);
        assert_eq!(stage.sprite(b).x, 161.0);
        assert_eq!(stage.sprite(a).y, 74.0);
        assert_eq!(stage.sprite(b).y, 74.0);
    }

    #[test]
    fn first_and_last_active_respect_order_and_flag() {
        let mut stage = Stage::new(800, 600);
        let group = stage.create_group();
        let a = stage.add_sprite(spec("a", 100.0, 50.0)).expect("add");
        let b = stage.add_sprite(spec("b", 160.0, 50.0)).expect("add");
        let c = stage.add_sprite(spec("c", 220.0, 50.0)).expect("add");
        stage.add_to_group(group, a);
        stage.add_to_group(group, b);
        stage.add_to_group(group, c);

        assert_eq!(stage.group_first_active(group), Some(a));
        assert_eq!(stage.group_last_active(group), Some(c));

        stage.sprite_mut(a).active = false;
        stage.sprite_mut(c).active = false;
        assert_eq!(stage.group_first_active(group), Some(b));
        assert_eq!(stage.group_last_active(group), Some(b));

        stage.sprite_mut(b).active = false;
        assert_eq!(stage.group_first_active(group), None);
        assert_eq!(stage.group_last_active(group), None);
    }

    #[test]
    fn background_is_stored() {
        let mut stage = Stage::new(800, 600);
        assert!(stage.background().is_none());
        stage.set_tile_background("background", 2.0);
        let bg = stage.background().expect("background set");
        assert_eq!(bg.texture, "background");
        assert_eq!(bg.tile_scale, 2.0);
    }
}
