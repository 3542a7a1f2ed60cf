//! Frame-based sprite animation types and deterministic tick logic.
//!
//! Animation clips are sequences of spritesheet frames with per-frame
//! durations. All timing uses integer microseconds (`u64`) to guarantee
//! deterministic advancement under the engine's fixed-timestep model -- no
//! floating-point drift across platforms.
//!
//! Clips are declared in code by the scene; [`AnimationClip::from_frame_rate`]
//! converts a frames-per-second rate into uniform per-frame durations.

/// A single frame in an animation clip.
///
/// `sheet_frame` indexes into the spritesheet named by the owning clip.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub sheet_frame: u32,
    pub duration_us: u64,
}

/// A named sequence of spritesheet frames that can loop or play once.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// Key of the spritesheet the frame indices refer to.
    pub sheet: String,
    pub frames: Vec<AnimationFrame>,
    pub looping: bool,
}

impl AnimationClip {
    /// Build a clip from a frame-rate declaration: every frame gets the same
    /// duration of `1_000_000 / frame_rate` microseconds (integer division,
    /// so very high rates lose sub-microsecond precision). Rates above
    /// 1_000_000 floor to a zero-length frame and are rejected.
    pub fn from_frame_rate(
        sheet: &str,
        sheet_frames: &[u32],
        frame_rate: u32,
        looping: bool,
    ) -> Result<Self, String> {
        if sheet.is_empty() {
            return Err("Animation clip validation failed: empty sheet key".to_string());
        }
        if sheet_frames.is_empty() {
            return Err(format!(
                "Animation clip validation failed: clip for sheet '{}' has no frames",
                sheet
            ));
        }
        if frame_rate == 0 {
            return Err(format!(
                "Animation clip validation failed: clip for sheet '{}' has zero frame rate",
                sheet
            ));
        }

        let duration_us = 1_000_000 / frame_rate as u64;
        if duration_us == 0 {
            return Err(format!(
                "Animation clip validation failed: clip for sheet '{}' has zero frame duration",
                sheet
            ));
        }

        Ok(Self {
            sheet: sheet.to_string(),
            frames: sheet_frames
                .iter()
                .map(|&f| AnimationFrame {
                    sheet_frame: f,
                    duration_us,
                })
                .collect(),
            looping,
        })
    }

    /// Total duration of one full cycle in microseconds.
    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }
}

/// Runtime state for one active animation instance.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub clip_name: String,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new(clip_name: &str) -> Self {
        Self {
            clip_name: clip_name.to_string(),
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Advance the animation by `dt_us` microseconds. Returns the current
    /// spritesheet frame index. Uses integer arithmetic only for determinism.
    pub fn tick(&mut self, dt_us: u64, clip: &AnimationClip) -> u32 {
        if clip.frames.is_empty() || self.finished {
            return if let Some(frame) = clip.frames.get(self.frame_index) {
                frame.sheet_frame
            } else if let Some(frame) = clip.frames.last() {
                frame.sheet_frame
            } else {
                0
            };
        }

        self.elapsed_us += dt_us;

        loop {
            let current_frame = &clip.frames[self.frame_index];
            if self.elapsed_us < current_frame.duration_us {
                break;
            }

            self.elapsed_us -= current_frame.duration_us;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        clip.frames[self.frame_index].sheet_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clip(durations_ms: &[u64], looping: bool) -> AnimationClip {
        AnimationClip {
            sheet: "test".to_string(),
            frames: durations_ms
                .iter()
                .enumerate()
                .map(|(i, &d)| AnimationFrame {
                    sheet_frame: i as u32,
                    duration_us: d * 1000,
                })
                .collect(),
            looping,
        }
    }

    #[test]
    fn tick_advances_through_frames() {
        let clip = make_clip(&[100, 100, 100], true);
        let mut state = AnimationState::new("walk");

        // At t=0, should be on frame 0
        let frame = state.tick(0, &clip);
        assert_eq!(frame, 0);

        // Advance 50ms, still on frame 0
        let frame = state.tick(50_000, &clip);
        assert_eq!(frame, 0);

        // Advance another 60ms (total 110ms) => frame 1
        let frame = state.tick(60_000, &clip);
        assert_eq!(frame, 1);
    }

    #[test]
    fn looping_wraps_around() {
        let clip = make_clip(&[100, 100], true);
        let mut state = AnimationState::new("idle");

        // Advance past both frames (250ms total)
        let frame = state.tick(250_000, &clip);
        assert_eq!(frame, 0);
        assert!(!state.finished);
    }

    #[test]
    fn non_looping_stops_on_last_frame() {
        let clip = make_clip(&[100, 100], false);
        let mut state = AnimationState::new("jump");

        // Advance past total duration
        let frame = state.tick(300_000, &clip);
        assert_eq!(frame, 1);
        assert!(state.finished);

        // Further ticks stay on last frame
        let frame = state.tick(100_000, &clip);
        assert_eq!(frame, 1);
        assert!(state.finished);
    }

    #[test]
    fn variable_frame_durations() {
        let clip = make_clip(&[50, 200, 100], true);
        let mut state = AnimationState::new("attack");

        // 50ms => end of frame 0, should be on frame 1
        let frame = state.tick(50_000, &clip);
        assert_eq!(frame, 1);

        // 150ms more (total 200ms) => still on frame 1 (200ms duration)
        let frame = state.tick(150_000, &clip);
        assert_eq!(frame, 1);

        // 50ms more (total 250ms) => frame 1 done, now on frame 2
        let frame = state.tick(50_000, &clip);
        assert_eq!(frame, 2);
    }

    #[test]
    fn determinism_identical_results() {
        let clip = make_clip(&[100, 150, 80], true);
        let dt = 33_333u64; // 30fps fixed step
        let steps = 100;

        let mut state_a = AnimationState::new("run");
        let mut state_b = AnimationState::new("run");

        for _ in 0..steps {
            let frame_a = state_a.tick(dt, &clip);
            let frame_b = state_b.tick(dt, &clip);
            assert_eq!(frame_a, frame_b);
        }
        assert_eq!(state_a.frame_index, state_b.frame_index);
        assert_eq!(state_a.elapsed_us, state_b.elapsed_us);
    }

    #[test]
    fn from_frame_rate_builds_uniform_durations() {
        let clip = AnimationClip::from_frame_rate("aliens", &[4, 5], 1, true).expect("valid clip");
        assert_eq!(clip.sheet, "aliens");
        assert_eq!(clip.frames.len(), 2);
        assert_eq!(clip.frames[0].sheet_frame, 4);
        assert_eq!(clip.frames[0].duration_us, 1_000_000);
        assert_eq!(clip.frames[1].sheet_frame, 5);
        assert_eq!(clip.frames[1].duration_us, 1_000_000);
        assert!(clip.looping);

        let fast = AnimationClip::from_frame_rate("aliens", &[0], 4, false).expect("valid clip");
        assert_eq!(fast.frames[0].duration_us, 250_000);
    }

    #[test]
    fn from_frame_rate_rejects_zero_rate() {
        let err = AnimationClip::from_frame_rate("aliens", &[0, 1], 0, true)
            .expect_err("zero frame rate should fail");
        assert!(err.contains("zero frame rate"));
    }

    #[test]
    fn from_frame_rate_rejects_zero_duration() {
        // A rate above 1_000_000 floors to a zero-length frame, which the
        // tick drain loop can never get past on a looping clip.
        let err = AnimationClip::from_frame_rate("aliens", &[0, 1], 2_000_000, true)
            .expect_err("zero frame duration should fail");
        assert!(err.contains("zero frame duration"));

        let fastest = AnimationClip::from_frame_rate("aliens", &[0], 1_000_000, true)
            .expect("a 1us frame is still valid");
        assert_eq!(fastest.frames[0].duration_us, 1);
    }

    #[test]
    fn from_frame_rate_rejects_empty_frames() {
        let err = AnimationClip::from_frame_rate("aliens", &[], 1, true)
            .expect_err("empty frame list should fail");
        assert!(err.contains("no frames"));
    }

    #[test]
    fn one_fps_clip_flips_every_thirty_steps() {
        // A 1fps two-frame clip driven at the 30fps fixed step: the visible
        // frame changes once every 30-31 ticks (integer microseconds).
        let clip = AnimationClip::from_frame_rate("aliens", &[0, 1], 1, true).expect("valid clip");
        let mut state = AnimationState::new("alien-red");

        let mut last = state.tick(0, &clip);
        let mut flips = 0;
        for _ in 0..120 {
            let frame = state.tick(33_333, &clip);
            if frame != last {
                flips += 1;
                last = frame;
            }
        }
        assert_eq!(flips, 3);
    }

    #[test]
    fn total_duration_us() {
        let clip = make_clip(&[100, 200, 300], true);
        assert_eq!(clip.total_duration_us(), 600_000);
    }
}
