use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Deserialize;

/// Clip as exported alongside an armature: a name and its keyframe numbers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClipSource {
    /// Track name, e.g. `Idle` or `Attack`.
    pub name: String,
    /// One-based keyframe numbers in ascending order.
    pub keyframes: Vec<u32>,
}

/// Parsed clip ready for playback.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    keyframes: Vec<f32>,
    max_frame: f32,
    row_offset: u32,
}

impl Clip {
    /// Last frame of the clip; playback wraps or stops here.
    #[must_use]
    pub const fn max_frame(&self) -> f32 {
        self.max_frame
    }

    /// Row of the first keyframe inside the armature's baked pose table.
    #[must_use]
    pub const fn row_offset(&self) -> u32 {
        self.row_offset
    }
}

/// Every clip of a single armature, keyed by track name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArmatureAnimations {
    clips: HashMap<String, Clip>,
}

impl ArmatureAnimations {
    /// Parses clips, laying their keyframe rows out back to back.
    #[must_use]
    pub fn from_sources(sources: &[ClipSource]) -> Self {
        let mut clips = HashMap::with_capacity(sources.len());
        let mut row_offset = 0u32;
        for source in sources {
            let keyframes = source
                .keyframes
                .iter()
                .map(|frame| frame.saturating_sub(1) as f32)
                .collect();
            let max_frame = source.keyframes.iter().copied().max().unwrap_or(0) as f32;
            let _ = clips.insert(
                source.name.clone(),
                Clip {
                    keyframes,
                    max_frame,
                    row_offset,
                },
            );
            row_offset = row_offset.saturating_add(source.keyframes.len() as u32);
        }
        Self { clips }
    }

    /// Looks up a clip by name.
    #[must_use]
    pub fn clip(&self, name: &str) -> Option<&Clip> {
        self.clips.get(name)
    }

    /// Number of parsed clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Reports whether the armature has no clips.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Pair of pose rows to blend and the blend factor between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    /// Row of the keyframe at or before the current frame.
    pub from_row: u32,
    /// Row of the following keyframe.
    pub to_row: u32,
    /// Blend factor in `0.0..=1.0`.
    pub amount: f32,
}

/// Playback cursor over one armature's clips.
#[derive(Clone, Debug)]
pub struct AnimationController {
    library: Arc<ArmatureAnimations>,
    clip: Option<(String, Clip)>,
    frame: f32,
    rate: f32,
    playing: bool,
}

impl AnimationController {
    /// Creates an idle controller over the provided armature.
    #[must_use]
    pub fn new(library: Arc<ArmatureAnimations>) -> Self {
        Self {
            library,
            clip: None,
            frame: 0.0,
            rate: 0.0,
            playing: false,
        }
    }

    /// Switches to the named clip at `rate` frames per second, restarting from frame zero.
    ///
    /// Unknown clips leave the controller stopped.
    pub fn set(&mut self, name: &str, rate: f32) {
        self.clip = self
            .library
            .clip(name)
            .map(|clip| (name.to_owned(), clip.clone()));
        self.frame = 0.0;
        self.rate = rate;
        self.playing = self.clip.is_some();
    }

    /// Advances a looping clip.
    pub fn advance_loop(&mut self, dt: Duration) {
        let Some((_, clip)) = &self.clip else {
            return;
        };
        if clip.max_frame <= 0.0 {
            return;
        }
        self.frame = (self.frame + dt.as_secs_f32() * self.rate) % clip.max_frame;
    }

    /// Advances a one-shot clip, stopping on its last frame.
    pub fn advance_once(&mut self, dt: Duration) {
        let Some((_, clip)) = &self.clip else {
            self.playing = false;
            return;
        };
        if !self.playing {
            return;
        }
        self.frame += dt.as_secs_f32() * self.rate;
        if self.frame >= clip.max_frame {
            self.frame = clip.max_frame;
            self.playing = false;
        }
    }

    /// Reports whether the current clip can still advance.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current frame of the clip.
    #[must_use]
    pub const fn frame(&self) -> f32 {
        self.frame
    }

    /// Name of the active clip.
    #[must_use]
    pub fn clip_name(&self) -> Option<&str> {
        self.clip.as_ref().map(|(name, _)| name.as_str())
    }

    /// Pose rows to blend for the current frame.
    #[must_use]
    pub fn tween(&self) -> Option<Tween> {
        let (_, clip) = self.clip.as_ref()?;
        if clip.keyframes.len() < 2 {
            return clip.keyframes.first().map(|_| Tween {
                from_row: clip.row_offset,
                to_row: clip.row_offset,
                amount: 0.0,
            });
        }
        let segment = (0..clip.keyframes.len() - 1)
            .rev()
            .find(|index| clip.keyframes[*index] < self.frame)
            .unwrap_or(0);
        let start = clip.keyframes[segment];
        let end = clip.keyframes[segment + 1];
        let span = end - start;
        let amount = if span > 0.0 {
            ((self.frame - start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let from_row = clip.row_offset + segment as u32;
        Some(Tween {
            from_row,
            to_row: from_row + 1,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Arc<ArmatureAnimations> {
        Arc::new(ArmatureAnimations::from_sources(&[
            ClipSource {
                name: "Idle".into(),
                keyframes: vec![1, 11, 21],
            },
            ClipSource {
                name: "Attack".into(),
                keyframes: vec![1, 6, 11],
            },
        ]))
    }

    #[test]
    fn clips_are_laid_out_back_to_back() {
        let library = library();
        let attack = library.clip("Attack").expect("attack clip");
        assert_eq!(attack.row_offset(), 3);
        assert_eq!(attack.max_frame(), 11.0);
    }

    #[test]
    fn looping_wraps_around_max_frame() {
        let mut controller = AnimationController::new(library());
        controller.set("Idle", 10.0);
        controller.advance_loop(Duration::from_millis(2_500));
        assert!((controller.frame() - 4.0).abs() < 1e-4);
        assert!(controller.is_playing());
    }

    #[test]
    fn one_shot_stops_on_last_frame() {
        let mut controller = AnimationController::new(library());
        controller.set("Attack", 10.0);
        controller.advance_once(Duration::from_millis(500));
        assert!(controller.is_playing());
        controller.advance_once(Duration::from_millis(700));
        assert!(!controller.is_playing());
        assert_eq!(controller.frame(), 11.0);
    }

    #[test]
    fn tween_blends_between_surrounding_keyframes() {
        let mut controller = AnimationController::new(library());
        controller.set("Idle", 10.0);
        controller.advance_loop(Duration::from_millis(1_500));
        let tween = controller.tween().expect("tween");
        assert_eq!((tween.from_row, tween.to_row), (1, 2));
        assert!((tween.amount - 0.5).abs() < 1e-4);
    }

    #[test]
    fn unknown_clip_leaves_controller_stopped() {
        let mut controller = AnimationController::new(library());
        controller.set("Dance", 10.0);
        assert!(!controller.is_playing());
        assert_eq!(controller.clip_name(), None);
        assert_eq!(controller.tween(), None);
    }
}
