use crate::assets::ValidatedAssetSet;
use crate::config::EngineConfig;
use crate::style::{Style, TransitionKind};
use std::path::PathBuf;

/// Where a scene sits in the video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePosition {
    Start,
    Middle,
    End,
}

impl ScenePosition {
    /// A single-scene timeline is `Start`.
    pub fn for_index(index: usize, count: usize) -> Self {
        if index == 0 {
            ScenePosition::Start
        } else if index + 1 == count {
            ScenePosition::End
        } else {
            ScenePosition::Middle
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SceneEffects {
    pub zoom: bool,
    pub fade: bool,
    pub position: ScenePosition,
}

/// One timeline segment showing one source image over `[start_time, end_time)`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub index: usize,
    pub image_path: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub transition: TransitionKind,
    pub effects: SceneEffects,
}

/// Ordered partition of the output duration into scenes.
///
/// Scene durations sum to `total_duration` and `scenes` holds one entry per validated image.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    pub total_duration: f64,
    /// Nominal per-scene length before the last scene is pinned to the end.
    pub image_duration: f64,
    pub transition_duration: f64,
    pub scenes: Vec<Scene>,
    /// Narration carried over from the validated assets.
    pub audio: Option<PathBuf>,
}

impl Timeline {
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// Duration heuristics and scene layout.
#[derive(Clone, Copy, Debug)]
pub struct TimelineBuilder {
    words_per_minute: f64,
    min_duration: f64,
    max_duration: f64,
    default_duration: f64,
    transition_duration: f64,
}

impl TimelineBuilder {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            words_per_minute: cfg.words_per_minute,
            min_duration: cfg.min_duration_secs,
            max_duration: cfg.max_duration_secs,
            default_duration: cfg.default_duration_secs,
            transition_duration: cfg.transition_duration_secs,
        }
    }

    /// Narration-rate estimate clamped to the configured range, or the default when the
    /// word count is unknown.
    pub fn total_duration(&self, script_word_count: Option<u32>) -> f64 {
        match script_word_count {
            Some(words) => {
                let raw = f64::from(words) / self.words_per_minute * 60.0;
                raw.clamp(self.min_duration, self.max_duration)
            }
            None => self.default_duration,
        }
    }

    /// Lay the validated images out as an even split of the total duration.
    ///
    /// `assets.images` is non-empty (guaranteed by the validator).
    #[tracing::instrument(skip(self, assets), fields(images = assets.images.len()))]
    pub fn build(
        &self,
        assets: &ValidatedAssetSet,
        script_word_count: Option<u32>,
        style: Style,
    ) -> Timeline {
        let total_duration = self.total_duration(script_word_count);
        let count = assets.images.len();
        let image_duration = total_duration / count as f64;
        let look = style.effects();

        let scenes = assets
            .images
            .iter()
            .enumerate()
            .map(|(index, image_path)| {
                let start_time = index as f64 * image_duration;
                // Computed from the next index so neighbouring scenes share the exact bound.
                let end_time = if index + 1 == count {
                    total_duration
                } else {
                    (index + 1) as f64 * image_duration
                };
                Scene {
                    index,
                    image_path: image_path.clone(),
                    start_time,
                    end_time,
                    duration: end_time - start_time,
                    transition: look.transition,
                    effects: SceneEffects {
                        zoom: look.zoom,
                        fade: look.fade,
                        position: ScenePosition::for_index(index, count),
                    },
                }
            })
            .collect();

        tracing::debug!(total_duration, image_duration, "timeline built");
        Timeline {
            total_duration,
            image_duration,
            transition_duration: self.transition_duration,
            scenes,
            audio: assets.audio.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/timeline.rs"]
mod tests;
