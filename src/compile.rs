//! Timeline to filter-graph compilation.
//!
//! Compilation is purely textual: it never touches the filesystem, so every graph can be
//! checked against a known timeline in unit tests.

use crate::config::EngineConfig;
use crate::format::OutputFormat;
use crate::foundation::core::{Resolution, fmt_secs, frame_index};
use crate::probe::Capabilities;
use crate::style::TransitionKind;
use crate::timeline::{Scene, ScenePosition, Timeline};
use std::ffi::OsString;
use std::path::PathBuf;

/// Label of the concatenated video stream.
pub const VIDEO_OUT_LABEL: &str = "vout";

/// Pixel format every scene chain is normalized to before concatenation.
pub const PIXEL_FORMAT: &str = "yuv420p";

/// One encoder input, in declaration order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSpec {
    /// A still image looped for `duration` seconds, a whole number of frames.
    Still { path: PathBuf, duration: f64 },
    /// The narration track.
    Audio { path: PathBuf },
}

impl InputSpec {
    /// Encoder arguments declaring this input.
    pub fn to_args(&self, fps: u32) -> Vec<OsString> {
        match self {
            InputSpec::Still { path, duration } => vec![
                "-loop".into(),
                "1".into(),
                "-framerate".into(),
                fps.to_string().into(),
                "-t".into(),
                fmt_secs(*duration).into(),
                "-i".into(),
                path.into(),
            ],
            InputSpec::Audio { path } => vec!["-i".into(), path.into()],
        }
    }
}

/// Knobs of graph generation that do not live on the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphSettings {
    pub fps: u32,
    pub max_zoom: f64,
    /// Emit `zoompan` ramps; off when the encoder lacks the filter.
    pub motion: bool,
}

impl GraphSettings {
    pub fn from_config(cfg: &EngineConfig, caps: &Capabilities) -> Self {
        Self {
            fps: cfg.fps,
            max_zoom: cfg.max_zoom,
            motion: caps.advanced_filters,
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            max_zoom: 1.2,
            motion: true,
        }
    }
}

/// A filter graph together with the inputs it was written against.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompiledGraph {
    pub filter_graph: String,
    pub inputs: Vec<InputSpec>,
    /// Per-scene output labels, in scene order.
    pub scene_labels: Vec<String>,
    /// Frames each scene contributes to the concat; they sum to the whole output.
    pub scene_frames: Vec<u64>,
    pub video_label: String,
    /// Input index of the narration track; always directly after the last still.
    pub audio_input: Option<usize>,
    pub total_duration: f64,
    pub fps: u32,
    pub resolution: Resolution,
}

impl CompiledGraph {
    pub fn has_audio(&self) -> bool {
        self.audio_input.is_some()
    }

    /// All input declarations, in order.
    pub fn input_args(&self) -> Vec<OsString> {
        self.inputs
            .iter()
            .flat_map(|input| input.to_args(self.fps))
            .collect()
    }

    /// `-map` target for the video stream.
    pub fn video_map(&self) -> String {
        format!("[{}]", self.video_label)
    }

    /// `-map` target for the narration stream, when present.
    pub fn audio_map(&self) -> Option<String> {
        self.audio_input.map(|idx| format!("{idx}:a:0"))
    }
}

/// Compile `timeline` into a graph producing `format`'s resolution.
#[tracing::instrument(skip_all, fields(scenes = timeline.scenes.len(), format = format.name))]
pub fn compile(timeline: &Timeline, format: OutputFormat, settings: GraphSettings) -> CompiledGraph {
    debug_assert!(!timeline.scenes.is_empty(), "timeline must hold >= 1 scene");

    let res = format.resolution();
    let mut chains = Vec::with_capacity(timeline.scenes.len() + 1);
    let mut inputs = Vec::with_capacity(timeline.scenes.len() + 1);
    let mut scene_labels = Vec::with_capacity(timeline.scenes.len());
    let scene_frames = scene_frame_counts(timeline, settings.fps);

    // Scene `i` always reads input `i`.
    for (input_idx, (scene, &frames)) in timeline.scenes.iter().zip(&scene_frames).enumerate() {
        let label = scene_label(scene.index);
        chains.push(format!(
            "[{input_idx}:v]{}[{label}]",
            scene_filters(scene, frames, res, timeline.transition_duration, settings).join(",")
        ));
        inputs.push(InputSpec::Still {
            path: scene.image_path.clone(),
            duration: frames as f64 / f64::from(settings.fps),
        });
        scene_labels.push(label);
    }

    let concat_inputs: String = scene_labels.iter().map(|l| format!("[{l}]")).collect();
    chains.push(format!(
        "{concat_inputs}concat=n={}:v=1:a=0[{VIDEO_OUT_LABEL}]",
        scene_labels.len()
    ));

    let audio_input = timeline.audio.as_ref().map(|path| {
        inputs.push(InputSpec::Audio { path: path.clone() });
        inputs.len() - 1
    });

    CompiledGraph {
        filter_graph: chains.join(";"),
        inputs,
        scene_labels,
        scene_frames,
        video_label: VIDEO_OUT_LABEL.to_string(),
        audio_input,
        total_duration: timeline.total_duration,
        fps: settings.fps,
        resolution: res,
    }
}

pub fn scene_label(index: usize) -> String {
    format!("v{index}")
}

/// Frame count of every scene, taken between rounded cumulative boundaries.
///
/// Rounding each boundary once keeps the sum equal to the frame count of the whole timeline,
/// so scene `k` starts on the frame nearest its `start_time`.
pub fn scene_frame_counts(timeline: &Timeline, fps: u32) -> Vec<u64> {
    timeline
        .scenes
        .iter()
        .map(|s| frame_index(s.end_time, fps).saturating_sub(frame_index(s.start_time, fps)))
        .collect()
}

/// Filters for one scene: cover-scale, crop, rate, motion, fades, trim.
fn scene_filters(
    scene: &Scene,
    frames: u64,
    res: Resolution,
    transition_duration: f64,
    settings: GraphSettings,
) -> Vec<String> {
    let (w, h) = (res.width, res.height);
    let mut filters = vec![
        format!("scale={w}:{h}:force_original_aspect_ratio=increase"),
        format!("crop={w}:{h}"),
        "setsar=1".to_string(),
        format!("fps={}", settings.fps),
    ];

    if settings.motion
        && let Some(motion) = motion_filter(scene, frames, res, settings)
    {
        filters.push(motion);
    }

    let secs = frames as f64 / f64::from(settings.fps);
    let fade = transition_duration.min(secs / 2.0);
    if fade > 0.0 {
        let fade_in = scene.effects.fade || scene.effects.position == ScenePosition::Start;
        let fade_out = scene.effects.fade || scene.effects.position == ScenePosition::End;
        if fade_in {
            filters.push(format!("fade=t=in:st=0:d={}", fmt_secs(fade)));
        }
        if fade_out {
            filters.push(format!(
                "fade=t=out:st={}:d={}",
                fmt_secs(secs - fade),
                fmt_secs(fade)
            ));
        }
    }

    filters.push(format!("trim=end_frame={frames}"));
    filters.push("setpts=PTS-STARTPTS".to_string());
    filters.push(format!("format={PIXEL_FORMAT}"));
    filters
}

/// Zoom-in ramp for zooming scenes, left-to-right pan for sliding ones.
fn motion_filter(
    scene: &Scene,
    frames: u64,
    res: Resolution,
    settings: GraphSettings,
) -> Option<String> {
    let frames = frames.max(1);
    let size = res.size_arg();
    let fps = settings.fps;
    let max_zoom = settings.max_zoom;

    if scene.effects.zoom {
        let step = (max_zoom - 1.0) / frames as f64;
        Some(format!(
            "zoompan=z='min(1+{step:.6}*on,{max_zoom:.3})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={size}:fps={fps}"
        ))
    } else if scene.transition == TransitionKind::Slide {
        Some(format!(
            "zoompan=z='{max_zoom:.3}':x='(iw-iw/zoom)*on/{frames}':y='ih/2-(ih/zoom/2)':d=1:s={size}:fps={fps}"
        ))
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../tests/unit/compile.rs"]
mod tests;
