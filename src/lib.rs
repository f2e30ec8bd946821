//! Stillreel assembles still images and an optional narration track into a single video file.
//!
//! The pipeline is a fixed sequence driven by [`VideoAssemblyEngine`]:
//!
//! - Probe the external encoder once ([`probe`])
//! - Validate the requested assets ([`assets`])
//! - Lay the images out on a [`Timeline`]
//! - Compile the timeline into an ffmpeg filter graph ([`compile`])
//! - Render it, falling back to a solid-color placeholder if the render fails
//!
//! All encoding goes through the [`EncoderRunner`] seam, so the whole pipeline can be driven
//! without ffmpeg installed.
#![forbid(unsafe_code)]

mod foundation;

pub mod assets;
pub mod compile;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod format;
pub mod probe;
pub mod process;
pub mod render;
pub mod style;
pub mod timeline;

pub use crate::foundation::core::{Resolution, fmt_secs, frame_index};
pub use crate::foundation::error::{AssemblyError, AssemblyResult};

pub use crate::assets::{AssetValidator, Rejection, ValidatedAssetSet};
pub use crate::compile::{CompiledGraph, GraphSettings, InputSpec};
pub use crate::config::EngineConfig;
pub use crate::engine::{
    AssemblyOutput, EngineState, RenderMode, RenderPlan, VideoAssemblyEngine, VideoRequest,
};
pub use crate::fallback::FallbackRenderer;
pub use crate::format::{OUTPUT_FORMATS, OutputFormat};
pub use crate::probe::Capabilities;
pub use crate::process::{CancelToken, EncoderRunner, FfmpegRunner, ProcessOutput};
pub use crate::render::{RenderExecutor, RenderJob};
pub use crate::style::{Style, StyleMetadata, TransitionKind};
pub use crate::timeline::{Scene, ScenePosition, Timeline, TimelineBuilder};
