use crate::assets::AssetValidator;
use crate::compile::{CompiledGraph, GraphSettings, compile};
use crate::config::EngineConfig;
use crate::fallback::FallbackRenderer;
use crate::format::OutputFormat;
use crate::foundation::core::Resolution;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::probe::{Capabilities, detect};
use crate::process::{CancelToken, EncoderRunner, FfmpegRunner};
use crate::render::{RenderExecutor, RenderJob, render_args};
use crate::style::StyleMetadata;
use crate::timeline::{Timeline, TimelineBuilder};
use std::path::PathBuf;
use std::sync::Arc;

/// Engine availability, fixed by the capability probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    Ready(Capabilities),
    /// The encoder could not be run; every `create_video` call is rejected.
    Unavailable { reason: String },
}

/// One video to assemble.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoRequest {
    /// Scene images in playback order.
    pub images: Vec<PathBuf>,
    #[serde(default)]
    pub audio: Option<PathBuf>,
    /// Approximate narration length; drives the duration heuristic.
    #[serde(default)]
    pub script_word_count: Option<u32>,
    pub style: StyleMetadata,
    /// Name from the output format table, e.g. `1080p`.
    pub output_format: String,
    pub output_path: PathBuf,
}

/// Which render produced the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Primary,
    /// Solid-color placeholder after a failed primary render.
    Fallback,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AssemblyOutput {
    pub path: PathBuf,
    pub mode: RenderMode,
    pub total_duration: f64,
    pub resolution: Resolution,
}

/// Result of a dry run: everything `create_video` would hand to the encoder.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderPlan {
    pub capabilities: Capabilities,
    pub timeline: Timeline,
    pub graph: CompiledGraph,
    pub format: OutputFormat,
    /// Encoder arguments, output path excluded.
    pub args: Vec<String>,
}

/// Facade sequencing validation, timeline, compilation and rendering.
///
/// `create_video` takes `&self`: concurrent calls share only the read-only capabilities and
/// config, each owning its own timeline, graph and output path.
pub struct VideoAssemblyEngine {
    cfg: EngineConfig,
    runner: Arc<dyn EncoderRunner>,
    state: EngineState,
}

impl VideoAssemblyEngine {
    /// Validate `cfg` and probe the encoder behind `runner`.
    ///
    /// A failed probe does not fail construction; it leaves the engine `Unavailable`.
    pub fn new(cfg: EngineConfig, runner: Arc<dyn EncoderRunner>) -> AssemblyResult<Self> {
        cfg.validate()?;
        let state = probe_state(runner.as_ref(), &cfg);
        Ok(Self { cfg, runner, state })
    }

    /// Engine driving the configured `ffmpeg` binary.
    pub fn with_ffmpeg(cfg: EngineConfig) -> AssemblyResult<Self> {
        let runner = Arc::new(FfmpegRunner::from_config(&cfg));
        Self::new(cfg, runner)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        match &self.state {
            EngineState::Ready(caps) => Some(*caps),
            EngineState::Unavailable { .. } => None,
        }
    }

    /// Probe again without touching the engine's own state.
    pub fn detect_capabilities(&self) -> AssemblyResult<Capabilities> {
        detect(self.runner.as_ref(), &self.cfg)
    }

    /// Probe again and replace the engine state with the result.
    pub fn redetect(&mut self) -> &EngineState {
        self.state = probe_state(self.runner.as_ref(), &self.cfg);
        &self.state
    }

    /// Run validation, timeline and compilation without invoking the encoder.
    pub fn plan(&self, req: &VideoRequest) -> AssemblyResult<RenderPlan> {
        let caps = self.ready()?;
        let (timeline, job) = self.prepare(req, caps)?;
        let args = render_args(&job, caps, &self.cfg)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        Ok(RenderPlan {
            capabilities: caps,
            timeline,
            graph: job.graph,
            format: job.format,
            args,
        })
    }

    /// Assemble `req` into a video file.
    ///
    /// A failed primary render is answered by exactly one placeholder render; the primary
    /// render is never retried. Cancellation skips the placeholder.
    #[tracing::instrument(
        skip_all,
        fields(
            out = %req.output_path.display(),
            style = %req.style.template,
            hint = req.style.image_style_hint.as_deref().unwrap_or(""),
        )
    )]
    pub fn create_video(
        &self,
        req: &VideoRequest,
        cancel: &CancelToken,
    ) -> AssemblyResult<AssemblyOutput> {
        let caps = self.ready()?;
        let (timeline, job) = self.prepare(req, caps)?;
        let resolution = job.format.resolution();

        let primary =
            RenderExecutor::new(self.runner.as_ref(), &self.cfg).render(&job, caps, cancel);
        let (path, mode) = match primary {
            Ok(path) => (path, RenderMode::Primary),
            Err(primary) if primary.is_recoverable() && !cancel.is_cancelled() => {
                tracing::warn!(error = %primary, "primary render failed, rendering placeholder");
                let path = FallbackRenderer::new(self.runner.as_ref(), &self.cfg)
                    .render_fallback(&timeline, job.format, &job.output_path, cancel)
                    .map_err(|fallback| match fallback {
                        AssemblyError::Cancelled => AssemblyError::Cancelled,
                        fallback => {
                            tracing::error!(error = %fallback, "placeholder render failed");
                            AssemblyError::fallback_exhausted(
                                primary.to_string(),
                                fallback.to_string(),
                            )
                        }
                    })?;
                (path, RenderMode::Fallback)
            }
            Err(_) if cancel.is_cancelled() => return Err(AssemblyError::Cancelled),
            Err(e) => return Err(e),
        };

        tracing::info!(path = %path.display(), ?mode, "video assembled");
        Ok(AssemblyOutput {
            path,
            mode,
            total_duration: timeline.total_duration,
            resolution,
        })
    }

    fn ready(&self) -> AssemblyResult<Capabilities> {
        match &self.state {
            EngineState::Ready(caps) => Ok(*caps),
            EngineState::Unavailable { reason } => Err(AssemblyError::capability(format!(
                "engine unavailable: {reason}"
            ))),
        }
    }

    /// Validate, lay out and compile; shared by `plan` and `create_video`.
    fn prepare(
        &self,
        req: &VideoRequest,
        caps: Capabilities,
    ) -> AssemblyResult<(Timeline, RenderJob)> {
        let format = OutputFormat::by_name(&req.output_format)?;
        let assets = AssetValidator::from_config(&self.cfg)
            .validate(&req.images, req.audio.as_deref())?;
        let timeline = TimelineBuilder::from_config(&self.cfg).build(
            &assets,
            req.script_word_count,
            req.style.template,
        );
        let graph = compile(&timeline, format, GraphSettings::from_config(&self.cfg, &caps));
        let job = RenderJob::new(graph, format, &req.output_path);
        Ok((timeline, job))
    }
}

fn probe_state(runner: &dyn EncoderRunner, cfg: &EngineConfig) -> EngineState {
    match detect(runner, cfg) {
        Ok(caps) => EngineState::Ready(caps),
        Err(e) => {
            tracing::error!(error = %e, "encoder unavailable");
            EngineState::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
