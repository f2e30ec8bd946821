use crate::compile::{CompiledGraph, PIXEL_FORMAT};
use crate::config::EngineConfig;
use crate::format::OutputFormat;
use crate::foundation::core::fmt_secs;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::probe::Capabilities;
use crate::process::{CancelToken, EncoderRunner, ensure_parent_dir};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed for one primary encoder invocation.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub graph: CompiledGraph,
    pub format: OutputFormat,
    pub output_path: PathBuf,
    pub has_audio: bool,
}

impl RenderJob {
    pub fn new(graph: CompiledGraph, format: OutputFormat, output_path: impl Into<PathBuf>) -> Self {
        let has_audio = graph.has_audio();
        Self {
            graph,
            format,
            output_path: output_path.into(),
            has_audio,
        }
    }
}

/// Runs the primary render of a compiled graph.
pub struct RenderExecutor<'a> {
    runner: &'a dyn EncoderRunner,
    cfg: &'a EngineConfig,
}

impl<'a> RenderExecutor<'a> {
    pub fn new(runner: &'a dyn EncoderRunner, cfg: &'a EngineConfig) -> Self {
        Self { runner, cfg }
    }

    /// Encode `job` and return its output path.
    ///
    /// The encoder writes to a sibling temp file which is renamed onto `job.output_path` only
    /// after a zero exit and a size check.
    #[tracing::instrument(skip_all, fields(out = %job.output_path.display(), hw = caps.hardware_accel))]
    pub fn render(
        &self,
        job: &RenderJob,
        caps: Capabilities,
        cancel: &CancelToken,
    ) -> AssemblyResult<PathBuf> {
        let args = render_args(job, caps, self.cfg);
        encode_to_path(
            self.runner,
            args,
            &job.output_path,
            self.cfg.min_output_bytes,
            cancel,
        )
    }
}

/// Full argument vector of a primary render, minus the output path.
pub fn render_args(job: &RenderJob, caps: Capabilities, cfg: &EngineConfig) -> Vec<OsString> {
    let graph = &job.graph;
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    args.push("-y".into());
    args.extend(graph.input_args());

    args.push("-filter_complex".into());
    args.push(graph.filter_graph.clone().into());
    args.push("-map".into());
    args.push(graph.video_map().into());

    match graph.audio_map() {
        Some(map) if job.has_audio => {
            args.push("-map".into());
            args.push(map.into());
            args.push("-c:a".into());
            args.push(cfg.audio_codec.clone().into());
            args.push("-b:a".into());
            args.push(format!("{}k", cfg.audio_bitrate_kbps).into());
        }
        _ => args.push("-an".into()),
    }

    args.extend(video_codec_args(caps, cfg));
    args.extend(rate_control_args(job.format));
    args.extend(
        [
            "-pix_fmt".to_string(),
            PIXEL_FORMAT.to_string(),
            "-r".to_string(),
            graph.fps.to_string(),
            "-t".to_string(),
            fmt_secs(graph.total_duration),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
        .map(OsString::from),
    );
    args
}

/// Codec selection: the hardware encoder when the probe found it, the software one otherwise.
pub fn video_codec_args(caps: Capabilities, cfg: &EngineConfig) -> Vec<OsString> {
    let crf = cfg.crf.to_string();
    let args = if caps.hardware_accel {
        [
            "-c:v",
            cfg.hardware_encoder.as_str(),
            "-preset",
            cfg.hardware_preset.as_str(),
            "-rc",
            "vbr",
            "-cq",
            crf.as_str(),
        ]
        .to_vec()
    } else {
        [
            "-c:v",
            cfg.software_encoder.as_str(),
            "-preset",
            cfg.software_preset.as_str(),
            "-crf",
            crf.as_str(),
        ]
        .to_vec()
    };
    args.into_iter().map(OsString::from).collect()
}

fn rate_control_args(format: OutputFormat) -> Vec<OsString> {
    [
        "-b:v".to_string(),
        format!("{}k", format.target_bitrate_kbps),
        "-maxrate".to_string(),
        format!("{}k", format.max_bitrate_kbps()),
        "-bufsize".to_string(),
        format!("{}k", format.buffer_size_kbps()),
    ]
    .map(OsString::from)
    .to_vec()
}

/// Sibling temp path the encoder writes to, keeping the container extension.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    output.with_file_name(format!(".{stem}.partial.{ext}"))
}

/// Run the encoder with `args` writing to a temp file, then promote it to `output`.
///
/// Success needs a zero exit and a temp file larger than `min_bytes`; every failure removes
/// the temp file and never touches `output`.
pub(crate) fn encode_to_path(
    runner: &dyn EncoderRunner,
    mut args: Vec<OsString>,
    output: &Path,
    min_bytes: u64,
    cancel: &CancelToken,
) -> AssemblyResult<PathBuf> {
    ensure_parent_dir(output).map_err(|e| AssemblyError::render(e.to_string()))?;
    let partial = partial_path(output);
    remove_quietly(&partial);
    args.push(partial.clone().into());

    let result = runner.run(&args, cancel).and_then(|out| {
        if !out.success() {
            return Err(AssemblyError::render(format!(
                "{} exited with {}: {}",
                runner.program(),
                out.describe_exit(),
                out.stderr_tail(5)
            )));
        }
        let size = std::fs::metadata(&partial).map(|m| m.len()).unwrap_or(0);
        if size <= min_bytes {
            return Err(AssemblyError::render(format!(
                "{} exited cleanly but wrote {size} bytes (need more than {min_bytes})",
                runner.program()
            )));
        }
        Ok(size)
    });

    match result {
        Ok(size) => {
            std::fs::rename(&partial, output).map_err(|e| {
                remove_quietly(&partial);
                AssemblyError::render(format!(
                    "failed to move '{}' to '{}': {e}",
                    partial.display(),
                    output.display()
                ))
            })?;
            tracing::info!(out = %output.display(), bytes = size, "output written");
            Ok(output.to_path_buf())
        }
        Err(e) => {
            remove_quietly(&partial);
            Err(e)
        }
    }
}

fn remove_quietly(path: &Path) {
    if path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
    }
}

#[cfg(test)]
#[path = "../tests/unit/render.rs"]
mod tests;
