use crate::foundation::error::{AssemblyError, AssemblyResult};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Tunable constants of the assembly engine.
///
/// Every field has a default, so a JSON config file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Encoder binary, resolved through `PATH` when relative.
    pub encoder_path: PathBuf,
    /// Output frame rate, applied to every scene.
    pub fps: u32,
    /// Narration rate used to turn a script word count into a duration.
    pub words_per_minute: f64,
    /// Lower clamp for the word-count duration heuristic.
    pub min_duration_secs: f64,
    /// Upper clamp for the word-count duration heuristic.
    pub max_duration_secs: f64,
    /// Duration used when the script word count is unknown.
    pub default_duration_secs: f64,
    /// Nominal fade length between scenes.
    pub transition_duration_secs: f64,
    /// Smallest accepted image/audio input, in bytes.
    pub min_asset_bytes: u64,
    /// Smallest accepted encoder output, in bytes.
    pub min_output_bytes: u64,
    /// Software H.264 encoder.
    pub software_encoder: String,
    /// `-preset` passed to the software encoder.
    pub software_preset: String,
    /// `-preset` of the placeholder render; empty for encoders without presets.
    pub fallback_preset: String,
    /// Hardware H.264 encoder, used when the probe finds it.
    pub hardware_encoder: String,
    /// `-preset` passed to the hardware encoder.
    pub hardware_preset: String,
    /// Name the hardware method has in `-hwaccels` output.
    pub hardware_accel_method: String,
    /// Set to `false` to never probe for (or use) hardware encoding.
    pub allow_hardware: bool,
    /// Constant-rate-factor (`-crf` / `-cq`).
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate_kbps: u32,
    /// Upper bound of the zoom ramp applied to zooming scenes.
    pub max_zoom: f64,
    /// Color of the placeholder video (any ffmpeg color name or `0xRRGGBB`).
    pub fallback_color: String,
    /// Sleep between encoder exit/cancellation checks.
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encoder_path: PathBuf::from("ffmpeg"),
            fps: 30,
            words_per_minute: 150.0,
            min_duration_secs: 120.0,
            max_duration_secs: 300.0,
            default_duration_secs: 180.0,
            transition_duration_secs: 1.0,
            min_asset_bytes: 1024,
            min_output_bytes: 1024,
            software_encoder: "libx264".to_string(),
            software_preset: "medium".to_string(),
            fallback_preset: "ultrafast".to_string(),
            hardware_encoder: "h264_nvenc".to_string(),
            hardware_preset: "p4".to_string(),
            hardware_accel_method: "cuda".to_string(),
            allow_hardware: true,
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 192,
            max_zoom: 1.2,
            fallback_color: "black".to_string(),
            poll_interval_ms: 50,
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> AssemblyResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| AssemblyError::validation(format!("parse engine config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> AssemblyResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            AssemblyError::validation(format!("open engine config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> AssemblyResult<()> {
        if self.encoder_path.as_os_str().is_empty() {
            return Err(AssemblyError::validation("encoder_path must not be empty"));
        }
        if self.fps == 0 {
            return Err(AssemblyError::validation("fps must be non-zero"));
        }
        if !is_positive(self.words_per_minute) {
            return Err(AssemblyError::validation("words_per_minute must be > 0"));
        }
        if !is_positive(self.min_duration_secs) {
            return Err(AssemblyError::validation("min_duration_secs must be > 0"));
        }
        if self.min_duration_secs > self.max_duration_secs {
            return Err(AssemblyError::validation(
                "min_duration_secs must be <= max_duration_secs",
            ));
        }
        if !is_positive(self.default_duration_secs) {
            return Err(AssemblyError::validation(
                "default_duration_secs must be > 0",
            ));
        }
        if !self.transition_duration_secs.is_finite() || self.transition_duration_secs < 0.0 {
            return Err(AssemblyError::validation(
                "transition_duration_secs must be >= 0",
            ));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < 1.0 {
            return Err(AssemblyError::validation("max_zoom must be >= 1.0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(AssemblyError::validation("poll_interval_ms must be non-zero"));
        }
        for (name, value) in [
            ("software_encoder", &self.software_encoder),
            ("hardware_encoder", &self.hardware_encoder),
            ("audio_codec", &self.audio_codec),
            ("fallback_color", &self.fallback_color),
        ] {
            if value.trim().is_empty() {
                return Err(AssemblyError::validation(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub(crate) fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
