use crate::config::EngineConfig;
use crate::foundation::error::{AssemblyError, AssemblyResult};
use crate::process::{CancelToken, EncoderRunner};
use std::ffi::OsString;

/// What the installed encoder can do.
///
/// Produced once by [`detect`] and passed by value afterwards; never updated in place.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Capabilities {
    pub encoder_available: bool,
    pub hardware_accel: bool,
    /// The encoder ships the `zoompan` filter used for motion.
    pub advanced_filters: bool,
}

/// Probe the encoder behind `runner`.
///
/// A failing version query is fatal and reported as [`AssemblyError::Capability`]; the
/// hardware and filter queries only ever downgrade their flag.
#[tracing::instrument(skip_all, fields(encoder = %runner.program()))]
pub fn detect(runner: &dyn EncoderRunner, cfg: &EngineConfig) -> AssemblyResult<Capabilities> {
    let cancel = CancelToken::new();

    let version = runner
        .run(&args(&["-version"]), &cancel)
        .map_err(|e| AssemblyError::capability(format!("encoder version query failed: {e}")))?;
    if !version.success() {
        return Err(AssemblyError::capability(format!(
            "encoder version query failed with {}: {}",
            version.describe_exit(),
            version.stderr_tail(3)
        )));
    }
    if let Some(line) = version.stdout_text().lines().next() {
        tracing::info!(version = line.trim(), "encoder found");
    }

    let hardware_accel = cfg.allow_hardware && detect_hardware(runner, cfg, &cancel);
    let advanced_filters = match query(runner, &["-hide_banner", "-filters"], &cancel) {
        Ok(listing) => lists_word(&listing, "zoompan"),
        Err(e) => {
            tracing::warn!(error = %e, "filter listing failed, motion effects disabled");
            false
        }
    };

    let caps = Capabilities {
        encoder_available: true,
        hardware_accel,
        advanced_filters,
    };
    tracing::info!(?caps, "capabilities detected");
    Ok(caps)
}

fn detect_hardware(runner: &dyn EncoderRunner, cfg: &EngineConfig, cancel: &CancelToken) -> bool {
    let hwaccels = match query(runner, &["-hide_banner", "-hwaccels"], cancel) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!(error = %e, "hardware acceleration listing failed");
            return false;
        }
    };
    if !lists_word(&hwaccels, &cfg.hardware_accel_method) {
        tracing::debug!(method = %cfg.hardware_accel_method, "hardware method not listed");
        return false;
    }

    match query(runner, &["-hide_banner", "-encoders"], cancel) {
        Ok(listing) => lists_word(&listing, &cfg.hardware_encoder),
        Err(e) => {
            tracing::warn!(error = %e, "encoder listing failed");
            false
        }
    }
}

fn query(runner: &dyn EncoderRunner, argv: &[&str], cancel: &CancelToken) -> AssemblyResult<String> {
    let out = runner.run(&args(argv), cancel)?;
    if !out.success() {
        return Err(AssemblyError::render(format!(
            "'{}' failed with {}",
            argv.join(" "),
            out.describe_exit()
        )));
    }
    Ok(out.stdout_text())
}

/// `true` when `word` appears as a whitespace-separated token of `listing`.
fn lists_word(listing: &str, word: &str) -> bool {
    listing.split_whitespace().any(|token| token == word)
}

fn args(argv: &[&str]) -> Vec<OsString> {
    argv.iter().map(OsString::from).collect()
}

#[cfg(test)]
#[path = "../tests/unit/probe.rs"]
mod tests;
