use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a validated resolution.
    ///
    /// Both sides must be non-zero and even (required for yuv420p output).
    pub fn new(width: u32, height: u32) -> AssemblyResult<Self> {
        if width == 0 || height == 0 {
            return Err(AssemblyError::validation(
                "resolution width/height must be non-zero",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(AssemblyError::validation(
                "resolution width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(Self { width, height })
    }

    /// `WxH` form used by encoder size arguments.
    pub fn size_arg(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Format seconds with millisecond precision for encoder arguments.
pub fn fmt_secs(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

/// Index of the frame boundary nearest to `secs` at `fps`.
pub fn frame_index(secs: f64, fps: u32) -> u64 {
    (secs.max(0.0) * f64::from(fps)).round() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
