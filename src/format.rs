use crate::foundation::core::Resolution;
use crate::foundation::error::{AssemblyError, AssemblyResult};

/// Named output quality preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct OutputFormat {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub target_bitrate_kbps: u32,
}

/// Fixed preset table, smallest first.
pub const OUTPUT_FORMATS: [OutputFormat; 4] = [
    OutputFormat {
        name: "720p",
        width: 1280,
        height: 720,
        target_bitrate_kbps: 5_000,
    },
    OutputFormat {
        name: "1080p",
        width: 1920,
        height: 1080,
        target_bitrate_kbps: 8_000,
    },
    OutputFormat {
        name: "1440p",
        width: 2560,
        height: 1440,
        target_bitrate_kbps: 16_000,
    },
    OutputFormat {
        name: "4k",
        width: 3840,
        height: 2160,
        target_bitrate_kbps: 35_000,
    },
];

impl OutputFormat {
    /// Look up a preset by name (case-insensitive; `2160p` is an alias of `4k`).
    pub fn by_name(name: &str) -> AssemblyResult<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        let wanted = if wanted == "2160p" { "4k" } else { wanted.as_str() };
        OUTPUT_FORMATS
            .iter()
            .find(|f| f.name == wanted)
            .copied()
            .ok_or_else(|| {
                let known: Vec<&str> = OUTPUT_FORMATS.iter().map(|f| f.name).collect();
                AssemblyError::validation(format!(
                    "unknown output format '{name}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }

    pub fn resolution(self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    pub fn max_bitrate_kbps(self) -> u32 {
        self.target_bitrate_kbps + self.target_bitrate_kbps / 2
    }

    pub fn buffer_size_kbps(self) -> u32 {
        self.target_bitrate_kbps * 2
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_name(s)
    }
}
