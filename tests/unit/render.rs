use super::*;
use crate::assets::ValidatedAssetSet;
use crate::compile::{GraphSettings, compile};
use crate::process::ProcessOutput;
use crate::style::Style;
use crate::timeline::TimelineBuilder;

/// Writes `bytes` bytes to the last argument and exits with `exit_code`.
struct WritingRunner {
    exit_code: i32,
    bytes: usize,
}

impl EncoderRunner for WritingRunner {
    fn program(&self) -> String {
        "fake-ffmpeg".to_string()
    }

    fn run(&self, args: &[OsString], cancel: &CancelToken) -> AssemblyResult<ProcessOutput> {
        if cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }
        let out = PathBuf::from(args.last().unwrap());
        std::fs::write(&out, vec![0u8; self.bytes]).unwrap();
        Ok(ProcessOutput {
            exit_code: Some(self.exit_code),
            stdout: Vec::new(),
            stderr: b"Error while filtering\nConversion failed!\n".to_vec(),
        })
    }
}

/// Writes a plausible partial file, then reports that the run was cancelled.
struct CancelledMidRunRunner;

impl EncoderRunner for CancelledMidRunRunner {
    fn program(&self) -> String {
        "fake-ffmpeg".to_string()
    }

    fn run(&self, args: &[OsString], cancel: &CancelToken) -> AssemblyResult<ProcessOutput> {
        let out = PathBuf::from(args.last().unwrap());
        std::fs::write(&out, vec![0u8; 64 * 1024]).unwrap();
        cancel.cancel();
        Err(AssemblyError::Cancelled)
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "stillreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn job(audio: bool) -> RenderJob {
    let assets = ValidatedAssetSet {
        images: (0..3).map(|i| PathBuf::from(format!("s{i}.png"))).collect(),
        audio: audio.then(|| PathBuf::from("voice.mp3")),
    };
    let tl = TimelineBuilder::from_config(&EngineConfig::default()).build(
        &assets,
        Some(300),
        Style::Mysterious,
    );
    let format = OutputFormat::by_name("1080p").unwrap();
    RenderJob::new(
        compile(&tl, format, GraphSettings::default()),
        format,
        "out/video.mp4",
    )
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}

#[test]
fn args_wire_inputs_graph_and_maps() {
    let job = job(true);
    assert!(job.has_audio);
    let args = strings(&render_args(&job, Capabilities::default(), &EngineConfig::default()));

    assert_eq!(value_after(&args, "-i"), vec!["s0.png", "s1.png", "s2.png", "voice.mp3"]);
    assert_eq!(value_after(&args, "-filter_complex"), vec![job.graph.filter_graph.as_str()]);
    assert_eq!(value_after(&args, "-map"), vec!["[vout]", "3:a:0"]);
    assert_eq!(value_after(&args, "-c:a"), vec!["aac"]);
    assert_eq!(value_after(&args, "-pix_fmt"), vec!["yuv420p"]);
    assert_eq!(value_after(&args, "-r"), vec!["30"]);
    assert_eq!(value_after(&args, "-t").last().copied(), Some("120.000"));
    assert!(!args.contains(&"-an".to_string()));
}

#[test]
fn video_only_job_disables_audio() {
    let args = strings(&render_args(
        &job(false),
        Capabilities::default(),
        &EngineConfig::default(),
    ));
    assert!(args.contains(&"-an".to_string()));
    assert_eq!(value_after(&args, "-map"), vec!["[vout]"]);
}

#[test]
fn codec_follows_hardware_capability() {
    let cfg = EngineConfig::default();
    let sw = strings(&video_codec_args(Capabilities::default(), &cfg));
    assert_eq!(sw, ["-c:v", "libx264", "-preset", "medium", "-crf", "23"]);

    let hw_caps = Capabilities {
        encoder_available: true,
        hardware_accel: true,
        advanced_filters: true,
    };
    let hw = strings(&video_codec_args(hw_caps, &cfg));
    assert_eq!(value_after(&hw, "-c:v"), vec!["h264_nvenc"]);
    assert_eq!(value_after(&hw, "-cq"), vec!["23"]);
}

#[test]
fn rate_control_comes_from_the_output_format() {
    let args = strings(&render_args(&job(false), Capabilities::default(), &EngineConfig::default()));
    assert_eq!(value_after(&args, "-b:v"), vec!["8000k"]);
    assert_eq!(value_after(&args, "-maxrate"), vec!["12000k"]);
    assert_eq!(value_after(&args, "-bufsize"), vec!["16000k"]);
}

#[test]
fn partial_path_is_a_hidden_sibling() {
    assert_eq!(
        partial_path(Path::new("out/video.mp4")),
        PathBuf::from("out/.video.partial.mp4")
    );
    assert_eq!(
        partial_path(Path::new("clip")),
        PathBuf::from(".clip.partial.mp4")
    );
}

#[test]
fn clean_exit_with_large_file_is_promoted() {
    let dir = temp_dir("render_promote");
    let out = dir.join("nested").join("final.mp4");
    let runner = WritingRunner {
        exit_code: 0,
        bytes: 4096,
    };

    let path = encode_to_path(&runner, Vec::new(), &out, 1024, &CancelToken::new()).unwrap();
    assert_eq!(path, out);
    assert_eq!(std::fs::metadata(&out).unwrap().len(), 4096);
    assert!(!partial_path(&out).exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn clean_exit_with_truncated_file_is_a_render_error() {
    let dir = temp_dir("render_truncated");
    let out = dir.join("final.mp4");
    let runner = WritingRunner {
        exit_code: 0,
        bytes: 100,
    };

    let err = encode_to_path(&runner, Vec::new(), &out, 1024, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, AssemblyError::Render(_)));
    assert!(!out.exists());
    assert!(!partial_path(&out).exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn non_zero_exit_reports_stderr_tail() {
    let dir = temp_dir("render_exit");
    let out = dir.join("final.mp4");
    let runner = WritingRunner {
        exit_code: 1,
        bytes: 4096,
    };

    let err = encode_to_path(&runner, Vec::new(), &out, 1024, &CancelToken::new()).unwrap_err();
    assert!(err.to_string().contains("exit code 1"));
    assert!(err.to_string().contains("Conversion failed!"));
    assert!(!out.exists());
    assert!(!partial_path(&out).exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn executor_runs_the_full_command() {
    let dir = temp_dir("render_executor");
    let cfg = EngineConfig::default();
    let runner = WritingRunner {
        exit_code: 0,
        bytes: 2048,
    };
    let mut job = job(false);
    job.output_path = dir.join("video.mp4");

    let path = RenderExecutor::new(&runner, &cfg)
        .render(&job, Capabilities::default(), &CancelToken::new())
        .unwrap();
    assert_eq!(path, job.output_path);

    let cancelled = CancelToken::new();
    cancelled.cancel();
    let err = RenderExecutor::new(&runner, &cfg)
        .render(&job, Capabilities::default(), &cancelled)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::Cancelled));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn cancelled_run_never_promotes_its_partial_file() {
    let dir = temp_dir("render_cancelled_partial");
    let out = dir.join("final.mp4");
    let cancel = CancelToken::new();

    let err = encode_to_path(&CancelledMidRunRunner, Vec::new(), &out, 1024, &cancel).unwrap_err();
    assert!(matches!(err, AssemblyError::Cancelled));
    assert!(cancel.is_cancelled());
    assert!(!partial_path(&out).exists());
    assert!(!out.exists());

    std::fs::remove_dir_all(&dir).ok();
}
