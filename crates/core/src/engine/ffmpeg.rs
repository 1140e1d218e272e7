//! FFmpeg subprocess engine.

use once_cell::sync::OnceCell;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error, info, warn};

use super::config::EngineConfig;
use super::traits::{TranscodeEngine, ENGINE_FAILURE};

/// Engine that shells out to an `ffmpeg` binary.
///
/// The process exit code is the engine status. A binary that cannot be
/// spawned, or a process killed by a signal, reports [`ENGINE_FAILURE`].
pub struct FfmpegEngine {
    config: EngineConfig,
    /// Queried once from `ffmpeg -version`.
    version: OnceCell<Option<String>>,
}

impl FfmpegEngine {
    /// Creates a new FFmpeg engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            version: OnceCell::new(),
        }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn query_version(&self) -> Option<String> {
        let result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match result {
            Ok(output) if output.status.success() => {
                parse_version(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!("ffmpeg -version exited with {}", output.status);
                None
            }
            Err(e) => {
                warn!(
                    "Failed to query ffmpeg version at {:?}: {}",
                    self.config.ffmpeg_path, e
                );
                None
            }
        }
    }

    /// Builds ffmpeg arguments for a transcode.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let config = &self.config;
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            // First video stream, first audio stream if there is one
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a:0?".to_string(),
            "-c:v".to_string(),
            config.video_codec.clone(),
            "-vf".to_string(),
            format!("scale={}:{}", config.width, config.height),
            "-pix_fmt".to_string(),
            config.pixel_format.clone(),
            "-r".to_string(),
            config.fps.to_string(),
            "-b:v".to_string(),
            format!("{}k", config.bitrate_kbps),
            "-g".to_string(),
            config.gop_size.to_string(),
            "-bf".to_string(),
            config.max_b_frames.to_string(),
            "-preset".to_string(),
            config.preset.clone(),
        ];

        if let Some(ref tune) = config.tune {
            args.extend(["-tune".to_string(), tune.clone()]);
        }
        if let Some(ref profile) = config.profile {
            args.extend(["-profile:v".to_string(), profile.clone()]);
        }

        args.extend(["-c:a".to_string(), config.audio_codec.clone()]);

        args.extend(["-loglevel".to_string(), config.log_level.clone()]);

        args.extend(config.extra_args.iter().cloned());

        args.push(output_path.to_string_lossy().to_string());

        args
    }
}

/// Extracts the version token from the `ffmpeg -version` banner.
fn parse_version(banner: &str) -> Option<String> {
    banner
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn version(&self) -> Option<String> {
        self.version.get_or_init(|| self.query_version()).clone()
    }

    fn transcode(&self, input: &Path, output: &Path) -> i32 {
        let args = self.build_args(input, output);
        info!("Starting transcode: {:?} -> {:?}", input, output);
        debug!("ffmpeg args: {:?}", args);

        let result = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                error!(
                    "Failed to spawn ffmpeg at {:?}: {}",
                    self.config.ffmpeg_path, e
                );
                return ENGINE_FAILURE;
            }
        };

        match output.status.code() {
            Some(code) => {
                if code != 0 {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    warn!("ffmpeg exited with code {}: {}", code, stderr.trim());
                }
                code
            }
            None => {
                warn!("ffmpeg terminated by signal");
                ENGINE_FAILURE
            }
        }
    }
}
