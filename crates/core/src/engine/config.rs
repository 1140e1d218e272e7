//! Configuration for the FFmpeg engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Encoding parameters passed to ffmpeg.
///
/// Defaults produce a 720x480 H.264 baseline stream at 2 Mbit/s with the
/// audio stream copied untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Video encoder name.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Output width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Target video bitrate in kbps.
    #[serde(default = "default_bitrate")]
    pub bitrate_kbps: u32,

    /// Keyframe interval in frames.
    #[serde(default = "default_gop")]
    pub gop_size: u32,

    /// Maximum consecutive B-frames.
    #[serde(default)]
    pub max_b_frames: u32,

    /// Encoder preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Encoder tune.
    #[serde(default = "default_tune")]
    pub tune: Option<String>,

    /// Encoder profile.
    #[serde(default = "default_profile")]
    pub profile: Option<String>,

    /// Output pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Audio codec; `copy` passes the first audio stream through.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional ffmpeg arguments placed before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_width() -> u32 {
    720
}

fn default_height() -> u32 {
    480
}

fn default_fps() -> u32 {
    30
}

fn default_bitrate() -> u32 {
    2000
}

fn default_gop() -> u32 {
    30
}

fn default_preset() -> String {
    "ultrafast".to_string()
}

fn default_tune() -> Option<String> {
    Some("zerolatency".to_string())
}

fn default_profile() -> Option<String> {
    Some("baseline".to_string())
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_audio_codec() -> String {
    "copy".to_string()
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            video_codec: default_video_codec(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            bitrate_kbps: default_bitrate(),
            gop_size: default_gop(),
            max_b_frames: 0,
            preset: default_preset(),
            tune: default_tune(),
            profile: default_profile(),
            pixel_format: default_pixel_format(),
            audio_codec: default_audio_codec(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Creates a config with a custom ffmpeg path.
    pub fn with_ffmpeg_path(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ..Default::default()
        }
    }

    /// Sets the output resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the target video bitrate.
    pub fn with_bitrate(mut self, bitrate_kbps: u32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }
}
