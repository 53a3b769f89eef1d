//! ffmpeg transcoding and WAV decoding.

use std::path::Path;
use std::process::Stdio;

use hound::{SampleFormat, WavReader};
use tokio::process::Command;
use tracing::debug;

use estate_core::error::{EstateError, Result};

/// Sample rate the recognizer expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Runs ffmpeg to produce recognizer-ready audio.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg_path: String,
}

impl Transcoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Convert any input ffmpeg understands into 16 kHz mono WAV at `output`.
    pub async fn to_wav(&self, input: &Path, output: &Path) -> Result<()> {
        let rate = TARGET_SAMPLE_RATE.to_string();
        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-ar", rate.as_str(), "-ac", "1"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                EstateError::Transcoding(format!("failed to run {}: {}", self.ffmpeg_path, e))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail = stderr.lines().last().unwrap_or_default();
            return Err(EstateError::Transcoding(format!(
                "ffmpeg exited with {}: {}",
                result.status, tail
            )));
        }
        debug!(input = %input.display(), output = %output.display(), "Audio transcoded");
        Ok(())
    }
}

/// Decode a WAV file into mono f32 samples in [-1.0, 1.0].
///
/// Multi-channel input is averaged down to one channel. Blocking; call it
/// from the blocking pool.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let decode_err = |e: hound::Error| EstateError::Transcoding(format!("invalid WAV: {}", e));

    let mut reader = WavReader::open(path).map_err(decode_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(decode_err)?,
        SampleFormat::Int => {
            let scale = (1_i64 << spec.bits_per_sample.saturating_sub(1).min(31)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };
    Ok((samples, spec.sample_rate))
}
