//! Text-to-speech through an external program.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use estate_core::config::VoiceConfig;
use estate_core::error::{EstateError, Result};

const OUTPUT_PLACEHOLDER: &str = "{output}";
const TEXT_PLACEHOLDER: &str = "{text}";

/// Renders text to an audio file.
pub trait SpeechSynthesizer: Send + Sync {
    /// Write speech for `text` to `output`.
    fn synthesize(&self, text: &str, output: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Synthesizer that shells out to a TTS program such as `espeak-ng`.
///
/// `{output}` and `{text}` in the argument list are substituted. When no
/// argument carries `{text}`, the text is written to the program's stdin.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(config.tts_program.clone(), config.tts_args.clone())
    }

    fn render_args(&self, text: &str, output: &Path) -> (Vec<String>, bool) {
        let output = output.to_string_lossy();
        let mut text_in_args = false;
        let args = self
            .args
            .iter()
            .map(|arg| {
                if arg.contains(TEXT_PLACEHOLDER) {
                    text_in_args = true;
                }
                arg.replace(OUTPUT_PLACEHOLDER, &output)
                    .replace(TEXT_PLACEHOLDER, text)
            })
            .collect();
        (args, text_in_args)
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let (args, text_in_args) = self.render_args(text, output);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if text_in_args {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EstateError::Synthesis(format!("failed to run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            // Dropping stdin closes the pipe so the program sees EOF.
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(EstateError::Synthesis(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }
        debug!(program = %self.program, output = %output.display(), "Speech synthesized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let synth = CommandSynthesizer::from_config(&VoiceConfig::default());
        let (args, text_in_args) = synth.render_args("добрый день", Path::new("/tmp/a.wav"));
        assert_eq!(args, vec!["-v", "ru", "-w", "/tmp/a.wav", "добрый день"]);
        assert!(text_in_args);
    }

    #[test]
    fn test_render_args_without_text_placeholder() {
        let synth = CommandSynthesizer::new("tts", vec!["--out={output}".to_string()]);
        let (args, text_in_args) = synth.render_args("hi", Path::new("x.wav"));
        assert_eq!(args, vec!["--out=x.wav"]);
        assert!(!text_in_args);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_synthesize_via_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let synth = CommandSynthesizer::new(
            "sh",
            vec!["-c".to_string(), "cat > \"$0\"".to_string(), "{output}".to_string()],
        );
        synth.synthesize("привет мир", &output).await.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "привет мир");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = CommandSynthesizer::new("false", vec![]);
        let err = synth
            .synthesize("text", &dir.path().join("o.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_synthesis_error() {
        let synth = CommandSynthesizer::new("/nonexistent/tts", vec!["{text}".to_string()]);
        let err = synth
            .synthesize("text", Path::new("o.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, EstateError::Synthesis(_)));
    }
}
