use std::path::Path;
use std::sync::Arc;

use tokio::process::Command;

use crate::media::{CommandExecutor, MediaError, MediaResult, MediaTools, SystemCommandExecutor};

/// Reports the exact playable duration of one chunk file, in seconds.
#[async_trait::async_trait]
pub trait DurationProbe: Send + Sync {
    async fn duration_sec(&self, chunk: &Path) -> MediaResult<f64>;
}

pub struct FfprobeDurationProbe {
    tools: MediaTools,
    executor: Arc<dyn CommandExecutor>,
}

impl FfprobeDurationProbe {
    pub fn new(tools: MediaTools, executor: Option<Arc<dyn CommandExecutor>>) -> Self {
        Self {
            tools,
            executor: executor.unwrap_or_else(|| Arc::new(SystemCommandExecutor)),
        }
    }
}

#[async_trait::async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn duration_sec(&self, chunk: &Path) -> MediaResult<f64> {
        let mut command = Command::new(&self.tools.ffprobe);
        command
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(chunk);

        let output = self
            .executor
            .run(&mut command)
            .await
            .map_err(|source| MediaError::Io {
                source,
                path: chunk.to_path_buf(),
            })?;
        if !output.status.success() {
            return Err(MediaError::Probe {
                path: chunk.to_path_buf(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| MediaError::InvalidProbeOutput {
                path: chunk.to_path_buf(),
                raw: stdout.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::{ExitStatus, Output};

    struct CannedExecutor {
        stdout: &'static [u8],
        code: i32,
    }

    #[async_trait::async_trait]
    impl CommandExecutor for CannedExecutor {
        async fn run(&self, _command: &mut Command) -> std::io::Result<Output> {
            Ok(Output {
                status: ExitStatus::from_raw(self.code << 8),
                stdout: self.stdout.to_vec(),
                stderr: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn parses_fractional_duration() {
        let probe = FfprobeDurationProbe::new(
            MediaTools::default(),
            Some(Arc::new(CannedExecutor {
                stdout: b"6.006000\n",
                code: 0,
            })),
        );
        let duration = probe.duration_sec(Path::new("seg000.ts")).await.unwrap();
        assert!((duration - 6.006).abs() < 1e-9);
    }

    #[tokio::test]
    async fn garbage_output_is_an_error() {
        let probe = FfprobeDurationProbe::new(
            MediaTools::default(),
            Some(Arc::new(CannedExecutor {
                stdout: b"N/A\n",
                code: 0,
            })),
        );
        let err = probe.duration_sec(Path::new("seg000.ts")).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidProbeOutput { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_probe_error() {
        let probe = FfprobeDurationProbe::new(
            MediaTools::default(),
            Some(Arc::new(CannedExecutor {
                stdout: b"",
                code: 1,
            })),
        );
        let err = probe.duration_sec(Path::new("seg000.ts")).await.unwrap_err();
        assert!(matches!(err, MediaError::Probe { .. }));
    }
}
