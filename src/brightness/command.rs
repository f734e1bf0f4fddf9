//! Applying brightness via brightnessctl
//!
//! Writes to the backlight go through an external tool instead of the sysfs
//! file itself, which normally requires root.

use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;

/// Something that can apply a raw brightness level to a device
#[async_trait]
pub trait BrightnessCommand: Send + Sync {
    /// Set `device` to the raw level `value`
    async fn apply(&self, device: &str, value: i32) -> anyhow::Result<()>;
}

/// Shells out to `brightnessctl` (or a compatible program)
#[derive(Debug, Clone)]
pub struct Brightnessctl {
    program: String,
}

impl Brightnessctl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for setting `device` to `value`
    fn args(device: &str, value: i32) -> Vec<String> {
        vec![
            "--device".to_string(),
            device.to_string(),
            "set".to_string(),
            value.to_string(),
        ]
    }
}

#[async_trait]
impl BrightnessCommand for Brightnessctl {
    async fn apply(&self, device: &str, value: i32) -> anyhow::Result<()> {
        let args = Self::args(device, value);
        tracing::debug!("Executing {} with args: {:?}", self.program, args);

        let output = AsyncCommand::new(&self.program)
            .args(&args)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed: stderr={}", self.program, stderr.trim());
        }

        Ok(())
    }
}
