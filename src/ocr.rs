//! Recognition engine boundary: image bytes in, plain text out. The engine
//! gives no structure guarantee; everything downstream treats its output as
//! an unstructured blob.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

pub trait OcrEngine {
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// Shells out to the `tesseract` CLI. Requires the Portuguese language data
/// to be installed on the host.
pub struct TesseractCli {
    pub lang: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        TesseractCli { lang: "por".to_string() }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let mut child = Command::new("tesseract")
            .args(["stdin", "stdout", "-l", &self.lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to start tesseract (is it installed?)")?;

        child
            .stdin
            .take()
            .context("tesseract stdin unavailable")?
            .write_all(image)
            .context("failed to feed image to tesseract")?;

        let output = child.wait_with_output().context("tesseract did not finish")?;
        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
