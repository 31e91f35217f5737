use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::Engine;
use image::ImageFormat;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::AppConfig;
use crate::models::ImageData;
use crate::validate;

#[async_trait]
pub trait OcrEngine: Send + Sync {
  async fn extract_text(&self, image: &[u8]) -> anyhow::Result<String>;
}

pub struct TesseractOcr {
  command: String,
}

impl TesseractOcr {
  pub fn new(command: impl Into<String>) -> Self {
    Self {
      command: command.into(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(config.tesseract_cmd.clone())
  }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
  async fn extract_text(&self, image: &[u8]) -> anyhow::Result<String> {
    if image.is_empty() {
      bail!("no image data provided for OCR");
    }

    let mut child = Command::new(&self.command)
      .args(["stdin", "stdout"])
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .with_context(|| {
        format!(
          "could not start `{}`; install Tesseract or set TESSERACT_CMD to its path",
          self.command
        )
      })?;

    let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
    let feed = async move {
      stdin.write_all(image).await?;
      stdin.shutdown().await
    };
    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.context("waiting for tesseract")?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      bail!("tesseract failed ({}): {}", output.status, stderr.trim());
    }
    fed.context("writing image to tesseract")?;

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

pub fn decode_upload(upload: &ImageData) -> Result<Vec<u8>, String> {
  validate::image_filename(upload.filename.as_deref())?;

  let payload = match upload.base64.split_once(";base64,") {
    Some((prefix, data)) if prefix.starts_with("data:") => data,
    _ => upload.base64.as_str(),
  };
  let bytes = base64::engine::general_purpose::STANDARD
    .decode(payload.trim())
    .map_err(|_| "The uploaded image could not be decoded.".to_string())?;
  if bytes.is_empty() {
    return Err("Please upload an image first.".to_string());
  }

  match image::guess_format(&bytes) {
    Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => Ok(bytes),
    _ => Err("Unsupported file type. Please upload a JPG or PNG image.".to_string()),
  }
}
