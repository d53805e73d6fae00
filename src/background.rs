//! 背景移除节点
//!
//! # 设计思路
//!
//! 背景移除算法本身完全交给外部引擎，这里只定义 `BackgroundRemover` 接缝：
//! 输入一张解码后的图，输出带（或细化了）alpha 通道的图。
//!
//! # 实现思路
//!
//! - 生产实现 `RembgCommand`：把 PNG 经 stdin 交给 `rembg i - -`，从 stdout 读回 RGBA PNG。
//! - 节点只处理批次首帧，输出去 alpha 的 RGB 图与保留 alpha 的 RGBA 图两路。

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::NodeError;
use crate::image_loader::decode_oriented;
use crate::tensor::ImageBatch;

/// 外部背景移除引擎。
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove(&self, image: DynamicImage) -> Result<DynamicImage, NodeError>;
}

/// 调用 `rembg` 命令行。
#[derive(Debug, Clone)]
pub struct RembgCommand {
    program: PathBuf,
    model: Option<String>,
}

impl Default for RembgCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rembg"),
            model: None,
        }
    }
}

impl RembgCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定可执行文件路径（虚拟环境中的 rembg 等）。
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// 指定模型名（`u2net`、`isnet-general-use` ...）。
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl BackgroundRemover for RembgCommand {
    async fn remove(&self, image: DynamicImage) -> Result<DynamicImage, NodeError> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| NodeError::Encode(e.to_string()))?;
        let input = png.into_inner();

        let mut command = Command::new(&self.program);
        command.arg("i");
        if let Some(model) = &self.model {
            command.arg("-m").arg(model);
        }
        command
            .arg("-")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            NodeError::Background(format!("无法启动 {}：{}", self.program.display(), e))
        })?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| NodeError::Background("无法获取子进程 stdin".to_string()))?;

        let write_input = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write_input, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(NodeError::Background(format!(
                "{} 退出码 {:?}：{}",
                self.program.display(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        written?;

        let (decoded, _) = decode_oriented(&output.stdout)?;
        Ok(decoded)
    }
}

/// 对批次首帧执行背景移除，返回 `(RGB 图, RGBA 图)`。
pub async fn remove_background(
    remover: &dyn BackgroundRemover,
    image: &ImageBatch,
) -> Result<(ImageBatch, ImageBatch), NodeError> {
    let frame = image.frame_to_dynamic(0)?;
    let (width, height) = (frame.width(), frame.height());

    let output = remover.remove(frame).await?;
    log::info!(
        "✂️ 背景移除完成 - {}x{} -> {}x{}",
        width,
        height,
        output.width(),
        output.height()
    );

    Ok((
        ImageBatch::from_dynamic_rgb(&output),
        ImageBatch::from_dynamic_rgba(&output),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use ndarray::Array4;

    /// 左半边视为背景：alpha 置 0。
    struct LeftHalfRemover;

    #[async_trait]
    impl BackgroundRemover for LeftHalfRemover {
        async fn remove(&self, image: DynamicImage) -> Result<DynamicImage, NodeError> {
            let mut rgba = image.to_rgba8();
            let half = rgba.width() / 2;
            for (x, _, pixel) in rgba.enumerate_pixels_mut() {
                let alpha = if x < half { 0 } else { 255 };
                *pixel = Rgba([pixel[0], pixel[1], pixel[2], alpha]);
            }
            Ok(DynamicImage::ImageRgba8(rgba))
        }
    }

    #[tokio::test]
    async fn node_returns_rgb_and_rgba_outputs() {
        let input = ImageBatch::from_array(Array4::from_elem((1, 2, 4, 3), 1.0));

        let (rgb, rgba) = remove_background(&LeftHalfRemover, &input)
            .await
            .expect("remove failed");

        assert_eq!(rgb.shape(), (1, 2, 4, 3));
        assert_eq!(rgba.shape(), (1, 2, 4, 4));
        // RGB 输出直接丢弃 alpha，不做合成
        assert_eq!(rgb.as_array()[[0, 0, 0, 0]], 1.0);
        assert_eq!(rgba.as_array()[[0, 0, 0, 3]], 0.0);
        assert_eq!(rgba.as_array()[[0, 0, 3, 3]], 1.0);
    }

    /// 原样返回输入，记录收到的颜色类型。
    struct EchoRemover {
        seen: std::sync::Mutex<Option<image::ColorType>>,
    }

    #[async_trait]
    impl BackgroundRemover for EchoRemover {
        async fn remove(&self, image: DynamicImage) -> Result<DynamicImage, NodeError> {
            if let Ok(mut seen) = self.seen.lock() {
                *seen = Some(image.color());
            }
            Ok(image)
        }
    }

    #[tokio::test]
    async fn four_channel_input_reaches_engine_with_alpha() {
        let mut data = Array4::from_elem((1, 2, 2, 4), 1.0);
        data[[0, 0, 0, 3]] = 0.0;
        let input = ImageBatch::from_array(data);
        let remover = EchoRemover {
            seen: std::sync::Mutex::new(None),
        };

        let (_, rgba) = remove_background(&remover, &input)
            .await
            .expect("remove failed");

        let seen = *remover.seen.lock().expect("lock poisoned");
        assert_eq!(seen, Some(image::ColorType::Rgba8));
        assert_eq!(rgba.as_array()[[0, 0, 0, 3]], 0.0);
        assert_eq!(rgba.as_array()[[0, 1, 1, 3]], 1.0);
    }

    #[tokio::test]
    async fn missing_engine_is_background_error() {
        let remover = RembgCommand::new().with_program("/nonexistent/rembg-binary");
        let input = ImageBatch::from_array(Array4::zeros((1, 2, 2, 3)));

        let result = remove_background(&remover, &input).await;

        assert!(matches!(result, Err(NodeError::Background(_))));
    }
}
