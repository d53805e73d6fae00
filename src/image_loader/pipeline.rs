//! # 解码与归一化流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 归一化张量 + 遮罩”的过程集中管理。
//! 输出固定为 3 通道、`[0, 1]` 浮点；透明区域合成到不透明黑底上，
//! 透明度信息单独保留在遮罩中（`mask = 1 - alpha`）。
//!
//! ## 实现思路
//!
//! 1. 签名探测（`infer`）+ 格式猜测，非图片内容尽早拒绝
//! 2. 完整解码，读取并应用 EXIF 方向，之后视为左上原点、无旋转
//! 3. 记录源图是否带 alpha，统一转为 RGBA8
//! 4. 颜色按 alpha 加权合成到黑底（清理 alpha 之外的脏颜色）
//! 5. 有 alpha 时生成 `1 - alpha` 遮罩；无 alpha 时输出固定尺寸全零遮罩

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use ndarray::{Array2, Array4};

use super::formats;
use super::handler::LoadedImage;
use super::source::RawImageData;
use super::{ImageError, ImageLoader};
use crate::tensor::ImageBatch;

impl ImageLoader {
    /// 将原始字节解码为归一化图像与遮罩。
    pub(crate) fn decode_and_normalize(&self, raw: RawImageData) -> Result<LoadedImage, ImageError> {
        let (decoded, has_alpha) = decode_oriented(&raw.bytes)?;
        let rgba = decoded.to_rgba8();
        let (image, mask) = normalize_rgba(&rgba, has_alpha, self.config.fallback_mask_size);

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{} alpha: {}",
            raw.source_hint,
            rgba.width(),
            rgba.height(),
            has_alpha
        );

        Ok(LoadedImage { image, mask })
    }
}

/// 解码并应用 EXIF 方向，返回图像与“源图是否带 alpha 通道”。
pub(crate) fn decode_oriented(bytes: &[u8]) -> Result<(DynamicImage, bool), ImageError> {
    formats::register_extended_formats();
    validate_image_signature(bytes)?;

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::Decode(format!("无法识别图片格式：{}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| ImageError::Decode("无法识别图片格式".to_string()))?;
    if !formats::is_decodable(format) {
        return Err(ImageError::Decode(format!("不支持的图片格式：{:?}", format)));
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| ImageError::Decode(format!("读取图片方向失败：{}", e)))?;

    let mut decoded = DynamicImage::from_decoder(decoder)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    decoded.apply_orientation(orientation);

    let has_alpha = decoded.color().has_alpha();
    Ok((decoded, has_alpha))
}

/// 颜色按 alpha 合成到黑底，输出 `(1, H, W, 3)` 与遮罩。
pub(crate) fn normalize_rgba(
    rgba: &RgbaImage,
    has_alpha: bool,
    fallback_mask_size: usize,
) -> (ImageBatch, Array2<f32>) {
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    let mut image = Array4::<f32>::zeros((1, height, width, 3));
    let mut mask = if has_alpha {
        Array2::<f32>::zeros((height, width))
    } else {
        // 与源图尺寸无关的固定兜底遮罩（兼容宿主既有行为）
        Array2::<f32>::zeros((fallback_mask_size, fallback_mask_size))
    };

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let alpha = f32::from(pixel[3]) / 255.0;
        for c in 0..3 {
            image[[0, y, x, c]] = f32::from(blend_on_black(pixel[c], pixel[3])) / 255.0;
        }
        if has_alpha {
            mask[[y, x]] = (1.0 - alpha).clamp(0.0, 1.0);
        }
    }

    (ImageBatch::from_array(image), mask)
}

/// 以 alpha 为遮罩把颜色贴到黑底上，在 8 位整数域内四舍五入。
fn blend_on_black(color: u8, alpha: u8) -> u8 {
    let tmp = u32::from(color) * u32::from(alpha) + 128;
    ((tmp + (tmp >> 8)) >> 8) as u8
}

/// 通过文件签名（magic bytes）预检：已识别为非图片类型时直接拒绝。
///
/// 无法识别的签名交给解码器判断（部分格式 `infer` 不覆盖）。
fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Decode("图片内容为空".to_string()));
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ImageError::Decode(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }
    }

    Ok(())
}
