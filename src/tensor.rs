//! 图像张量模块
//!
//! # 设计思路
//!
//! 宿主节点之间传递的图像统一为 `f32` 四维张量 `(batch, height, width, channels)`，
//! 数值范围 `[0, 1]`；遮罩为二维 `(height, width)`。
//!
//! # 实现思路
//!
//! - `ImageBatch` 用 newtype 包住 `ndarray::Array4<f32>`，对外只暴露形状查询、
//!   批次拼接和与 `image` 像素缓冲之间的互转。
//! - 浮点转 8 位时先乘 255 再截断到 `[0, 255]`，小数部分直接丢弃。

use image::{DynamicImage, Rgb, Rgb32FImage, RgbImage, Rgba, RgbaImage};
use ndarray::{Array2, Array4, ArrayView3, Axis, concatenate, s};

use crate::image_loader::ImageError;

/// 单通道遮罩，`1.0` 表示完全透明。
pub type Mask = Array2<f32>;

/// 批次图像张量。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch(Array4<f32>);

impl ImageBatch {
    pub fn from_array(data: Array4<f32>) -> Self {
        Self(data)
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    /// `(batch, height, width, channels)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.0.dim()
    }

    pub fn len(&self) -> usize {
        self.0.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn height(&self) -> usize {
        self.0.dim().1
    }

    pub fn width(&self) -> usize {
        self.0.dim().2
    }

    pub fn channels(&self) -> usize {
        self.0.dim().3
    }

    /// `(height, width)`
    pub fn spatial_dims(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn frame(&self, index: usize) -> Option<ArrayView3<'_, f32>> {
        (index < self.len()).then(|| self.0.slice(s![index, .., .., ..]))
    }

    /// 沿批次轴追加，要求空间尺寸与通道数一致。
    pub fn concat(&self, other: &ImageBatch) -> Result<ImageBatch, ImageError> {
        concatenate(Axis(0), &[self.0.view(), other.0.view()])
            .map(Self)
            .map_err(|e| {
                ImageError::UnsupportedInput(format!(
                    "批次拼接形状不一致：{:?} 与 {:?}（{}）",
                    self.shape(),
                    other.shape(),
                    e
                ))
            })
    }

    /// 单帧 RGB 浮点图 → `(1, H, W, 3)`。
    pub fn from_rgb32f(image: &Rgb32FImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                data[[0, y as usize, x as usize, c]] = pixel[c];
            }
        }
        Self(data)
    }

    /// 任意图像按 RGB 取值 → `(1, H, W, 3)`。
    pub fn from_dynamic_rgb(image: &DynamicImage) -> Self {
        Self::from_dynamic_channels(image.to_rgba8(), 3)
    }

    /// 任意图像按 RGBA 取值 → `(1, H, W, 4)`，alpha 不做预乘。
    pub fn from_dynamic_rgba(image: &DynamicImage) -> Self {
        Self::from_dynamic_channels(image.to_rgba8(), 4)
    }

    fn from_dynamic_channels(rgba: image::RgbaImage, channels: usize) -> Self {
        let (width, height) = rgba.dimensions();
        let mut data = Array4::<f32>::zeros((1, height as usize, width as usize, channels));
        for (x, y, pixel) in rgba.enumerate_pixels() {
            for c in 0..channels {
                data[[0, y as usize, x as usize, c]] = f32::from(pixel[c]) / 255.0;
            }
        }
        Self(data)
    }

    /// 取出一帧为 RGB 浮点图（至少 3 通道，多余通道忽略）。
    pub fn frame_to_rgb32f(&self, index: usize) -> Result<Rgb32FImage, ImageError> {
        let frame = self.rgb_frame(index)?;
        let (height, width, _) = frame.dim();
        Ok(Rgb32FImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([frame[[y, x, 0]], frame[[y, x, 1]], frame[[y, x, 2]]])
        }))
    }

    /// 取出一帧为 8 位 RGB 图。
    pub fn frame_to_rgb8(&self, index: usize) -> Result<RgbImage, ImageError> {
        let frame = self.rgb_frame(index)?;
        let (height, width, _) = frame.dim();
        Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([
                to_u8(frame[[y, x, 0]]),
                to_u8(frame[[y, x, 1]]),
                to_u8(frame[[y, x, 2]]),
            ])
        }))
    }

    /// 取出一帧为 8 位图像：4 通道保留 alpha（`ImageRgba8`），否则为 `ImageRgb8`。
    pub fn frame_to_dynamic(&self, index: usize) -> Result<DynamicImage, ImageError> {
        if self.channels() != 4 {
            return self.frame_to_rgb8(index).map(DynamicImage::ImageRgb8);
        }

        let frame = self.rgb_frame(index)?;
        let (height, width, _) = frame.dim();
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_fn(
            width as u32,
            height as u32,
            |x, y| {
                let (x, y) = (x as usize, y as usize);
                Rgba([
                    to_u8(frame[[y, x, 0]]),
                    to_u8(frame[[y, x, 1]]),
                    to_u8(frame[[y, x, 2]]),
                    to_u8(frame[[y, x, 3]]),
                ])
            },
        )))
    }

    fn rgb_frame(&self, index: usize) -> Result<ArrayView3<'_, f32>, ImageError> {
        if self.channels() < 3 {
            return Err(ImageError::UnsupportedInput(format!(
                "图像通道数不足：{}（至少 3）",
                self.channels()
            )));
        }
        self.frame(index).ok_or_else(|| {
            ImageError::UnsupportedInput(format!("批次越界：{}（共 {} 帧）", index, self.len()))
        })
    }
}

/// `[0, 1]` 浮点 → 8 位，超界截断、小数舍去。
pub fn to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}
