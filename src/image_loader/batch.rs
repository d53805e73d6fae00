//! # 批量加载模块
//!
//! ## 设计思路
//!
//! 批量加载是单图加载的组合：逐行解析定位符、依次加载，
//! 再以第一张图为基准尺寸沿批次轴拼接。任一张失败则整批失败，不返回部分结果。
//!
//! ## 实现思路
//!
//! - 按 `\n` 切分，去除首尾空白（含 `\r`），跳过空行；一个定位符都没有时返回 `UnsupportedInput`。
//! - 尺寸不一致的图先做“居中裁切到目标宽高比 + 双线性缩放”，再拼接。
//! - 缩放优先走 `fast_image_resize`，失败时回退 `image::resize_to_fill`。
//! - 批量路径只输出图像，不输出遮罩。

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb32FImage};

use super::{ImageError, ImageLoader};
use crate::tensor::ImageBatch;

/// 切分多行文本为定位符列表。
pub fn split_locators(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

impl ImageLoader {
    /// 从多行定位符加载并拼接为一个批次。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use ez_nodes::image_loader::{ImageLoader, LoaderConfig};
    ///
    /// # async fn demo() -> Result<(), ez_nodes::image_loader::ImageError> {
    /// let loader = ImageLoader::new(LoaderConfig::default())?;
    /// let batch = loader
    ///     .load_batch("https://example.com/a.png\ns3://bucket1/imgs/b.png")
    ///     .await?;
    /// assert_eq!(batch.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_batch(&self, text: &str) -> Result<ImageBatch, ImageError> {
        let locators = split_locators(text);
        if locators.is_empty() {
            return Err(ImageError::UnsupportedInput(
                "图片定位符列表为空".to_string(),
            ));
        }

        log::info!("📚 开始批量加载 - 共 {} 张", locators.len());

        let mut images = Vec::with_capacity(locators.len());
        for locator in &locators {
            images.push(self.load_image(locator).await?.image);
        }

        let mut images = images.into_iter();
        let mut batch = images
            .next()
            .ok_or_else(|| ImageError::UnsupportedInput("图片定位符列表为空".to_string()))?;

        for image in images {
            let image = if image.spatial_dims() != batch.spatial_dims() {
                let (height, width) = batch.spatial_dims();
                self.resize_batch(&image, width as u32, height as u32)?
            } else {
                image
            };
            batch = batch.concat(&image)?;
        }

        log::info!("✅ 批量加载完成 - 形状: {:?}", batch.shape());
        Ok(batch)
    }

    /// 将批次中每一帧缩放到目标尺寸（居中裁切到目标宽高比后缩放）。
    pub(crate) fn resize_batch(
        &self,
        batch: &ImageBatch,
        target_width: u32,
        target_height: u32,
    ) -> Result<ImageBatch, ImageError> {
        let (_, height, width, _) = batch.shape();
        log::info!(
            "🧩 尺寸对齐：{}x{} -> {}x{}（filter={:?}）",
            width,
            height,
            target_width,
            target_height,
            self.config.resize_filter
        );

        let mut resized: Option<ImageBatch> = None;
        for index in 0..batch.len() {
            let frame = DynamicImage::ImageRgb32F(batch.frame_to_rgb32f(index)?);
            let scaled = resize_frame(&frame, target_width, target_height, self.config.resize_filter);
            let scaled = ImageBatch::from_rgb32f(&scaled.to_rgb32f());
            resized = Some(match resized {
                Some(acc) => acc.concat(&scaled)?,
                None => scaled,
            });
        }

        resized.ok_or_else(|| ImageError::UnsupportedInput("待缩放批次为空".to_string()))
    }
}

fn resize_frame(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> DynamicImage {
    match resize_with_fast_image_resize(image, target_width, target_height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::resize_to_fill：{}", err);
            image.resize_to_fill(target_width, target_height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<DynamicImage, ImageError> {
    let mut dst_image = DynamicImage::ImageRgb32F(Rgb32FImage::new(target_width, target_height));

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)))
        .fit_into_destination(Some((0.5, 0.5)));

    resizer
        .resize(image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    Ok(dst_image)
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::LoaderConfig;
    use ndarray::Array4;

    #[test]
    fn split_locators_skips_blank_lines_and_carriage_returns() {
        let text = "https://a.example/1.png\r\n\n  s3://b/2.png  \n";

        assert_eq!(
            split_locators(text),
            vec!["https://a.example/1.png", "s3://b/2.png"]
        );
    }

    #[tokio::test]
    async fn empty_locator_list_is_unsupported_input() {
        let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");

        let result = loader.load_batch(" \n\r\n").await;

        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[test]
    fn resize_batch_matches_target_dims() {
        let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");
        let batch = ImageBatch::from_array(Array4::from_elem((1, 6, 12, 3), 0.25));

        let resized = loader.resize_batch(&batch, 4, 4).expect("resize failed");

        assert_eq!(resized.shape(), (1, 4, 4, 3));
        // 纯色图缩放后颜色不变
        assert!(resized.as_array().iter().all(|&v| (v - 0.25).abs() < 1e-3));
    }

    #[test]
    fn fallback_resize_fills_target_dims() {
        let frame = DynamicImage::ImageRgb32F(Rgb32FImage::new(9, 3));

        let resized = frame.resize_to_fill(5, 5, FilterType::Triangle);

        assert_eq!((resized.width(), resized.height()), (5, 5));
    }
}
