//! 键值字典节点模块
//!
//! # 设计思路
//!
//! 宿主图中的 `DICT` 类型就是 JSON 对象，直接用 `serde_json::Map` 表示，
//! 便于原样交给 `http_post` 作为请求体。
//!
//! # 实现思路
//!
//! 所有 `assoc_*` 都是写时复制：克隆入参后插入，原字典保持不变，
//! 同名键直接覆盖。

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use serde_json::{Map, Value};

use crate::error::NodeError;
use crate::tensor::ImageBatch;

/// 宿主 `DICT` 类型。
pub type Dict = Map<String, Value>;

/// `assoc_img` 默认输出格式。
pub const DEFAULT_IMAGE_FORMAT: &str = "webp";
/// `assoc_img` 默认质量。
///
/// 只有 JPEG 使用该值；`image` 的 WebP 编码器仅支持无损，
/// 因此默认的 webp 输出会比有损 webp 体积大得多。
pub const DEFAULT_IMAGE_QUALITY: u8 = 92;

/// 空字典。
pub fn empty_dict() -> Dict {
    Dict::new()
}

/// 插入字符串值。
pub fn assoc_str(dict: &Dict, key: &str, value: &str) -> Dict {
    assoc(dict, key, Value::String(value.to_string()))
}

/// 插入嵌套字典。
pub fn assoc_dict(dict: &Dict, key: &str, value: &Dict) -> Dict {
    assoc(dict, key, Value::Object(value.clone()))
}

/// 将批次首帧编码为 `data:image/<format>;base64,...` 后插入。
///
/// # 示例
/// ```rust
/// use ez_nodes::dict::{assoc_img, empty_dict};
/// use ez_nodes::tensor::ImageBatch;
/// use ndarray::Array4;
///
/// let image = ImageBatch::from_array(Array4::from_elem((1, 2, 2, 3), 0.5));
/// let dict = assoc_img(&empty_dict(), "preview", &image, "png", 92)?;
/// assert!(dict["preview"].as_str().unwrap().starts_with("data:image/png;base64,"));
/// # Ok::<(), ez_nodes::error::NodeError>(())
/// ```
pub fn assoc_img(
    dict: &Dict,
    key: &str,
    image: &ImageBatch,
    format: &str,
    quality: u8,
) -> Result<Dict, NodeError> {
    let data_uri = encode_data_uri(image, format, quality)?;
    Ok(assoc(dict, key, Value::String(data_uri)))
}

fn assoc(dict: &Dict, key: &str, value: Value) -> Dict {
    let mut next = dict.clone();
    next.insert(key.to_string(), value);
    next
}

/// 首帧 → 指定格式字节 → Data URI。
pub fn encode_data_uri(image: &ImageBatch, format: &str, quality: u8) -> Result<String, NodeError> {
    let format_name = format.trim().to_lowercase();
    let image_format = ImageFormat::from_extension(&format_name)
        .filter(|f| f.writing_enabled())
        .ok_or_else(|| NodeError::unsupported(format!("不支持的输出格式：{}", format)))?;

    let frame = image.frame_to_dynamic(0)?;
    let mut buffer = Cursor::new(Vec::new());

    if image_format == ImageFormat::Jpeg {
        // JPEG 没有 alpha 通道
        JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .encode_image(&frame.to_rgb8())
            .map_err(|e| NodeError::Encode(e.to_string()))?;
    } else {
        frame
            .write_to(&mut buffer, image_format)
            .map_err(|e| NodeError::Encode(e.to_string()))?;
    }

    let encoded = general_purpose::STANDARD.encode(buffer.into_inner());
    log::debug!("🖼️ 图片已编码为 {}，base64 长度 {}", format_name, encoded.len());

    Ok(format!("data:image/{};base64,{}", format_name, encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::{ImageLoader, LoaderConfig};
    use image::DynamicImage;
    use ndarray::Array4;
    use serde_json::json;

    #[test]
    fn assoc_str_leaves_input_untouched() {
        let base = assoc_str(&empty_dict(), "a", "1");

        let next = assoc_str(&base, "b", "2");

        assert_eq!(Value::Object(base), json!({"a": "1"}));
        assert_eq!(Value::Object(next), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn assoc_overwrites_existing_key() {
        let base = assoc_str(&empty_dict(), "a", "old");
        let nested = assoc_str(&empty_dict(), "inner", "x");

        let next = assoc_dict(&base, "a", &nested);

        assert_eq!(Value::Object(next), json!({"a": {"inner": "x"}}));
    }

    #[test]
    fn assoc_img_rejects_unknown_format() {
        let image = ImageBatch::from_array(Array4::zeros((1, 2, 2, 3)));

        let result = assoc_img(&empty_dict(), "img", &image, "definitely-not-a-format", 92);

        assert!(matches!(result, Err(NodeError::Image(_))));
    }

    fn rgba_batch_with_transparent_pixel() -> ImageBatch {
        let mut data = Array4::from_elem((1, 2, 2, 4), 0.5);
        data[[0, 0, 0, 3]] = 0.0;
        data[[0, 0, 1, 3]] = 1.0;
        data[[0, 1, 0, 3]] = 1.0;
        data[[0, 1, 1, 3]] = 1.0;
        ImageBatch::from_array(data)
    }

    fn decode_value(dict: &Dict, key: &str) -> DynamicImage {
        let uri = dict[key].as_str().expect("value must be a string");
        let (_, payload) = uri.split_once(',').expect("data uri must contain a comma");
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .expect("payload must be base64");
        image::load_from_memory(&bytes).expect("payload must decode")
    }

    #[test]
    fn assoc_img_keeps_alpha_of_four_channel_batch() {
        let image = rgba_batch_with_transparent_pixel();

        for format in ["png", "webp"] {
            let dict = assoc_img(&empty_dict(), "k", &image, format, 92).expect("encode failed");
            let decoded = decode_value(&dict, "k");

            assert!(decoded.color().has_alpha(), "{} output lost alpha", format);
            let rgba = decoded.to_rgba8();
            assert_eq!(rgba.get_pixel(0, 0)[3], 0);
            assert_eq!(rgba.get_pixel(1, 0)[3], 255);
        }
    }

    #[test]
    fn assoc_img_jpeg_drops_alpha() {
        let image = rgba_batch_with_transparent_pixel();

        let dict = assoc_img(&empty_dict(), "k", &image, "jpeg", 92).expect("encode failed");
        let decoded = decode_value(&dict, "k");

        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[tokio::test]
    async fn assoc_img_output_loads_back_with_same_dims() {
        let image = ImageBatch::from_array(Array4::from_elem((1, 5, 7, 3), 0.5));

        for format in ["webp", "png", "jpeg"] {
            let dict = assoc_img(&empty_dict(), "img", &image, format, 80).expect("encode failed");
            let uri = dict["img"].as_str().expect("value must be a string");
            assert!(uri.starts_with(&format!("data:image/{};base64,", format)));

            let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");
            let loaded = loader.load_image(uri).await.expect("round trip load failed");
            assert_eq!(loaded.image.shape(), (1, 5, 7, 3));
        }
    }
}
