//! # 扩展格式注册
//!
//! 进程内只初始化一次的“可解码格式表”。首次解码前强制初始化，
//! 之后重复调用 `register_extended_formats` 不会再做任何事。

use image::ImageFormat;
use once_cell::sync::Lazy;

static DECODABLE_FORMATS: Lazy<Vec<ImageFormat>> = Lazy::new(|| {
    let formats: Vec<ImageFormat> = ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .collect();

    log::info!(
        "🧩 已注册可解码格式：{}",
        formats
            .iter()
            .map(|format| format.extensions_str().first().copied().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    formats
});

/// 注册扩展格式支持，幂等。
pub fn register_extended_formats() -> &'static [ImageFormat] {
    DECODABLE_FORMATS.as_slice()
}

/// 该格式是否可被当前进程解码。
pub fn is_decodable(format: ImageFormat) -> bool {
    register_extended_formats().contains(&format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        let first = register_extended_formats();
        let second = register_extended_formats();

        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn common_formats_are_decodable() {
        assert!(is_decodable(ImageFormat::Png));
        assert!(is_decodable(ImageFormat::Jpeg));
        assert!(is_decodable(ImageFormat::WebP));
    }
}
