//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入字符串”和“流水线中间结果”解耦：
//! - `Locator` 表示外部来源语义（内联 Data URI / 对象存储 / 网络地址）
//! - `RawImageData` 表示已加载但未解码的字节
//!
//! 来源判定在 `Locator::parse` 一处完成，返回穷尽的枚举，
//! 下游按分支处理，不再散落前缀判断。

use std::fmt;

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ImageError;

const S3_SCHEME: &str = "s3://";

/// `data:image/<type>[;参数...],<payload>`
static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^data:(image/[^;,]*)[^,]*,(.*)$").expect("data uri pattern is valid")
});

/// 图片定位符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// 内联 Data URI，`payload` 为 base64 文本。
    InlineData { media_type: String, payload: String },
    /// 对象存储路径 `s3://bucket/key`。
    ObjectStorage { bucket: String, key: String },
    /// 其余一律视为网络地址。
    Network(String),
}

impl Locator {
    /// 解析定位符。判定顺序：内联数据 → 对象存储前缀 → 网络地址。
    ///
    /// # 示例
    /// ```rust
    /// use ez_nodes::image_loader::Locator;
    ///
    /// let locator = Locator::parse("s3://bucket1/imgs/a.png")?;
    /// assert_eq!(
    ///     locator,
    ///     Locator::ObjectStorage { bucket: "bucket1".into(), key: "imgs/a.png".into() }
    /// );
    /// # Ok::<(), ez_nodes::image_loader::ImageError>(())
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ImageError> {
        if raw.starts_with("data:image/") {
            let captures = DATA_URI.captures(raw).ok_or_else(|| {
                ImageError::UnsupportedInput("Data URI 缺少 ',' 分隔的数据段".to_string())
            })?;
            return Ok(Self::InlineData {
                media_type: captures[1].to_string(),
                payload: captures[2].to_string(),
            });
        }

        if let Some(rest) = raw.strip_prefix(S3_SCHEME) {
            let (bucket, key) = rest.split_once('/').ok_or_else(|| {
                ImageError::UnsupportedInput(format!("对象存储路径缺少 key：{}", raw))
            })?;
            if bucket.is_empty() {
                return Err(ImageError::UnsupportedInput(format!(
                    "对象存储路径缺少 bucket：{}",
                    raw
                )));
            }
            return Ok(Self::ObjectStorage {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        Ok(Self::Network(raw.to_string()))
    }

    /// 来源提示（用于日志与诊断）。
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InlineData { .. } => "inline",
            Self::ObjectStorage { .. } => "s3",
            Self::Network(_) => "url",
        }
    }
}

impl fmt::Display for Locator {
    /// 内联数据只输出媒体类型与长度，避免日志被 base64 刷屏。
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InlineData {
                media_type,
                payload,
            } => write!(f, "data:{} ({} chars)", media_type, payload.len()),
            Self::ObjectStorage { bucket, key } => write!(f, "{}{}/{}", S3_SCHEME, bucket, key),
            Self::Network(url) => f.write_str(url),
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Bytes,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}
