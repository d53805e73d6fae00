//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调参数”集中到 `LoaderConfig`，保证运行时行为可观测、可调整、可测试。
//! `Default` 即为宿主节点的生产默认值（5 秒下载超时、64×64 兜底遮罩、双线性缩放）。
//!
//! ## 实现思路
//!
//! - 对象存储连接参数单独放在 `S3Settings`，凭证本身交给 AWS 默认凭证链。
//! - `S3Settings::from_env` 只在字段为空时读取环境变量，显式参数优先。

use std::time::Duration;

use image::imageops::FilterType;

/// 对象存储 endpoint 环境变量。
pub const ENV_S3_ENDPOINT: &str = "AWS_ENDPOINT_URL";
/// 对象存储区域环境变量。
pub const ENV_S3_REGION: &str = "AWS_REGION";

/// 图片加载配置。
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// 网络下载超时时间。
    pub fetch_timeout: Duration,
    /// 源图无 alpha 通道时输出的兜底遮罩边长（正方形）。
    ///
    /// 与源图真实尺寸无关，这是宿主侧既有行为，保持兼容。
    pub fallback_mask_size: usize,
    /// 批量加载时尺寸对齐所用的缩放滤镜。
    pub resize_filter: FilterType,
    /// 对象存储连接参数。
    pub s3: S3Settings,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(5),
            fallback_mask_size: 64,
            resize_filter: FilterType::Triangle,
            s3: S3Settings::default(),
        }
    }
}

/// S3 兼容存储的连接参数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Settings {
    /// 自定义 endpoint（R2 / MinIO 等），为空时使用 AWS 默认。
    pub endpoint_url: Option<String>,
    /// 区域名；`auto` 原样传给 SDK。
    pub region: Option<String>,
}

impl S3Settings {
    pub fn new(endpoint_url: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint_url: non_empty(endpoint_url.into()),
            region: non_empty(region.into()),
        }
    }

    /// 用环境变量补全未显式设置的字段。
    pub fn from_env(self) -> Self {
        Self {
            endpoint_url: self
                .endpoint_url
                .or_else(|| std::env::var(ENV_S3_ENDPOINT).ok().and_then(non_empty)),
            region: self
                .region
                .or_else(|| std::env::var(ENV_S3_REGION).ok().and_then(non_empty)),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
