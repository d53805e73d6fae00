//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageLoader` 只负责流程编排与依赖持有（HTTP 客户端、对象存储），不直接与宿主绑定。
//! 单图处理链路固定为：
//! 1. 解析定位符
//! 2. 按来源加载原始字节
//! 3. 解码、方向校正、alpha 合成并生成遮罩
//!
//! ## 实现思路
//!
//! - 对象存储客户端首次用到时才创建（读取环境凭证较慢），之后复用同一实例。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。
//! - 链路内不做缓存与重试，任何错误立即上抛。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;

use super::source::Locator;
use super::{ImageError, LoaderConfig};
use crate::object_store::{ObjectStore, S3ObjectStore};
use crate::tensor::{ImageBatch, Mask};

/// 单图加载结果：批次形式的图像 `(1, H, W, 3)` 与遮罩。
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: ImageBatch,
    pub mask: Mask,
}

/// 图片加载器。
///
/// 封装了配置、HTTP 客户端与对象存储，并编排各子模块实现完整流程。
pub struct ImageLoader {
    pub(super) config: LoaderConfig,
    pub(super) http: reqwest::Client,
    object_store: OnceCell<Arc<dyn ObjectStore>>,
}

impl ImageLoader {
    /// 根据配置创建加载器。
    ///
    /// # 示例
    /// ```rust
    /// use ez_nodes::image_loader::{ImageLoader, LoaderConfig};
    ///
    /// let loader = ImageLoader::new(LoaderConfig::default())?;
    /// # let _ = loader;
    /// # Ok::<(), ez_nodes::image_loader::ImageError>(())
    /// ```
    pub fn new(config: LoaderConfig) -> Result<Self, ImageError> {
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| ImageError::Network(format!("HTTP 客户端初始化失败：{}", e)))?;

        Ok(Self {
            config,
            http,
            object_store: OnceCell::new(),
        })
    }

    /// 注入对象存储实现（测试或自定义后端）。
    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = OnceCell::new_with(Some(store));
        self
    }

    /// 获取对象存储，未注入时按配置懒加载 S3 客户端。
    pub(super) async fn object_store(&self) -> &Arc<dyn ObjectStore> {
        self.object_store
            .get_or_init(|| async {
                let settings = self.config.s3.clone().from_env();
                Arc::new(S3ObjectStore::connect(&settings).await) as Arc<dyn ObjectStore>
            })
            .await
    }

    /// 处理主入口：从任意定位符加载单张图片。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use ez_nodes::image_loader::{ImageLoader, LoaderConfig};
    ///
    /// # async fn demo() -> Result<(), ez_nodes::image_loader::ImageError> {
    /// let loader = ImageLoader::new(LoaderConfig::default())?;
    /// let loaded = loader.load_image("https://example.com/a.png").await?;
    /// println!("{:?}", loaded.image.shape());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_image(&self, raw_locator: &str) -> Result<LoadedImage, ImageError> {
        let total_start = Instant::now();
        let locator = Locator::parse(raw_locator)?;

        let load_start = Instant::now();
        let raw = self.resolve(&locator).await?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let loaded = self.decode_and_normalize(raw)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 图片加载完成 - 来源: {}（{}） load={}ms decode={}ms total={}ms",
            locator.kind(),
            locator,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(loaded)
    }
}
