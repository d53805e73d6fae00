//! 对象存储访问模块
//!
//! # 设计思路
//!
//! 图片加载（`s3://` 定位符）与文件上传节点都依赖“按 bucket + key 读写对象”，
//! 这里用 `ObjectStore` trait 把存储后端抽象出来：
//!
//! - `S3ObjectStore`：基于 `aws-sdk-s3`，凭证完全交给 AWS 默认凭证链（环境变量 / profile / IMDS）。
//! - `MemoryObjectStore`：进程内实现，用于测试与离线调试。
//!
//! # 实现思路
//!
//! - 后端错误不做二次分类，原样转为 `StorageError` 文本上抛。
//! - 客户端每次调用独立使用，不做连接池之外的复用策略。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use crate::image_loader::S3Settings;

/// 对象存储访问失败（缺失对象、权限拒绝、网络等），消息来自后端。
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StorageError(pub String);

/// 按 bucket + key 读写对象的最小接口。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 读取对象完整内容。
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

    /// 将本地文件上传为对象。
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), StorageError>;
}

/// S3 兼容对象存储。
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// 按连接参数构建客户端。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use ez_nodes::image_loader::S3Settings;
    /// use ez_nodes::object_store::S3ObjectStore;
    ///
    /// # async fn demo() {
    /// let store = S3ObjectStore::connect(&S3Settings::new("https://r2.example.com", "auto")).await;
    /// # let _ = store;
    /// # }
    /// ```
    pub async fn connect(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        log::debug!(
            "🪣 S3 客户端已创建 - endpoint: {} region: {}",
            settings.endpoint_url.as_deref().unwrap_or("(default)"),
            settings.region.as_deref().unwrap_or("(default)")
        );

        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError(DisplayErrorContext(&e).to_string()))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError(format!("读取对象内容失败：{}", e)))?;

        Ok(body.into_bytes())
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError(format!("无法读取待上传文件 {}：{}", path.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// 进程内对象存储。
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入对象（测试夹具）。
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .objects
            .lock()
            .map_err(|_| StorageError("对象表锁已中毒".to_string()))?;
        guard.insert((bucket.to_string(), key.to_string()), data.into());
        Ok(())
    }

    /// 读取对象副本，不存在时返回 `None`。
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .ok()
            .and_then(|guard| guard.get(&(bucket.to_string(), key.to_string())).cloned())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        self.get(bucket, key)
            .ok_or_else(|| StorageError(format!("NoSuchKey: s3://{}/{}", bucket, key)))
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> Result<(), StorageError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError(format!("无法读取待上传文件 {}：{}", path.display(), e)))?;
        self.insert(bucket, key, data)
    }
}
