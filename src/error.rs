//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义节点级统一的 `NodeError` 枚举，所有节点函数统一返回 `Result<T, NodeError>`，
//! 宿主据此把单个节点标记为失败，由宿主决定对整张图的影响。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / `StorageError` / `io::Error` / `serde_json::Error` 提供 `From` 转换，无需手动 map。
//! - 节点内部不捕获、不重试、不做默认值替换。

use crate::image_loader::ImageError;
use crate::object_store::StorageError;

/// 节点级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// 图片加载链路错误（下载 / 对象存储 / 解码 / 输入）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 图片编码失败
    #[error("图片编码失败: {0}")]
    Encode(String),

    /// 背景移除引擎失败
    #[error("背景移除失败: {0}")]
    Background(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析 / 序列化失败
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for NodeError {
    fn from(error: StorageError) -> Self {
        NodeError::Image(error.into())
    }
}

impl NodeError {
    /// 结构非法的调用方输入。
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        NodeError::Image(ImageError::UnsupportedInput(message.into()))
    }

    /// 稳定的错误码，供 CLI 退出信息使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Image(inner) => inner.code(),
            Self::Encode(_) => "encode",
            Self::Background(_) => "background",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}
