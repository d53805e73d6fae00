//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片加载链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 任何错误都不会在链路内部被吞掉或重试，直接上抛给调用方（宿主节点执行层）。

/// 图片加载统一错误类型。
///
/// 该类型会在节点层被上转为 `NodeError`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 网络响应状态码非 200，`body` 为响应正文（诊断用）。
    #[error("下载失败（HTTP {status}）：{body}")]
    Fetch { status: u16, body: String },

    /// 对象存储访问失败，消息原样来自存储后端。
    #[error("对象存储错误：{0}")]
    Storage(String),

    #[error("解码错误：{0}")]
    Decode(String),

    /// 调用方输入结构非法（空批次、畸形定位符等）。
    #[error("不支持的输入：{0}")]
    UnsupportedInput(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),
}

impl ImageError {
    /// 稳定的错误码，供 CLI 与日志使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Storage(_) => "storage",
            Self::Decode(_) => "decode",
            Self::UnsupportedInput(_) => "unsupported_input",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_message_carries_body() {
        let err = ImageError::Fetch {
            status: 404,
            body: "no such image".to_string(),
        };

        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("no such image"));
        assert_eq!(err.code(), "fetch");
    }
}
