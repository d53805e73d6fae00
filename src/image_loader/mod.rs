//! # 图片加载模块（image_loader）
//!
//! ## 设计思路
//!
//! 该模块将“定位符识别 → 原始字节加载 → 解码归一化 → 批量拼接”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `handler`：持有依赖并编排单图处理流水线
//! - `loader`：负责内联 / 对象存储 / 网络三类来源的字节加载
//! - `pipeline`：负责解码、方向校正、alpha 合成与遮罩生成
//! - `batch`：负责多行定位符的批量加载与尺寸对齐
//! - `formats`：进程级一次性格式注册
//! - `config/error/source`：配置、错误、定位符与中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! 节点入口（nodes.rs / CLI）
//!    ↓
//! handler.rs（Locator::parse + 阶段耗时日志）
//!    ├─ loader.rs（来源加载）
//!    └─ pipeline.rs（解码 + 合成 + 遮罩）
//!    ↓
//! LoadedImage { image, mask }
//!
//! batch.rs：逐行调用 handler → 尺寸对齐 → 沿批次轴拼接
//! ```

mod batch;
mod config;
mod error;
pub mod formats;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use batch::split_locators;
pub use config::{ENV_S3_ENDPOINT, ENV_S3_REGION, LoaderConfig, S3Settings};
pub use error::ImageError;
pub use handler::{ImageLoader, LoadedImage};
pub use source::Locator;

pub(crate) use pipeline::decode_oriented;
