//! # EZ 节点集 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              宿主（节点图调度，外部）                    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ 节点输入 / 输出（字符串、DICT、IMAGE、MASK）
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            本 crate                              │
//! │                                                          │
//! │  ┌─ nodes ──────── 静态注册表（类名 / 显示名 / 分类）    │
//! │  │                                                       │
//! │  ├─ image_loader ─ 定位符 → 字节 → 归一化张量 + 遮罩    │
//! │  │   └─ batch      多行定位符批量加载 + 尺寸对齐         │
//! │  ├─ dict ───────── DICT 构建（写时复制）                 │
//! │  ├─ http_post ──── JSON POST 透传                        │
//! │  ├─ s3_upload ──── 图片 + 视频上传                       │
//! │  ├─ background ─── 外部引擎背景移除                      │
//! │  ├─ object_store ─ S3 / 内存对象存储                     │
//! │  ├─ tensor ─────── ImageBatch / Mask                     │
//! │  └─ error ──────── NodeError（统一错误类型）             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `NodeError`，所有节点函数的错误类型 |
//! | [`image_loader`] | 从 Data URI / S3 / URL 加载图片并归一化 |
//! | [`tensor`] | 批次图像张量与遮罩，和 `image` 像素缓冲互转 |
//! | [`dict`] | `DICT` 构建节点 |
//! | [`http_post`] | 把 `DICT` 作为 JSON POST 出去并回报状态码 |
//! | [`s3_upload`] | 上传图片与视频到对象存储 |
//! | [`background`] | 背景移除接缝与 `rembg` 命令行实现 |
//! | [`object_store`] | 对象存储接缝与 S3 实现 |
//! | [`nodes`] | 节点注册表 |

pub mod background;
pub mod dict;
pub mod error;
pub mod http_post;
pub mod image_loader;
pub mod nodes;
pub mod object_store;
pub mod s3_upload;
pub mod tensor;
