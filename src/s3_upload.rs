//! 对象存储上传节点
//!
//! # 设计思路
//!
//! 上游视频合成节点会产出一个有序文件列表，约定第 1 项为封面图、第 2 项为视频。
//! 两个文件以同一个对象名前缀上传，各自沿用原文件后缀。
//!
//! # 实现思路
//!
//! - 对象名 = `object_name` + 原后缀（含点号；无后缀则为空）。
//! - 先传图片后传视频，任一失败立即中止。
//! - 返回两个 `s3://bucket/name` 定位符与对象名，可直接喂给图片加载节点。

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::NodeError;
use crate::object_store::ObjectStore;

/// 默认对象名前缀。
pub const DEFAULT_OBJECT_NAME: &str = "default/result.webp";
/// 默认区域。
pub const DEFAULT_REGION: &str = "auto";

/// 上传结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub image_url: String,
    pub video_url: String,
    pub image_object_name: String,
    pub video_object_name: String,
}

/// 上传图片 + 视频两个文件。
///
/// # 参数
/// * `store` - 对象存储后端
/// * `filenames` - 有序文件列表，`[0]` 为图片、`[1]` 为视频
/// * `bucket` - 目标 bucket
/// * `object_name` - 对象名前缀
///
/// # 返回
/// - `Ok(UploadOutcome)` — 两个对象的定位符与对象名
/// - `Err(NodeError)` — 文件列表不足两项，或存储后端失败
pub async fn upload_image_and_video(
    store: &dyn ObjectStore,
    filenames: &[PathBuf],
    bucket: &str,
    object_name: &str,
) -> Result<UploadOutcome, NodeError> {
    let [image_file, video_file, ..] = filenames else {
        return Err(NodeError::unsupported(format!(
            "需要至少 2 个文件（图片、视频），实际 {} 个",
            filenames.len()
        )));
    };

    let (image_url, image_object_name) = upload_one(store, image_file, bucket, object_name).await?;
    let (video_url, video_object_name) = upload_one(store, video_file, bucket, object_name).await?;

    Ok(UploadOutcome {
        image_url,
        video_url,
        image_object_name,
        video_object_name,
    })
}

async fn upload_one(
    store: &dyn ObjectStore,
    file: &Path,
    bucket: &str,
    object_name: &str,
) -> Result<(String, String), NodeError> {
    let key = format!("{}{}", object_name, extension_with_dot(file));
    let url = format!("s3://{}/{}", bucket, key);

    log::info!("⬆️ 上传文件 {} -> {}", file.display(), url);
    store.put_object_from_file(bucket, &key, file).await?;

    Ok((url, key))
}

/// `clip.mp4` → `.mp4`；无后缀 → 空串。
fn extension_with_dot(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::ImageError;
    use crate::object_store::MemoryObjectStore;

    #[test]
    fn extension_keeps_leading_dot() {
        assert_eq!(extension_with_dot(Path::new("/tmp/out/clip.mp4")), ".mp4");
        assert_eq!(extension_with_dot(Path::new("/tmp/out/archive.tar.gz")), ".gz");
        assert_eq!(extension_with_dot(Path::new("/tmp/out/README")), "");
        assert_eq!(extension_with_dot(Path::new("/tmp/out/.hidden")), "");
    }

    #[tokio::test]
    async fn uploads_both_files_under_shared_prefix() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let image = dir.path().join("frame_00001.png");
        let video = dir.path().join("clip_00001.mp4");
        std::fs::write(&image, b"png").expect("write image failed");
        std::fs::write(&video, b"mp4").expect("write video failed");

        let store = MemoryObjectStore::new();
        let outcome = upload_image_and_video(&store, &[image, video], "media", "jobs/42/result")
            .await
            .expect("upload failed");

        assert_eq!(
            outcome,
            UploadOutcome {
                image_url: "s3://media/jobs/42/result.png".to_string(),
                video_url: "s3://media/jobs/42/result.mp4".to_string(),
                image_object_name: "jobs/42/result.png".to_string(),
                video_object_name: "jobs/42/result.mp4".to_string(),
            }
        );
        assert_eq!(store.get("media", "jobs/42/result.mp4").as_deref(), Some(&b"mp4"[..]));
    }

    #[tokio::test]
    async fn single_file_is_unsupported_input() {
        let store = MemoryObjectStore::new();

        let result =
            upload_image_and_video(&store, &[PathBuf::from("a.png")], "media", "x").await;

        assert!(matches!(
            result,
            Err(NodeError::Image(ImageError::UnsupportedInput(_)))
        ));
    }

    #[tokio::test]
    async fn missing_local_file_is_storage_error() {
        let store = MemoryObjectStore::new();
        let files = [PathBuf::from("/nonexistent/a.png"), PathBuf::from("/nonexistent/b.mp4")];

        let result = upload_image_and_video(&store, &files, "media", "x").await;

        assert!(matches!(result, Err(NodeError::Image(ImageError::Storage(_)))));
    }
}
