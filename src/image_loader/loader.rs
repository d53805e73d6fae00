//! # 来源加载模块
//!
//! ## 设计思路
//!
//! 统一处理三类定位符（内联 Data URI / 对象存储 / 网络地址）的原始字节加载。
//! 每类来源只做一次尝试：不重试、不缓存、不流式分块，失败即上抛。
//!
//! ## 实现思路
//!
//! - 内联数据：base64 文本直接解码，不触网。
//! - 对象存储：整对象读取，后端错误原样转为 `ImageError::Storage`。
//! - 网络：带超时的 GET，状态码非 200 时把响应正文作为诊断信息返回。

use base64::{Engine as _, engine::general_purpose};
use reqwest::StatusCode;

use super::source::{Locator, RawImageData};
use super::{ImageError, ImageLoader};
use crate::object_store::StorageError;

impl From<StorageError> for ImageError {
    fn from(error: StorageError) -> Self {
        ImageError::Storage(error.0)
    }
}

impl ImageLoader {
    /// 按定位符分支加载原始字节。
    pub(crate) async fn resolve(&self, locator: &Locator) -> Result<RawImageData, ImageError> {
        match locator {
            Locator::InlineData {
                media_type,
                payload,
            } => Self::load_from_inline(media_type, payload),
            Locator::ObjectStorage { bucket, key } => {
                self.load_from_object_store(bucket, key).await
            }
            Locator::Network(url) => self.load_from_url(url).await,
        }
    }

    /// 从内联 Data URI 的 base64 段加载。
    pub(super) fn load_from_inline(
        media_type: &str,
        payload: &str,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📝 开始处理内联图片 - 类型: {}", media_type);

        let bytes = Self::parse_base64(payload)?;

        Ok(RawImageData {
            bytes: bytes.into(),
            source_hint: "inline",
        })
    }

    /// 从对象存储读取整个对象。
    pub(super) async fn load_from_object_store(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<RawImageData, ImageError> {
        log::info!("🪣 开始读取对象存储图片 - s3://{}/{}", bucket, key);

        let bytes = self.object_store().await.get_object(bucket, key).await?;
        log::debug!("🪣 对象读取完成 - {} 字节", bytes.len());

        Ok(RawImageData {
            bytes,
            source_hint: "s3",
        })
    }

    /// 从网络地址下载。
    pub(super) async fn load_from_url(&self, url: &str) -> Result<RawImageData, ImageError> {
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ImageError::UnsupportedInput(format!("URL 格式错误：{}（{}）", e, url)))?;

        let response = self
            .http
            .get(parsed)
            .timeout(self.config.fetch_timeout)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, url))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "⚠️ 下载失败 - HTTP {} URL: {}",
                status.as_u16(),
                Self::redact_url_for_log(url)
            );
            return Err(ImageError::Fetch {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e, url))?;
        log::debug!("📡 下载完成 - {} 字节", bytes.len());

        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 标准 base64 解码，忽略其中的 ASCII 空白（多行粘贴的数据）。
    pub(crate) fn parse_base64(payload: &str) -> Result<Vec<u8>, ImageError> {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        if compact.is_empty() {
            return Err(ImageError::Decode("内联图片数据为空".to_string()));
        }

        general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
    }

    /// 统一映射 reqwest 错误到业务错误。
    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> ImageError {
        let err_msg = e
            .to_string()
            .replace(url, &Self::redact_url_for_log(url));

        if e.is_timeout() {
            ImageError::Timeout(format!(
                "下载超时（{}秒）",
                self.config.fetch_timeout.as_secs_f32()
            ))
        } else if e.is_connect() {
            ImageError::Network(format!("无法连接：{}", err_msg))
        } else {
            ImageError::Network(format!("请求失败：{}", err_msg))
        }
    }

    /// 日志中去掉 query 与 fragment，避免泄露签名参数。
    pub(crate) fn redact_url_for_log(url: &str) -> String {
        match reqwest::Url::parse(url) {
            Ok(mut parsed) => {
                parsed.set_query(None);
                parsed.set_fragment(None);
                parsed.to_string()
            }
            Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::LoaderConfig;
    use crate::object_store::MemoryObjectStore;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::thread;

    fn serve_once(status_line: &'static str, body: &'static [u8]) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let port = listener.local_addr().expect("read local addr failed").port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );

            stream
                .write_all(response.as_bytes())
                .expect("write headers failed");
            stream.write_all(body).expect("write body failed");
            stream.flush().expect("flush failed");
        });

        (port, server)
    }

    #[test]
    fn parse_base64_ignores_whitespace() {
        let bytes = ImageLoader::parse_base64("aGVs\nbG8=\r\n").expect("decode failed");

        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn parse_base64_rejects_garbage() {
        assert!(matches!(
            ImageLoader::parse_base64("!!!not-base64!!!"),
            Err(ImageError::Decode(_))
        ));
        assert!(matches!(
            ImageLoader::parse_base64("   "),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted = ImageLoader::redact_url_for_log(
            "https://example.com:8443/path/img.png?X-Amz-Signature=abc123#hash",
        );

        assert_eq!(redacted, "https://example.com:8443/path/img.png");
    }

    #[tokio::test]
    async fn non_success_status_fails_with_response_body() {
        let (port, server) = serve_once("404 Not Found", b"image gone");

        let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");
        let url = format!("http://127.0.0.1:{}/missing.png", port);
        let result = loader.load_from_url(&url).await;

        server.join().expect("server thread failed");

        match result {
            Err(ImageError::Fetch { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "image gone");
            }
            other => panic!("expected fetch error, got {:?}", other.map(|raw| raw.bytes)),
        }
    }

    #[tokio::test]
    async fn success_status_returns_body_bytes() {
        let (port, server) = serve_once("200 OK", b"raw image bytes");

        let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");
        let url = format!("http://127.0.0.1:{}/a.png", port);
        let raw = loader.load_from_url(&url).await.expect("download failed");

        server.join().expect("server thread failed");

        assert_eq!(&raw.bytes[..], b"raw image bytes");
        assert_eq!(raw.source_hint, "url");
    }

    #[tokio::test]
    async fn malformed_network_address_is_unsupported_input() {
        let loader = ImageLoader::new(LoaderConfig::default()).expect("loader init failed");

        let result = loader.resolve(&Locator::Network("not a url".to_string())).await;

        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[tokio::test]
    async fn missing_object_propagates_storage_error() {
        let loader = ImageLoader::new(LoaderConfig::default())
            .expect("loader init failed")
            .with_object_store(Arc::new(MemoryObjectStore::new()));

        let result = loader
            .resolve(&Locator::ObjectStorage {
                bucket: "bucket1".to_string(),
                key: "nope.png".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ImageError::Storage(msg)) if msg.contains("NoSuchKey")));
    }
}
