//! HTTP POST 透传节点
//!
//! 把字典原样作为 JSON 请求体发送，回报状态码。
//! 非 2xx 不视为失败（状态码本身就是节点输出），只有传输层错误才上抛。

use crate::dict::Dict;
use crate::error::NodeError;
use crate::image_loader::ImageError;

/// POST `body` 到 `url`，返回 HTTP 状态码。
pub async fn http_post(client: &reqwest::Client, url: &str, body: &Dict) -> Result<u16, NodeError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| map_transport_error(e, url))?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    log::info!("📮 POST {} -> {} {}", url, status.as_u16(), text);

    Ok(status.as_u16())
}

fn map_transport_error(e: reqwest::Error, url: &str) -> NodeError {
    let error = if e.is_timeout() {
        ImageError::Timeout(format!("POST {} 超时", url))
    } else if e.is_builder() {
        ImageError::UnsupportedInput(format!("URL 格式错误：{}（{}）", url, e))
    } else {
        ImageError::Network(format!("POST {} 失败：{}", url, e))
    };
    NodeError::Image(error)
}
