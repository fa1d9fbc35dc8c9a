//! 远程规则拉取
//! 以 trait 隔离网络访问，测试时可替换为假实现

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::error::{PpResult, PurePasteError};

const CLIENT_USER_AGENT: &str = concat!("PurePaste/", env!("CARGO_PKG_VERSION"));

/// 远程规则拉取接口：成功仅指 2xx 并拿到完整响应体，内容校验由调用方负责
#[async_trait]
pub trait RuleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> PpResult<Vec<u8>>;
}

/// 基于 reqwest 的 HTTP 拉取器
#[derive(Debug, Clone)]
pub struct HttpRuleFetcher {
    client: Client,
}

impl HttpRuleFetcher {
    pub fn new(timeout: Duration) -> PpResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RuleFetcher for HttpRuleFetcher {
    async fn fetch(&self, url: &str) -> PpResult<Vec<u8>> {
        debug!("拉取远程规则：{}", url);

        // 绕过 HTTP 层缓存
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| PurePasteError::SourceUnavailable(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PurePasteError::SourceUnavailable(format!(
                "{} returned status {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PurePasteError::SourceUnavailable(format!("reading body from {} failed: {}", url, e)))?;

        debug!("远程规则拉取完成：{}字节，来源{}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}
