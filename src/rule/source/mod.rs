//! 上游规则源：将过滤列表与提供方规则编译为统一载荷

use std::path::PathBuf;

use tracing::info;

use super::fetcher::RuleFetcher;
use super::model::RuleSourcePayload;
use crate::error::{PpResult, PurePasteError};

pub mod clear_urls;
pub mod remove_param;

pub use self::clear_urls::parse_clear_urls_providers;
pub use self::remove_param::{parse_remove_param_list, GeneralRules};

/// 上游数据位置：本地文件或 http(s) 地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamSource {
    Path(PathBuf),
    Url(String),
}

impl UpstreamSource {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    pub async fn read(&self, fetcher: &dyn RuleFetcher) -> PpResult<Vec<u8>> {
        match self {
            Self::Path(path) => std::fs::read(path).map_err(|e| {
                PurePasteError::SourceUnavailable(format!("{} unreadable: {}", path.display(), e))
            }),
            Self::Url(url) => fetcher.fetch(url).await,
        }
    }
}

/// 合并通用规则与提供方规则
pub fn build_payload(general_list: &str, provider_json: &[u8]) -> PpResult<RuleSourcePayload> {
    let general = parse_remove_param_list(general_list);
    let providers = parse_clear_urls_providers(provider_json)?;

    info!(
        "规则载荷构建完成：精确={}，正则={}，提供方={}",
        general.exact.len(),
        general.regex.len(),
        providers.len()
    );

    Ok(RuleSourcePayload {
        general_exact: Some(general.exact),
        general_regex: Some(general.regex),
        providers: Some(providers),
    })
}

/// 读取两个上游来源并生成载荷
pub async fn build_payload_from_sources(
    general: &UpstreamSource,
    providers: &UpstreamSource,
    fetcher: &dyn RuleFetcher,
) -> PpResult<RuleSourcePayload> {
    let general_bytes = general.read(fetcher).await?;
    let general_text = String::from_utf8(general_bytes)
        .map_err(|e| PurePasteError::ParseError(format!("filter list is not UTF-8: {}", e)))?;
    let provider_bytes = providers.read(fetcher).await?;
    build_payload(&general_text, &provider_bytes)
}
