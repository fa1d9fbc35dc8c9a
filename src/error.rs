//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum PurePasteError {
    // 规则源相关错误
    #[error("规则源不可用：{0}")]
    SourceUnavailable(String),
    #[error("规则载荷无效：{0}")]
    ParseError(String),
    #[error("规则缓存读写失败：{0}")]
    CacheIoFailure(String),

    // 剪贴板相关错误
    #[error("剪贴板写入被拒绝：{0}")]
    WriteBackFailure(String),

    // 编译相关错误
    #[error("正则编译失败：{0}")]
    RegexCompileError(#[from] RegexError),

    // 网络相关错误
    #[error("HTTP请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("输入无效：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type PpResult<T> = Result<T, PurePasteError>;
