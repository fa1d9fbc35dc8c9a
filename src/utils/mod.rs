//! 工具模块：内容摘要、诊断日志
pub mod content_hash;
pub mod diag_log;

pub use self::content_hash::content_hash;
pub use self::diag_log::DiagnosticLog;
