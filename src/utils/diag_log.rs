//! 诊断日志
//! 追加写入的纯文本文件，每条非致命错误一行，写入失败直接忽略

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::debug;

pub const DIAGNOSTIC_LOG_FILE: &str = "error.txt";

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 位于缓存目录下的默认日志文件
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DIAGNOSTIC_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, message: &str) {
        self.record_all(&[message]);
    }

    /// 同一批消息共用一个时间戳
    pub fn record_all<S: AsRef<str>>(&self, messages: &[S]) {
        if messages.is_empty() {
            return;
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut body = String::new();
        for message in messages {
            body.push_str(&timestamp);
            body.push(' ');
            body.push_str(message.as_ref());
            body.push('\n');
        }

        if let Err(e) = self.append(body.as_bytes()) {
            debug!("诊断日志写入{}失败：{}", self.path.display(), e);
        }
    }

    fn append(&self, data: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(data)
    }
}
