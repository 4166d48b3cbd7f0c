use std::time::Duration;

use crate::{
    cli::Args,
    errors::{Error, Result},
    vars::{CLEANER_DATA_DIR, CLEANER_FREE, CLEANER_INTERVAL_SECS, CLEANER_KEEP_FREE},
};

/// 清理器配置。阈值以原始字符串保存，每次运行时重新解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerConfig {
    // 根目录，可以以 `*` 结尾表示匹配同级目录
    pub data_dir: String,
    // 触发阈值
    pub keep_free: String,
    // 目标可用空间
    pub free: String,
    pub interval: Duration,
}

impl CleanerConfig {
    /// 命令行参数优先，其次是环境变量（及其默认值）。
    pub fn load(args: &Args) -> Result<Self> {
        let interval = match args.interval_secs {
            Some(secs) => parse_interval(&secs.to_string())?,
            None => parse_interval(*CLEANER_INTERVAL_SECS)?,
        };

        Ok(CleanerConfig {
            data_dir: args
                .data_dir
                .clone()
                .unwrap_or_else(|| CLEANER_DATA_DIR.to_string()),
            keep_free: args
                .keep_free
                .clone()
                .unwrap_or_else(|| CLEANER_KEEP_FREE.to_string()),
            free: args
                .free
                .clone()
                .unwrap_or_else(|| CLEANER_FREE.to_string()),
            interval,
        })
    }
}

pub fn parse_interval(secs: &str) -> Result<Duration> {
    match secs.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(Error::InvalidInterval(secs.to_string())),
    }
}
