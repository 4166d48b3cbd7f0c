use std::path::PathBuf;

use strum::EnumProperty;

pub type Result<T> = std::result::Result<T, Error>;

// 错误分类（kind 属性）：
//  - config: 配置错误（阈值语法、通配符无匹配目录等）
//  - probe: 文件系统空间查询失败
//  - io: 目录列举或删除失败
//  - internal: 内部错误（任务、调度器等）
// 未定义 kind 的变体一律视为 internal

#[derive(Debug, thiserror::Error, strum_macros::EnumProperty)]
pub enum Error {
    // 阈值语法错误
    #[strum(props(kind = "config"))]
    #[error("invalid threshold `{0}`: expected `NN%` or a byte size such as `512M` or `10G`")]
    InvalidThreshold(String),
    // 百分比超出范围
    #[strum(props(kind = "config"))]
    #[error("threshold percentage out of range: {0}%, must be within 0..=100")]
    ThresholdOutOfRange(i64),
    // 无效的调度间隔
    #[strum(props(kind = "config"))]
    #[error("invalid cleaner interval: `{0}`, expected a positive number of seconds")]
    InvalidInterval(String),
    // 通配符没有匹配任何目录
    #[strum(props(kind = "config"))]
    #[error("no cleaners for {0}: the pattern matched no directories")]
    NoMatchingDirs(String),
    // 空间查询失败
    #[strum(props(kind = "probe"))]
    #[error("failed to stat filesystem at {}: {source}", .path.display())]
    Probe {
        path: PathBuf,
        source: std::io::Error,
    },
    // 内部通用错误
    #[error("internal error: {0}")]
    Internal(String),
    // 包装 std::io::Error
    #[strum(props(kind = "io"))]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    // 包装 tokio 的 JoinError
    #[error("task join error: {0}")]
    TokioTaskJoin(#[from] tokio::task::JoinError),
    // 包装 JobSchedulerError
    #[error("job scheduler error: {0}")]
    JobScheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        self.get_str("kind").unwrap_or("internal")
    }
}

#[macro_export]
macro_rules! fail {
    ($msg:expr) => {
        $crate::errors::Error::Internal(format!($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::Error::Internal(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! err {
    ($msg:expr) => {
        Err($crate::fail!($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::fail!($fmt, $($arg)*))
    };
}
