use std::{fmt, path::Path, time::SystemTime};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::{errors::Result, space::gib, threshold, volume::Volume};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    // 可用空间充足，无需清理
    Sufficient,
    // 已达到目标可用空间
    ReachedTarget,
    // 条目已全部删除但仍未达到目标
    Exhausted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Sufficient => write!(f, "sufficient"),
            Outcome::ReachedTarget => write!(f, "reached target"),
            Outcome::Exhausted => write!(f, "exhausted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub outcome: Outcome,
    pub dropped: usize,
}

/// 单个根目录的驱逐引擎。
///
/// `keep` 是触发阈值：可用空间不高于它时开始清理；`free` 是停止条件：清理持续到可用空间高于它。
/// 两者每次运行都重新解析，不缓存任何派生状态。
#[derive(Debug)]
pub struct Cleaner<V> {
    volume: V,
    keep: String,
    free: String,
}

impl<V: Volume> Cleaner<V> {
    pub fn new(volume: V, keep: impl Into<String>, free: impl Into<String>) -> Self {
        Cleaner {
            volume,
            keep: keep.into(),
            free: free.into(),
        }
    }

    pub fn root(&self) -> &Path {
        self.volume.root()
    }

    #[cfg(test)]
    pub fn volume(&self) -> &V {
        &self.volume
    }

    pub fn run_pass(&self) -> Result<PassReport> {
        let space = self.volume.space()?;
        let keep = threshold::parse(&self.keep, space.total)?;
        let target = threshold::parse(&self.free, space.total)?;

        info!(
            "start cleaning root={} total={:.2}G free={:.2}G keep={:.2}G target={:.2}G",
            self.root().display(),
            gib(space.total),
            gib(space.free),
            gib(keep),
            gib(target)
        );

        if space.free > keep {
            info!("no need to clean root={}", self.root().display());
            return Ok(PassReport {
                outcome: Outcome::Sufficient,
                dropped: 0,
            });
        }

        let entries = self.volume.scan()?;
        debug!(
            "found {} entries under {}",
            entries.len(),
            self.root().display()
        );

        let mut dropped = 0;
        for entry in entries {
            info!(
                "drop hash={} touch={}",
                entry.id,
                format_touch(entry.touched)
            );
            self.volume.drop_entry(&entry.id)?;
            dropped += 1;

            let free = self.volume.space()?.free;
            if free > target {
                info!(
                    "finish cleaning root={} dropped={dropped} free={:.2}G",
                    self.root().display(),
                    gib(free)
                );
                return Ok(PassReport {
                    outcome: Outcome::ReachedTarget,
                    dropped,
                });
            }
        }

        info!(
            "finish cleaning root={} dropped={dropped}, no entries left to drop",
            self.root().display()
        );

        Ok(PassReport {
            outcome: Outcome::Exhausted,
            dropped,
        })
    }
}

fn format_touch(touched: Option<SystemTime>) -> String {
    match touched {
        Some(at) => DateTime::<Utc>::from(at).to_rfc3339(),
        None => "never".to_string(),
    }
}
