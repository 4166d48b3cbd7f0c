use std::{
    path::Path,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    errors::Error,
    janitor::{Cleaner, Outcome, PassReport},
    volume::Volume,
};

/// 一次调度触发的结果。
#[derive(Debug)]
pub enum Tick {
    // 上一次运行尚未结束（或已停止），本次触发被跳过
    Skipped,
    Completed(PassReport),
    Failed(Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct LastError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct UnitStats {
    // 已执行的运行次数（含失败）
    pub passes: u64,
    // 被跳过的触发次数
    pub skipped: u64,
    // 累计删除的条目数
    pub dropped_total: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_outcome: Option<Outcome>,
    pub last_error: Option<LastError>,
}

/// 一个根目录的清理单元：驱逐引擎加上单飞保护。
///
/// `running` 是单元独占的令牌，触发时以非阻塞方式获取，获取失败即跳过；停止时阻塞等待当前运行结束。
pub struct CleanerUnit<V> {
    cleaner: Arc<Cleaner<V>>,
    running: Arc<Mutex<()>>,
    in_flight: Arc<AtomicBool>,
    stopped: AtomicBool,
    stats: Arc<RwLock<UnitStats>>,
}

impl<V: Volume> CleanerUnit<V> {
    pub fn new(cleaner: Cleaner<V>) -> Self {
        CleanerUnit {
            cleaner: Arc::new(cleaner),
            running: Arc::new(Mutex::new(())),
            in_flight: Arc::new(AtomicBool::new(false)),
            stopped: AtomicBool::new(false),
            stats: Arc::new(RwLock::new(UnitStats::default())),
        }
    }

    pub fn root(&self) -> &Path {
        self.cleaner.root()
    }

    #[cfg(test)]
    pub fn cleaner(&self) -> &Cleaner<V> {
        &self.cleaner
    }

    pub fn stats(&self) -> UnitStats {
        match self.stats.read() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn tick(self: Arc<Self>) -> Tick {
        let permit = match self.running.clone().try_lock_owned() {
            Ok(permit) if !self.stopped.load(Ordering::SeqCst) => permit,
            _ => {
                debug!(
                    "skip cleaning root={}: a pass is in flight or the unit is stopped",
                    self.root().display()
                );
                update(&self.stats, |stats| stats.skipped += 1);
                return Tick::Skipped;
            }
        };

        let cleaner = Arc::clone(&self.cleaner);
        let stats = Arc::clone(&self.stats);
        let in_flight = Arc::clone(&self.in_flight);
        // 令牌随阻塞任务一起移动，确保即使调用方被取消也不会重叠运行
        let joined = tokio::task::spawn_blocking(move || {
            in_flight.store(true, Ordering::SeqCst);
            let result = cleaner.run_pass();
            record(&stats, &result);
            in_flight.store(false, Ordering::SeqCst);
            drop(permit);
            result
        })
        .await;

        match joined {
            Ok(Ok(report)) => Tick::Completed(report),
            Ok(Err(e)) => {
                error!(
                    "got cleaner error root={} kind={}: {e}",
                    self.root().display(),
                    e.kind()
                );
                Tick::Failed(e)
            }
            Err(e) => {
                error!("cleaner task panicked root={}: {e}", self.root().display());
                Tick::Failed(e.into())
            }
        }
    }

    /// 停止后续的触发，并等待正在进行的运行自然结束。
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if self.is_running() {
            info!(
                "waiting for the in-flight pass to finish root={}",
                self.root().display()
            );
        }
        let _ = self.running.lock().await;
    }
}

fn update(stats: &RwLock<UnitStats>, f: impl FnOnce(&mut UnitStats)) {
    match stats.write() {
        Ok(mut guard) => f(&mut guard),
        Err(poisoned) => f(&mut poisoned.into_inner()),
    }
}

fn record(stats: &RwLock<UnitStats>, result: &Result<PassReport, Error>) {
    update(stats, |stats| {
        stats.passes += 1;
        stats.last_run = Some(Utc::now());
        match result {
            Ok(report) => {
                stats.dropped_total += report.dropped as u64;
                stats.last_outcome = Some(report.outcome);
                stats.last_error = None;
            }
            Err(e) => {
                stats.last_outcome = None;
                stats.last_error = Some(LastError {
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    });
}
