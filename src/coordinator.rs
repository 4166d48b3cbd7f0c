use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
    time::Duration,
};

use log::{error, info};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::CleanerConfig,
    errors::{Error, Result},
    janitor::Cleaner,
    models::payload::UnitStatus,
    scheduler::Scheduler,
    unit::{CleanerUnit, Tick},
    volume::DiskVolume,
};

pub const WILDCARD: char = '*';

static MULTI_CLEANER: OnceLock<Arc<MultiCleaner>> = OnceLock::new();

/// 将根目录描述解析为一个或多个根目录。
///
/// 以 `*` 结尾时，匹配父目录下名称以该前缀开头的全部子目录（按名称排序）；否则原样返回。
pub fn resolve(path_spec: &str) -> Result<Vec<PathBuf>> {
    let Some(prefix) = path_spec.strip_suffix(WILDCARD) else {
        return Ok(vec![PathBuf::from(path_spec)]);
    };

    let (parent, name_prefix) = match prefix.rsplit_once('/') {
        Some(("", name_prefix)) => (Path::new("/"), name_prefix),
        Some((parent, name_prefix)) => (Path::new(parent), name_prefix),
        None => (Path::new("."), prefix),
    };

    let mut roots = vec![];
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(name_prefix))
        {
            roots.push(entry.path());
        }
    }
    roots.sort();

    if roots.is_empty() {
        Err(Error::NoMatchingDirs(path_spec.to_string()))
    } else {
        Ok(roots)
    }
}

struct Scheduled {
    scheduler: Scheduler,
    job_ids: Vec<Uuid>,
}

/// 管理一组互相独立的清理单元，只负责统一启动和停止。
pub struct MultiCleaner {
    units: Vec<Arc<CleanerUnit<DiskVolume>>>,
    interval: Duration,
    scheduled: Mutex<Option<Scheduled>>,
}

impl MultiCleaner {
    pub fn new(config: &CleanerConfig) -> Result<Self> {
        let units = resolve(&config.data_dir)?
            .into_iter()
            .map(|root| {
                let cleaner = Cleaner::new(
                    DiskVolume::new(root),
                    config.keep_free.clone(),
                    config.free.clone(),
                );
                Arc::new(CleanerUnit::new(cleaner))
            })
            .collect::<Vec<_>>();
        info!("Created {} cleaner(s) for {}", units.len(), config.data_dir);

        Ok(MultiCleaner {
            units,
            interval: config.interval,
            scheduled: Mutex::new(None),
        })
    }

    pub fn units(&self) -> &[Arc<CleanerUnit<DiskVolume>>] {
        &self.units
    }

    pub async fn is_started(&self) -> bool {
        self.scheduled.lock().await.is_some()
    }

    /// 启动全部单元：每个单元立即运行一次，之后按固定间隔触发。
    pub async fn start(&self) -> Result<()> {
        let mut scheduled = self.scheduled.lock().await;
        if scheduled.is_some() {
            return Ok(());
        }

        let mut scheduler = Scheduler::new().await?;
        let mut job_ids = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            job_ids.push(scheduler.add(Arc::clone(unit), self.interval).await?);
        }
        scheduler.start().await?;

        for unit in &self.units {
            tokio::spawn(Arc::clone(unit).tick());
        }
        *scheduled = Some(Scheduled { scheduler, job_ids });

        Ok(())
    }

    /// 停止全部单元，等待所有正在进行的运行结束。
    pub async fn stop(&self) {
        if let Some(mut scheduled) = self.scheduled.lock().await.take() {
            if let Err(e) = scheduled.scheduler.shutdown().await {
                error!("Failed to shut down the cleaner scheduler: {e}");
            }
        }
        for unit in &self.units {
            unit.stop().await;
        }
        info!("All cleaners stopped");
    }

    /// 启动并运行，直到 `shutdown` 完成后停止。
    pub async fn serve(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!("serving Cleaner");
        self.start().await?;
        shutdown.await;
        self.stop().await;

        Ok(())
    }

    /// 立即触发全部单元各一次（遵守单飞保护）。
    pub async fn tick_all(&self) -> Vec<(PathBuf, Tick)> {
        let handles = self
            .units
            .iter()
            .map(|unit| {
                let root = unit.root().to_path_buf();
                (root, tokio::spawn(Arc::clone(unit).tick()))
            })
            .collect::<Vec<_>>();

        let mut ticks = Vec::with_capacity(handles.len());
        for (root, handle) in handles {
            let tick = match handle.await {
                Ok(tick) => tick,
                Err(e) => Tick::Failed(e.into()),
            };
            ticks.push((root, tick));
        }

        ticks
    }

    pub async fn status(&self) -> Vec<UnitStatus> {
        let mut scheduled = self.scheduled.lock().await;
        let mut statuses = Vec::with_capacity(self.units.len());
        for (i, unit) in self.units.iter().enumerate() {
            let next_run = match scheduled.as_mut() {
                Some(Scheduled { scheduler, job_ids }) => match job_ids.get(i) {
                    Some(job_id) => scheduler.next_run(*job_id).await,
                    None => None,
                },
                None => None,
            };
            statuses.push(UnitStatus::new(
                unit.root(),
                unit.is_running(),
                unit.stats(),
                next_run,
            ));
        }

        statuses
    }
}

pub fn init(multi_cleaner: Arc<MultiCleaner>) {
    if MULTI_CLEANER.set(multi_cleaner).is_err() {
        error!("The MultiCleaner is already initialized");
    }
}

pub fn multi_cleaner() -> Option<&'static Arc<MultiCleaner>> {
    MULTI_CLEANER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::tests::add_entry;

    fn config(data_dir: &str) -> CleanerConfig {
        CleanerConfig {
            data_dir: data_dir.to_string(),
            keep_free: "25%".to_string(),
            free: "35%".to_string(),
            interval: Duration::from_secs(300),
        }
    }

    #[test]
    fn test_resolve_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["foo-c", "foo-a", "foo-b", "bar-a"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        // 名称匹配但不是目录
        fs::write(dir.path().join("foo-file"), b"").unwrap();

        let spec = format!("{}/foo-*", dir.path().display());
        let roots = resolve(&spec).unwrap();

        assert_eq!(
            roots,
            vec![
                dir.path().join("foo-a"),
                dir.path().join("foo-b"),
                dir.path().join("foo-c"),
            ]
        );
    }

    #[test]
    fn test_resolve_wildcard_without_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("one")).unwrap();
        fs::create_dir(dir.path().join("two")).unwrap();

        let spec = format!("{}/*", dir.path().display());
        assert_eq!(resolve(&spec).unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_no_match() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bar-a")).unwrap();

        let spec = format!("{}/foo-*", dir.path().display());
        let err = resolve(&spec).unwrap_err();
        assert!(matches!(err, Error::NoMatchingDirs(_)));
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_resolve_missing_parent() {
        let dir = tempfile::tempdir().unwrap();

        let spec = format!("{}/missing/foo-*", dir.path().display());
        assert_eq!(resolve(&spec).unwrap_err().kind(), "io");
    }

    #[test]
    fn test_resolve_literal() {
        // 字面路径不检查是否存在，由每次运行报告错误
        assert_eq!(
            resolve("/var/cache/blobs").unwrap(),
            vec![PathBuf::from("/var/cache/blobs")]
        );
    }

    #[test]
    fn test_fan_out_units() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["foo-a", "foo-b", "foo-c"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }

        let spec = format!("{}/foo-*", dir.path().display());
        let multi = MultiCleaner::new(&config(&spec)).unwrap();

        let roots = multi
            .units()
            .iter()
            .map(|unit| unit.root().to_path_buf())
            .collect::<Vec<_>>();
        assert_eq!(
            roots,
            vec![
                dir.path().join("foo-a"),
                dir.path().join("foo-b"),
                dir.path().join("foo-c"),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_tick_all_units_independently() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["foo-a", "foo-b"] {
            let root = dir.path().join(name);
            fs::create_dir(&root).unwrap();
            add_entry(&root, "aaaa", None);
        }
        let mut config = config(&format!("{}/foo-*", dir.path().display()));
        // 可用空间总是高于 0%，两个单元都不需要清理
        config.keep_free = "0%".to_string();
        let multi = MultiCleaner::new(&config).unwrap();

        let ticks = multi.tick_all().await;

        assert_eq!(ticks.len(), 2);
        assert!(
            ticks
                .iter()
                .all(|(_, tick)| matches!(tick, Tick::Completed(_)))
        );
        assert!(dir.path().join("foo-a/aaaa").exists());
        assert!(dir.path().join("foo-b/aaaa").exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_serve_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        add_entry(dir.path(), "aaaa", None);
        add_entry(dir.path(), "bbbb", None);
        // 100% 触发且目标不可达：启动时的首次运行会清空目录
        let mut config = config(&dir.path().display().to_string());
        config.keep_free = "100%".to_string();
        config.free = "100%".to_string();
        let multi = MultiCleaner::new(&config).unwrap();

        multi
            .serve(tokio::time::sleep(Duration::from_millis(500)))
            .await
            .unwrap();

        assert!(!multi.is_started().await);
        let stats = multi.units()[0].stats();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.dropped_total, 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
