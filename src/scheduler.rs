use crate::{errors::Result, unit::CleanerUnit, volume::Volume};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::{pin::Pin, sync::Arc, time::Duration};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

type TaskRun = Arc<
    dyn Fn() -> Pin<Box<dyn std::future::Future<Output = ()> + Send + 'static>>
        + Send
        + Sync
        + 'static,
>;

pub struct Task {
    run: TaskRun,
}

impl Task {
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            run: Arc::new(move || Box::pin(run())),
        }
    }

    pub fn create_job(&self, interval: Duration) -> Result<Job> {
        let run = Arc::clone(&self.run);
        let job = Job::new_repeated_async(interval, move |_, _| run())?;

        Ok(job)
    }
}

/// 以固定间隔触发各清理单元的调度器。
pub struct Scheduler {
    sched: JobScheduler,
    job_ids: Vec<Uuid>,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let sched = JobScheduler::new().await?;

        Ok(Self {
            sched,
            job_ids: vec![],
        })
    }

    /// 为单元添加定时作业，返回作业 ID。
    pub async fn add<V: Volume>(
        &mut self,
        unit: Arc<CleanerUnit<V>>,
        interval: Duration,
    ) -> Result<Uuid> {
        let root = unit.root().display().to_string();
        let task = Task::new(move || {
            let unit = Arc::clone(&unit);
            async move {
                unit.tick().await;
            }
        });
        let job_id = self.sched.add(task.create_job(interval)?).await?;
        self.job_ids.push(job_id);
        info!(
            "Cleaner for {root} scheduled to run every {} seconds",
            interval.as_secs()
        );

        Ok(job_id)
    }

    pub async fn start(&mut self) -> Result<()> {
        self.sched.set_shutdown_handler(Box::new(|| {
            Box::pin(async move {
                info!("Job scheduler is shutting down");
            })
        }));
        self.sched.start().await?;

        Ok(())
    }

    pub async fn next_run(&mut self, job_id: Uuid) -> Option<DateTime<Utc>> {
        match self.sched.next_tick_for_job(job_id).await {
            Ok(next) => next,
            Err(e) => {
                warn!("Failed to get the next run of job {job_id}: {e}");
                None
            }
        }
    }

    /// 取消全部后续触发，不会中断正在进行的运行。
    pub async fn shutdown(&mut self) -> Result<()> {
        for job_id in self.job_ids.drain(..) {
            self.sched.remove(&job_id).await?;
        }
        self.sched.shutdown().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{janitor::Cleaner, scanner::Entry, volume::fake::FakeVolume};

    const GB: u64 = 1024 * 1024 * 1024;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fires_on_interval() {
        let volume = FakeVolume::new(100 * GB, 50 * GB).with_entry(Entry::new("A", None), GB);
        let unit = Arc::new(CleanerUnit::new(Cleaner::new(volume, "25%", "35%")));

        let mut scheduler = Scheduler::new().await.unwrap();
        scheduler
            .add(unit.clone(), Duration::from_secs(1))
            .await
            .unwrap();
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        scheduler.shutdown().await.unwrap();
        unit.stop().await;

        let passes = unit.stats().passes;
        assert!(passes >= 2, "expected at least 2 passes, got {passes}");
        // 空间充足，不会删除任何条目
        assert!(unit.cleaner().volume().dropped().is_empty());

        // 关闭后不再触发
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(unit.stats().passes, passes);
    }
}
