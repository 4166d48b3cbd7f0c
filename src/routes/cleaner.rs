use crate::{
    coordinator::{self, MultiCleaner},
    errors::Result,
    fail,
    models::payload::{CleanerStatus, Scheduled},
    vars::STARTED_AT,
};
use axum::Json;
use std::sync::Arc;

fn multi_cleaner() -> Result<&'static Arc<MultiCleaner>> {
    coordinator::multi_cleaner().ok_or(fail!("cleaner is not initialized"))
}

pub async fn status() -> Result<Json<CleanerStatus>> {
    Ok(Json(cleaner_status(multi_cleaner()?).await))
}

pub async fn schedule() -> Result<Json<Vec<Scheduled>>> {
    Ok(Json(schedule_all(multi_cleaner()?).await))
}

async fn cleaner_status(multi_cleaner: &MultiCleaner) -> CleanerStatus {
    CleanerStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: STARTED_AT.get().cloned(),
        units: multi_cleaner.status().await,
    }
}

// 立即触发全部单元，正在运行或已停止的单元报告为 skipped
async fn schedule_all(multi_cleaner: &MultiCleaner) -> Vec<Scheduled> {
    multi_cleaner
        .tick_all()
        .await
        .into_iter()
        .map(|(root, tick)| Scheduled::new(&root, tick))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{janitor::Outcome, routes::tests::idle_cleaner};
    use std::fs;

    #[tokio::test]
    async fn test_handlers_require_init() {
        // 测试中从不初始化全局实例
        assert_eq!(status().await.unwrap_err().kind(), "internal");
        assert_eq!(schedule().await.unwrap_err().kind(), "internal");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_reports_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let multi = idle_cleaner(dir.path());

        let before = cleaner_status(&multi).await;
        assert_eq!(before.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(before.units.len(), 1);
        assert_eq!(before.units[0].root, dir.path().display().to_string());
        assert!(before.units[0].next_run.is_none());

        multi.start().await.unwrap();
        let after = cleaner_status(&multi).await;
        assert!(after.units[0].next_run.is_some());
        assert!(after.units[0].last_error.is_none());

        multi.stop().await;
        let stopped = cleaner_status(&multi).await;
        assert!(stopped.units[0].next_run.is_none());
        assert!(!stopped.units[0].running);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_schedule_reports_each_unit() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cache-b", "cache-a"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let multi = idle_cleaner(&dir.path().join("cache-*"));

        let scheduled = schedule_all(&multi).await;
        let roots: Vec<_> = scheduled.iter().map(|s| s.root.clone()).collect();
        assert_eq!(
            roots,
            vec![
                dir.path().join("cache-a").display().to_string(),
                dir.path().join("cache-b").display().to_string(),
            ]
        );
        for s in &scheduled {
            assert_eq!(s.result, "completed");
            assert_eq!(s.outcome, Some(Outcome::Sufficient));
            assert_eq!(s.dropped, Some(0));
        }

        // 停止后的单元不再运行
        multi.stop().await;
        let scheduled = schedule_all(&multi).await;
        assert!(scheduled.iter().all(|s| s.result == "skipped"));
        let units = cleaner_status(&multi).await.units;
        assert!(units.iter().all(|u| u.passes == 1 && u.skipped == 1));
    }
}
