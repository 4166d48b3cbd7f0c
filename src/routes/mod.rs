pub mod cleaner;

use std::sync::Arc;

use axum::http::StatusCode;
use log::debug;

use crate::coordinator::{self, MultiCleaner};

pub async fn liveness() -> &'static str {
    debug!("Liveness probe hit");

    "ok"
}

pub async fn readiness() -> (StatusCode, &'static str) {
    readiness_of(coordinator::multi_cleaner().map(Arc::as_ref)).await
}

// 只有清理单元处于启动状态时才就绪
async fn readiness_of(multi_cleaner: Option<&MultiCleaner>) -> (StatusCode, &'static str) {
    let ready = match multi_cleaner {
        Some(multi_cleaner) => multi_cleaner.is_started().await,
        None => false,
    };

    if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}
