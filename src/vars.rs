use std::sync::{LazyLock, OnceLock};

use chrono::{DateTime, Utc};

macro_rules! env_config {
    ($name:ident, $env_key:expr, $default:expr) => {
        paste::paste! {
            pub static [<CLEANER_ $name>]: ::std::sync::LazyLock<&'static str> = ::std::sync::LazyLock::new(|| {
                ::std::boxed::Box::leak(
                    ::std::env::var($env_key)
                        .unwrap_or_else(|_| $default.to_string())
                        .into_boxed_str()
                )
            });
        }
    };
    ($name:ident, $default:expr) => {
        env_config!($name, stringify!([<CLEANER_ $name>]), $default);
    };
}

// 与旧版部署保持一致的变量名
env_config!(DATA_DIR, "DATA_DIR", std::env::temp_dir().display());
env_config!(PROBE_HOST, "PROBE_HOST", "0.0.0.0");
env_config!(PROBE_PORT, "PROBE_PORT", "8081");

env_config!(KEEP_FREE, "25%");
env_config!(FREE, "35%");
env_config!(INTERVAL_SECS, "300");

pub static PROBE_BIND: LazyLock<String> =
    LazyLock::new(|| format!("{}:{}", *CLEANER_PROBE_HOST, *CLEANER_PROBE_PORT));

pub static STARTED_AT: OnceLock<DateTime<Utc>> = OnceLock::new();

pub fn init_started_at() {
    let _ = STARTED_AT.set(Utc::now());
}
