use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    errors::Result,
    scanner::{self, Entry, TOUCH_SUFFIX},
    space::{self, Space},
};

/// 清理器所管理的根目录所在的存储卷。
pub trait Volume: Send + Sync + 'static {
    fn root(&self) -> &Path;

    fn space(&self) -> Result<Space>;

    fn scan(&self) -> Result<Vec<Entry>>;

    /// 删除条目目录及其触摸标记，两者不存在均不视为错误。
    fn drop_entry(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct DiskVolume {
    root: PathBuf,
}

impl DiskVolume {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskVolume { root: root.into() }
    }
}

impl Volume for DiskVolume {
    fn root(&self) -> &Path {
        &self.root
    }

    fn space(&self) -> Result<Space> {
        space::stat(&self.root)
    }

    fn scan(&self) -> Result<Vec<Entry>> {
        scanner::scan(&self.root)
    }

    fn drop_entry(&self, id: &str) -> Result<()> {
        ignore_not_found(fs::remove_dir_all(self.root.join(id)))?;
        ignore_not_found(fs::remove_file(
            self.root.join(format!("{id}{TOUCH_SUFFIX}")),
        ))?;

        Ok(())
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::fail;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Debug, Default)]
    struct State {
        free: u64,
        total: u64,
        // 按扫描顺序排列的条目及其占用字节数
        entries: Vec<(Entry, u64)>,
        dropped: Vec<String>,
    }

    /// 内存中的存储卷，删除条目时按其大小归还可用空间。
    #[derive(Debug, Default)]
    pub struct FakeVolume {
        root: PathBuf,
        state: Mutex<State>,
        pub drop_delay: Option<Duration>,
        pub fail_drop_of: Option<String>,
        pub fail_space: bool,
        pub scans: AtomicUsize,
    }

    impl FakeVolume {
        pub fn new(total: u64, free: u64) -> Self {
            FakeVolume {
                root: PathBuf::from("/fake"),
                state: Mutex::new(State {
                    free,
                    total,
                    ..Default::default()
                }),
                ..Default::default()
            }
        }

        pub fn with_entry(self, entry: Entry, size: u64) -> Self {
            self.state.lock().unwrap().entries.push((entry, size));
            self
        }

        pub fn dropped(&self) -> Vec<String> {
            self.state.lock().unwrap().dropped.clone()
        }

        pub fn remaining(&self) -> Vec<String> {
            let state = self.state.lock().unwrap();
            state.entries.iter().map(|(e, _)| e.id.clone()).collect()
        }

        pub fn free(&self) -> u64 {
            self.state.lock().unwrap().free
        }
    }

    impl Volume for FakeVolume {
        fn root(&self) -> &Path {
            &self.root
        }

        fn space(&self) -> Result<Space> {
            if self.fail_space {
                return Err(crate::errors::Error::Probe {
                    path: self.root.clone(),
                    source: io::Error::from(io::ErrorKind::PermissionDenied),
                });
            }
            let state = self.state.lock().unwrap();
            Ok(Space {
                free: state.free,
                total: state.total,
            })
        }

        fn scan(&self) -> Result<Vec<Entry>> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            let state = self.state.lock().unwrap();
            Ok(state.entries.iter().map(|(e, _)| e.clone()).collect())
        }

        fn drop_entry(&self, id: &str) -> Result<()> {
            if let Some(delay) = self.drop_delay {
                std::thread::sleep(delay);
            }
            if self.fail_drop_of.as_deref() == Some(id) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied).into());
            }
            let mut state = self.state.lock().unwrap();
            let pos = state
                .entries
                .iter()
                .position(|(e, _)| e.id == id)
                .ok_or_else(|| fail!("no such entry: {id}"))?;
            let (_, size) = state.entries.remove(pos);
            state.free += size;
            state.dropped.push(id.to_string());

            Ok(())
        }
    }
}
