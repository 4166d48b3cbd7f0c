use std::{ffi::CString, io, mem::MaybeUninit, os::unix::ffi::OsStrExt, path::Path};

use crate::errors::{Error, Result};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// 文件系统容量快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Space {
    // 非特权用户可用的字节数（不含保留块）
    pub free: u64,
    // 总字节数
    pub total: u64,
}

/// 查询 `path` 所在文件系统的可用与总容量。
pub fn stat(path: &Path) -> Result<Space> {
    let probe_err = |source: io::Error| Error::Probe {
        path: path.to_path_buf(),
        source,
    };
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| probe_err(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    // Safety: c_path 是以 NUL 结尾的合法字符串，stat 指向足够大小的缓冲区
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return Err(probe_err(io::Error::last_os_error()));
    }
    // Safety: statvfs 返回 0 时已完整写入结构体
    let stat = unsafe { stat.assume_init() };

    // 各平台字段宽度不同，统一转换为 u64
    #[allow(clippy::unnecessary_cast)]
    let (block_size, available, blocks) = (
        stat.f_frsize as u64,
        stat.f_bavail as u64,
        stat.f_blocks as u64,
    );

    Ok(Space {
        free: available * block_size,
        total: blocks * block_size,
    })
}

pub fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}
