use std::{collections::HashMap, fs, io, path::Path, time::SystemTime};

use crate::errors::Result;

pub const TOUCH_SUFFIX: &str = ".touch";

/// 可驱逐的缓存条目：以内容标识（哈希）命名的子目录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    // 触摸标记的修改时间，`None` 表示从未被触摸
    pub touched: Option<SystemTime>,
}

impl Entry {
    pub fn new(id: impl Into<String>, touched: Option<SystemTime>) -> Self {
        Entry {
            id: id.into(),
            touched,
        }
    }
}

/// 列举 `root` 并按最近触摸时间升序返回条目。
///
/// 没有标记文件的目录排在最前（最先被驱逐），时间相同的条目按标识字典序排列。
pub fn scan(root: &Path) -> Result<Vec<Entry>> {
    let mut index: HashMap<String, Option<SystemTime>> = HashMap::new();

    for dir_entry in fs::read_dir(root)? {
        let dir_entry = dir_entry?;
        let file_type = dir_entry.file_type()?;
        let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
            // 内容标识总是 ASCII 哈希，跳过无法解码的名称
            continue;
        };

        if file_type.is_dir() {
            index.entry(name).or_insert(None);
        } else if let Some(id) = name.strip_suffix(TOUCH_SUFFIX) {
            // 标记可能在列举之后被并发删除
            let Some(modified) = touch_time(&dir_entry.path())? else {
                continue;
            };
            index.insert(id.to_string(), Some(modified));
        }
    }

    let mut entries = index
        .into_iter()
        .map(|(id, touched)| Entry::new(id, touched))
        .collect::<Vec<_>>();
    // Option 的排序中 None 小于任何 Some
    entries.sort_by(|a, b| a.touched.cmp(&b.touched).then_with(|| a.id.cmp(&b.id)));

    Ok(entries)
}

/// 读取标记文件的修改时间，文件已不存在时返回 `None`。
fn touch_time(path: &Path) -> io::Result<Option<SystemTime>> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.modified().map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
