use anyhow::Context;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 接受的图片扩展名（小写）
const EXTENSIONS: [&str; 2] = [".jpeg", ".jpg"];

/// 按瓶盖标签解析图片文件名的能力
pub trait ImageLookup {
    /// 返回磁盘上的原始文件名（保留大小写）
    fn resolve(&self, cap_label: &str) -> Option<&str>;
}

/// 图片目录索引，构建一次后只读
///
/// 匹配时忽略大小写：标签 `Duvel` 可以匹配 `duvel.JPG`，返回值是磁盘上的 `duvel.JPG`
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    by_stem: HashMap<String, String>,
    files: Vec<String>,
}

impl ImageIndex {
    /// 从文件名列表构建索引，列表顺序决定同名不同扩展名时取哪一个
    pub fn from_filenames<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut by_stem = HashMap::new();
        let mut files = Vec::new();
        for name in filenames {
            let name: String = name.into();
            let lower = name.to_lowercase();
            if let Some(stem) = EXTENSIONS.iter().find_map(|ext| lower.strip_suffix(ext)) {
                by_stem
                    .entry(stem.to_string())
                    .or_insert_with(|| name.clone());
            }
            files.push(name);
        }
        Self { by_stem, files }
    }

    /// 读取目录构建索引
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        Ok(Self::from_filenames(list_files(dir)?))
    }

    /// 目录中的全部文件名（包括非图片文件），按列举顺序
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// 可被标签解析的图片数量
    pub fn image_count(&self) -> usize {
        self.by_stem.len()
    }
}

impl ImageLookup for ImageIndex {
    fn resolve(&self, cap_label: &str) -> Option<&str> {
        self.by_stem
            .get(&cap_label.to_lowercase())
            .map(String::as_str)
    }
}

/// 列出目录中的普通文件名
pub fn list_files<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<String>> {
    let dir = dir.as_ref();
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        // 跟随符号链接，链接到图片的文件同样计入
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
