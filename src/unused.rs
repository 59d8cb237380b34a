use crate::catalog::CatalogTree;

/// 找出目录中未被任何瓶盖引用的文件（区分大小写），按字典序排序
pub fn unused_images<'a, I>(all_files: I, tree: &CatalogTree) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let used = tree.cap_filenames();
    let mut unused: Vec<String> = all_files
        .into_iter()
        .filter(|name| !used.contains(name.as_str()))
        .cloned()
        .collect();
    unused.sort();
    unused.dedup();
    unused
}

/// 生成报告文本
pub fn render_report(unused: &[String]) -> String {
    let mut out = String::from("=== Unused image files ===\n");
    if unused.is_empty() {
        out.push_str("✅ No unused images found!\n");
    } else {
        for name in unused {
            out.push_str(name);
            out.push('\n');
        }
    }
    out
}
