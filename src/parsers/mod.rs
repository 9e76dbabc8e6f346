//! # 解析器模块
//!
//! 扫描数据文件的读取。这里刻意不解析 spec 文件或探测器原始
//! 图像（那些属于采集链上游）；本模块只读已经按点展开的列式
//! 导出文件，作为扫描记录的来源。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: colscan

pub mod colscan;

use std::path::Path;

use crate::error::{CtrError, Result};
use crate::models::ScanRecord;

/// 从文件路径推断格式并解析
pub fn parse_scan_file(path: &Path) -> Result<ScanRecord> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "scan" | "dat" => colscan::parse_scan_file(path),
        _ => Err(CtrError::UnsupportedFormat(format!(
            "Cannot determine scan format for: {}",
            path.display()
        ))),
    }
}
