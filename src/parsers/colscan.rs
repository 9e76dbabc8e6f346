//! # 列式扫描文件解析器
//!
//! 解析逐点展开的列式扫描导出文件。
//!
//! ## 格式说明
//! ```text
//! # name scan_0231          # 指令行（可选）：扫描名
//! # lambda 0.7749           # 波长（Å），缺省 1.0
//! # normal 0 0 1            # 表面法向（phi 系），缺省 0 0 1
//! H,K,L,I,io,Ierr,Ibgr,phi,chi,eta,mu,nu,del
//! 1.0,0.0,0.1,211.0,9.8e5,14.5,3.2,0,0,0,2.0,12.0,0.4
//! ...
//! ```
//! 表头行命名各列；数值一律按 f64 解析，坏单元是硬错误。
//! 缺失的马达角列不在这里报错，归算时降级为 0 并给警告。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/` 数据模型
//! - 使用 `csv` 解析表格、`regex` 解析指令行

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CtrError, Result};
use crate::models::image::{ColumnSource, ImageScan};
use crate::models::scan::{Column, ScanGeometry, ScanRecord};

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s*(\w+)\s+(.+)$").unwrap())
}

/// 解析列式扫描文件
pub fn parse_scan_file(path: &Path) -> Result<ScanRecord> {
    let content = fs::read_to_string(path).map_err(|e| CtrError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_scan_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scan"),
    )
}

/// 从字符串内容解析
pub fn parse_scan_content(content: &str, default_name: &str) -> Result<ScanRecord> {
    let mut name = default_name.to_string();
    let mut geometry = ScanGeometry::default();
    let mut table = String::new();

    let parse_err = |reason: String| CtrError::ParseError {
        format: "colscan".to_string(),
        path: default_name.to_string(),
        reason,
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = directive_re().captures(trimmed) {
            let key = caps[1].to_lowercase();
            let value = caps[2].trim();
            match key.as_str() {
                "name" => name = value.to_string(),
                "lambda" => {
                    geometry.lambda = value
                        .parse()
                        .map_err(|_| parse_err(format!("bad lambda '{}'", value)))?;
                }
                "normal" => {
                    let parts: Vec<f64> = value
                        .split_whitespace()
                        .filter_map(|s| s.parse().ok())
                        .collect();
                    if parts.len() != 3 {
                        return Err(parse_err(format!("bad normal '{}'", value)));
                    }
                    geometry.normal = [parts[0], parts[1], parts[2]];
                }
                // 未知指令跳过，保持格式可扩展
                _ => {}
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        table.push_str(trimmed);
        table.push('\n');
    }

    if table.is_empty() {
        return Err(parse_err("no table section".to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(table.as_bytes());
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(parse_err("empty header row".to_string()));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    for (row_idx, record) in rdr.records().enumerate() {
        let record = record?;
        for (col, cell) in record.iter().enumerate() {
            let value: f64 = cell.parse().map_err(|_| {
                parse_err(format!(
                    "bad numeric value '{}' in column '{}' (row {})",
                    cell,
                    headers[col],
                    row_idx + 2
                ))
            })?;
            columns[col].push(value);
        }
    }

    let npts = columns.first().map(|c| c.len()).unwrap_or(0);
    if npts == 0 {
        return Err(parse_err("no data rows".to_string()));
    }

    let mut scan = ScanRecord::new(name, npts, geometry)?;
    for (header, values) in headers.iter().zip(columns.iter()) {
        scan.set_column(header.clone(), Column::Array(values.clone()));
    }

    // 预积分列数据接入图像积分源；追加时会跑一遍积分把结果
    // 回写到 I/Ierr/Ibgr 列
    let pick = |label: &str| -> Option<Vec<f64>> {
        headers
            .iter()
            .position(|h| h == label)
            .map(|idx| columns[idx].clone())
    };
    let source = ColumnSource::new(npts, pick("I"), pick("Ierr"), pick("Ibgr"));
    scan.set_image(ImageScan::new(npts, Box::new(source)));

    Ok(scan)
}
