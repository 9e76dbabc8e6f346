//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑，并提供三个子命令共用的前置流水线：
//! 收集扫描文件 → 并行解析 → 单线程聚合成 CTR 数据集。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `batch/`, `ctr/`, `utils/`
//! - 子模块: reduce, rods, inspect

pub mod inspect;
pub mod reduce;
pub mod rods;

use std::path::PathBuf;

use crate::batch::{BatchRunner, FileCollector};
use crate::cli::{Commands, ReductionArgs, ScanInputArgs};
use crate::ctr::dataset::{AppendOptions, CtrDataset};
use crate::error::{CtrError, Result};
use crate::parsers;
use crate::utils::output;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Reduce(args) => reduce::execute(args),
        Commands::Rods(args) => rods::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}

/// 收集、解析并聚合扫描数据
///
/// 解析阶段并行；聚合阶段单线程按文件名顺序追加，保证全局点
/// 索引可复现。解析失败的文件记警告后跳过，不中断批处理。
pub(crate) fn load_dataset(
    input: &ScanInputArgs,
    reduction: &ReductionArgs,
) -> Result<CtrDataset> {
    let files = collect_files(input)?;
    output::print_info(&format!("Found {} scan file(s)", files.len()));

    let runner = BatchRunner::new(input.jobs);
    let (scans, batch) = runner.run(files, |file| {
        parsers::parse_scan_file(file).map_err(|e| e.to_string())
    });

    if batch.failed > 0 {
        output::print_warning(&format!("{} file(s) failed to parse", batch.failed));
        for (path, err) in batch.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if batch.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", batch.failures.len() - 10));
        }
    }
    if scans.is_empty() {
        return Err(CtrError::NoFilesFound {
            pattern: input.pattern.clone(),
        });
    }

    let options = AppendOptions {
        labels: Some(reduction.labels()),
        corr: reduction.correction_choice()?,
        kind: Some(reduction.scan_type),
    };
    let (ds, report) = CtrDataset::from_scans(scans, options)?;
    for warning in &report.warnings {
        output::print_warning(warning);
    }
    output::print_info(&format!(
        "Aggregated {} points from {} scan(s)",
        report.points_added, report.scans_added
    ));
    Ok(ds)
}

/// 解析输入路径为文件列表（存在的文件/目录，或 glob 模式）
fn collect_files(input: &ScanInputArgs) -> Result<Vec<PathBuf>> {
    if input.input.exists() {
        let collector = FileCollector::new(input.input.clone())
            .with_pattern(&input.pattern)
            .recursive(input.recursive);
        let files = collector.collect();
        if files.is_empty() {
            return Err(CtrError::NoFilesFound {
                pattern: input.pattern.clone(),
            });
        }
        return Ok(files);
    }

    // 输入路径不存在：按 glob 模式展开
    let pattern = input.input.display().to_string();
    if !pattern.contains(['*', '?', '[']) {
        return Err(CtrError::FileNotFound { path: pattern });
    }
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| {
            CtrError::InvalidArgument(format!("Bad glob pattern '{}': {}", pattern, e))
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(CtrError::NoFilesFound { pattern });
    }
    Ok(files)
}
