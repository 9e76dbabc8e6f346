//! # 数据导出
//!
//! 结构因子列表（HKL 纯文本）与按棒排序的 CSV 表。
//!
//! ## HKL 格式
//! 表头 `#idx H K L F Ferr`，每个 I > 0 的点一行：整数索引、
//! H/K 取最近整数显示、L 保留 3 位小数、F/Ferr 用 6 位有效数字
//! 的通用数字格式。
//!
//! ## 依赖关系
//! - 被 `commands/reduce.rs` 调用
//! - 读取 `ctr/dataset.rs`, `ctr/rods.rs`
//! - 使用 `csv` 库写棒表

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::ctr::dataset::CtrDataset;
use crate::ctr::rods::RodSet;
use crate::error::{CtrError, Result};

/// 6 位有效数字的通用数字格式（C 的 %.6g）
pub fn format_g6(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return format!("{}", x);
    }
    let exp = x.abs().log10().floor() as i32;
    let mut s = if exp < -4 || exp > 5 {
        format!("{:.5e}", x)
    } else {
        let prec = (5 - exp).max(0) as usize;
        format!("{:.*}", prec, x)
    };
    // 去掉小数部分的尾零
    if let Some(epos) = s.find('e') {
        let (mantissa, exponent) = s.split_at(epos);
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        s = format!("{}{}", mantissa, exponent);
    } else if s.contains('.') {
        s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    s
}

/// 导出 HKL 结构因子列表；返回写出的点数
pub fn write_hkl(ds: &CtrDataset, path: &Path) -> Result<usize> {
    let mut file = File::create(path).map_err(|e| CtrError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    let map_io = |e: std::io::Error| CtrError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    writeln!(file, "#idx {:>5} {:>5} {:>5} {:>7} {:>7}", "H", "K", "L", "F", "Ferr")
        .map_err(map_io)?;
    let mut written = 0;
    for idx in 0..ds.len() {
        if ds.i()[idx] <= 0.0 {
            continue;
        }
        writeln!(
            file,
            "{:4} {:3.2} {:3.2} {:6.3} {:>6} {:>6}",
            idx,
            ds.h()[idx].round(),
            ds.k()[idx].round(),
            ds.l()[idx],
            format_g6(ds.f()[idx]),
            format_g6(ds.ferr()[idx]),
        )
        .map_err(map_io)?;
        written += 1;
    }
    Ok(written)
}

/// 导出按棒排序的 CSV 表
pub fn write_rod_csv(rods: &[RodSet], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "rod_H", "rod_K", "idx", "H", "K", "L", "F", "Ferr", "I", "Inorm", "Ierr", "Ibgr",
    ])?;
    for rod in rods {
        for p in &rod.points {
            wtr.write_record([
                format!("{:.3}", rod.h),
                format!("{:.3}", rod.k),
                p.index.to_string(),
                format!("{:.3}", p.h),
                format!("{:.3}", p.k),
                format!("{:.4}", p.l),
                format_g6(p.f),
                format_g6(p.ferr),
                format_g6(p.i),
                format_g6(p.inorm),
                format_g6(p.ierr),
                format_g6(p.ibgr),
            ])?;
        }
    }
    wtr.flush().map_err(|e| CtrError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
