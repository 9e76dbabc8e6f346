//! # rods 子命令实现
//!
//! 按倒格棒 (H,K) 分组展示约化结果：全部棒的汇总表，或指定
//! 一条棒的成员点列表（按 L 升序）。
//!
//! ## 依赖关系
//! - 使用 `cli/rods.rs` 定义的 RodsArgs
//! - 使用 `commands/mod.rs` 的共用加载流水线
//! - 使用 `ctr/rods.rs`，表格渲染用 `tabled`

use tabled::{Table, Tabled};

use crate::cli::rods::RodsArgs;
use crate::ctr::dataset::CtrDataset;
use crate::ctr::export::format_g6;
use crate::ctr::rods;
use crate::error::{CtrError, Result};
use crate::utils::output;

/// 执行棒分组查看
pub fn execute(args: RodsArgs) -> Result<()> {
    output::print_header("Reciprocal-Lattice Rod Grouping");

    let ds = super::load_dataset(&args.input, &args.reduction)?;

    match args.rod {
        Some(ref spec) => print_rod_members(&ds, spec, args.precision),
        None => {
            print_rod_summary(&ds, args.precision);
            Ok(())
        }
    }
}

/// 解析 "H,K" 形式的棒标识
fn parse_rod_spec(spec: &str) -> Result<(f64, f64)> {
    let bad = || {
        CtrError::InvalidArgument(format!(
            "Invalid rod spec '{}'. Use \"H,K\", e.g. \"1,0\"",
            spec
        ))
    };
    let parts: Vec<&str> = spec.split(',').collect();
    if parts.len() != 2 {
        return Err(bad());
    }
    let h: f64 = parts[0].trim().parse().map_err(|_| bad())?;
    let k: f64 = parts[1].trim().parse().map_err(|_| bad())?;
    Ok((h, k))
}

/// 全部棒的汇总表
fn print_rod_summary(ds: &CtrDataset, precision: u32) {
    #[derive(Tabled)]
    struct RodRow {
        #[tabled(rename = "H")]
        h: String,
        #[tabled(rename = "K")]
        k: String,
        #[tabled(rename = "points")]
        points: usize,
        #[tabled(rename = "L range")]
        l_range: String,
        #[tabled(rename = "F > 0")]
        nonzero: usize,
    }

    let sets = rods::sort_by_rod(ds, precision);
    let rows: Vec<RodRow> = sets
        .iter()
        .map(|rod| {
            let l_min = rod.points.first().map(|p| p.l).unwrap_or(0.0);
            let l_max = rod.points.last().map(|p| p.l).unwrap_or(0.0);
            RodRow {
                h: format!("{:.3}", rod.h),
                k: format!("{:.3}", rod.k),
                points: rod.points.len(),
                l_range: format!("{:.3} .. {:.3}", l_min, l_max),
                nonzero: rod.points.iter().filter(|p| p.f > 0.0).count(),
            }
        })
        .collect();

    if rows.is_empty() {
        output::print_warning("Dataset holds no points");
        return;
    }
    output::print_info(&format!("{} rod(s)", rows.len()));
    println!("{}", Table::new(&rows));
}

/// 一条棒的成员点列表（L 升序）
fn print_rod_members(ds: &CtrDataset, spec: &str, precision: u32) -> Result<()> {
    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "idx")]
        idx: usize,
        #[tabled(rename = "scan")]
        scan: String,
        #[tabled(rename = "L")]
        l: String,
        #[tabled(rename = "F")]
        f: String,
        #[tabled(rename = "Ferr")]
        ferr: String,
        #[tabled(rename = "I")]
        i: String,
        #[tabled(rename = "ctot")]
        ctot: String,
        #[tabled(rename = "flag")]
        flag: String,
    }

    let (h, k) = parse_rod_spec(spec)?;
    let mut indices = rods::points_for_rod(ds, h, k, precision);
    if indices.is_empty() {
        output::print_warning(&format!("No points on rod ({}, {})", h, k));
        return Ok(());
    }
    indices.sort_by(|&a, &b| ds.l()[a].total_cmp(&ds.l()[b]));

    let mut rows = Vec::with_capacity(indices.len());
    for idx in indices {
        rows.push(PointRow {
            idx,
            scan: ds.get_scan_name(idx)?.to_string(),
            l: format!("{:.3}", ds.l()[idx]),
            f: format_g6(ds.f()[idx]),
            ferr: format_g6(ds.ferr()[idx]),
            i: format_g6(ds.i()[idx]),
            ctot: format_g6(ds.ctot()[idx]),
            flag: if ds.is_bad(idx) { "bad" } else { "" }.to_string(),
        });
    }

    output::print_info(&format!("Rod ({}, {}): {} point(s)", h, k, rows.len()));
    println!("{}", Table::new(&rows));
    Ok(())
}
