//! # inspect 子命令实现
//!
//! 单个数据点的诊断视图：所在扫描、当前行值、校正因子分解
//! （偏振/洛伦兹/有效面积/ctot 及伪角），可选地先修改参数并
//! 原位重积分，或打印全部可调参数的扁平键值映射。
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的 InspectArgs
//! - 使用 `commands/mod.rs` 的共用加载流水线
//! - 使用 `ctr/dataset.rs`, `ctr/params.rs`, `ctr/correction.rs`

use std::collections::BTreeMap;

use tabled::{Table, Tabled};

use crate::cli::inspect::InspectArgs;
use crate::ctr::dataset::PointOverrides;
use crate::ctr::export::format_g6;
use crate::ctr::params;
use crate::error::{CtrError, Result};
use crate::models::image::Roi;
use crate::utils::output;

/// 执行单点诊断
pub fn execute(args: InspectArgs) -> Result<()> {
    output::print_header("Point Inspection");

    let mut ds = super::load_dataset(&args.input, &args.reduction)?;
    let index = args.point;

    // --set 编辑：先写设置，再随重积分生效
    if !args.set.is_empty() {
        let mut edits = BTreeMap::new();
        for item in &args.set {
            let (key, value) = item.split_once('=').ok_or_else(|| {
                CtrError::InvalidArgument(format!("--set expects KEY=VALUE, got '{}'", item))
            })?;
            edits.insert(key.trim().to_string(), value.trim().to_string());
        }
        params::set_parameters(&mut ds, index, &edits)?;
        output::print_info(&format!("Applied {} parameter edit(s)", args.set.len()));
    }

    let roi = match args.roi {
        Some(ref spec) => Some(parse_roi(spec)?),
        None => None,
    };
    let reintegrate =
        args.bad.is_some() || roi.is_some() || args.rotangle.is_some() || !args.set.is_empty();
    if reintegrate {
        let overrides = PointOverrides {
            bad: args.bad,
            roi,
            rotangle: args.rotangle,
            ..Default::default()
        };
        let warnings = ds.integrate_point(index, overrides)?;
        for warning in &warnings {
            output::print_warning(warning);
        }
        output::print_info("Point re-integrated with updated settings");
    }

    let scan_name = ds.get_scan_name(index)?.to_string();
    let (_, offset) = ds.get_scan(index)?;
    output::print_info(&format!(
        "Point {} -> scan '{}', offset {}{}",
        index,
        scan_name,
        offset,
        if ds.is_bad(index) { " (bad)" } else { "" }
    ));

    print_point_row(&ds, index);

    let (corr, warnings) = ds.get_correction(index)?;
    for warning in &warnings {
        output::print_warning(warning);
    }
    print_correction_factors(&corr);

    if args.show_params {
        print_parameter_map(&ds, index)?;
    }
    Ok(())
}

/// 解析 "x1,y1,x2,y2" 形式的 ROI
fn parse_roi(spec: &str) -> Result<Roi> {
    let bad = || {
        CtrError::InvalidArgument(format!(
            "Invalid ROI '{}'. Use \"x1,y1,x2,y2\"",
            spec
        ))
    };
    let values: Vec<i64> = spec
        .split(',')
        .map(|s| s.trim().parse().map_err(|_| bad()))
        .collect::<Result<_>>()?;
    if values.len() != 4 {
        return Err(bad());
    }
    Ok(Roi::from_list([values[0], values[1], values[2], values[3]]))
}

/// 当前行值
fn print_point_row(ds: &crate::ctr::dataset::CtrDataset, index: usize) {
    #[derive(Tabled)]
    struct ValueRow {
        #[tabled(rename = "H")]
        h: String,
        #[tabled(rename = "K")]
        k: String,
        #[tabled(rename = "L")]
        l: String,
        #[tabled(rename = "F")]
        f: String,
        #[tabled(rename = "Ferr")]
        ferr: String,
        #[tabled(rename = "I")]
        i: String,
        #[tabled(rename = "Inorm")]
        inorm: String,
        #[tabled(rename = "Ibgr")]
        ibgr: String,
        #[tabled(rename = "ctot")]
        ctot: String,
    }

    let row = ValueRow {
        h: format!("{:.3}", ds.h()[index]),
        k: format!("{:.3}", ds.k()[index]),
        l: format!("{:.3}", ds.l()[index]),
        f: format_g6(ds.f()[index]),
        ferr: format_g6(ds.ferr()[index]),
        i: format_g6(ds.i()[index]),
        inorm: format_g6(ds.inorm()[index]),
        ibgr: format_g6(ds.ibgr()[index]),
        ctot: format_g6(ds.ctot()[index]),
    };
    println!("{}", Table::new([row]));
}

/// 校正因子分解表
fn print_correction_factors(corr: &crate::ctr::correction::CtrCorrection) {
    #[derive(Tabled)]
    struct FactorRow {
        #[tabled(rename = "correction")]
        name: String,
        #[tabled(rename = "factor")]
        value: String,
    }

    let factors = corr.factors();
    for warning in &factors.warnings {
        output::print_warning(warning);
    }
    let rows = vec![
        FactorRow {
            name: "polarization".to_string(),
            value: format_g6(factors.polarization),
        },
        FactorRow {
            name: "lorentz".to_string(),
            value: format_g6(factors.lorentz),
        },
        FactorRow {
            name: "active area".to_string(),
            value: format_g6(factors.area),
        },
        FactorRow {
            name: "total (ctot)".to_string(),
            value: format_g6(factors.total),
        },
        FactorRow {
            name: "alpha (deg)".to_string(),
            value: format!("{:.4}", factors.alpha),
        },
        FactorRow {
            name: "beta (deg)".to_string(),
            value: format!("{:.4}", factors.beta),
        },
    ];
    println!("{}", Table::new(&rows));
}

/// 可调参数的扁平键值表
fn print_parameter_map(ds: &crate::ctr::dataset::CtrDataset, index: usize) -> Result<()> {
    #[derive(Tabled)]
    struct ParamRow {
        #[tabled(rename = "key")]
        key: String,
        #[tabled(rename = "value")]
        value: String,
    }

    let map = params::get_parameters(ds, index)?;
    let rows: Vec<ParamRow> = map
        .into_iter()
        .map(|(key, value)| ParamRow { key, value })
        .collect();
    println!("{}", Table::new(&rows));
    Ok(())
}
