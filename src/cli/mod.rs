//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `reduce`: 约化扫描数据并导出结构因子列表
//! - `rods`: 按倒格棒分组查看
//! - `inspect`: 单点校正因子与参数诊断
//!
//! 三个子命令共享扫描输入参数（`ScanInputArgs`）与约化参数
//! （`ReductionArgs`），用 `#[command(flatten)]` 嵌入。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: reduce, rods, inspect

pub mod inspect;
pub mod reduce;
pub mod rods;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ctr::dataset::CorrectionChoice;
use crate::ctr::reduce::ColumnLabels;
use crate::error::{CtrError, Result};
use crate::models::params::{
    CorrectionParams, GeometryKind, RefAngles, SampleShape, ScanKind, Slits,
};

/// ctrkit - 同步辐射表面衍射 CTR 约化工具箱
#[derive(Parser)]
#[command(name = "ctrkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A synchrotron surface diffraction CTR reduction toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Reduce scan data to structure factors and export an HKL list
    Reduce(reduce::ReduceArgs),

    /// Group reduced points by reciprocal-lattice rod (H,K)
    Rods(rods::RodsArgs),

    /// Inspect one point: correction factors and tunable parameters
    Inspect(inspect::InspectArgs),
}

// ─────────────────────────────────────────────────────────────
// 共享参数: 扫描输入
// ─────────────────────────────────────────────────────────────

/// 扫描文件输入参数
#[derive(Args, Debug)]
pub struct ScanInputArgs {
    /// Input: scan file, directory, or glob pattern
    pub input: PathBuf,

    /// Glob pattern(s) for directory input (comma separated)
    #[arg(long, default_value = "*.csv,*.scan,*.dat")]
    pub pattern: String,

    /// Number of parallel parse jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,
}

// ─────────────────────────────────────────────────────────────
// 共享参数: 约化设置
// ─────────────────────────────────────────────────────────────

/// 强度列标签与几何校正参数
#[derive(Args, Debug)]
pub struct ReductionArgs {
    /// Intensity column label
    #[arg(long = "intensity", default_value = "I")]
    pub i_label: String,

    /// Normalization column label
    #[arg(long = "norm", default_value = "io")]
    pub inorm_label: String,

    /// Intensity-error column label
    #[arg(long = "err", default_value = "Ierr")]
    pub ierr_label: String,

    /// Background column label
    #[arg(long = "bgr", default_value = "Ibgr")]
    pub ibgr_label: String,

    /// Scan type (rocking scans are accepted but add no points)
    #[arg(long = "scan-type", value_enum, default_value_t = ScanKind::Image)]
    pub scan_type: ScanKind,

    /// Disable geometric corrections entirely (ctot = 1)
    #[arg(long, default_value_t = false)]
    pub no_correction: bool,

    /// Goniometer geometry
    #[arg(long, value_enum, default_value_t = GeometryKind::Psic)]
    pub geom: GeometryKind,

    /// Beam slit aperture "HxV" in mm (e.g. "0.6x0.8")
    #[arg(long)]
    pub beam_slits: Option<String>,

    /// Detector slit aperture "HxV" in mm (omit for a large area detector)
    #[arg(long)]
    pub det_slits: Option<String>,

    /// Round sample diameter in mm
    #[arg(long)]
    pub sample_dia: Option<f64>,

    /// Sample polygon vertices "x1,y1;x2,y2;..." in mm (phi frame)
    #[arg(long)]
    pub sample_polygon: Option<String>,

    /// Reference angles "phi,chi[,eta,mu]" at which the polygon was measured
    #[arg(long)]
    pub sample_angles: Option<String>,

    /// Intensity scale factor
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Horizontal polarization fraction
    #[arg(long, default_value_t = 1.0)]
    pub fh: f64,
}

impl ReductionArgs {
    /// 组装强度列标签
    pub fn labels(&self) -> ColumnLabels {
        ColumnLabels {
            i: self.i_label.clone(),
            inorm: self.inorm_label.clone(),
            ierr: self.ierr_label.clone(),
            ibgr: self.ibgr_label.clone(),
        }
    }

    /// 组装校正参数选择
    pub fn correction_choice(&self) -> Result<CorrectionChoice> {
        if self.no_correction {
            return Ok(CorrectionChoice::NoCorrection);
        }
        let sample = if let Some(dia) = self.sample_dia {
            SampleShape::Disk { diameter: dia }
        } else if let Some(ref polygon) = self.sample_polygon {
            SampleShape::Polygon {
                vertices: parse_polygon(polygon)?,
                reference_angles: match self.sample_angles {
                    Some(ref angles) => parse_ref_angles(angles)?,
                    None => RefAngles::default(),
                },
            }
        } else {
            SampleShape::None
        };
        let params = CorrectionParams {
            geom: self.geom,
            beam_slits: self.beam_slits.as_deref().map(parse_slits).transpose()?,
            det_slits: self.det_slits.as_deref().map(parse_slits).transpose()?,
            sample,
            scale: self.scale,
            fh: self.fh,
        };
        params.validate()?;
        Ok(CorrectionChoice::Params(params))
    }
}

/// 解析狭缝孔径（"0.6x0.8" 或 "0.6,0.8"）
pub fn parse_slits(input: &str) -> Result<Slits> {
    let parts: Vec<&str> = input.split(['x', 'X', ',']).collect();
    if parts.len() == 2 {
        if let (Ok(horz), Ok(vert)) = (parts[0].trim().parse(), parts[1].trim().parse()) {
            return Ok(Slits { horz, vert });
        }
    }
    Err(CtrError::InvalidArgument(format!(
        "Invalid slit aperture '{}'. Use \"HxV\", e.g. \"0.6x0.8\"",
        input
    )))
}

/// 解析样品多边形顶点（"x1,y1;x2,y2;..."）
pub fn parse_polygon(input: &str) -> Result<Vec<[f64; 2]>> {
    let bad = || {
        CtrError::InvalidArgument(format!(
            "Invalid sample polygon '{}'. Use \"x1,y1;x2,y2;...\" with at least 3 vertices",
            input
        ))
    };
    let mut vertices = Vec::new();
    for pair in input.split(';') {
        let coords: Vec<&str> = pair.split(',').collect();
        if coords.len() != 2 {
            return Err(bad());
        }
        let x: f64 = coords[0].trim().parse().map_err(|_| bad())?;
        let y: f64 = coords[1].trim().parse().map_err(|_| bad())?;
        vertices.push([x, y]);
    }
    if vertices.len() < 3 {
        return Err(bad());
    }
    Ok(vertices)
}

/// 解析样品参考角（"phi,chi[,eta,mu]"）
pub fn parse_ref_angles(input: &str) -> Result<RefAngles> {
    let bad = || {
        CtrError::InvalidArgument(format!(
            "Invalid reference angles '{}'. Use \"phi,chi\" or \"phi,chi,eta,mu\"",
            input
        ))
    };
    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse().map_err(|_| bad()))
        .collect::<Result<_>>()?;
    if values.is_empty() || values.len() > 4 {
        return Err(bad());
    }
    let mut angles = RefAngles {
        phi: values[0],
        ..Default::default()
    };
    if values.len() > 1 {
        angles.chi = values[1];
    }
    if values.len() > 2 {
        angles.eta = values[2];
    }
    if values.len() > 3 {
        angles.mu = values[3];
    }
    Ok(angles)
}
