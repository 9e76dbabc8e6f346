//! # 单点归算
//!
//! 把一个图像扫描点的原始量 (I, Inorm, Ierr, Ibgr) 与校正引擎的
//! ctot 组合成结构因子模量及其误差：
//!
//! ```text
//! k    = scale · ctot / Inorm
//! F    = sqrt(k · I)
//! Ferr = 0.5 · sqrt(k) · Ierr / sqrt(I)
//! ```
//!
//! Ferr 是 F = sqrt(k·I) 的一阶误差传播，微分时视 k 为常数。
//! I ≤ 0 或 Inorm ≤ 0 时 F = Ferr = 0。
//!
//! ## 依赖关系
//! - 被 `ctr/dataset.rs` 调用
//! - 使用 `ctr/correction.rs`, `geom/gonio.rs`, `models/`

use serde::{Deserialize, Serialize};

use crate::ctr::correction::CtrCorrection;
use crate::error::{CtrError, Result};
use crate::geom::gonio::{AngleUpdate, Psic};
use crate::models::params::CorrectionParams;
use crate::models::scan::ScanRecord;

/// 四条强度列的标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLabels {
    pub i: String,
    pub inorm: String,
    pub ierr: String,
    pub ibgr: String,
}

impl Default for ColumnLabels {
    fn default() -> Self {
        Self {
            i: "I".to_string(),
            inorm: "io".to_string(),
            ierr: "Ierr".to_string(),
            ibgr: "Ibgr".to_string(),
        }
    }
}

/// 单点归算结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointValue {
    pub i: f64,
    pub inorm: f64,
    pub ierr: f64,
    pub ibgr: f64,
    pub ctot: f64,
    pub f: f64,
    pub ferr: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// 归算结果加上过程警告（缺失马达角等）
#[derive(Debug, Clone)]
pub struct ReducedPoint {
    pub value: PointValue,
    pub warnings: Vec<String>,
}

/// 按扫描的某一点更新测角仪角度
///
/// 缺失或长度不符的角列降级为 0 并记一条警告，处理不中断。
pub fn update_angles_from_scan(gonio: &mut Psic, scan: &ScanRecord, point: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut read = |label: &str| -> f64 {
        match scan.angle_at(label, point) {
            Some(v) => v,
            None => {
                warnings.push(format!("no {} angle in scan '{}'", label, scan.name()));
                0.0
            }
        }
    };
    let update = AngleUpdate {
        phi: Some(read("phi")),
        chi: Some(read("chi")),
        eta: Some(read("eta")),
        mu: Some(read("mu")),
        nu: Some(read("nu")),
        delta: Some(read("del")),
    };
    gonio.set_angles(update);
    warnings
}

/// 为扫描的某一点构建校正引擎（测角仪设到该点的角度）
pub fn build_correction(
    scan: &ScanRecord,
    point: usize,
    params: &CorrectionParams,
) -> Result<(CtrCorrection, Vec<String>)> {
    params.validate()?;
    let geometry = scan.geometry();
    let mut gonio = Psic::new(geometry.lambda, geometry.normal)?;
    let warnings = update_angles_from_scan(&mut gonio, scan, point);
    Ok((CtrCorrection::new(gonio, params), warnings))
}

/// 读取必需的强度列；缺列是调用方配置缺陷，硬失败
fn required_column(scan: &ScanRecord, label: &str, point: usize) -> Result<f64> {
    scan.value_at(label, point).ok_or_else(|| {
        CtrError::Other(format!(
            "Scan '{}' has no usable column '{}'",
            scan.name(),
            label
        ))
    })
}

/// 归算一个图像扫描点
///
/// `params` 为 None 时不做校正（ctot = 1, scale = 1）。
pub fn reduce_image_point(
    scan: &ScanRecord,
    point: usize,
    labels: &ColumnLabels,
    params: Option<&CorrectionParams>,
) -> Result<ReducedPoint> {
    let mut value = PointValue {
        i: required_column(scan, &labels.i, point)?,
        inorm: required_column(scan, &labels.inorm, point)?,
        ierr: required_column(scan, &labels.ierr, point)?,
        ibgr: required_column(scan, &labels.ibgr, point)?,
        ctot: 1.0,
        ..Default::default()
    };
    let mut warnings = Vec::new();

    let scale = match params {
        None => 1.0,
        Some(params) => {
            let (corr, angle_warnings) = build_correction(scan, point, params)?;
            warnings.extend(angle_warnings);
            let factors = corr.factors();
            warnings.extend(factors.warnings);
            value.ctot = factors.total;
            value.alpha = factors.alpha;
            value.beta = factors.beta;
            params.scale
        }
    };

    if value.i <= 0.0 || value.inorm <= 0.0 {
        value.f = 0.0;
        value.ferr = 0.0;
    } else {
        let k = scale * value.ctot / value.inorm;
        value.f = (k * value.i).sqrt();
        value.ferr = 0.5 * k.sqrt() * value.ierr / value.i.sqrt();
    }

    Ok(ReducedPoint { value, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::{Column, ScanGeometry};

    fn plain_scan() -> ScanRecord {
        let mut scan = ScanRecord::new("s1", 3, ScanGeometry::default()).unwrap();
        scan.set_column("I", Column::Array(vec![100.0, 200.0, 300.0]));
        scan.set_column("io", Column::Scalar(10.0));
        scan.set_column("Ierr", Column::Array(vec![10.0, 14.1, 17.3]));
        scan.set_column("Ibgr", Column::Scalar(0.0));
        scan
    }

    #[test]
    fn test_reduce_without_corrections() {
        // Scenario A: no correction parameters => ctot = 1,
        // F = sqrt(I/Inorm)
        let scan = plain_scan();
        let labels = ColumnLabels::default();
        let expected = [3.162, 4.472, 5.477];
        for (point, want) in expected.iter().enumerate() {
            let reduced = reduce_image_point(&scan, point, &labels, None).unwrap();
            assert_eq!(reduced.value.ctot, 1.0);
            assert!((reduced.value.f - want).abs() < 1e-3);
        }
    }

    #[test]
    fn test_reduce_zero_intensity() {
        // Scenario B: I = 0 => F = 0, Ferr = 0
        let mut scan = plain_scan();
        scan.set_column("I", Column::Array(vec![0.0, 200.0, 300.0]));
        let reduced = reduce_image_point(&scan, 0, &ColumnLabels::default(), None).unwrap();
        assert_eq!(reduced.value.f, 0.0);
        assert_eq!(reduced.value.ferr, 0.0);
        assert_eq!(reduced.value.i, 0.0);
    }

    #[test]
    fn test_reduce_zero_norm() {
        let mut scan = plain_scan();
        scan.set_column("io", Column::Scalar(0.0));
        let reduced = reduce_image_point(&scan, 1, &ColumnLabels::default(), None).unwrap();
        assert_eq!(reduced.value.f, 0.0);
        assert_eq!(reduced.value.ferr, 0.0);
    }

    #[test]
    fn test_ferr_first_order_propagation() {
        let scan = plain_scan();
        let reduced = reduce_image_point(&scan, 0, &ColumnLabels::default(), None).unwrap();
        // k = 1/10, F = sqrt(10), Ferr = 0.5*sqrt(0.1)*10/10
        assert!((reduced.value.f - 10.0_f64.sqrt()).abs() < 1e-12);
        assert!((reduced.value.ferr - 0.5 * 0.1_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_angles_warn_and_default() {
        let scan = plain_scan();
        let params = CorrectionParams::default();
        let reduced = reduce_image_point(&scan, 0, &ColumnLabels::default(), Some(&params))
            .unwrap();
        // all six angles missing: six warnings, angles default to 0
        assert_eq!(
            reduced
                .warnings
                .iter()
                .filter(|w| w.contains("angle"))
                .count(),
            6
        );
        assert_eq!(reduced.value.alpha, 0.0);
        assert_eq!(reduced.value.beta, 0.0);
    }

    #[test]
    fn test_unmeasurable_geometry_zeroes_f_not_i() {
        // Scenario D: alpha < 0 => ctot = 0 => F = 0 even though I > 0.
        // This is a distinct path from the I <= 0 one: ctot tells them apart.
        let mut scan = plain_scan();
        scan.set_column("mu", Column::Scalar(-1.0));
        scan.set_column("chi", Column::Scalar(0.0));
        scan.set_column("phi", Column::Scalar(0.0));
        scan.set_column("eta", Column::Scalar(0.0));
        scan.set_column("nu", Column::Scalar(20.0));
        scan.set_column("del", Column::Scalar(0.0));
        let params = CorrectionParams {
            beam_slits: Some(crate::models::params::Slits {
                horz: 0.6,
                vert: 0.8,
            }),
            ..Default::default()
        };
        let reduced = reduce_image_point(&scan, 0, &ColumnLabels::default(), Some(&params))
            .unwrap();
        assert!(reduced.value.i > 0.0);
        assert_eq!(reduced.value.ctot, 0.0);
        assert_eq!(reduced.value.f, 0.0);
        assert_eq!(reduced.value.ferr, 0.0);
    }

    #[test]
    fn test_missing_intensity_column_is_hard_error() {
        let scan = plain_scan();
        let labels = ColumnLabels {
            i: "I_missing".to_string(),
            ..Default::default()
        };
        assert!(reduce_image_point(&scan, 0, &labels, None).is_err());
    }
}
