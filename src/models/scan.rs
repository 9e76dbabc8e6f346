//! # 扫描记录数据模型
//!
//! 一次衍射扫描的统一表示：命名数值列（整扫描标量或逐点数组）、
//! 测量几何（波长、表面法向）以及图像型扫描的积分子对象。
//!
//! 六个马达角列使用 spec 文件助记符：`phi, chi, eta, mu, nu, del`
//! （`delta` 作为 `del` 的别名接受）。
//!
//! ## 依赖关系
//! - 被 `parsers/` 构造，被 `ctr/` 读取
//! - 使用 `models/image.rs` 的 ImageScan

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CtrError, Result};
use crate::models::image::{ImageScan, IntegrateRequest};

/// 命名数值列：整扫描单值或逐点数组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Column {
    /// 整个扫描共用一个值（如固定的入射角马达）
    Scalar(f64),
    /// 逐点数组，长度必须等于扫描点数
    Array(Vec<f64>),
}

/// 测量几何配置
///
/// 波长只决定波矢模长 |k| = 2π/λ；各校正因子仅依赖方向，
/// 但仍要求 λ > 0 以保证波矢定义良好。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanGeometry {
    /// X 射线波长（Å）
    pub lambda: f64,
    /// 表面法向，phi 坐标系（默认沿 phi 轴 (0,0,1)）
    pub normal: [f64; 3],
}

impl Default for ScanGeometry {
    fn default() -> Self {
        Self {
            lambda: 1.0,
            normal: [0.0, 0.0, 1.0],
        }
    }
}

impl ScanGeometry {
    /// 校验几何配置
    pub fn validate(&self) -> Result<()> {
        if !(self.lambda > 0.0) || !self.lambda.is_finite() {
            return Err(CtrError::InvalidGeometry(format!(
                "wavelength must be positive, got {}",
                self.lambda
            )));
        }
        let n2 = self.normal.iter().map(|x| x * x).sum::<f64>();
        if n2 <= 0.0 || !n2.is_finite() {
            return Err(CtrError::InvalidGeometry(
                "surface normal must be a nonzero vector".to_string(),
            ));
        }
        Ok(())
    }
}

/// 一次衍射扫描
pub struct ScanRecord {
    /// 扫描名（通常来自文件名）
    name: String,
    /// 扫描点数
    npts: usize,
    /// 命名数值列
    columns: HashMap<String, Column>,
    /// 测量几何
    geometry: ScanGeometry,
    /// 图像型扫描的积分子对象
    image: Option<ImageScan>,
}

impl ScanRecord {
    /// 创建空扫描记录
    pub fn new(name: impl Into<String>, npts: usize, geometry: ScanGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            name: name.into(),
            npts,
            columns: HashMap::new(),
            geometry,
            image: None,
        })
    }

    /// 扫描名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 扫描点数
    pub fn npts(&self) -> usize {
        self.npts
    }

    /// 测量几何
    pub fn geometry(&self) -> &ScanGeometry {
        &self.geometry
    }

    /// 写入或替换一列
    pub fn set_column(&mut self, label: impl Into<String>, column: Column) {
        self.columns.insert(label.into(), column);
    }

    /// 读取某列在指定点的值
    ///
    /// 标量列广播到所有点；数组列长度与点数不符或列缺失时返回
    /// None，由调用方决定降级策略（马达角列：警告并取 0）。
    pub fn value_at(&self, label: &str, point: usize) -> Option<f64> {
        match self.columns.get(label)? {
            Column::Scalar(v) => Some(*v),
            Column::Array(values) => {
                if values.len() != self.npts {
                    return None;
                }
                values.get(point).copied()
            }
        }
    }

    /// 读取马达角列（接受 `delta` 作为 `del` 的别名）
    pub fn angle_at(&self, label: &str, point: usize) -> Option<f64> {
        match self.value_at(label, point) {
            Some(v) => Some(v),
            None if label == "del" => self.value_at("delta", point),
            None => None,
        }
    }

    /// 挂载图像积分子对象
    pub fn set_image(&mut self, image: ImageScan) {
        self.image = Some(image);
    }

    /// 图像积分子对象
    pub fn image(&self) -> Option<&ImageScan> {
        self.image.as_ref()
    }

    /// 图像积分子对象（可变）
    pub fn image_mut(&mut self) -> Option<&mut ImageScan> {
        self.image.as_mut()
    }

    /// 运行（或重跑）图像积分并刷新 I/Ierr/Ibgr 列
    ///
    /// 像素级积分委托给 `ImageScan` 的积分源；结果写回固定标签
    /// `I`, `Ierr`, `Ibgr`，保持标签间接寻址有效。
    pub fn integrate_image(&mut self, request: &IntegrateRequest) -> Result<()> {
        let image = self.image.as_mut().ok_or_else(|| {
            CtrError::Other(format!("Scan '{}' has no image data", self.name))
        })?;
        image.integrate(request);

        let (i, ierr, ibgr) = image.result_columns();
        self.columns.insert("I".to_string(), Column::Array(i));
        self.columns.insert("Ierr".to_string(), Column::Array(ierr));
        self.columns.insert("Ibgr".to_string(), Column::Array(ibgr));
        Ok(())
    }
}

impl std::fmt::Debug for ScanRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanRecord")
            .field("name", &self.name)
            .field("npts", &self.npts)
            .field("columns", &self.columns.keys().collect::<Vec<_>>())
            .field("geometry", &self.geometry)
            .field("has_image", &self.image.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_with_columns() -> ScanRecord {
        let mut scan = ScanRecord::new("s1", 3, ScanGeometry::default()).unwrap();
        scan.set_column("H", Column::Array(vec![1.0, 1.0, 1.0]));
        scan.set_column("mu", Column::Scalar(2.0));
        scan.set_column("short", Column::Array(vec![1.0, 2.0]));
        scan
    }

    #[test]
    fn test_value_at_array_and_scalar() {
        let scan = scan_with_columns();
        assert_eq!(scan.value_at("H", 2), Some(1.0));
        // scalar broadcasts to every point
        assert_eq!(scan.value_at("mu", 0), Some(2.0));
        assert_eq!(scan.value_at("mu", 2), Some(2.0));
    }

    #[test]
    fn test_value_at_missing_and_mismatched() {
        let scan = scan_with_columns();
        assert_eq!(scan.value_at("nu", 0), None);
        // length mismatch degrades to None, never panics
        assert_eq!(scan.value_at("short", 0), None);
    }

    #[test]
    fn test_angle_alias_delta() {
        let mut scan = scan_with_columns();
        scan.set_column("delta", Column::Scalar(20.0));
        assert_eq!(scan.angle_at("del", 1), Some(20.0));
    }

    #[test]
    fn test_geometry_validation() {
        assert!(ScanRecord::new(
            "bad",
            1,
            ScanGeometry {
                lambda: -1.0,
                normal: [0.0, 0.0, 1.0]
            }
        )
        .is_err());
        assert!(ScanRecord::new(
            "bad",
            1,
            ScanGeometry {
                lambda: 1.0,
                normal: [0.0, 0.0, 0.0]
            }
        )
        .is_err());
    }
}
