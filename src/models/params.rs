//! # 校正参数数据模型
//!
//! 把原先松散的“参数字典”固化为带默认值的显式结构：
//! 狭缝孔径、样品外形（无/圆片/多边形）、几何类型、强度标度、
//! 水平偏振占比。所有字段在构造后通过 `validate` 校验，
//! 配置缺陷立即硬失败而不是悄悄吞掉。
//!
//! ## 依赖关系
//! - 被 `ctr/` 与 `cli/` 使用
//! - 使用 `serde` 派生、`clap::ValueEnum`

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CtrError, Result};

/// 狭缝孔径（mm），phi 坐标系
///
/// horz = 实验室 z 方向（水平散射面内）的总宽，
/// vert = 实验室 x 方向（竖直散射面内）的总高。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slits {
    pub horz: f64,
    pub vert: f64,
}

/// 样品外形定位用的参考角（度）
///
/// 多边形顶点是在这些仪器角下测量的；校正时按
/// `Z_now · Z_refᵀ` 把顶点带到当前取向。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RefAngles {
    pub phi: f64,
    pub chi: f64,
    pub eta: f64,
    pub mu: f64,
}

/// 样品外形描述
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SampleShape {
    /// 不做样品裁剪
    #[default]
    None,
    /// 圆片样品，装在旋转中心上
    Disk { diameter: f64 },
    /// 任意多边形，顶点为参考角下的 phi 系坐标 [x, y]（表面内，z=0）
    Polygon {
        vertices: Vec<[f64; 2]>,
        reference_angles: RefAngles,
    },
}

/// 测角仪几何类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Psic (4S+2D) 六圆几何
    #[default]
    Psic,
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::Psic => write!(f, "psic"),
        }
    }
}

/// 扫描类型
///
/// 摇摆扫描的积分上游并未实现；这里保留显式变体，
/// append 时报告“不支持”而不是悄悄丢数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum ScanKind {
    /// 静止图像扫描，每个扫描点对应一个 HKL
    #[default]
    Image,
    /// 摇摆扫描（未实现）
    Rocking,
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanKind::Image => write!(f, "image"),
            ScanKind::Rocking => write!(f, "rocking"),
        }
    }
}

/// 几何校正参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionParams {
    /// 测角仪几何
    pub geom: GeometryKind,
    /// 入射光束狭缝；缺省时有效面积校正取 1 并给出警告
    pub beam_slits: Option<Slits>,
    /// 探测器狭缝；大面积探测器可不设，只算样品溢出
    pub det_slits: Option<Slits>,
    /// 样品外形
    pub sample: SampleShape,
    /// 强度标度因子（如 Io ~ 1e6 cps 时取 1e6 使归一强度接近 cps）
    pub scale: f64,
    /// 水平偏振占比 fh，1.0 = 完全水平偏振
    pub fh: f64,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            geom: GeometryKind::Psic,
            beam_slits: None,
            det_slits: None,
            sample: SampleShape::None,
            scale: 1.0,
            fh: 1.0,
        }
    }
}

impl CorrectionParams {
    /// 校验参数；配置缺陷返回硬错误
    pub fn validate(&self) -> Result<()> {
        let check_slits = |name: &str, slits: &Slits| -> Result<()> {
            if !(slits.horz > 0.0) || !(slits.vert > 0.0) {
                return Err(CtrError::InvalidCorrectionParams(format!(
                    "{} must have positive horz/vert, got {}x{}",
                    name, slits.horz, slits.vert
                )));
            }
            Ok(())
        };
        if let Some(ref slits) = self.beam_slits {
            check_slits("beam_slits", slits)?;
        }
        if let Some(ref slits) = self.det_slits {
            check_slits("det_slits", slits)?;
        }
        match &self.sample {
            SampleShape::None => {}
            SampleShape::Disk { diameter } => {
                if !(*diameter > 0.0) {
                    return Err(CtrError::InvalidCorrectionParams(format!(
                        "sample diameter must be positive, got {}",
                        diameter
                    )));
                }
            }
            SampleShape::Polygon { vertices, .. } => {
                if vertices.len() < 3 {
                    return Err(CtrError::InvalidCorrectionParams(format!(
                        "sample polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
            }
        }
        if !self.scale.is_finite() {
            return Err(CtrError::InvalidCorrectionParams(format!(
                "scale must be finite, got {}",
                self.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.fh) {
            return Err(CtrError::InvalidCorrectionParams(format!(
                "polarization fraction must be in [0, 1], got {}",
                self.fh
            )));
        }
        Ok(())
    }
}
