//! # 图像积分状态模型
//!
//! 图像型扫描的逐点积分设置（ROI、旋转角、背景参数）与积分结果。
//! 像素级积分本身是外部协作方：通过 `IntegrationSource` 特征对象
//! 委托出去，本 crate 自带的 `ColumnSource` 直接提供上游已积分的
//! 列数据（重处理束线导出文件的常见情形）。
//!
//! 背景参数沿用逐列/逐行幂律背景拟合的参数集
//! （nbgr/width/power/tangent 各轴一套，外加 nline/filter/compress）。
//!
//! ## 依赖关系
//! - 被 `models/scan.rs` 持有
//! - 被 `ctr/dataset.rs` 经 `integrate_point` 驱动

use std::fmt;

use serde::{Deserialize, Serialize};

/// 图像感兴趣区域，像素坐标 [x1, y1, x2, y2]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Roi {
    /// 从四元列表构造
    pub fn from_list(v: [i64; 4]) -> Self {
        Self {
            x1: v[0],
            y1: v[1],
            x2: v[2],
            y2: v[3],
        }
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// 背景拟合参数（逐列/逐行）
///
/// `flag`: 0 = 不扣背景，1 = 仅列方向，2 = 仅行方向，3 = 双向。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgrParams {
    pub flag: u8,
    pub col_nbgr: usize,
    pub col_width: f64,
    pub col_power: f64,
    pub col_tangent: bool,
    pub row_nbgr: usize,
    pub row_width: f64,
    pub row_power: f64,
    pub row_tangent: bool,
    pub nline: usize,
    pub filter: bool,
    pub compress: usize,
}

impl Default for BgrParams {
    fn default() -> Self {
        Self {
            flag: 1,
            col_nbgr: 5,
            col_width: 0.0,
            col_power: 2.0,
            col_tangent: false,
            row_nbgr: 5,
            row_width: 0.0,
            row_power: 2.0,
            row_tangent: false,
            nline: 1,
            filter: false,
            compress: 1,
        }
    }
}

/// 单点积分结果
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointIntegration {
    pub i: f64,
    pub ierr: f64,
    pub ibgr: f64,
}

/// 像素级积分的外部协作方接口
///
/// 给定一个点的积分设置，返回积分强度、误差与背景。
/// `excluded` 为真表示该点被标记为坏点并应从积分中剔除。
pub trait IntegrationSource: Send + Sync {
    fn integrate(
        &self,
        point: usize,
        roi: Option<&Roi>,
        rotangle: f64,
        bgr: &BgrParams,
        excluded: bool,
    ) -> PointIntegration;
}

/// 预积分列数据源
///
/// 上游采集链已经做过像素积分时使用：逐点返回存储值，
/// 对被剔除的点返回零。
pub struct ColumnSource {
    i: Vec<f64>,
    ierr: Vec<f64>,
    ibgr: Vec<f64>,
}

impl ColumnSource {
    /// 由三条预积分列构造（缺失的列以零补齐到 npts）
    pub fn new(npts: usize, i: Option<Vec<f64>>, ierr: Option<Vec<f64>>, ibgr: Option<Vec<f64>>) -> Self {
        let fill = |v: Option<Vec<f64>>| {
            let mut v = v.unwrap_or_default();
            v.resize(npts, 0.0);
            v
        };
        Self {
            i: fill(i),
            ierr: fill(ierr),
            ibgr: fill(ibgr),
        }
    }
}

impl IntegrationSource for ColumnSource {
    fn integrate(
        &self,
        point: usize,
        _roi: Option<&Roi>,
        _rotangle: f64,
        _bgr: &BgrParams,
        excluded: bool,
    ) -> PointIntegration {
        if excluded {
            return PointIntegration::default();
        }
        PointIntegration {
            i: self.i.get(point).copied().unwrap_or(0.0),
            ierr: self.ierr.get(point).copied().unwrap_or(0.0),
            ibgr: self.ibgr.get(point).copied().unwrap_or(0.0),
        }
    }
}

/// 一次积分请求
///
/// `points` 为 None 表示整个扫描；设置覆盖项只作用于目标点并
/// 持久保存，供之后的重积分复用。
#[derive(Default)]
pub struct IntegrateRequest {
    pub points: Option<Vec<usize>>,
    pub roi: Option<Roi>,
    pub rotangle: Option<f64>,
    pub bgr: Option<BgrParams>,
    pub excluded: Vec<usize>,
}

/// 图像型扫描的积分子对象
///
/// 逐点保存积分设置与最近一次的积分结果，可按扫描内偏移寻址。
pub struct ImageScan {
    integrated: bool,
    rois: Vec<Option<Roi>>,
    rotangles: Vec<f64>,
    bgr: Vec<BgrParams>,
    results: Vec<PointIntegration>,
    source: Box<dyn IntegrationSource>,
}

impl ImageScan {
    /// 创建尚未积分的图像扫描状态
    pub fn new(npts: usize, source: Box<dyn IntegrationSource>) -> Self {
        Self {
            integrated: false,
            rois: vec![None; npts],
            rotangles: vec![0.0; npts],
            bgr: vec![BgrParams::default(); npts],
            results: vec![PointIntegration::default(); npts],
            source,
        }
    }

    /// 点数
    pub fn npts(&self) -> usize {
        self.results.len()
    }

    /// 是否已经积分过
    pub fn is_integrated(&self) -> bool {
        self.integrated
    }

    /// 运行积分
    ///
    /// 覆盖项先写入目标点的持久设置，再对目标点委托积分源重算。
    /// 越界点索引被忽略。
    pub fn integrate(&mut self, request: &IntegrateRequest) {
        let npts = self.npts();
        let targets: Vec<usize> = match &request.points {
            Some(points) => points.iter().copied().filter(|&p| p < npts).collect(),
            None => (0..npts).collect(),
        };

        for &p in &targets {
            if let Some(roi) = request.roi {
                self.rois[p] = Some(roi);
            }
            if let Some(rot) = request.rotangle {
                self.rotangles[p] = rot;
            }
            if let Some(ref bgr) = request.bgr {
                self.bgr[p] = bgr.clone();
            }
            let excluded = request.excluded.contains(&p);
            self.results[p] = self.source.integrate(
                p,
                self.rois[p].as_ref(),
                self.rotangles[p],
                &self.bgr[p],
                excluded,
            );
        }
        self.integrated = true;
    }

    /// 指定点的 ROI
    pub fn roi(&self, point: usize) -> Option<&Roi> {
        self.rois.get(point).and_then(|r| r.as_ref())
    }

    /// 写入指定点的 ROI
    pub fn set_roi(&mut self, point: usize, roi: Option<Roi>) {
        if let Some(slot) = self.rois.get_mut(point) {
            *slot = roi;
        }
    }

    /// 指定点的图像旋转角（度）
    pub fn rotangle(&self, point: usize) -> f64 {
        self.rotangles.get(point).copied().unwrap_or(0.0)
    }

    /// 写入指定点的旋转角
    pub fn set_rotangle(&mut self, point: usize, rotangle: f64) {
        if let Some(slot) = self.rotangles.get_mut(point) {
            *slot = rotangle;
        }
    }

    /// 指定点的背景参数
    pub fn bgr(&self, point: usize) -> &BgrParams {
        &self.bgr[point]
    }

    /// 写入指定点的背景参数
    pub fn set_bgr(&mut self, point: usize, bgr: BgrParams) {
        if let Some(slot) = self.bgr.get_mut(point) {
            *slot = bgr;
        }
    }

    /// 指定点的最近积分结果
    pub fn result(&self, point: usize) -> PointIntegration {
        self.results.get(point).copied().unwrap_or_default()
    }

    /// 积分结果展开为三条列 (I, Ierr, Ibgr)
    pub fn result_columns(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let i = self.results.iter().map(|r| r.i).collect();
        let ierr = self.results.iter().map(|r| r.ierr).collect();
        let ibgr = self.results.iter().map(|r| r.ibgr).collect();
        (i, ierr, ibgr)
    }
}

impl fmt::Debug for ImageScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageScan")
            .field("npts", &self.npts())
            .field("integrated", &self.integrated)
            .finish()
    }
}
