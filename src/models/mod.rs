//! # 数据模型模块
//!
//! 定义扫描记录、图像积分状态与校正参数的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `ctr/`, `commands/` 使用
//! - 子模块: scan, image, params

pub mod image;
pub mod params;
pub mod scan;

pub use image::{BgrParams, ColumnSource, ImageScan, IntegrationSource, PointIntegration, Roi};
pub use params::{CorrectionParams, GeometryKind, RefAngles, SampleShape, ScanKind, Slits};
pub use scan::{Column, ScanGeometry, ScanRecord};
