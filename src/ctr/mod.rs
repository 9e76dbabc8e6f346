//! # CTR 约化模块
//!
//! 晶体截断棒结构因子约化的核心：逐点几何校正、强度到 |F| 的
//! 归算、全量数据点的列式聚合存储、按倒格棒的派生分组与导出。
//!
//! ## 子模块
//! - `correction`: 偏振/洛伦兹/有效面积校正引擎
//! - `reduce`: 单点强度 → (F, Ferr) 归算
//! - `dataset`: 列式数据集（唯一的可变真值存储）
//! - `rods`: 按 (H,K) 的棒分组查询（派生，随算随取）
//! - `params`: 逐点可调参数的扁平键值往返
//! - `export`: HKL 列表与棒表导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `geom/`

pub mod correction;
pub mod dataset;
pub mod export;
pub mod params;
pub mod reduce;
pub mod rods;

pub use correction::{CorrectionFactors, CtrCorrection};
pub use dataset::{AppendOptions, AppendReport, CorrectionChoice, CtrDataset, PointOverrides};
pub use reduce::{ColumnLabels, PointValue};
pub use rods::{RodPoint, RodSet};
