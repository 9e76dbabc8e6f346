//! # 几何模块
//!
//! 测角仪角度/波矢计算与光斑-样品有效面积几何。
//!
//! ## 子模块
//! - `gonio`: psic 六圆测角仪，伪角与波矢
//! - `polygon`: 二维多边形面积/裁剪原语
//! - `area`: 光束足迹、探测器接收与样品外形的重叠面积
//!
//! ## 依赖关系
//! - 被 `ctr/correction.rs` 使用
//! - 使用 `models/params.rs` 的狭缝/样品描述

pub mod area;
pub mod gonio;
pub mod polygon;

pub use gonio::{Angles, PseudoAngles, Psic};
