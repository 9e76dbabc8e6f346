//! # 批量处理模块
//!
//! 扫描文件的收集与并行解析。注意并行只发生在文件解析阶段；
//! 数据集聚合本身保持单线程、同步，调用方按输入顺序逐个追加。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录/glob 模式）
//! - 收集匹配文件列表
//! - 并行解析
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被各命令模块使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner};
