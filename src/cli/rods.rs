//! # rods 子命令 CLI 定义
//!
//! 按倒格棒 (H,K) 分组查看约化结果。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/rods.rs`

use clap::Args;

use crate::cli::{ReductionArgs, ScanInputArgs};

/// rods 子命令参数
#[derive(Args, Debug)]
pub struct RodsArgs {
    #[command(flatten)]
    pub input: ScanInputArgs,

    #[command(flatten)]
    pub reduction: ReductionArgs,

    /// Show the member points of one rod, e.g. "1,0"
    #[arg(long)]
    pub rod: Option<String>,

    /// H/K rounding precision (decimals) for rod grouping
    #[arg(long, default_value_t = 3)]
    pub precision: u32,
}
