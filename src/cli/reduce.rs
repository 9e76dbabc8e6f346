//! # reduce 子命令 CLI 定义
//!
//! 读取扫描数据、应用几何校正并导出结构因子列表。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/reduce.rs`

use std::path::PathBuf;

use clap::Args;

use crate::cli::{ReductionArgs, ScanInputArgs};

/// reduce 子命令参数
#[derive(Args, Debug)]
pub struct ReduceArgs {
    #[command(flatten)]
    pub input: ScanInputArgs,

    #[command(flatten)]
    pub reduction: ReductionArgs,

    /// Output HKL list file
    #[arg(short, long, default_value = "ctr.lst")]
    pub output: PathBuf,

    /// Also dump the rod-sorted table as CSV
    #[arg(long)]
    pub rod_csv: Option<PathBuf>,

    /// H/K rounding precision (decimals) for rod grouping
    #[arg(long, default_value_t = 3)]
    pub precision: u32,
}
