//! # inspect 子命令 CLI 定义
//!
//! 查看单个数据点的校正因子分解，可选地修改积分/校正参数并
//! 原位重积分。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use clap::Args;

use crate::cli::{ReductionArgs, ScanInputArgs};

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: ScanInputArgs,

    #[command(flatten)]
    pub reduction: ReductionArgs,

    /// Global point index to inspect
    #[arg(short, long)]
    pub point: usize,

    /// Override the image ROI "x1,y1,x2,y2" and re-integrate
    #[arg(long)]
    pub roi: Option<String>,

    /// Override the image rotation angle (degrees) and re-integrate
    #[arg(long)]
    pub rotangle: Option<f64>,

    /// Flag (true) or unflag (false) the point as bad and re-integrate
    #[arg(long)]
    pub bad: Option<bool>,

    /// Set a tunable parameter "key=value" (repeatable), then re-integrate
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Show the point's flat parameter map
    #[arg(long, default_value_t = false)]
    pub show_params: bool,
}
