//! # ctrkit - 同步辐射表面衍射 CTR 约化工具箱
//!
//! 将逐点的衍射扫描测量转换为经几何校正的晶体截断棒 (CTR)
//! 结构因子模量，统一成单一可执行文件。
//!
//! ## 子命令
//! - `reduce`  - 读取扫描数据，应用校正并导出结构因子列表
//! - `rods`    - 按倒格棒 (H,K) 分组并显示汇总/成员列表
//! - `inspect` - 查看单个数据点的校正因子分解与可调参数
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (扫描文件读取)
//!   │     ├── models/    (数据模型)
//!   │     ├── geom/      (测角仪与有效面积几何)
//!   │     └── ctr/       (校正引擎与数据聚合)
//!   ├── batch/      (文件收集与并行解析)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod ctr;
mod error;
mod geom;
mod models;
mod parsers;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
