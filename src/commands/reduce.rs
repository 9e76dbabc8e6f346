//! # reduce 子命令实现
//!
//! 扫描数据 → 校正 → 结构因子列表导出的主流水线。
//!
//! ## 依赖关系
//! - 使用 `cli/reduce.rs` 定义的 ReduceArgs
//! - 使用 `commands/mod.rs` 的共用加载流水线
//! - 使用 `ctr/export.rs`, `ctr/rods.rs`

use crate::cli::reduce::ReduceArgs;
use crate::ctr::{export, rods};
use crate::error::Result;
use crate::utils::output;

/// 执行约化
pub fn execute(args: ReduceArgs) -> Result<()> {
    output::print_header("CTR Structure Factor Reduction");

    let ds = super::load_dataset(&args.input, &args.reduction)?;

    let rod_list = rods::find_rods(&ds, args.precision);
    output::print_info(&format!("{} reciprocal-lattice rod(s) in dataset", rod_list.len()));

    let written = export::write_hkl(&ds, &args.output)?;
    output::print_success(&format!(
        "Wrote {} structure factors to '{}'",
        written,
        args.output.display()
    ));

    if let Some(ref path) = args.rod_csv {
        let sorted = rods::sort_by_rod(&ds, args.precision);
        export::write_rod_csv(&sorted, path)?;
        output::print_success(&format!("Rod table saved to '{}'", path.display()));
    }

    output::print_separator();
    println!("{}", ds);
    Ok(())
}
