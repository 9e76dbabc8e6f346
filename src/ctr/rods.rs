//! # 倒格棒分组
//!
//! 按四舍五入到给定小数位的 (H, K) 把数据点分到各条倒格棒上。
//! 纯派生查询：每次调用现算，不缓存、无失效问题；单次会话
//! 几千个点的规模下开销可忽略。
//!
//! 这里的 3 位小数舍入只用于分组；导出时 H/K 另取最近整数显示，
//! 两者用途不同、互不替代。
//!
//! ## 依赖关系
//! - 被 `commands/rods.rs`, `ctr/export.rs` 使用
//! - 读取 `ctr/dataset.rs`，不修改

use std::collections::BTreeSet;

use crate::ctr::dataset::CtrDataset;

/// 默认的 H/K 舍入小数位
pub const DEFAULT_PRECISION: u32 = 3;

/// 一条棒上的一个成员点（H/K 已按分组精度舍入）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RodPoint {
    /// 数据集中的全局索引
    pub index: usize,
    pub h: f64,
    pub k: f64,
    pub l: f64,
    pub f: f64,
    pub ferr: f64,
    pub i: f64,
    pub inorm: f64,
    pub ierr: f64,
    pub ibgr: f64,
}

/// 一条倒格棒：固定 (H, K)，成员按 L 升序
#[derive(Debug, Clone, PartialEq)]
pub struct RodSet {
    pub h: f64,
    pub k: f64,
    pub points: Vec<RodPoint>,
}

/// 舍入到 precision 位小数后的整数键（稳定可排序、可比较）
fn rod_key(x: f64, precision: u32) -> i64 {
    (x * 10f64.powi(precision as i32)).round() as i64
}

fn key_to_value(key: i64, precision: u32) -> f64 {
    key as f64 / 10f64.powi(precision as i32)
}

/// 数据集中所有唯一的 (H, K) 对，排序返回
pub fn find_rods(ds: &CtrDataset, precision: u32) -> Vec<(f64, f64)> {
    let mut keys = BTreeSet::new();
    for idx in 0..ds.len() {
        keys.insert((rod_key(ds.h()[idx], precision), rod_key(ds.k()[idx], precision)));
    }
    keys.into_iter()
        .map(|(h, k)| (key_to_value(h, precision), key_to_value(k, precision)))
        .collect()
}

/// 舍入后 (H, K) 精确匹配的所有点索引
pub fn points_for_rod(ds: &CtrDataset, h: f64, k: f64, precision: u32) -> Vec<usize> {
    let hk = (rod_key(h, precision), rod_key(k, precision));
    (0..ds.len())
        .filter(|&idx| {
            (rod_key(ds.h()[idx], precision), rod_key(ds.k()[idx], precision)) == hk
        })
        .collect()
}

/// 全量按棒分组，每条棒内按 L 升序（并列时按原索引，稳定）
pub fn sort_by_rod(ds: &CtrDataset, precision: u32) -> Vec<RodSet> {
    find_rods(ds, precision)
        .into_iter()
        .map(|(h, k)| {
            let mut points: Vec<RodPoint> = points_for_rod(ds, h, k, precision)
                .into_iter()
                .map(|idx| RodPoint {
                    index: idx,
                    h: key_to_value(rod_key(ds.h()[idx], precision), precision),
                    k: key_to_value(rod_key(ds.k()[idx], precision), precision),
                    l: ds.l()[idx],
                    f: ds.f()[idx],
                    ferr: ds.ferr()[idx],
                    i: ds.i()[idx],
                    inorm: ds.inorm()[idx],
                    ierr: ds.ierr()[idx],
                    ibgr: ds.ibgr()[idx],
                })
                .collect();
            points.sort_by(|a, b| a.l.total_cmp(&b.l));
            RodSet { h, k, points }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctr::dataset::tests::{image_scan, options_no_corr};
    use crate::ctr::dataset::CtrDataset;

    fn two_rod_dataset() -> CtrDataset {
        let mut ds = CtrDataset::new();
        let s1 = image_scan("s1", 0.0, 0.0, vec![0.2, 0.1], vec![10.0, 10.0], 1.0);
        let s2 = image_scan("s2", 1.0, 1.0, vec![0.4, 0.3], vec![10.0, 10.0], 1.0);
        ds.append_scans(vec![s1, s2], options_no_corr()).unwrap();
        ds
    }

    #[test]
    fn test_find_rods_sorted_unique() {
        let ds = two_rod_dataset();
        let rods = find_rods(&ds, DEFAULT_PRECISION);
        assert_eq!(rods, vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_points_for_rod_returns_global_indices() {
        // Scenario E: the (1,1) rod lives only in scan 2 and must map
        // to global indices 2 and 3, not 0 and 1
        let ds = two_rod_dataset();
        let idx = points_for_rod(&ds, 1.0, 1.0, DEFAULT_PRECISION);
        assert_eq!(idx, vec![2, 3]);
    }

    #[test]
    fn test_points_for_rod_no_match() {
        let ds = two_rod_dataset();
        assert!(points_for_rod(&ds, 2.0, 0.0, DEFAULT_PRECISION).is_empty());
    }

    #[test]
    fn test_sort_by_rod_partitions_all_points() {
        let ds = two_rod_dataset();
        let rods = sort_by_rod(&ds, DEFAULT_PRECISION);
        let mut seen: Vec<usize> = rods
            .iter()
            .flat_map(|rod| rod.points.iter().map(|p| p.index))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        // every member's rounded H,K equals the rod's
        for rod in &rods {
            for p in &rod.points {
                assert_eq!((p.h, p.k), (rod.h, rod.k));
            }
        }
    }

    #[test]
    fn test_sort_by_rod_l_ascending() {
        let ds = two_rod_dataset();
        for rod in sort_by_rod(&ds, DEFAULT_PRECISION) {
            for pair in rod.points.windows(2) {
                assert!(pair[0].l <= pair[1].l);
            }
        }
    }

    #[test]
    fn test_equal_l_ties_keep_index_order() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.5, 0.5, 0.5], vec![1.0, 2.0, 3.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        let rods = sort_by_rod(&ds, DEFAULT_PRECISION);
        let idx: Vec<usize> = rods[0].points.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_rounding_separates_close_rods() {
        let mut ds = CtrDataset::new();
        let s1 = image_scan("s1", 1.0004, 0.0, vec![0.1], vec![1.0], 1.0);
        let s2 = image_scan("s2", 1.0006, 0.0, vec![0.2], vec![1.0], 1.0);
        ds.append_scans(vec![s1, s2], options_no_corr()).unwrap();
        // at 3 decimals 1.0004 -> 1.000 and 1.0006 -> 1.001: two rods
        assert_eq!(find_rods(&ds, 3).len(), 2);
        // at 2 decimals they merge
        assert_eq!(find_rods(&ds, 2).len(), 1);
    }
}
