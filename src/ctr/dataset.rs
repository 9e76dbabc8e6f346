//! # CTR 数据集
//!
//! 全部结构因子数据点的唯一可变真值存储：等长平行列
//! (H, K, L, I, Inorm, Ierr, Ibgr, ctot, F, Ferr) 加逐点簿记
//! （扫描引用、列标签、校正参数、扫描类型）。
//!
//! ## 不变量
//! - 所有平行列长度 == 点数
//! - 点索引只追加、永不重排：外部引用在后续追加后保持有效
//! - 每个点唯一对应一个 (扫描, 扫描内偏移)
//! - 坏点集是合法索引的子集，标记从不删除行
//!
//! 追加按整行为单位提交（整扫描先暂存再落列），失败只中止当前
//! 调用，已存状态不会被写坏一半。
//!
//! ## 依赖关系
//! - 被 `ctr/rods.rs`, `ctr/export.rs`, `commands/` 使用
//! - 使用 `ctr/reduce.rs`, `ctr/correction.rs`, `models/`

use std::collections::BTreeSet;
use std::fmt;

use crate::ctr::correction::CtrCorrection;
use crate::ctr::reduce::{build_correction, reduce_image_point, ColumnLabels, PointValue};
use crate::error::{CtrError, Result};
use crate::models::image::{BgrParams, IntegrateRequest, Roi};
use crate::models::params::{CorrectionParams, ScanKind};
use crate::models::scan::ScanRecord;

/// 点到扫描的引用：(扫描序号, 扫描内偏移)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRef {
    pub scan: usize,
    pub point: usize,
}

/// 追加时的校正参数选择
///
/// `Inherit` 沿用上一次追加的值（首次追加时是硬错误），
/// `NoCorrection` 显式关闭校正（ctot = 1）。
#[derive(Debug, Clone, Default)]
pub enum CorrectionChoice {
    #[default]
    Inherit,
    NoCorrection,
    Params(CorrectionParams),
}

/// append_scans 的可选参数；None 字段沿用上一次的值
#[derive(Debug, Default)]
pub struct AppendOptions {
    pub labels: Option<ColumnLabels>,
    pub corr: CorrectionChoice,
    pub kind: Option<ScanKind>,
}

/// 一次追加的结果汇报
///
/// 警告（不支持的扫描类型、缺失马达角等）不打断批处理，
/// 由命令层决定如何展示。
#[derive(Debug, Default)]
pub struct AppendReport {
    pub scans_added: usize,
    pub points_added: usize,
    pub warnings: Vec<String>,
}

/// integrate_point 的覆盖项；None 字段保持现值
#[derive(Debug, Default)]
pub struct PointOverrides {
    /// 坏点标记；独立于重积分本身，跨重积分持久
    pub bad: Option<bool>,
    pub roi: Option<Roi>,
    pub rotangle: Option<f64>,
    pub bgr: Option<BgrParams>,
    pub i_label: Option<String>,
    pub inorm_label: Option<String>,
    pub ierr_label: Option<String>,
    pub ibgr_label: Option<String>,
    pub corr: Option<CorrectionParams>,
}

/// 暂存行：先整扫描算完，再一次性落列
struct StagedRow {
    point: usize,
    h: f64,
    k: f64,
    l: f64,
    value: PointValue,
}

/// CTR 数据集
pub struct CtrDataset {
    scans: Vec<ScanRecord>,
    bad: BTreeSet<usize>,
    refs: Vec<ScanRef>,
    labels: Vec<ColumnLabels>,
    corr_params: Vec<Option<CorrectionParams>>,
    kinds: Vec<ScanKind>,
    h: Vec<f64>,
    k: Vec<f64>,
    l: Vec<f64>,
    i: Vec<f64>,
    inorm: Vec<f64>,
    ierr: Vec<f64>,
    ibgr: Vec<f64>,
    ctot: Vec<f64>,
    f: Vec<f64>,
    ferr: Vec<f64>,
}

impl CtrDataset {
    /// 创建空数据集
    pub fn new() -> Self {
        Self {
            scans: Vec::new(),
            bad: BTreeSet::new(),
            refs: Vec::new(),
            labels: Vec::new(),
            corr_params: Vec::new(),
            kinds: Vec::new(),
            h: Vec::new(),
            k: Vec::new(),
            l: Vec::new(),
            i: Vec::new(),
            inorm: Vec::new(),
            ierr: Vec::new(),
            ibgr: Vec::new(),
            ctot: Vec::new(),
            f: Vec::new(),
            ferr: Vec::new(),
        }
    }

    /// 由初始扫描列表创建
    pub fn from_scans(
        scans: Vec<ScanRecord>,
        options: AppendOptions,
    ) -> Result<(Self, AppendReport)> {
        let mut ds = Self::new();
        let report = ds.append_scans(scans, options)?;
        Ok((ds, report))
    }

    /// 点数
    pub fn len(&self) -> usize {
        self.l.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.l.is_empty()
    }

    /// 扫描数
    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(CtrError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // 追加
    // ─────────────────────────────────────────────────────────────

    /// 追加扫描
    ///
    /// 省略的参数沿用上一次追加的值；首次追加必须给全
    /// （否则 `MissingDefault`）。非图像扫描类型加入 0 个点并
    /// 在汇报中记警告，已存数据不受影响。
    pub fn append_scans(
        &mut self,
        scans: Vec<ScanRecord>,
        options: AppendOptions,
    ) -> Result<AppendReport> {
        let labels = match options.labels {
            Some(labels) => labels,
            None => self
                .labels
                .last()
                .cloned()
                .ok_or_else(|| CtrError::MissingDefault {
                    what: "column labels".to_string(),
                })?,
        };
        let corr = match options.corr {
            CorrectionChoice::Inherit => {
                self.corr_params
                    .last()
                    .cloned()
                    .ok_or_else(|| CtrError::MissingDefault {
                        what: "correction parameters".to_string(),
                    })?
            }
            CorrectionChoice::NoCorrection => None,
            CorrectionChoice::Params(params) => {
                params.validate()?;
                Some(params)
            }
        };
        let kind = match options.kind {
            Some(kind) => kind,
            None => self
                .kinds
                .last()
                .copied()
                .ok_or_else(|| CtrError::MissingDefault {
                    what: "scan kind".to_string(),
                })?,
        };

        let mut report = AppendReport::default();
        for mut scan in scans {
            match kind {
                ScanKind::Rocking => {
                    push_warning(
                        &mut report.warnings,
                        format!(
                            "scan '{}': scan kind 'rocking' is not implemented, no points added",
                            scan.name()
                        ),
                    );
                    self.scans.push(scan);
                    report.scans_added += 1;
                }
                ScanKind::Image => {
                    let rows =
                        self.stage_image_scan(&mut scan, &labels, corr.as_ref(), &mut report)?;
                    let scan_idx = self.scans.len();
                    self.scans.push(scan);
                    for row in rows {
                        self.commit_row(scan_idx, &labels, &corr, kind, row);
                        report.points_added += 1;
                    }
                    report.scans_added += 1;
                }
            }
        }
        Ok(report)
    }

    /// 整扫描归算并暂存，不触碰已存列
    fn stage_image_scan(
        &self,
        scan: &mut ScanRecord,
        labels: &ColumnLabels,
        corr: Option<&CorrectionParams>,
        report: &mut AppendReport,
    ) -> Result<Vec<StagedRow>> {
        let integrated = scan
            .image()
            .map(|image| image.is_integrated())
            .ok_or_else(|| CtrError::Other(format!("Scan '{}' has no image data", scan.name())))?;
        if !integrated {
            scan.integrate_image(&IntegrateRequest::default())?;
        }

        let mut rows = Vec::with_capacity(scan.npts());
        for point in 0..scan.npts() {
            let h = hkl_column(scan, "H", point)?;
            let k = hkl_column(scan, "K", point)?;
            let l = hkl_column(scan, "L", point)?;
            let reduced = reduce_image_point(scan, point, labels, corr)?;
            for warning in reduced.warnings {
                push_warning(&mut report.warnings, warning);
            }
            rows.push(StagedRow {
                point,
                h,
                k,
                l,
                value: reduced.value,
            });
        }
        Ok(rows)
    }

    fn commit_row(
        &mut self,
        scan_idx: usize,
        labels: &ColumnLabels,
        corr: &Option<CorrectionParams>,
        kind: ScanKind,
        row: StagedRow,
    ) {
        self.refs.push(ScanRef {
            scan: scan_idx,
            point: row.point,
        });
        self.labels.push(labels.clone());
        self.corr_params.push(corr.clone());
        self.kinds.push(kind);
        self.h.push(row.h);
        self.k.push(row.k);
        self.l.push(row.l);
        self.i.push(row.value.i);
        self.inorm.push(row.value.inorm);
        self.ierr.push(row.value.ierr);
        self.ibgr.push(row.value.ibgr);
        self.ctot.push(row.value.ctot);
        self.f.push(row.value.f);
        self.ferr.push(row.value.ferr);
    }

    // ─────────────────────────────────────────────────────────────
    // 原位重积分
    // ─────────────────────────────────────────────────────────────

    /// 重积分单个数据点并原位覆盖该行（列长不变）
    ///
    /// 坏点标记先于重积分生效：被标记的点从积分中剔除。
    /// 标签/校正参数覆盖项在归算成功后才落盘，失败不会留下
    /// 半新半旧的簿记。
    pub fn integrate_point(
        &mut self,
        index: usize,
        overrides: PointOverrides,
    ) -> Result<Vec<String>> {
        self.check_index(index)?;

        if let Some(bad) = overrides.bad {
            if bad {
                self.bad.insert(index);
            } else {
                self.bad.remove(&index);
            }
        }

        let mut warnings = Vec::new();
        match self.kinds[index] {
            ScanKind::Image => {}
            ScanKind::Rocking => {
                warnings.push("only image scans support re-integration".to_string());
                return Ok(warnings);
            }
        }

        if let Some(ref params) = overrides.corr {
            params.validate()?;
        }
        let mut labels = self.labels[index].clone();
        if let Some(label) = overrides.i_label {
            labels.i = label;
        }
        if let Some(label) = overrides.inorm_label {
            labels.inorm = label;
        }
        if let Some(label) = overrides.ierr_label {
            labels.ierr = label;
        }
        if let Some(label) = overrides.ibgr_label {
            labels.ibgr = label;
        }
        let corr = match overrides.corr {
            Some(params) => Some(params),
            None => self.corr_params[index].clone(),
        };

        let ScanRef {
            scan: scan_idx,
            point,
        } = self.refs[index];
        let excluded = if self.bad.contains(&index) {
            vec![point]
        } else {
            Vec::new()
        };
        let request = IntegrateRequest {
            points: Some(vec![point]),
            roi: overrides.roi,
            rotangle: overrides.rotangle,
            bgr: overrides.bgr,
            excluded,
        };
        self.scans[scan_idx].integrate_image(&request)?;

        let scan = &self.scans[scan_idx];
        let h = hkl_column(scan, "H", point)?;
        let k = hkl_column(scan, "K", point)?;
        let l = hkl_column(scan, "L", point)?;
        let reduced = reduce_image_point(scan, point, &labels, corr.as_ref())?;
        warnings.extend(reduced.warnings);

        self.labels[index] = labels;
        self.corr_params[index] = corr;
        self.h[index] = h;
        self.k[index] = k;
        self.l[index] = l;
        let value = reduced.value;
        self.i[index] = value.i;
        self.inorm[index] = value.inorm;
        self.ierr[index] = value.ierr;
        self.ibgr[index] = value.ibgr;
        self.ctot[index] = value.ctot;
        self.f[index] = value.f;
        self.ferr[index] = value.ferr;

        Ok(warnings)
    }

    // ─────────────────────────────────────────────────────────────
    // 查询
    // ─────────────────────────────────────────────────────────────

    /// 由点索引取 (扫描, 扫描内偏移)
    pub fn get_scan(&self, index: usize) -> Result<(&ScanRecord, usize)> {
        self.check_index(index)?;
        let r = self.refs[index];
        Ok((&self.scans[r.scan], r.point))
    }

    /// 由点索引取扫描名
    pub fn get_scan_name(&self, index: usize) -> Result<&str> {
        let (scan, _) = self.get_scan(index)?;
        Ok(scan.name())
    }

    /// 为诊断重建校正引擎（测角仪设到该点当前角度）
    pub fn get_correction(&self, index: usize) -> Result<(CtrCorrection, Vec<String>)> {
        self.check_index(index)?;
        let params = self.corr_params[index].clone().unwrap_or_default();
        let r = self.refs[index];
        build_correction(&self.scans[r.scan], r.point, &params)
    }

    /// 标记/取消坏点；标记从不删除行
    pub fn set_bad(&mut self, index: usize, bad: bool) -> Result<()> {
        self.check_index(index)?;
        if bad {
            self.bad.insert(index);
        } else {
            self.bad.remove(&index);
        }
        Ok(())
    }

    /// 某点是否被标记为坏点
    pub fn is_bad(&self, index: usize) -> bool {
        self.bad.contains(&index)
    }

    /// 坏点集
    pub fn bad_points(&self) -> &BTreeSet<usize> {
        &self.bad
    }

    /// 某点的列标签
    pub fn point_labels(&self, index: usize) -> Result<&ColumnLabels> {
        self.check_index(index)?;
        Ok(&self.labels[index])
    }

    /// 某点的校正参数（None = 不做校正）
    pub fn point_corr_params(&self, index: usize) -> Result<Option<&CorrectionParams>> {
        self.check_index(index)?;
        Ok(self.corr_params[index].as_ref())
    }

    /// 某点的扫描类型
    pub fn point_kind(&self, index: usize) -> Result<ScanKind> {
        self.check_index(index)?;
        Ok(self.kinds[index])
    }

    pub(crate) fn scan_mut(&mut self, scan_idx: usize) -> &mut ScanRecord {
        &mut self.scans[scan_idx]
    }

    pub(crate) fn point_ref(&self, index: usize) -> ScanRef {
        self.refs[index]
    }

    pub(crate) fn labels_mut(&mut self, index: usize) -> &mut ColumnLabels {
        &mut self.labels[index]
    }

    pub(crate) fn corr_params_mut(&mut self, index: usize) -> &mut Option<CorrectionParams> {
        &mut self.corr_params[index]
    }

    // ─────────────────────────────────────────────────────────────
    // 列访问
    // ─────────────────────────────────────────────────────────────

    pub fn h(&self) -> &[f64] {
        &self.h
    }

    pub fn k(&self) -> &[f64] {
        &self.k
    }

    pub fn l(&self) -> &[f64] {
        &self.l
    }

    pub fn i(&self) -> &[f64] {
        &self.i
    }

    pub fn inorm(&self) -> &[f64] {
        &self.inorm
    }

    pub fn ierr(&self) -> &[f64] {
        &self.ierr
    }

    pub fn ibgr(&self) -> &[f64] {
        &self.ibgr
    }

    pub fn ctot(&self) -> &[f64] {
        &self.ctot
    }

    pub fn f(&self) -> &[f64] {
        &self.f
    }

    pub fn ferr(&self) -> &[f64] {
        &self.ferr
    }
}

impl Default for CtrDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CtrDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CTR dataset")?;
        writeln!(f, "Number of scans = {}", self.scan_count())?;
        write!(f, "Number of structure factors = {}", self.len())
    }
}

/// 读取 H/K/L 列；缺列是调用方配置缺陷，硬失败
fn hkl_column(scan: &ScanRecord, label: &str, point: usize) -> Result<f64> {
    scan.value_at(label, point).ok_or_else(|| {
        CtrError::Other(format!(
            "Scan '{}' has no usable column '{}'",
            scan.name(),
            label
        ))
    })
}

/// 去重追加警告，避免逐点重复刷屏
fn push_warning(warnings: &mut Vec<String>, warning: String) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::image::{ColumnSource, ImageScan};
    use crate::models::scan::{Column, ScanGeometry};

    /// 造一个 npts 点的图像扫描，H/K 固定，L/I 给定
    pub(crate) fn image_scan(
        name: &str,
        h: f64,
        k: f64,
        l: Vec<f64>,
        i: Vec<f64>,
        inorm: f64,
    ) -> ScanRecord {
        let npts = l.len();
        let mut scan = ScanRecord::new(name, npts, ScanGeometry::default()).unwrap();
        scan.set_column("H", Column::Scalar(h));
        scan.set_column("K", Column::Scalar(k));
        scan.set_column("L", Column::Array(l));
        scan.set_column("io", Column::Scalar(inorm));
        let ierr: Vec<f64> = i.iter().map(|v| v.sqrt()).collect();
        let source = ColumnSource::new(npts, Some(i), Some(ierr), None);
        scan.set_image(ImageScan::new(npts, Box::new(source)));
        scan
    }

    pub(crate) fn options_no_corr() -> AppendOptions {
        AppendOptions {
            labels: Some(ColumnLabels::default()),
            corr: CorrectionChoice::NoCorrection,
            kind: Some(ScanKind::Image),
        }
    }

    #[test]
    fn test_append_scenario_a() {
        // Scenario A: 3 points, Inorm = 10, no corrections
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2, 0.3], vec![100.0, 200.0, 300.0], 10.0);
        let report = ds.append_scans(vec![scan], options_no_corr()).unwrap();
        assert_eq!(report.points_added, 3);
        assert_eq!(report.scans_added, 1);
        let expected = [3.162, 4.472, 5.477];
        for (idx, want) in expected.iter().enumerate() {
            assert_eq!(ds.ctot()[idx], 1.0);
            assert!((ds.f()[idx] - want).abs() < 1e-3);
        }
    }

    #[test]
    fn test_parallel_columns_equal_length() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2], vec![10.0, 20.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        let n = ds.len();
        assert_eq!(n, 2);
        for col in [
            ds.h(),
            ds.k(),
            ds.l(),
            ds.i(),
            ds.inorm(),
            ds.ierr(),
            ds.ibgr(),
            ds.ctot(),
            ds.f(),
            ds.ferr(),
        ] {
            assert_eq!(col.len(), n);
        }
    }

    #[test]
    fn test_append_defaults_inherited() {
        let mut ds = CtrDataset::new();
        let s1 = image_scan("s1", 1.0, 0.0, vec![0.1], vec![10.0], 1.0);
        ds.append_scans(vec![s1], options_no_corr()).unwrap();
        // second append omits everything: inherits labels/corr/kind
        let s2 = image_scan("s2", 1.0, 0.0, vec![0.2], vec![40.0], 1.0);
        let report = ds.append_scans(vec![s2], AppendOptions::default()).unwrap();
        assert_eq!(report.points_added, 1);
        assert!((ds.f()[1] - 40.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_first_append_requires_explicit_options() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1], vec![10.0], 1.0);
        let err = ds.append_scans(vec![scan], AppendOptions::default());
        assert!(matches!(err, Err(CtrError::MissingDefault { .. })));
        // the failed call must leave the dataset untouched
        assert_eq!(ds.len(), 0);
        assert_eq!(ds.scan_count(), 0);
    }

    #[test]
    fn test_rocking_scan_adds_zero_points_with_warning() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1], vec![10.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();

        let rocking = image_scan("r1", 1.0, 0.0, vec![0.5], vec![50.0], 1.0);
        let report = ds
            .append_scans(
                vec![rocking],
                AppendOptions {
                    kind: Some(ScanKind::Rocking),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(report.points_added, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("not implemented"));
        // previously stored points are untouched
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_indices_stay_global_across_scans() {
        // Scenario E: rod present only in scan 2 maps to indices 2,3
        let mut ds = CtrDataset::new();
        let s1 = image_scan("s1", 0.0, 0.0, vec![0.1, 0.2], vec![10.0, 10.0], 1.0);
        let s2 = image_scan("s2", 1.0, 1.0, vec![0.3, 0.4], vec![10.0, 10.0], 1.0);
        ds.append_scans(vec![s1, s2], options_no_corr()).unwrap();
        assert_eq!(ds.len(), 4);
        let (scan, offset) = ds.get_scan(2).unwrap();
        assert_eq!(scan.name(), "s2");
        assert_eq!(offset, 0);
        assert_eq!(ds.get_scan_name(3).unwrap(), "s2");
    }

    #[test]
    fn test_integrate_point_is_idempotent() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2], vec![100.0, 200.0], 10.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();

        ds.integrate_point(1, PointOverrides::default()).unwrap();
        let first = (ds.i()[1], ds.f()[1], ds.ferr()[1], ds.ctot()[1]);
        ds.integrate_point(1, PointOverrides::default()).unwrap();
        let second = (ds.i()[1], ds.f()[1], ds.ferr()[1], ds.ctot()[1]);
        assert_eq!(first, second);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_integrate_point_bad_flag_excludes_and_persists() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2], vec![100.0, 200.0], 10.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();

        let overrides = PointOverrides {
            bad: Some(true),
            ..Default::default()
        };
        ds.integrate_point(0, overrides).unwrap();
        // excluded from integration: I = 0 hence F = 0, row still present
        assert!(ds.is_bad(0));
        assert_eq!(ds.i()[0], 0.0);
        assert_eq!(ds.f()[0], 0.0);
        assert_eq!(ds.len(), 2);

        // flag survives a plain re-integration
        ds.integrate_point(0, PointOverrides::default()).unwrap();
        assert!(ds.is_bad(0));
        assert_eq!(ds.i()[0], 0.0);

        // clearing the flag restores the stored intensity
        let overrides = PointOverrides {
            bad: Some(false),
            ..Default::default()
        };
        ds.integrate_point(0, overrides).unwrap();
        assert!(!ds.is_bad(0));
        assert_eq!(ds.i()[0], 100.0);
    }

    #[test]
    fn test_integrate_point_out_of_range_is_hard_error() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1], vec![10.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        let err = ds.integrate_point(5, PointOverrides::default());
        assert!(matches!(err, Err(CtrError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_get_correction_reconstructs_geometry() {
        let mut ds = CtrDataset::new();
        let mut scan = image_scan("s1", 1.0, 0.0, vec![0.1], vec![10.0], 1.0);
        scan.set_column("mu", Column::Scalar(3.0));
        scan.set_column("nu", Column::Scalar(20.0));
        ds.append_scans(vec![scan], options_no_corr()).unwrap();

        let (corr, _warnings) = ds.get_correction(0).unwrap();
        assert!((corr.gonio().pangles().alpha - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_intensity_iff_zero_f() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2, 0.3], vec![0.0, 200.0, -5.0], 10.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        for idx in 0..ds.len() {
            let zeroed = ds.i()[idx] <= 0.0 || ds.inorm()[idx] <= 0.0;
            let f_zero = ds.f()[idx] == 0.0 && ds.ferr()[idx] == 0.0;
            assert_eq!(zeroed, f_zero, "point {}", idx);
        }
    }

    #[test]
    fn test_bad_set_is_subset_of_indices() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2], vec![10.0, 20.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        ds.set_bad(1, true).unwrap();
        assert!(ds.set_bad(7, true).is_err());
        assert!(ds.bad_points().iter().all(|&idx| idx < ds.len()));
        // flagging never removes rows
        assert_eq!(ds.len(), 2);
        ds.set_bad(1, false).unwrap();
        assert!(ds.bad_points().is_empty());
    }

    #[test]
    fn test_display_summary() {
        let mut ds = CtrDataset::new();
        let scan = image_scan("s1", 1.0, 0.0, vec![0.1, 0.2], vec![10.0, 20.0], 1.0);
        ds.append_scans(vec![scan], options_no_corr()).unwrap();
        let text = format!("{}", ds);
        assert!(text.contains("Number of scans = 1"));
        assert!(text.contains("Number of structure factors = 2"));
    }
}
