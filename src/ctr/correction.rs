//! # 几何校正引擎
//!
//! 静止（图像）测量的逐点校正因子。全部因子定义为乘在测量
//! 强度上的校正：`Ic = Im · ct`，`ct = cp · cl · ca`。
//! 亦即 `Im = |F|² · Πᵢ Xᵢ`，`|F| = sqrt(Im · ct)`，`cᵢ = 1/Xᵢ`。
//!
//! 某个因子出现几何退化（除零、不可测量）时返回 0，
//! 让校正后的数据归零；绝不抛错、绝不除零。
//!
//! ## 参考
//! - E. Vlieg, J. Appl. Cryst. (1997). 30, 532-543
//! - C. Schlepuetz et al, Acta Cryst. (2005). A61, 418-425
//!
//! ## 依赖关系
//! - 被 `ctr/reduce.rs`, `ctr/dataset.rs`, `commands/inspect.rs` 使用
//! - 使用 `geom/gonio.rs`, `geom/area.rs`

use crate::geom::area;
use crate::geom::gonio::{cosd, sind, Psic};
use crate::models::params::{CorrectionParams, SampleShape, Slits};

/// 校正因子分解
///
/// `inspect` 子命令按项展示；`total` 即 ctot。
#[derive(Debug, Clone)]
pub struct CorrectionFactors {
    pub polarization: f64,
    pub lorentz: f64,
    pub area: f64,
    pub total: f64,
    pub alpha: f64,
    pub beta: f64,
    pub warnings: Vec<String>,
}

/// psic 几何的数据点校正
///
/// 持有按当前数据点设好角度的测角仪，加上狭缝与样品描述。
#[derive(Debug, Clone)]
pub struct CtrCorrection {
    gonio: Psic,
    beam_slits: Option<Slits>,
    det_slits: Option<Slits>,
    sample: SampleShape,
    fh: f64,
}

impl CtrCorrection {
    /// 由测角仪与校正参数构造
    pub fn new(gonio: Psic, params: &CorrectionParams) -> Self {
        Self {
            gonio,
            beam_slits: params.beam_slits,
            det_slits: params.det_slits,
            sample: params.sample.clone(),
            fh: params.fh,
        }
    }

    /// 测角仪状态
    pub fn gonio(&self) -> &Psic {
        &self.gonio
    }

    /// 偏振校正因子 cp = 1/p
    ///
    /// 水平偏振：p = 1 − (cos δ · sin ν)²；
    /// 混合偏振：p = fh·p_h + (1−fh)·(1 − sin²δ)。
    /// p = 0 时返回 0。
    pub fn polarization(&self) -> f64 {
        let delta = self.gonio.angles().delta;
        let nu = self.gonio.angles().nu;
        let p_h = 1.0 - (cosd(delta) * sind(nu)).powi(2);
        let p = if self.fh == 1.0 {
            p_h
        } else {
            self.fh * p_h + (1.0 - self.fh) * (1.0 - sind(delta).powi(2))
        };
        if p == 0.0 {
            0.0
        } else {
            1.0 / p
        }
    }

    /// 静止测量的洛伦兹校正因子 cl = sin(beta)（Vlieg 1997）
    pub fn lorentz_stationary(&self) -> f64 {
        sind(self.gonio.pangles().beta)
    }

    /// 有效面积校正因子 ca = A_beam / A_int²
    ///
    /// 同时涵盖溢出、A_int/A_beam 与单位表面积归一 (1/A_beam)。
    /// alpha < 0 或 beta < 0 的点不可测量，返回 0；零重叠返回 0；
    /// 未给光束狭缝时无从计算，取 1。
    pub fn active_area(&self) -> f64 {
        let pangles = self.gonio.pangles();
        if pangles.alpha < 0.0 || pangles.beta < 0.0 {
            return 0.0;
        }
        let beam = match self.beam_slits {
            Some(ref slits) => slits,
            None => return 1.0,
        };
        match area::active_area(&self.gonio, beam, self.det_slits.as_ref(), &self.sample) {
            Some(a) if a.intersection > 0.0 => a.beam / (a.intersection * a.intersection),
            _ => 0.0,
        }
    }

    /// 总校正因子 ctot = cp · cl · ca
    pub fn ctot_stationary(&self) -> f64 {
        self.factors().total
    }

    /// 校正因子分解（含警告），供诊断展示
    pub fn factors(&self) -> CorrectionFactors {
        let mut warnings = Vec::new();
        if self.beam_slits.is_none() {
            warnings.push("beam slits not specified, active area taken as 1".to_string());
        }
        let polarization = self.polarization();
        let lorentz = self.lorentz_stationary();
        let area = self.active_area();
        let pangles = self.gonio.pangles();
        CorrectionFactors {
            polarization,
            lorentz,
            area,
            total: polarization * lorentz * area,
            alpha: pangles.alpha,
            beta: pangles.beta,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::gonio::AngleUpdate;
    use crate::models::params::CorrectionParams;

    fn gonio_at(mu: f64, nu: f64, delta: f64) -> Psic {
        let mut gonio = Psic::new(1.0, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            mu: Some(mu),
            nu: Some(nu),
            delta: Some(delta),
            ..Default::default()
        });
        gonio
    }

    #[test]
    fn test_polarization_noop_at_zero_angles() {
        // Scenario C: delta = 0, nu = 0, fh = 1 => p = 1 => factor 1
        let corr = CtrCorrection::new(gonio_at(0.0, 0.0, 0.0), &CorrectionParams::default());
        assert!((corr.polarization() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_polarization_degenerate_returns_zero() {
        // nu = 90, delta = 0: the scattered beam lies along the
        // polarization axis, p = 0, factor must be 0 not infinite
        let corr = CtrCorrection::new(gonio_at(0.0, 90.0, 0.0), &CorrectionParams::default());
        assert_eq!(corr.polarization(), 0.0);
    }

    #[test]
    fn test_polarization_mixed_fraction() {
        let params = CorrectionParams {
            fh: 0.5,
            ..Default::default()
        };
        let corr = CtrCorrection::new(gonio_at(0.0, 30.0, 0.0), &params);
        // p = 0.5*(1 - sin^2(nu)) + 0.5*1 = 0.875
        let expected = 1.0 / 0.875;
        assert!((corr.polarization() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lorentz_is_sin_beta() {
        let corr = CtrCorrection::new(gonio_at(5.0, 25.0, 0.0), &CorrectionParams::default());
        let beta = corr.gonio().pangles().beta;
        assert!((corr.lorentz_stationary() - beta.to_radians().sin()).abs() < 1e-12);
    }

    #[test]
    fn test_active_area_negative_alpha_is_zero() {
        // Scenario D: alpha < 0 makes the point unmeasurable
        let params = CorrectionParams {
            beam_slits: Some(Slits {
                horz: 0.6,
                vert: 0.8,
            }),
            ..Default::default()
        };
        let corr = CtrCorrection::new(gonio_at(-1.0, 20.0, 0.0), &params);
        assert!(corr.gonio().pangles().alpha < 0.0);
        assert_eq!(corr.active_area(), 0.0);
        assert_eq!(corr.ctot_stationary(), 0.0);
    }

    #[test]
    fn test_negative_beta_zeroes_even_without_slits() {
        // beta < 0 is unmeasurable regardless of aperture knowledge;
        // ctot must come out 0, not a negative Lorentz times 1
        let corr = CtrCorrection::new(gonio_at(5.0, 2.0, 0.0), &CorrectionParams::default());
        assert!(corr.gonio().pangles().beta < 0.0);
        assert_eq!(corr.active_area(), 0.0);
        assert_eq!(corr.ctot_stationary(), 0.0);
    }

    #[test]
    fn test_active_area_without_beam_slits_warns_as_one() {
        let corr = CtrCorrection::new(gonio_at(2.0, 20.0, 0.0), &CorrectionParams::default());
        assert_eq!(corr.active_area(), 1.0);
        let factors = corr.factors();
        assert_eq!(factors.warnings.len(), 1);
        assert!((factors.total - factors.polarization * factors.lorentz).abs() < 1e-12);
    }

    #[test]
    fn test_ctot_is_product_of_factors() {
        let params = CorrectionParams {
            beam_slits: Some(Slits {
                horz: 0.6,
                vert: 0.8,
            }),
            det_slits: Some(Slits {
                horz: 20.0,
                vert: 10.5,
            }),
            sample: SampleShape::Disk { diameter: 10.0 },
            ..Default::default()
        };
        let corr = CtrCorrection::new(gonio_at(3.0, 25.0, 5.0), &params);
        let factors = corr.factors();
        assert!(factors.total > 0.0);
        assert!(
            (factors.total - factors.polarization * factors.lorentz * factors.area).abs() < 1e-12
        );
    }
}
