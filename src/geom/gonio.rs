//! # psic 测角仪
//!
//! psic (4S+2D) 六圆几何：由六个马达角推导样品旋转矩阵、
//! 入射/出射波矢和散射伪角。
//!
//! ## 坐标约定
//! 实验室系：x 竖直向上，y 沿入射光束，z 水平（平行于 phi 轴），
//! 右手系，原点在仪器旋转中心。
//!
//! 样品旋转 `Z = M(mu)·H(eta)·X(chi)·P(phi)`（P、H 绕 z，X 绕 y，
//! M 绕 x）。探测器方向由 delta（抬向 +x）与 nu（摆向 +z）决定：
//! `kr = k·(sin δ, cos ν·cos δ, sin ν·cos δ)`。
//!
//! ## 伪角
//! 表面法向 n 在 phi 系给出，`nm = Z·n`；
//! `alpha = asin(−n̂m·k̂i)`，`beta = asin(n̂m·k̂r)`，
//! `tth = acos(k̂i·k̂r)`，均以度返回。
//!
//! ## 依赖关系
//! - 被 `ctr/correction.rs`, `ctr/reduce.rs`, `geom/area.rs` 使用
//! - 无外部模块依赖

use std::f64::consts::PI;

use crate::error::{CtrError, Result};

/// 三维向量
pub type Vec3 = [f64; 3];
/// 3x3 矩阵（行优先）
pub type Mat3 = [[f64; 3]; 3];

/// sin，参数为度
pub fn sind(x: f64) -> f64 {
    x.to_radians().sin()
}

/// cos，参数为度
pub fn cosd(x: f64) -> f64 {
    x.to_radians().cos()
}

/// 向量点积
pub fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 向量叉积
pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// 向量模长
pub fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// 单位化；零向量原样返回
pub fn normalize(a: &Vec3) -> Vec3 {
    let n = norm(a);
    if n == 0.0 {
        return *a;
    }
    [a[0] / n, a[1] / n, a[2] / n]
}

/// 矩阵乘向量
pub fn mat_vec(m: &Mat3, v: &Vec3) -> Vec3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// 矩阵乘矩阵
pub fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// 矩阵转置
pub fn transpose(m: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = m[j][i];
        }
    }
    out
}

/// 六个马达角（度）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Angles {
    pub phi: f64,
    pub chi: f64,
    pub eta: f64,
    pub mu: f64,
    pub nu: f64,
    pub delta: f64,
}

/// 马达角部分更新；None 字段保持原值
#[derive(Debug, Clone, Copy, Default)]
pub struct AngleUpdate {
    pub phi: Option<f64>,
    pub chi: Option<f64>,
    pub eta: Option<f64>,
    pub mu: Option<f64>,
    pub nu: Option<f64>,
    pub delta: Option<f64>,
}

/// 散射伪角（度）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PseudoAngles {
    /// 入射掠角
    pub alpha: f64,
    /// 出射角
    pub beta: f64,
    /// 总散射角
    pub tth: f64,
}

/// 计算样品旋转矩阵 Z = M(mu)·H(eta)·X(chi)·P(phi)
pub fn calc_z(phi: f64, chi: f64, eta: f64, mu: f64) -> Mat3 {
    let p = [
        [cosd(phi), sind(phi), 0.0],
        [-sind(phi), cosd(phi), 0.0],
        [0.0, 0.0, 1.0],
    ];
    let x = [
        [cosd(chi), 0.0, sind(chi)],
        [0.0, 1.0, 0.0],
        [-sind(chi), 0.0, cosd(chi)],
    ];
    let h = [
        [cosd(eta), sind(eta), 0.0],
        [-sind(eta), cosd(eta), 0.0],
        [0.0, 0.0, 1.0],
    ];
    let m = [
        [1.0, 0.0, 0.0],
        [0.0, cosd(mu), -sind(mu)],
        [0.0, sind(mu), cosd(mu)],
    ];
    mat_mul(&m, &mat_mul(&h, &mat_mul(&x, &p)))
}

/// 入射光束狭缝四角向量（孔径平面 ⊥ y，h 沿 z，v 沿 x）
pub fn beam_vectors(h: f64, v: f64) -> [Vec3; 4] {
    let bh = h / 2.0;
    let bv = v / 2.0;
    [
        [bv, 0.0, bh],
        [bv, 0.0, -bh],
        [-bv, 0.0, -bh],
        [-bv, 0.0, bh],
    ]
}

/// 探测器狭缝四角向量，随 nu/delta 转到 ⊥ kr 的平面
pub fn det_vectors(h: f64, v: f64, nu: f64, delta: f64) -> [Vec3; 4] {
    let del = [
        [cosd(delta), sind(delta), 0.0],
        [-sind(delta), cosd(delta), 0.0],
        [0.0, 0.0, 1.0],
    ];
    let nu_m = [
        [1.0, 0.0, 0.0],
        [0.0, cosd(nu), -sind(nu)],
        [0.0, sind(nu), cosd(nu)],
    ];
    let d = mat_mul(&nu_m, &del);
    let corners = beam_vectors(h, v);
    [
        mat_vec(&d, &corners[0]),
        mat_vec(&d, &corners[1]),
        mat_vec(&d, &corners[2]),
        mat_vec(&d, &corners[3]),
    ]
}

/// psic 测角仪状态
///
/// 持有一套马达角；每次更新后重算旋转矩阵、波矢与伪角。
#[derive(Debug, Clone)]
pub struct Psic {
    lambda: f64,
    n_phi: Vec3,
    angles: Angles,
    z: Mat3,
    nm: Vec3,
    ki: Vec3,
    kr: Vec3,
    pangles: PseudoAngles,
}

impl Psic {
    /// 创建测角仪；`n_phi` 为 phi 系表面法向
    pub fn new(lambda: f64, n_phi: Vec3) -> Result<Self> {
        if !(lambda > 0.0) || !lambda.is_finite() {
            return Err(CtrError::InvalidGeometry(format!(
                "wavelength must be positive, got {}",
                lambda
            )));
        }
        if norm(&n_phi) == 0.0 {
            return Err(CtrError::InvalidGeometry(
                "surface normal must be a nonzero vector".to_string(),
            ));
        }
        let mut gonio = Self {
            lambda,
            n_phi: normalize(&n_phi),
            angles: Angles::default(),
            z: [[0.0; 3]; 3],
            nm: [0.0; 3],
            ki: [0.0; 3],
            kr: [0.0; 3],
            pangles: PseudoAngles::default(),
        };
        gonio.update();
        Ok(gonio)
    }

    /// 原位角度更新；None 字段不动
    pub fn set_angles(&mut self, update: AngleUpdate) {
        if let Some(v) = update.phi {
            self.angles.phi = v;
        }
        if let Some(v) = update.chi {
            self.angles.chi = v;
        }
        if let Some(v) = update.eta {
            self.angles.eta = v;
        }
        if let Some(v) = update.mu {
            self.angles.mu = v;
        }
        if let Some(v) = update.nu {
            self.angles.nu = v;
        }
        if let Some(v) = update.delta {
            self.angles.delta = v;
        }
        self.update();
    }

    fn update(&mut self) {
        let a = &self.angles;
        self.z = calc_z(a.phi, a.chi, a.eta, a.mu);
        self.nm = normalize(&mat_vec(&self.z, &self.n_phi));

        let k = 2.0 * PI / self.lambda;
        self.ki = [0.0, k, 0.0];
        self.kr = [
            k * sind(a.delta),
            k * cosd(a.nu) * cosd(a.delta),
            k * sind(a.nu) * cosd(a.delta),
        ];

        let ki_hat = normalize(&self.ki);
        let kr_hat = normalize(&self.kr);
        let sin_alpha = -dot(&self.nm, &ki_hat);
        let sin_beta = dot(&self.nm, &kr_hat);
        let cos_tth = dot(&ki_hat, &kr_hat);
        self.pangles = PseudoAngles {
            alpha: sin_alpha.clamp(-1.0, 1.0).asin().to_degrees(),
            beta: sin_beta.clamp(-1.0, 1.0).asin().to_degrees(),
            tth: cos_tth.clamp(-1.0, 1.0).acos().to_degrees(),
        };
    }

    /// 当前马达角
    pub fn angles(&self) -> &Angles {
        &self.angles
    }

    /// 当前伪角
    pub fn pangles(&self) -> &PseudoAngles {
        &self.pangles
    }

    /// 样品旋转矩阵
    pub fn z(&self) -> &Mat3 {
        &self.z
    }

    /// 实验室系表面法向（单位向量）
    pub fn nm(&self) -> &Vec3 {
        &self.nm
    }

    /// 入射波矢
    pub fn ki(&self) -> &Vec3 {
        &self.ki
    }

    /// 出射波矢
    pub fn kr(&self) -> &Vec3 {
        &self.kr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn test_zero_angles_grazing() {
        let gonio = Psic::new(1.0, [0.0, 0.0, 1.0]).unwrap();
        let p = gonio.pangles();
        assert!(p.alpha.abs() < TOL);
        assert!(p.beta.abs() < TOL);
        assert!(p.tth.abs() < TOL);
    }

    #[test]
    fn test_mu_sets_incidence_angle() {
        // mu rotates the surface normal about x, tilting the surface
        // into the beam: alpha must equal mu
        let mut gonio = Psic::new(1.54, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            mu: Some(5.0),
            ..Default::default()
        });
        assert!((gonio.pangles().alpha - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_nu_sets_exit_angle() {
        let mut gonio = Psic::new(1.54, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            mu: Some(2.0),
            nu: Some(12.0),
            ..Default::default()
        });
        // beta = nu - mu for in-plane scattering at delta = 0
        assert!((gonio.pangles().beta - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_tth_from_detector_angles() {
        let mut gonio = Psic::new(1.0, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            delta: Some(30.0),
            ..Default::default()
        });
        assert!((gonio.pangles().tth - 30.0).abs() < 1e-9);

        gonio.set_angles(AngleUpdate {
            delta: Some(0.0),
            nu: Some(40.0),
            ..Default::default()
        });
        assert!((gonio.pangles().tth - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_kr_magnitude_matches_ki() {
        let mut gonio = Psic::new(0.7749, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            nu: Some(25.0),
            delta: Some(15.0),
            ..Default::default()
        });
        assert!((norm(gonio.kr()) - norm(gonio.ki())).abs() < 1e-9);
    }

    #[test]
    fn test_eta_leaves_axial_normal_fixed() {
        // eta rotates about z, so a normal along the phi axis is unmoved
        let mut gonio = Psic::new(1.0, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            eta: Some(33.0),
            ..Default::default()
        });
        assert!((gonio.nm()[2] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Psic::new(0.0, [0.0, 0.0, 1.0]).is_err());
        assert!(Psic::new(1.0, [0.0, 0.0, 0.0]).is_err());
    }
}
