//! # 有效面积几何
//!
//! 把入射光束足迹、探测器接收范围与样品外形全部投影到样品
//! 表面平面，求出光束总面积 A_beam 与三者交集面积 A_int。
//! 校正因子 `A_beam / A_int²` 由 `ctr/correction.rs` 组装。
//!
//! ## 投影方式
//! - 光束狭缝四角沿 k̂i 投到平面 {p : n̂m·p = 0}
//! - 探测器狭缝四角（已随 nu/delta 旋转）沿 k̂r 投到同一平面
//! - 样品多边形顶点按 `Z_now·Z_refᵀ` 带到当前取向（顶点在参考
//!   角下位于表面内，变换后仍在表面平面上）；圆片样品以正多边形
//!   逼近，圆心即旋转中心
//!
//! 面积全部在表面平面的正交基 (e1, e2) 下计算。
//!
//! ## 依赖关系
//! - 被 `ctr/correction.rs` 调用
//! - 使用 `geom/gonio.rs` 的向量原语与 `geom/polygon.rs` 的裁剪

use crate::geom::gonio::{
    self, beam_vectors, calc_z, det_vectors, mat_mul, mat_vec, normalize, transpose, Psic, Vec3,
};
use crate::geom::polygon::{self, Point2};
use crate::models::params::{RefAngles, SampleShape, Slits};

/// 圆片样品的多边形逼近段数
const DISK_SEGMENTS: usize = 120;

/// 投影退化判定阈值（方向与表面夹角的正弦）
const GRAZING_EPS: f64 = 1e-12;

/// 表面平面上的光斑面积
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveArea {
    /// 光束足迹总面积 A_beam
    pub beam: f64,
    /// 光束 ∩ 探测器 ∩ 样品的交集面积 A_int
    pub intersection: f64,
}

/// 表面平面正交基
struct SurfaceBasis {
    e1: Vec3,
    e2: Vec3,
    nm: Vec3,
}

impl SurfaceBasis {
    fn new(gonio: &Psic) -> Self {
        let nm = *gonio.nm();
        let ki_hat = normalize(gonio.ki());
        // e1 取入射方向在表面内的投影；掠入射下良定义，
        // 垂直入射退化时换用任意面内方向
        let d = gonio::dot(&nm, &ki_hat);
        let mut e1 = [
            ki_hat[0] - d * nm[0],
            ki_hat[1] - d * nm[1],
            ki_hat[2] - d * nm[2],
        ];
        if gonio::norm(&e1) < 1e-9 {
            let fallback = if nm[0].abs() < 0.9 {
                [1.0, 0.0, 0.0]
            } else {
                [0.0, 1.0, 0.0]
            };
            let dd = gonio::dot(&nm, &fallback);
            e1 = [
                fallback[0] - dd * nm[0],
                fallback[1] - dd * nm[1],
                fallback[2] - dd * nm[2],
            ];
        }
        let e1 = normalize(&e1);
        let e2 = gonio::cross(&nm, &e1);
        Self { e1, e2, nm }
    }

    fn plane_coords(&self, p: &Vec3) -> Point2 {
        [gonio::dot(p, &self.e1), gonio::dot(p, &self.e2)]
    }

    /// 沿方向 dir 把空间点投到表面平面；方向掠过表面时返回 None
    fn project(&self, corners: &[Vec3], dir: &Vec3) -> Option<Vec<Point2>> {
        let dir = normalize(dir);
        let denom = gonio::dot(&self.nm, &dir);
        if denom.abs() < GRAZING_EPS {
            return None;
        }
        let mut out = Vec::with_capacity(corners.len());
        for v in corners {
            let t = -gonio::dot(&self.nm, v) / denom;
            let p = [v[0] + t * dir[0], v[1] + t * dir[1], v[2] + t * dir[2]];
            out.push(self.plane_coords(&p));
        }
        Some(out)
    }
}

/// 样品外形在当前取向下的表面平面多边形
fn sample_polygon(gonio: &Psic, sample: &SampleShape, basis: &SurfaceBasis) -> Option<Vec<Point2>> {
    match sample {
        SampleShape::None => None,
        SampleShape::Disk { diameter } => Some(polygon::circle(diameter / 2.0, DISK_SEGMENTS)),
        SampleShape::Polygon {
            vertices,
            reference_angles,
        } => {
            let RefAngles { phi, chi, eta, mu } = *reference_angles;
            let z_ref = calc_z(phi, chi, eta, mu);
            let m = mat_mul(gonio.z(), &transpose(&z_ref));
            let poly = vertices
                .iter()
                .map(|v| {
                    let lab = mat_vec(&m, &[v[0], v[1], 0.0]);
                    basis.plane_coords(&lab)
                })
                .collect();
            Some(poly)
        }
    }
}

/// 计算有效面积
///
/// 调用方保证 alpha > 0 且（给了探测器狭缝时）beta > 0；
/// 数值上仍掠过表面的投影返回 None，由调用方按零重叠处理。
pub fn active_area(
    gonio: &Psic,
    beam: &Slits,
    det: Option<&Slits>,
    sample: &SampleShape,
) -> Option<ActiveArea> {
    let basis = SurfaceBasis::new(gonio);

    let beam_corners = beam_vectors(beam.horz, beam.vert);
    let beam_poly = basis.project(&beam_corners, gonio.ki())?;
    let beam_area = polygon::area(&beam_poly);

    let det_poly = match det {
        Some(slits) => {
            let corners = det_vectors(
                slits.horz,
                slits.vert,
                gonio.angles().nu,
                gonio.angles().delta,
            );
            Some(basis.project(&corners, gonio.kr())?)
        }
        None => None,
    };

    // 交集：以样品（可为凹多边形）为被裁剪对象，光束/探测器
    // 足迹是凸四边形，依次作为裁剪多边形
    let mut inter = match sample_polygon(gonio, sample, &basis) {
        Some(sample_poly) => polygon::clip(&sample_poly, &beam_poly),
        None => beam_poly.clone(),
    };
    if let Some(ref det_poly) = det_poly {
        inter = polygon::clip(&inter, det_poly);
    }

    Some(ActiveArea {
        beam: beam_area,
        intersection: polygon::area(&inter),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::gonio::AngleUpdate;

    fn grazing_gonio(mu: f64, nu: f64) -> Psic {
        let mut gonio = Psic::new(1.0, [0.0, 0.0, 1.0]).unwrap();
        gonio.set_angles(AngleUpdate {
            mu: Some(mu),
            nu: Some(nu),
            ..Default::default()
        });
        gonio
    }

    #[test]
    fn test_beam_footprint_stretches_with_grazing_angle() {
        let slits = Slits {
            horz: 1.0,
            vert: 1.0,
        };
        let a30 = active_area(&grazing_gonio(30.0, 60.0), &slits, None, &SampleShape::None)
            .unwrap();
        let a10 = active_area(&grazing_gonio(10.0, 60.0), &slits, None, &SampleShape::None)
            .unwrap();
        // footprint area = aperture area / sin(alpha)
        let expected30 = 1.0 / (30.0_f64.to_radians().sin());
        let expected10 = 1.0 / (10.0_f64.to_radians().sin());
        assert!((a30.beam - expected30).abs() < 1e-9);
        assert!((a10.beam - expected10).abs() < 1e-9);
        // without sample or detector the full footprint is active
        assert!((a30.intersection - a30.beam).abs() < 1e-9);
    }

    #[test]
    fn test_large_disk_keeps_full_footprint() {
        let slits = Slits {
            horz: 0.5,
            vert: 0.5,
        };
        let gonio = grazing_gonio(20.0, 40.0);
        let big = SampleShape::Disk { diameter: 100.0 };
        let a = active_area(&gonio, &slits, None, &big).unwrap();
        assert!((a.intersection - a.beam).abs() / a.beam < 1e-3);
    }

    #[test]
    fn test_small_disk_limits_intersection() {
        let slits = Slits {
            horz: 2.0,
            vert: 2.0,
        };
        let gonio = grazing_gonio(20.0, 40.0);
        let small = SampleShape::Disk { diameter: 1.0 };
        let a = active_area(&gonio, &slits, None, &small).unwrap();
        // intersection bounded by the disk area
        let disk_area = std::f64::consts::PI * 0.25;
        assert!(a.intersection <= disk_area + 1e-6);
        assert!(a.intersection > 0.0);
        assert!(a.beam > a.intersection);
    }

    #[test]
    fn test_detector_slits_clip_footprint() {
        let beam = Slits {
            horz: 1.0,
            vert: 1.0,
        };
        let det = Slits {
            horz: 0.2,
            vert: 0.2,
        };
        let gonio = grazing_gonio(15.0, 30.0);
        let open = active_area(&gonio, &beam, None, &SampleShape::None).unwrap();
        let clipped = active_area(&gonio, &beam, Some(&det), &SampleShape::None).unwrap();
        assert!(clipped.intersection < open.intersection);
        assert!(clipped.intersection > 0.0);
    }

    #[test]
    fn test_square_sample_polygon_matches_disk_scale() {
        let slits = Slits {
            horz: 5.0,
            vert: 5.0,
        };
        let gonio = grazing_gonio(25.0, 50.0);
        let square = SampleShape::Polygon {
            vertices: vec![[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]],
            reference_angles: RefAngles::default(),
        };
        let a = active_area(&gonio, &slits, None, &square).unwrap();
        // beam footprint covers the whole 2x2 sample
        assert!((a.intersection - 4.0).abs() < 1e-6);
    }
}
