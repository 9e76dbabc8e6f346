//! # 二维多边形原语
//!
//! 有效面积校正所需的最小多边形工具集：鞋带公式面积、
//! Sutherland-Hodgman 裁剪（裁剪多边形须为凸）、圆的正多边形
//! 逼近。顶点按任意方向给入均可，内部统一成逆时针。
//!
//! ## 依赖关系
//! - 被 `geom/area.rs` 使用
//! - 无外部模块依赖

/// 二维点 [x, y]
pub type Point2 = [f64; 2];

/// 有符号面积（逆时针为正）
fn signed_area(poly: &[Point2]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum / 2.0
}

/// 多边形面积（绝对值）
pub fn area(poly: &[Point2]) -> f64 {
    signed_area(poly).abs()
}

/// 逆时针化：顺时针输入被翻转
pub fn ccw(poly: &[Point2]) -> Vec<Point2> {
    let mut out = poly.to_vec();
    if signed_area(poly) < 0.0 {
        out.reverse();
    }
    out
}

/// 裁剪边 (a, b) 的内侧判定，裁剪多边形逆时针
fn inside(p: &Point2, a: &Point2, b: &Point2) -> bool {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]) >= 0.0
}

/// 线段 (p, q) 与裁剪边 (a, b) 所在直线的交点
fn intersection(p: &Point2, q: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let d1 = [q[0] - p[0], q[1] - p[1]];
    let d2 = [b[0] - a[0], b[1] - a[1]];
    let denom = d1[0] * d2[1] - d1[1] * d2[0];
    if denom.abs() < 1e-300 {
        // 平行退化，返回端点即可（上游 inside 判定保证不会放大误差）
        return *q;
    }
    let t = ((a[0] - p[0]) * d2[1] - (a[1] - p[1]) * d2[0]) / denom;
    [p[0] + t * d1[0], p[1] + t * d1[1]]
}

/// Sutherland-Hodgman 裁剪
///
/// `subject` 可为任意简单多边形，`clip` 必须是凸多边形。
/// 返回交集多边形的顶点（可能为空）。
pub fn clip(subject: &[Point2], clip_poly: &[Point2]) -> Vec<Point2> {
    if subject.len() < 3 || clip_poly.len() < 3 {
        return Vec::new();
    }
    let clip_poly = ccw(clip_poly);
    let mut output = subject.to_vec();

    for i in 0..clip_poly.len() {
        if output.is_empty() {
            return Vec::new();
        }
        let a = clip_poly[i];
        let b = clip_poly[(i + 1) % clip_poly.len()];
        let input = std::mem::take(&mut output);

        for j in 0..input.len() {
            let p = input[j];
            let q = input[(j + 1) % input.len()];
            let p_in = inside(&p, &a, &b);
            let q_in = inside(&q, &a, &b);
            if p_in {
                output.push(p);
                if !q_in {
                    output.push(intersection(&p, &q, &a, &b));
                }
            } else if q_in {
                output.push(intersection(&p, &q, &a, &b));
            }
        }
    }
    output
}

/// 半径 r 的圆的正 n 边形逼近，圆心在原点
pub fn circle(radius: f64, n: usize) -> Vec<Point2> {
    (0..n)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
            [radius * theta.cos(), radius * theta.sin()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point2> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
    }

    #[test]
    fn test_area_square() {
        assert!((area(&unit_square()) - 1.0).abs() < 1e-12);
        // orientation must not matter
        let mut cw = unit_square();
        cw.reverse();
        assert!((area(&cw) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_overlapping_squares() {
        let a = unit_square();
        let b = vec![[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 1.5]];
        let inter = clip(&a, &b);
        assert!((area(&inter) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_clip_disjoint() {
        let a = unit_square();
        let b = vec![[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 3.0]];
        assert_eq!(area(&clip(&a, &b)), 0.0);
    }

    #[test]
    fn test_clip_contained() {
        let a = vec![[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75]];
        let inter = clip(&a, &unit_square());
        assert!((area(&inter) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_clip_clockwise_clip_polygon() {
        let a = unit_square();
        let mut b = unit_square();
        b.reverse();
        let inter = clip(&a, &b);
        assert!((area(&inter) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_area_converges() {
        let poly = circle(2.0, 360);
        let exact = std::f64::consts::PI * 4.0;
        assert!((area(&poly) - exact).abs() / exact < 1e-3);
    }
}
