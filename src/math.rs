use nalgebra::{Unit, UnitQuaternion, Vector3};

pub type Vec3 = Vector3<f32>;
pub type Quat = UnitQuaternion<f32>;

/// 2点間の関節角度（度、0〜360）
///
/// XY平面上の余弦定理による近似角度。補助点 X = (center.x + point.x, center.y) を
/// 置き、a = |center-point| (XY), b = point.x, c = |point-X| (XY) として
/// acos((a²+b²-c²)/(2ab)) を計算する。center.y < point.y のとき 360-角度に折り返す。
/// ポーズ定義の角度定数はこの式を前提に調整されているため、3D的に正しい角度に
/// 置き換えてはならない。
pub fn joint_angle(center: Vec3, point: Vec3) -> f64 {
    let a = (((center.x - point.x) as f64).powi(2) + ((center.y - point.y) as f64).powi(2)).sqrt();
    let b = point.x as f64;
    let c = ((center.x as f64).powi(2) + ((point.y - center.y) as f64).powi(2)).sqrt();

    let mut deg = ((a * a + b * b - c * c) / (2.0 * a * b)).acos().to_degrees();
    if center.y < point.y {
        deg = 360.0 - deg;
    }
    deg
}

/// from から to への最短弧回転
///
/// 平行なら単位回転、正反対なら直交軸まわりの180度回転
pub fn from_to_rotation(from: Vec3, to: Vec3) -> Quat {
    let from = match Unit::try_new(from, 1e-6) {
        Some(v) => v,
        None => return Quat::identity(),
    };
    let to = match Unit::try_new(to, 1e-6) {
        Some(v) => v,
        None => return Quat::identity(),
    };

    match Quat::rotation_between_axis(&from, &to) {
        Some(q) => q,
        None => {
            let ortho = if from.x.abs() < 0.9 {
                from.cross(&Vec3::new(1.0, 0.0, 0.0))
            } else {
                from.cross(&Vec3::new(0.0, 1.0, 0.0))
            };
            Quat::from_axis_angle(&Unit::new_normalize(ortho), std::f32::consts::PI)
        }
    }
}

/// 軸まわりの回転（度）
pub fn angle_axis_deg(deg: f32, axis: Vec3) -> Quat {
    match Unit::try_new(axis, 1e-6) {
        Some(axis) => Quat::from_axis_angle(&axis, deg.to_radians()),
        None => Quat::identity(),
    }
}

/// 2つの回転の間の角度（度）
pub fn quat_angle_deg(a: &Quat, b: &Quat) -> f32 {
    let dot = a.coords.dot(&b.coords).abs().min(1.0);
    2.0 * dot.acos().to_degrees()
}

/// 2ベクトル間の角度（度、0〜180）
pub fn vector_angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = a.norm() * b.norm();
    if denom < 1e-12 {
        return 0.0;
    }
    (a.dot(&b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// オイラー角（度、Y→X→Z合成）から回転を作る
pub fn from_euler_deg(e: Vec3) -> Quat {
    angle_axis_deg(e.y, Vec3::new(0.0, 1.0, 0.0))
        * angle_axis_deg(e.x, Vec3::new(1.0, 0.0, 0.0))
        * angle_axis_deg(e.z, Vec3::new(0.0, 0.0, 1.0))
}

/// 回転をオイラー角（度、各成分 0〜360）に分解する
pub fn euler_deg(q: &Quat) -> Vec3 {
    let m = q.to_rotation_matrix();
    let sx = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let x = sx.asin();

    // ジンバルロック時はyに全てを寄せてzを0とする
    let (y, z) = if sx.abs() < 0.999_999 {
        (m[(0, 2)].atan2(m[(2, 2)]), m[(1, 0)].atan2(m[(1, 1)]))
    } else {
        ((-m[(2, 0)]).atan2(m[(0, 0)]), 0.0)
    };

    Vec3::new(
        wrap_deg(x.to_degrees()),
        wrap_deg(y.to_degrees()),
        wrap_deg(z.to_degrees()),
    )
}

/// 角度を 0〜360 に正規化
pub fn wrap_deg(deg: f32) -> f32 {
    let w = deg % 360.0;
    if w < 0.0 {
        w + 360.0
    } else {
        w
    }
}

/// ミラー姿勢用: Y/Z成分を反転したオイラー角
pub fn mirror_euler(e: Vec3) -> Vec3 {
    Vec3::new(e.x, -e.y, -e.z)
}

/// ミラー姿勢の回転
pub fn mirror_quat(q: &Quat) -> Quat {
    from_euler_deg(mirror_euler(euler_deg(q)))
}

/// ベクトル射影
pub fn project(v: Vec3, onto: Vec3) -> Vec3 {
    let denom = onto.dot(&onto);
    if denom < 1e-12 {
        return Vec3::zeros();
    }
    onto * (v.dot(&onto) / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() < eps, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_joint_angle_elevation() {
        // center above point: angle stays in [0, 180]
        let angle = joint_angle(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!((angle - 45.0).abs() < 1e-4, "expected 45, got {}", angle);
    }

    #[test]
    fn test_joint_angle_flips_when_point_above() {
        // center below point: flips into [180, 360)
        let angle = joint_angle(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        assert!((angle - 315.0).abs() < 1e-4, "expected 315, got {}", angle);
    }

    #[test]
    fn test_joint_angle_zero() {
        let angle = joint_angle(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert!(angle.abs() < 1e-4);
    }

    #[test]
    fn test_from_to_rotation_maps_vector() {
        let q = from_to_rotation(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let rotated = q * Vec3::new(1.0, 0.0, 0.0);
        assert_near(rotated.x, 0.0, 1e-5);
        assert_near(rotated.y, 1.0, 1e-5);
        assert_near(rotated.z, 0.0, 1e-5);
    }

    #[test]
    fn test_from_to_rotation_opposite() {
        let q = from_to_rotation(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let rotated = q * Vec3::new(0.0, 1.0, 0.0);
        assert_near(rotated.y, -1.0, 1e-5);
    }

    #[test]
    fn test_from_to_rotation_zero_vector() {
        let q = from_to_rotation(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(q, Quat::identity());
    }

    #[test]
    fn test_euler_roundtrip() {
        let e = Vec3::new(30.0, 40.0, 50.0);
        let q = from_euler_deg(e);
        let back = euler_deg(&q);
        assert_near(back.x, 30.0, 1e-3);
        assert_near(back.y, 40.0, 1e-3);
        assert_near(back.z, 50.0, 1e-3);
    }

    #[test]
    fn test_euler_negative_wraps() {
        let q = from_euler_deg(Vec3::new(-10.0, 0.0, 0.0));
        let e = euler_deg(&q);
        assert_near(e.x, 350.0, 1e-3);
    }

    #[test]
    fn test_quat_angle() {
        let a = angle_axis_deg(0.0, Vec3::new(0.0, 1.0, 0.0));
        let b = angle_axis_deg(90.0, Vec3::new(0.0, 1.0, 0.0));
        assert_near(quat_angle_deg(&a, &b), 90.0, 1e-3);
    }

    #[test]
    fn test_mirror_quat_symmetry() {
        let q = from_euler_deg(Vec3::new(20.0, 30.0, 40.0));
        let m = mirror_quat(&q);
        let em = euler_deg(&m);
        assert_near(em.x, 20.0, 1e-3);
        assert_near(em.y, 330.0, 1e-3);
        assert_near(em.z, 320.0, 1e-3);
    }

    #[test]
    fn test_project() {
        let p = project(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 1.0, 0.0));
        assert_near(p.x, 0.0, 1e-6);
        assert_near(p.y, 2.0, 1e-6);
        assert_near(p.z, 0.0, 1e-6);
    }

    #[test]
    fn test_wrap_deg() {
        assert_near(wrap_deg(370.0), 10.0, 1e-6);
        assert_near(wrap_deg(-30.0), 330.0, 1e-6);
        assert_near(wrap_deg(0.0), 0.0, 1e-6);
    }
}
