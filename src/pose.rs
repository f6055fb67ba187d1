use crate::math::{joint_angle, Vec3};
use crate::skeleton::JointType;

/// 関節ペアひとつ分の角度チェック
#[derive(Debug, Clone, Copy)]
pub struct PoseCheck {
    /// 角度の基準となる関節
    pub center: JointType,
    /// 角度を測る関節
    pub angle_joint: JointType,
    /// 目標角度（度）
    pub angle: f64,
    /// 許容誤差（度）
    pub threshold: f64,
}

impl PoseCheck {
    pub fn new(center: JointType, angle_joint: JointType, angle: f64, threshold: f64) -> Self {
        Self {
            center,
            angle_joint,
            angle,
            threshold,
        }
    }
}

/// 静的ポーズ定義
///
/// 全チェックが同時に成立したときのみマッチする。構築後は不変。
#[derive(Debug, Clone)]
pub struct Pose {
    pub title: &'static str,
    pub checks: Vec<PoseCheck>,
}

impl Pose {
    pub fn new(title: &'static str, checks: Vec<PoseCheck>) -> Self {
        Self { title, checks }
    }

    /// 現在の関節位置に対してポーズ判定する
    ///
    /// 許容窓が 0/360 をまたぐ場合は補集合で判定する。最初に失敗した
    /// チェックで打ち切る。
    pub fn matches(&self, positions: &[Vec3; JointType::COUNT]) -> bool {
        for check in &self.checks {
            let angle = joint_angle(
                positions[check.center as usize],
                positions[check.angle_joint as usize],
            );

            let mut lo = check.angle - check.threshold;
            let mut hi = check.angle + check.threshold;

            let in_window = if hi >= 360.0 || lo < 0.0 {
                if lo < 0.0 {
                    lo += 360.0;
                }
                hi %= 360.0;
                !(lo > angle && angle > hi)
            } else {
                lo <= angle && hi >= angle
            };

            if !in_window {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // joint_angle with the center at the origin measures the depression angle
    // of the point, flipping past 180 when the point is above the center.
    fn positions_with_angle(center: JointType, point: JointType, angle_deg: f64) -> [Vec3; JointType::COUNT] {
        let mut positions = [Vec3::zeros(); JointType::COUNT];
        let rad = angle_deg.to_radians();
        positions[center as usize] = Vec3::zeros();
        positions[point as usize] = Vec3::new(rad.cos() as f32, -rad.sin() as f32, 0.0);
        positions
    }

    fn single_check_pose(angle: f64, threshold: f64) -> Pose {
        Pose::new(
            "test",
            vec![PoseCheck::new(JointType::KneeLeft, JointType::HipLeft, angle, threshold)],
        )
    }

    #[test]
    fn test_plain_window() {
        // window [230, 270], no wrap
        let pose = single_check_pose(250.0, 20.0);
        assert!(pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 250.0)));
        assert!(pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 231.0)));
        assert!(!pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 40.0)));
        assert!(!pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 0.0)));
        assert!(!pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 355.0)));
    }

    #[test]
    fn test_wrapped_window() {
        // window [-10, 30] wraps to "not in (30, 350)"
        let pose = single_check_pose(10.0, 20.0);
        assert!(pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 0.0)));
        assert!(pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 15.0)));
        assert!(pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 355.0)));
        assert!(!pose.matches(&positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 40.0)));
    }

    #[test]
    fn test_matcher_is_deterministic() {
        let pose = single_check_pose(250.0, 20.0);
        let positions = positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 250.0);
        let first = pose.matches(&positions);
        for _ in 0..10 {
            assert_eq!(pose.matches(&positions), first);
        }
    }

    #[test]
    fn test_all_checks_must_pass() {
        let mut positions = positions_with_angle(JointType::KneeLeft, JointType::HipLeft, 250.0);
        // second pair far outside its window
        let second = positions_with_angle(JointType::KneeRight, JointType::HipRight, 90.0);
        positions[JointType::KneeRight as usize] = second[JointType::KneeRight as usize];
        positions[JointType::HipRight as usize] = second[JointType::HipRight as usize];

        let pose = Pose::new(
            "pair",
            vec![
                PoseCheck::new(JointType::KneeLeft, JointType::HipLeft, 250.0, 20.0),
                PoseCheck::new(JointType::KneeRight, JointType::HipRight, 250.0, 20.0),
            ],
        );
        assert!(!pose.matches(&positions));
    }

    #[test]
    fn test_degenerate_positions_do_not_panic() {
        // coincident joints make the angle NaN; must return a result, not panic
        let positions = [Vec3::zeros(); JointType::COUNT];
        let pose = single_check_pose(250.0, 20.0);
        let _ = pose.matches(&positions);
    }
}
