//! 骨格回転の可動域制限
//!
//! 推定した関節回転を親ボーンからの相対回転に直し、軸ごとの可動域に収める。
//! 範囲判定はオイラー角の大小比較ではなく、境界回転とのクォータニオン距離で
//! 行う（0/360 をまたぐ範囲をそのまま扱えるため）。

use crate::math::{angle_axis_deg, euler_deg, from_euler_deg, quat_angle_deg, Quat, Vec3};
use crate::skeleton::{BodyData, JointType, TrackingState};

/// 1軸分の可動域
#[derive(Debug, Clone)]
pub struct AxisConstraint {
    pub axis: usize,
    pub angle_min: f32,
    pub angle_max: f32,
    min_quat: Quat,
    max_quat: Quat,
    range: f32,
}

impl AxisConstraint {
    pub fn new(axis: usize, angle_min: f32, angle_max: f32) -> Self {
        let axis_vec = axis_vector(axis);
        Self {
            axis,
            angle_min,
            angle_max,
            min_quat: angle_axis_deg(angle_min, axis_vec),
            max_quat: angle_axis_deg(angle_max, axis_vec),
            range: angle_max - angle_min,
        }
    }
}

fn axis_vector(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::new(1.0, 0.0, 0.0),
        1 => Vec3::new(0.0, 1.0, 0.0),
        _ => Vec3::new(0.0, 0.0, 1.0),
    }
}

#[derive(Debug, Clone)]
pub struct JointConstraint {
    pub joint: JointType,
    pub axes: Vec<AxisConstraint>,
}

impl JointConstraint {
    fn new(joint: JointType, axes: &[(usize, f32, f32)]) -> Self {
        Self {
            joint,
            axes: axes
                .iter()
                .map(|&(axis, min, max)| AxisConstraint::new(axis, min, max))
                .collect(),
        }
    }
}

pub struct BoneOrientationConstraints {
    constraints: Vec<JointConstraint>,
}

impl Default for BoneOrientationConstraints {
    fn default() -> Self {
        Self::with_default_constraints()
    }
}

impl BoneOrientationConstraints {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// 人体の標準可動域
    pub fn with_default_constraints() -> Self {
        use JointType::*;
        let mut s = Self::new();

        s.add(SpineMid, &[(0, -5.0, 5.0), (1, -5.0, 5.0), (2, -5.0, 5.0)]);
        s.add(
            SpineShoulder,
            &[(0, -10.0, 20.0), (1, -60.0, 60.0), (2, -20.0, 20.0)],
        );
        s.add(Neck, &[(0, -10.0, 30.0), (1, -10.0, 10.0), (2, -30.0, 30.0)]);
        s.add(
            ShoulderLeft,
            &[(0, -30.0, 30.0), (1, -50.0, 90.0), (2, -110.0, 90.0)],
        );
        s.add(
            ShoulderRight,
            &[(0, -30.0, 30.0), (1, -90.0, 50.0), (2, -110.0, 90.0)],
        );
        s.add(
            ElbowLeft,
            &[(0, -90.0, 90.0), (1, -90.0, 90.0), (2, -10.0, 180.0)],
        );
        s.add(
            ElbowRight,
            &[(0, -90.0, 90.0), (1, -90.0, 90.0), (2, -10.0, 180.0)],
        );
        s.add(
            WristLeft,
            &[(0, -90.0, 90.0), (1, -60.0, 60.0), (2, -60.0, 60.0)],
        );
        s.add(
            WristRight,
            &[(0, -90.0, 90.0), (1, -60.0, 60.0), (2, -90.0, 90.0)],
        );
        s.add(HandLeft, &[(0, -10.0, 10.0), (1, -30.0, 30.0), (2, -30.0, 30.0)]);
        s.add(HandRight, &[(0, -10.0, 10.0), (1, -30.0, 30.0), (2, -30.0, 30.0)]);
        s.add(
            HipLeft,
            &[(0, -100.0, 60.0), (1, -90.0, 90.0), (2, -100.0, 30.0)],
        );
        s.add(
            HipRight,
            &[(0, -100.0, 60.0), (1, -90.0, 90.0), (2, -30.0, 100.0)],
        );
        s.add(KneeLeft, &[(0, 0.0, 100.0), (1, -10.0, 10.0), (2, -45.0, 45.0)]);
        s.add(KneeRight, &[(0, 0.0, 100.0), (1, -10.0, 10.0), (2, -45.0, 45.0)]);
        s.add(FootLeft, &[(0, -20.0, 20.0), (1, -20.0, 20.0), (2, -30.0, 30.0)]);
        s.add(FootRight, &[(0, -20.0, 20.0), (1, -20.0, 20.0), (2, -30.0, 30.0)]);

        s
    }

    fn add(&mut self, joint: JointType, axes: &[(usize, f32, f32)]) {
        self.constraints.push(JointConstraint::new(joint, axes));
    }

    /// 可動域外の関節回転を境界まで丸める
    pub fn apply(&self, body: &mut BodyData) {
        for jc in &self.constraints {
            let joint = jc.joint;
            if joint == JointType::SpineBase {
                continue;
            }

            let parent = joint.parent();
            if body.joint(joint).state == TrackingState::NotTracked
                || body.joint(parent).state == TrackingState::NotTracked
            {
                continue;
            }

            let joint_normal = body.joint(joint).normal_rotation;
            if joint_normal == Quat::identity() {
                continue;
            }
            let joint_mirrored = body.joint(joint).mirrored_rotation;
            let parent_normal = body.joint(parent).normal_rotation;
            let parent_mirrored = body.joint(parent).mirrored_rotation;

            let local_normal = parent_normal.inverse() * joint_normal;
            let local_mirrored = parent_mirrored.inverse() * joint_mirrored;

            let mut euler_normal = euler_deg(&local_normal);
            let mut euler_mirrored = euler_deg(&local_mirrored);
            let mut clamped = false;

            for ac in &jc.axes {
                let axis_vec = axis_vector(ac.axis);
                let axis_rotation = angle_axis_deg(euler_normal[ac.axis], axis_vec);

                let from_min = quat_angle_deg(&axis_rotation, &ac.min_quat);
                let from_max = quat_angle_deg(&axis_rotation, &ac.max_quat);
                if from_min <= ac.range && from_max <= ac.range {
                    continue;
                }

                // 近い側の境界へ丸める
                let bound = if from_min > from_max {
                    ac.angle_max
                } else {
                    ac.angle_min
                };
                euler_normal[ac.axis] = bound;
                euler_mirrored[ac.axis] = if ac.axis == 0 { bound } else { -bound };
                clamped = true;
            }

            if clamped {
                let data = body.joint_mut(joint);
                data.normal_rotation = parent_normal * from_euler_deg(euler_normal);
                data.mirrored_rotation = parent_mirrored * from_euler_deg(euler_mirrored);
            }
        }
    }
}
