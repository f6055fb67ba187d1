//! 関節位置からの姿勢（回転）推定
//!
//! 各関節の回転は、基準姿勢での子骨方向と観測された子骨方向の間の回転として
//! 求める。腕は親指角度でロール補正し、胴体・脚は肩の向きで全体回転を合成する。

use crate::math::{angle_axis_deg, from_to_rotation, mirror_quat, Quat, Vec3};
use crate::skeleton::{BodyData, JointType, TrackingState};

const LEFT_ARM: [JointType; 4] = [
    JointType::ShoulderLeft,
    JointType::ElbowLeft,
    JointType::WristLeft,
    JointType::HandLeft,
];

const RIGHT_ARM: [JointType; 4] = [
    JointType::ShoulderRight,
    JointType::ElbowRight,
    JointType::WristRight,
    JointType::HandRight,
];

/// 体幹と脚: 肩の向きによる全体回転を合成する関節
const TORSO_AND_LEGS: [JointType; 10] = [
    JointType::SpineBase,
    JointType::SpineMid,
    JointType::SpineShoulder,
    JointType::Neck,
    JointType::HipLeft,
    JointType::HipRight,
    JointType::KneeLeft,
    JointType::KneeRight,
    JointType::AnkleLeft,
    JointType::AnkleRight,
];

fn joint_valid(state: TrackingState, ignore_inferred: bool) -> bool {
    if ignore_inferred {
        state == TrackingState::Tracked
    } else {
        state != TrackingState::NotTracked
    }
}

/// 全関節の normal/mirrored 回転を更新する
///
/// 子骨方向が得られない関節は前回の回転を保持し、終端関節は単位回転になる。
pub fn calculate_joint_orients(body: &mut BodyData, ignore_inferred: bool) {
    let shoulders_dir = {
        let d = body.shoulders_direction;
        Vec3::new(d.x, d.y, -d.z)
    };
    let right = Vec3::new(1.0, 0.0, 0.0);

    for index in 0..JointType::COUNT {
        let joint = match JointType::from_index(index) {
            Some(j) => j,
            None => continue,
        };

        if !joint_valid(body.joint(joint).state, ignore_inferred) {
            continue;
        }

        let next = joint.next();
        if next == joint {
            // 終端関節には子骨がない
            let data = body.joint_mut(joint);
            data.normal_rotation = Quat::identity();
            data.mirrored_rotation = Quat::identity();
        } else if joint_valid(body.joint(next).state, ignore_inferred) {
            let base_dir = next.base_direction();
            let d = body.joint(next).direction;
            let joint_dir = Vec3::new(d.x, d.y, -d.z);

            let mut normal = if LEFT_ARM.contains(&joint) {
                angle_axis_deg(-body.left_thumb_angle, joint_dir)
                    * from_to_rotation(base_dir, joint_dir)
            } else if RIGHT_ARM.contains(&joint) {
                angle_axis_deg(-body.right_thumb_angle, joint_dir)
                    * from_to_rotation(base_dir, joint_dir)
            } else {
                from_to_rotation(base_dir, joint_dir)
            };

            if TORSO_AND_LEGS.contains(&joint) {
                normal *= from_to_rotation(right, shoulders_dir);
            }

            let data = body.joint_mut(joint);
            data.normal_rotation = normal;
            data.mirrored_rotation = mirror_quat(&normal);
        }
        // 子関節が追跡できていない場合は前回の回転を据え置く

        if joint == JointType::SpineBase {
            body.normal_rotation = body.joint(joint).normal_rotation;
            body.mirrored_rotation = body.joint(joint).mirrored_rotation;
        }
    }
}
