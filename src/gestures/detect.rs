//! ジェスチャーごとのフェーズ判定
//!
//! 各ジェスチャーは `(GestureData, スナップショット, 現在時刻) -> GestureData` の
//! 純関数として独立に実装する。判定に使う距離・角度の定数は各ジェスチャーの
//! 検出感度そのものなので、値を変えると検出挙動が変わる。

use crate::math::{vector_angle_deg, Vec3};
use crate::pose::{Pose, PoseCheck};
use crate::skeleton::JointType;
use crate::skeleton::JointType::{
    AnkleLeft, AnkleRight, ElbowLeft, ElbowRight, HandLeft, HandRight, HipLeft, HipRight,
    KneeLeft, KneeRight, ShoulderLeft, ShoulderRight, SpineBase, WristLeft, WristRight,
};

use super::{GestureData, GestureType, JointSnapshot, POSE_COMPLETE_DURATION};

/// 1フレーム分のジェスチャー状態遷移
///
/// 完了済みデータはリセットされるまで変化しない。
pub fn step(data: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    if data.complete {
        return data;
    }

    match data.gesture {
        GestureType::None => data,
        GestureType::RaiseRightHand => raise_right_hand(data, s, now),
        GestureType::RaiseLeftHand => raise_left_hand(data, s, now),
        GestureType::Psi => psi(data, s, now),
        GestureType::Tpose => tpose(data, s, now),
        GestureType::Stop => stop(data, s, now),
        GestureType::Wave => wave(data, s, now),
        GestureType::SwipeLeft => swipe_left(data, s, now),
        GestureType::SwipeRight => swipe_right(data, s, now),
        GestureType::SwipeUp => swipe_up(data, s, now),
        GestureType::SwipeDown => swipe_down(data, s, now),
        GestureType::ZoomOut => zoom_out(data, s, now),
        GestureType::ZoomIn => zoom_in(data, s, now),
        GestureType::Wheel => wheel(data, s, now),
        GestureType::Jump => jump(data, s, now),
        GestureType::Squat => squat(data, s, now),
        GestureType::Push => push(data, s, now),
        GestureType::Pull => pull(data, s, now),
        GestureType::TheFirstMove => compound_move(data, s, now, the_first_move_pose(), true),
        GestureType::TheSecondMove => compound_move(data, s, now, the_second_move_pose(), false),
        GestureType::TheThirdMove => compound_move(data, s, now, the_third_move_pose(), false),
        GestureType::TheForthMove => compound_move(data, s, now, the_forth_move_pose(), false),
    }
}

fn set_gesture_joint(d: &mut GestureData, now: f32, joint: JointType, joint_pos: Vec3) {
    d.joint = joint;
    d.joint_pos = joint_pos;
    d.timestamp = now;
    d.state += 1;
}

fn set_cancelled(d: &mut GestureData) {
    d.state = 0;
    d.progress = 0.0;
    d.cancelled = true;
}

/// ホールド判定: duration 秒ポーズを保持したら完了、崩れたら即キャンセル
fn check_pose_complete(d: &mut GestureData, now: f32, joint_pos: Vec3, in_pose: bool, duration: f32) {
    if in_pose {
        let elapsed = now - d.timestamp;
        d.progress = if duration > 0.0 {
            (elapsed / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if elapsed >= duration {
            d.timestamp = now;
            d.joint_pos = joint_pos;
            d.state += 1;
            d.complete = true;
        }
    } else {
        set_cancelled(d);
    }
}

/// ズーム倍率を screen_pos.z に書き込む
fn set_zoom_factor(d: &mut GestureData, s: &JointSnapshot, initial_zoom: f32) {
    let vector_zooming = s.pos(HandRight) - s.pos(HandLeft);

    if d.tag_float == 0.0 {
        // 100%に相当する基準距離
        d.tag_float = 0.5;
    }

    d.screen_pos.z = initial_zoom + vector_zooming.norm() / d.tag_float;
}

/// ホイール回転角を screen_pos.z に書き込む
fn set_wheel_rotation(d: &mut GestureData, initial: Vec3, current: Vec3) {
    let sign = if current.y - initial.y >= 0.0 { 1.0 } else { -1.0 };
    d.screen_pos.z = vector_angle_deg(initial, current) * sign;
}

fn raise_right_hand(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ShoulderRight)
                && s.pos(HandRight).y - s.pos(ShoulderRight).y > 0.1
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
            }
        }
        _ => {
            let in_pose = s.is_tracked(HandRight)
                && s.is_tracked(ShoulderRight)
                && s.pos(HandRight).y - s.pos(ShoulderRight).y > 0.1;
            let joint_pos = s.pos(d.joint);
            check_pose_complete(&mut d, now, joint_pos, in_pose, POSE_COMPLETE_DURATION);
        }
    }
    d
}

fn raise_left_hand(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandLeft)
                && s.is_tracked(ShoulderLeft)
                && s.pos(HandLeft).y - s.pos(ShoulderLeft).y > 0.1
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
            }
        }
        _ => {
            let in_pose = s.is_tracked(HandLeft)
                && s.is_tracked(ShoulderLeft)
                && s.pos(HandLeft).y - s.pos(ShoulderLeft).y > 0.1;
            let joint_pos = s.pos(d.joint);
            check_pose_complete(&mut d, now, joint_pos, in_pose, POSE_COMPLETE_DURATION);
        }
    }
    d
}

fn psi_pose_held(s: &JointSnapshot) -> bool {
    s.is_tracked(HandRight)
        && s.is_tracked(ShoulderRight)
        && s.pos(HandRight).y - s.pos(ShoulderRight).y > 0.1
        && s.is_tracked(HandLeft)
        && s.is_tracked(ShoulderLeft)
        && s.pos(HandLeft).y - s.pos(ShoulderLeft).y > 0.1
}

fn psi(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if psi_pose_held(s) {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
            }
        }
        _ => {
            let in_pose = psi_pose_held(s);
            let joint_pos = s.pos(d.joint);
            check_pose_complete(&mut d, now, joint_pos, in_pose, POSE_COMPLETE_DURATION);
        }
    }
    d
}

fn tpose_held(s: &JointSnapshot) -> bool {
    s.is_tracked(HandRight)
        && s.is_tracked(ElbowRight)
        && s.is_tracked(ShoulderRight)
        && (s.pos(ElbowRight).y - s.pos(ShoulderRight).y).abs() < 0.1
        && (s.pos(HandRight).y - s.pos(ShoulderRight).y).abs() < 0.1
        && s.is_tracked(HandLeft)
        && s.is_tracked(ElbowLeft)
        && s.is_tracked(ShoulderLeft)
        && (s.pos(ElbowLeft).y - s.pos(ShoulderLeft).y).abs() < 0.1
        && (s.pos(HandLeft).y - s.pos(ShoulderLeft).y).abs() < 0.1
}

fn tpose(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if tpose_held(s) {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
            }
        }
        _ => {
            let in_pose = tpose_held(s);
            let joint_pos = s.pos(d.joint);
            check_pose_complete(&mut d, now, joint_pos, in_pose, POSE_COMPLETE_DURATION);
        }
    }
    d
}

fn stop_held(s: &JointSnapshot) -> bool {
    s.is_tracked(HandRight)
        && s.is_tracked(HipRight)
        && s.pos(HandRight).y - s.pos(HipRight).y < 0.0
        && s.is_tracked(HandLeft)
        && s.is_tracked(HipLeft)
        && s.pos(HandLeft).y - s.pos(HipLeft).y < 0.0
}

fn stop(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if stop_held(s) {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
            }
        }
        _ => {
            let in_pose = stop_held(s);
            let joint_pos = s.pos(d.joint);
            check_pose_complete(&mut d, now, joint_pos, in_pose, POSE_COMPLETE_DURATION);
        }
    }
    d
}

/// 3フェーズの手振り: 上げた手を左右に往復させる
fn wave(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ElbowRight)
                && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.1
                && s.pos(HandRight).x - s.pos(ElbowRight).x > 0.05
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.3;
            } else if s.is_tracked(HandLeft)
                && s.is_tracked(ElbowLeft)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.1
                && s.pos(HandLeft).x - s.pos(ElbowLeft).x < -0.05
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.3;
            }
        }
        1 => {
            // 逆側への振り
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.1
                        && s.pos(HandRight).x - s.pos(ElbowRight).x < -0.05
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.1
                        && s.pos(HandLeft).x - s.pos(ElbowLeft).x > 0.05
                };

                if in_pose {
                    d.timestamp = now;
                    d.state += 1;
                    d.progress = 0.7;
                }
            } else {
                set_cancelled(&mut d);
            }
        }
        _ => {
            // 元の側へ戻って完了
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.1
                        && s.pos(HandRight).x - s.pos(ElbowRight).x > 0.05
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.1
                        && s.pos(HandLeft).x - s.pos(ElbowLeft).x < -0.05
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn swipe_left(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ElbowRight)
                && s.pos(HandRight).y - s.pos(ElbowRight).y > -0.05
                && s.pos(HandRight).x - s.pos(ElbowRight).x > 0.0
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && (s.pos(HandRight).y - s.pos(ElbowRight).y).abs() < 0.1
                        && (s.pos(HandRight).y - d.joint_pos.y).abs() < 0.08
                        && s.pos(HandRight).x - d.joint_pos.x < -0.15
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && (s.pos(HandLeft).y - s.pos(ElbowLeft).y).abs() < 0.1
                        && (s.pos(HandLeft).y - d.joint_pos.y).abs() < 0.08
                        && s.pos(HandLeft).x - d.joint_pos.x < -0.15
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn swipe_right(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandLeft)
                && s.is_tracked(ElbowLeft)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > -0.05
                && s.pos(HandLeft).x - s.pos(ElbowLeft).x < 0.0
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && (s.pos(HandRight).y - s.pos(ElbowRight).y).abs() < 0.1
                        && (s.pos(HandRight).y - d.joint_pos.y).abs() < 0.08
                        && s.pos(HandRight).x - d.joint_pos.x > 0.15
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && (s.pos(HandLeft).y - s.pos(ElbowLeft).y).abs() < 0.1
                        && (s.pos(HandLeft).y - d.joint_pos.y).abs() < 0.08
                        && s.pos(HandLeft).x - d.joint_pos.x > 0.15
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn swipe_up(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ElbowRight)
                && s.pos(HandRight).y - s.pos(ElbowRight).y < -0.05
                && s.pos(HandRight).y - s.pos(ElbowRight).y > -0.15
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.5;
            } else if s.is_tracked(HandLeft)
                && s.is_tracked(ElbowLeft)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y < -0.05
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > -0.15
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && s.is_tracked(ShoulderLeft)
                        && s.pos(HandRight).y - s.pos(ShoulderLeft).y > 0.05
                        && (s.pos(HandRight).x - d.joint_pos.x).abs() < 0.08
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && s.is_tracked(ShoulderRight)
                        && s.pos(HandLeft).y - s.pos(ShoulderRight).y > 0.05
                        && (s.pos(HandLeft).x - d.joint_pos.x).abs() < 0.08
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn swipe_down(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ShoulderLeft)
                && s.pos(HandRight).y - s.pos(ShoulderLeft).y >= 0.05
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.5;
            } else if s.is_tracked(HandLeft)
                && s.is_tracked(ShoulderRight)
                && s.pos(HandLeft).y - s.pos(ShoulderRight).y >= 0.05
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && s.pos(HandRight).y - d.joint_pos.y < -0.2
                        && (s.pos(HandRight).x - d.joint_pos.x).abs() < 0.08
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && s.pos(HandLeft).y - d.joint_pos.y < -0.2
                        && (s.pos(HandLeft).x - d.joint_pos.x).abs() < 0.08
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn both_hands_tracked(s: &JointSnapshot) -> bool {
    s.is_tracked(HandLeft)
        && s.is_tracked(ElbowLeft)
        && s.is_tracked(HandRight)
        && s.is_tracked(ElbowRight)
}

/// 連続ジェスチャー: 完了せず screen_pos.z の倍率更新を繰り返す
fn zoom_out(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            let dist = (s.pos(HandRight) - s.pos(HandLeft)).norm();

            if both_hands_tracked(s)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0
                && dist < 0.2
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.3;
            }
        }
        _ => {
            if now - d.timestamp < 1.0 {
                let in_pose = both_hands_tracked(s)
                    && (s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                        || s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0);

                if in_pose {
                    set_zoom_factor(&mut d, s, 1.0);
                    d.timestamp = now;
                    d.progress = 0.7;
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn zoom_in(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            let dist = (s.pos(HandRight) - s.pos(HandLeft)).norm();

            if both_hands_tracked(s)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0
                && dist >= 0.7
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.tag_float = dist;
                d.progress = 0.3;
            }
        }
        _ => {
            if now - d.timestamp < 1.0 {
                let in_pose = both_hands_tracked(s)
                    && (s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                        || s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0);

                if in_pose {
                    set_zoom_factor(&mut d, s, 0.0);
                    d.timestamp = now;
                    d.progress = 0.7;
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn wheel(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    let vector_wheel = s.pos(HandRight) - s.pos(HandLeft);
    let dist_wheel = vector_wheel.norm();

    match d.state {
        0 => {
            if both_hands_tracked(s)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                && s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0
                && dist_wheel > 0.2
                && dist_wheel < 0.7
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.tag_vector = vector_wheel;
                d.tag_float = dist_wheel;
                d.progress = 0.3;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = both_hands_tracked(s)
                    && (s.pos(HandLeft).y - s.pos(ElbowLeft).y > 0.0
                        || (s.pos(HandRight).y - s.pos(ElbowRight).y > 0.0
                            && (dist_wheel - d.tag_float).abs() < 0.1));

                if in_pose {
                    let initial = d.tag_vector;
                    set_wheel_rotation(&mut d, initial, vector_wheel);
                    d.timestamp = now;
                    d.tag_float = dist_wheel;
                    d.progress = 0.7;
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn jump(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(SpineBase)
                && s.pos(SpineBase).y > 0.8
                && s.pos(SpineBase).y < 1.3
            {
                set_gesture_joint(&mut d, now, SpineBase, s.pos(SpineBase));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = s.is_tracked(SpineBase)
                    && s.pos(SpineBase).y - d.joint_pos.y > 0.15
                    && (s.pos(SpineBase).x - d.joint_pos.x).abs() < 0.15;

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn squat(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(SpineBase) && s.pos(SpineBase).y < 0.8 {
                set_gesture_joint(&mut d, now, SpineBase, s.pos(SpineBase));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = s.is_tracked(SpineBase)
                    && s.pos(SpineBase).y - d.joint_pos.y < -0.15
                    && (s.pos(SpineBase).x - d.joint_pos.x).abs() < 0.15;

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn push(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ElbowRight)
                && s.pos(HandRight).y - s.pos(ElbowRight).y > -0.05
                && (s.pos(HandRight).x - s.pos(ElbowRight).x).abs() < 0.15
                && s.pos(HandRight).z - s.pos(ElbowRight).z < -0.05
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.5;
            } else if s.is_tracked(HandLeft)
                && s.is_tracked(ElbowLeft)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > -0.05
                && (s.pos(HandLeft).x - s.pos(ElbowLeft).x).abs() < 0.15
                && s.pos(HandLeft).z - s.pos(ElbowLeft).z < -0.05
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && (s.pos(HandRight).x - d.joint_pos.x).abs() < 0.15
                        && (s.pos(HandRight).y - d.joint_pos.y).abs() < 0.15
                        && s.pos(HandRight).z - d.joint_pos.z < -0.15
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && (s.pos(HandLeft).x - d.joint_pos.x).abs() < 0.15
                        && (s.pos(HandLeft).y - d.joint_pos.y).abs() < 0.15
                        && s.pos(HandLeft).z - d.joint_pos.z < -0.15
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn pull(mut d: GestureData, s: &JointSnapshot, now: f32) -> GestureData {
    match d.state {
        0 => {
            if s.is_tracked(HandRight)
                && s.is_tracked(ElbowRight)
                && s.pos(HandRight).y - s.pos(ElbowRight).y > -0.05
                && (s.pos(HandRight).x - s.pos(ElbowRight).x).abs() < 0.15
                && s.pos(HandRight).z - s.pos(ElbowRight).z < -0.15
            {
                set_gesture_joint(&mut d, now, HandRight, s.pos(HandRight));
                d.progress = 0.5;
            } else if s.is_tracked(HandLeft)
                && s.is_tracked(ElbowLeft)
                && s.pos(HandLeft).y - s.pos(ElbowLeft).y > -0.05
                && (s.pos(HandLeft).x - s.pos(ElbowLeft).x).abs() < 0.15
                && s.pos(HandLeft).z - s.pos(ElbowLeft).z < -0.15
            {
                set_gesture_joint(&mut d, now, HandLeft, s.pos(HandLeft));
                d.progress = 0.5;
            }
        }
        _ => {
            if now - d.timestamp < 1.5 {
                let in_pose = if d.joint == HandRight {
                    s.is_tracked(HandRight)
                        && s.is_tracked(ElbowRight)
                        && (s.pos(HandRight).x - d.joint_pos.x).abs() < 0.15
                        && (s.pos(HandRight).y - d.joint_pos.y).abs() < 0.15
                        && s.pos(HandRight).z - d.joint_pos.z > 0.15
                } else {
                    s.is_tracked(HandLeft)
                        && s.is_tracked(ElbowLeft)
                        && (s.pos(HandLeft).x - d.joint_pos.x).abs() < 0.15
                        && (s.pos(HandLeft).y - d.joint_pos.y).abs() < 0.15
                        && s.pos(HandLeft).z - d.joint_pos.z > 0.15
                };

                if in_pose {
                    let joint_pos = s.pos(d.joint);
                    check_pose_complete(&mut d, now, joint_pos, true, 0.0);
                }
            } else {
                set_cancelled(&mut d);
            }
        }
    }
    d
}

fn the_first_move_pose() -> Pose {
    Pose::new(
        "the_first_move",
        vec![
            PoseCheck::new(ShoulderLeft, ElbowLeft, 250.0, 20.0),
            PoseCheck::new(ElbowLeft, WristLeft, 300.0, 20.0),
            PoseCheck::new(ShoulderRight, ElbowRight, 290.0, 20.0),
            PoseCheck::new(ElbowRight, WristRight, 240.0, 20.0),
            PoseCheck::new(KneeLeft, HipLeft, 290.0, 15.0),
            PoseCheck::new(AnkleLeft, KneeLeft, 290.0, 15.0),
            PoseCheck::new(KneeRight, HipRight, 250.0, 15.0),
            PoseCheck::new(AnkleRight, KneeRight, 250.0, 15.0),
        ],
    )
}

fn the_second_move_pose() -> Pose {
    Pose::new(
        "the_second_move",
        vec![
            PoseCheck::new(ShoulderLeft, ElbowLeft, 195.0, 15.0),
            PoseCheck::new(ElbowLeft, WristLeft, 260.0, 15.0),
            PoseCheck::new(ShoulderRight, ElbowRight, 45.0, 15.0),
            PoseCheck::new(ElbowRight, WristRight, 45.0, 15.0),
            PoseCheck::new(KneeLeft, HipLeft, 290.0, 15.0),
            PoseCheck::new(AnkleLeft, KneeLeft, 290.0, 20.0),
            PoseCheck::new(KneeRight, HipRight, 250.0, 15.0),
            PoseCheck::new(AnkleRight, KneeRight, 250.0, 15.0),
        ],
    )
}

fn the_third_move_pose() -> Pose {
    Pose::new(
        "the_third_move",
        vec![
            PoseCheck::new(ShoulderLeft, ElbowLeft, 200.0, 20.0),
            PoseCheck::new(ElbowLeft, WristLeft, 200.0, 20.0),
            PoseCheck::new(ShoulderRight, ElbowRight, 25.0, 20.0),
            PoseCheck::new(ElbowRight, WristRight, 205.0, 20.0),
            PoseCheck::new(KneeLeft, HipLeft, 290.0, 20.0),
            PoseCheck::new(AnkleLeft, KneeLeft, 290.0, 20.0),
            PoseCheck::new(KneeRight, HipRight, 250.0, 20.0),
            PoseCheck::new(AnkleRight, KneeRight, 250.0, 20.0),
        ],
    )
}

fn the_forth_move_pose() -> Pose {
    Pose::new(
        "the_forth_move",
        vec![
            PoseCheck::new(ShoulderLeft, ElbowLeft, 220.0, 15.0),
            PoseCheck::new(ElbowLeft, WristLeft, 230.0, 15.0),
            PoseCheck::new(ShoulderRight, ElbowRight, 320.0, 15.0),
            PoseCheck::new(ElbowRight, WristRight, 310.0, 15.0),
            PoseCheck::new(KneeLeft, HipLeft, 290.0, 15.0),
            PoseCheck::new(AnkleLeft, KneeLeft, 290.0, 15.0),
            PoseCheck::new(KneeRight, HipRight, 250.0, 15.0),
            PoseCheck::new(AnkleRight, KneeRight, 250.0, 15.0),
        ],
    )
}

/// 全身8角度チェックの複合ポーズ: 成立した瞬間に完了する
fn compound_move(
    mut d: GestureData,
    s: &JointSnapshot,
    now: f32,
    pose: Pose,
    wrist_guard: bool,
) -> GestureData {
    if d.state != 0 {
        return d;
    }

    let hands_ok = if wrist_guard {
        s.is_tracked(WristLeft) && s.is_tracked(WristRight)
    } else {
        s.is_tracked(HandLeft) && s.is_tracked(HandRight)
    };

    let limbs_tracked = s.is_tracked(ShoulderLeft)
        && s.is_tracked(ElbowLeft)
        && hands_ok
        && s.is_tracked(ShoulderRight)
        && s.is_tracked(ElbowRight)
        && s.is_tracked(KneeLeft)
        && s.is_tracked(HipLeft)
        && s.is_tracked(AnkleLeft)
        && s.is_tracked(KneeRight)
        && s.is_tracked(HipRight)
        && s.is_tracked(AnkleRight);

    if limbs_tracked && pose.matches(&s.positions) {
        let joint_pos = s.pos(d.joint);
        check_pose_complete(&mut d, now, joint_pos, true, 0.0);
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestures::GestureData;

    fn snapshot() -> JointSnapshot {
        JointSnapshot::new()
    }

    fn raised_right_hand() -> JointSnapshot {
        let mut s = snapshot();
        s.set(ShoulderRight, Vec3::new(0.2, 1.4, 2.0));
        s.set(HandRight, Vec3::new(0.25, 1.7, 2.0));
        s
    }

    #[test]
    fn test_raise_right_hand_completes_after_hold() {
        let s = raised_right_hand();
        let mut d = GestureData::new(1, GestureType::RaiseRightHand);

        d = step(d, &s, 10.0);
        assert_eq!(d.state, 1);
        assert_eq!(d.joint, HandRight);
        assert!(!d.complete);

        d = step(d, &s, 10.5);
        assert!(!d.complete);
        assert!((d.progress - 0.5).abs() < 1e-5, "progress = {}", d.progress);

        d = step(d, &s, 11.1);
        assert!(d.complete);
        assert_eq!(d.progress, 1.0);
    }

    #[test]
    fn test_complete_gesture_is_noop() {
        let s = raised_right_hand();
        let mut d = GestureData::new(1, GestureType::RaiseRightHand);
        d = step(d, &s, 0.0);
        d = step(d, &s, 1.5);
        assert!(d.complete);

        let frozen = d.clone();
        let d = step(d, &s, 2.0);
        assert_eq!(d.state, frozen.state);
        assert_eq!(d.timestamp, frozen.timestamp);
        assert_eq!(d.progress, frozen.progress);
    }

    #[test]
    fn test_hold_cancelled_on_tracking_loss() {
        let s = raised_right_hand();
        let mut d = GestureData::new(1, GestureType::RaiseRightHand);
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);

        let mut lost = raised_right_hand();
        lost.tracked[HandRight as usize] = false;
        d = step(d, &lost, 0.3);

        assert!(d.cancelled);
        assert_eq!(d.state, 0);
        assert_eq!(d.progress, 0.0);
    }

    #[test]
    fn test_hold_cancelled_when_hand_drops() {
        let s = raised_right_hand();
        let mut d = GestureData::new(1, GestureType::RaiseRightHand);
        d = step(d, &s, 0.0);

        let mut dropped = snapshot();
        dropped.set(ShoulderRight, Vec3::new(0.2, 1.4, 2.0));
        dropped.set(HandRight, Vec3::new(0.25, 1.0, 2.0));
        d = step(d, &dropped, 0.4);

        assert!(d.cancelled);
    }

    #[test]
    fn test_psi_requires_both_hands() {
        let s = raised_right_hand();
        let d = GestureData::new(1, GestureType::Psi);
        let d = step(d, &s, 0.0);
        assert_eq!(d.state, 0);

        let mut both = raised_right_hand();
        both.set(ShoulderLeft, Vec3::new(-0.2, 1.4, 2.0));
        both.set(HandLeft, Vec3::new(-0.25, 1.7, 2.0));
        let d = step(d, &both, 0.1);
        assert_eq!(d.state, 1);
    }

    #[test]
    fn test_wave_right_hand_three_phases() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::Wave);

        // phase 0: hand up and to the right of the elbow
        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.1, 0.2, 0.0));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);
        assert!((d.progress - 0.3).abs() < 1e-6);

        // phase 1: swings to the left side
        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(-0.1, 0.2, 0.0));
        d = step(d, &s, 0.5);
        assert_eq!(d.state, 2);
        assert!((d.progress - 0.7).abs() < 1e-6);

        // phase 2: returns to the right side and completes
        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.1, 0.2, 0.0));
        d = step(d, &s, 1.0);
        assert!(d.complete);
    }

    #[test]
    fn test_wave_times_out() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::Wave);

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.1, 0.2, 0.0));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);

        // no swing within the 1.5s window
        d = step(d, &s, 2.0);
        assert!(d.cancelled);
        assert_eq!(d.state, 0);
    }

    #[test]
    fn test_swipe_left_travel() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::SwipeLeft);

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.1, 0.0, 0.0));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);
        let anchor = d.joint_pos;

        // moved 0.2m left at the same height
        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, anchor + Vec3::new(-0.2, 0.0, 0.0));
        d = step(d, &s, 0.5);
        assert!(d.complete);
    }

    #[test]
    fn test_swipe_left_insufficient_travel() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::SwipeLeft);

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.1, 0.0, 0.0));
        d = step(d, &s, 0.0);
        let anchor = d.joint_pos;

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, anchor + Vec3::new(-0.1, 0.0, 0.0));
        d = step(d, &s, 0.5);
        assert!(!d.complete);

        // and the window eventually expires
        d = step(d, &s, 2.0);
        assert!(d.cancelled);
    }

    fn zoom_snapshot(hand_dist: f32) -> JointSnapshot {
        let mut s = snapshot();
        s.set(ElbowLeft, Vec3::new(-0.3, 1.1, 2.0));
        s.set(ElbowRight, Vec3::new(0.3, 1.1, 2.0));
        s.set(HandLeft, Vec3::new(-hand_dist / 2.0, 1.3, 2.0));
        s.set(HandRight, Vec3::new(hand_dist / 2.0, 1.3, 2.0));
        s
    }

    #[test]
    fn test_zoom_in_reports_factor_but_never_completes() {
        let mut d = GestureData::new(1, GestureType::ZoomIn);

        d = step(d, &zoom_snapshot(0.8), 0.0);
        assert_eq!(d.state, 1);
        assert!((d.tag_float - 0.8).abs() < 1e-5);

        for i in 1..20 {
            let now = i as f32 * 0.1;
            d = step(d, &zoom_snapshot(0.4), now);
            assert!(!d.complete, "zoom must stay continuous");
            assert!(!d.cancelled);
        }
        // screen_pos.z = 0.0 + 0.4 / 0.8
        assert!((d.screen_pos.z - 0.5).abs() < 1e-4, "zoom = {}", d.screen_pos.z);
        assert!((d.progress - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_out_uses_default_reference_distance() {
        let mut d = GestureData::new(1, GestureType::ZoomOut);

        d = step(d, &zoom_snapshot(0.1), 0.0);
        assert_eq!(d.state, 1);

        d = step(d, &zoom_snapshot(0.3), 0.5);
        // screen_pos.z = 1.0 + 0.3 / 0.5
        assert!((d.screen_pos.z - 1.6).abs() < 1e-4, "zoom = {}", d.screen_pos.z);
    }

    #[test]
    fn test_zoom_cancelled_when_hands_drop() {
        let mut d = GestureData::new(1, GestureType::ZoomIn);
        d = step(d, &zoom_snapshot(0.8), 0.0);

        // both hands below elbows: no refresh, window expires
        let mut low = snapshot();
        low.set(ElbowLeft, Vec3::new(-0.3, 1.1, 2.0));
        low.set(ElbowRight, Vec3::new(0.3, 1.1, 2.0));
        low.set(HandLeft, Vec3::new(-0.3, 0.9, 2.0));
        low.set(HandRight, Vec3::new(0.3, 0.9, 2.0));
        d = step(d, &low, 0.5);
        assert!(!d.cancelled);

        d = step(d, &low, 1.2);
        assert!(d.cancelled);
    }

    #[test]
    fn test_wheel_rotation_angle() {
        let mut d = GestureData::new(1, GestureType::Wheel);

        d = step(d, &zoom_snapshot(0.4), 0.0);
        assert_eq!(d.state, 1);

        // rotate the two-hand vector by raising the right hand
        let mut s = snapshot();
        s.set(ElbowLeft, Vec3::new(-0.3, 1.1, 2.0));
        s.set(ElbowRight, Vec3::new(0.3, 1.1, 2.0));
        s.set(HandLeft, Vec3::new(-0.2, 1.3, 2.0));
        s.set(HandRight, Vec3::new(0.2, 1.5, 2.0));
        d = step(d, &s, 0.5);

        assert!(d.screen_pos.z > 0.0, "wheel angle = {}", d.screen_pos.z);
        assert!(!d.complete);
    }

    #[test]
    fn test_jump() {
        let mut d = GestureData::new(1, GestureType::Jump);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.0, 1.0, 2.0));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.05, 1.2, 2.0));
        d = step(d, &s, 0.4);
        assert!(d.complete);
    }

    #[test]
    fn test_jump_rejects_lateral_drift() {
        let mut d = GestureData::new(1, GestureType::Jump);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.0, 1.0, 2.0));
        d = step(d, &s, 0.0);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.3, 1.2, 2.0));
        d = step(d, &s, 0.4);
        assert!(!d.complete);
    }

    #[test]
    fn test_squat() {
        let mut d = GestureData::new(1, GestureType::Squat);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.0, 0.7, 2.0));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);

        let mut s = snapshot();
        s.set(SpineBase, Vec3::new(0.0, 0.5, 2.0));
        d = step(d, &s, 0.4);
        assert!(d.complete);
    }

    #[test]
    fn test_push() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::Push);

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.05, 0.0, -0.1));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);
        let anchor = d.joint_pos;

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, anchor + Vec3::new(0.0, 0.0, -0.2));
        d = step(d, &s, 0.5);
        assert!(d.complete);
    }

    #[test]
    fn test_pull() {
        let elbow = Vec3::new(0.3, 1.2, 2.0);
        let mut d = GestureData::new(1, GestureType::Pull);

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, elbow + Vec3::new(0.05, 0.0, -0.2));
        d = step(d, &s, 0.0);
        assert_eq!(d.state, 1);
        let anchor = d.joint_pos;

        let mut s = snapshot();
        s.set(ElbowRight, elbow);
        s.set(HandRight, anchor + Vec3::new(0.0, 0.0, 0.2));
        d = step(d, &s, 0.5);
        assert!(d.complete);
    }

    // displacement of (cos t, -sin t) from any center yields joint angle t
    fn offset_for(angle_deg: f32) -> Vec3 {
        let rad = angle_deg.to_radians();
        Vec3::new(rad.cos(), -rad.sin(), 0.0)
    }

    fn first_move_snapshot() -> JointSnapshot {
        let mut s = snapshot();
        let l_shoulder = Vec3::new(0.2, 1.4, 2.0);
        let r_shoulder = Vec3::new(0.8, 1.4, 2.0);
        let l_knee = Vec3::new(0.3, 0.5, 2.0);
        let r_knee = Vec3::new(0.7, 0.5, 2.0);

        s.set(ShoulderLeft, l_shoulder);
        s.set(ElbowLeft, l_shoulder + offset_for(250.0));
        s.set(WristLeft, l_shoulder + offset_for(250.0) + offset_for(300.0));
        s.set(ShoulderRight, r_shoulder);
        s.set(ElbowRight, r_shoulder + offset_for(290.0));
        s.set(WristRight, r_shoulder + offset_for(290.0) + offset_for(240.0));
        s.set(KneeLeft, l_knee);
        s.set(HipLeft, l_knee + offset_for(290.0));
        s.set(AnkleLeft, l_knee - offset_for(290.0));
        s.set(KneeRight, r_knee);
        s.set(HipRight, r_knee + offset_for(250.0));
        s.set(AnkleRight, r_knee - offset_for(250.0));
        s
    }

    #[test]
    fn test_the_first_move_completes_instantly() {
        let s = first_move_snapshot();
        let d = GestureData::new(1, GestureType::TheFirstMove);
        let d = step(d, &s, 5.0);
        assert!(d.complete);
        assert_eq!(d.progress, 1.0);
    }

    #[test]
    fn test_the_first_move_rejects_wrong_elbow_angle() {
        let mut s = first_move_snapshot();
        let l_shoulder = s.pos(ShoulderLeft);
        // left elbow 40 degrees off target (tolerance is 20)
        s.set(ElbowLeft, l_shoulder + offset_for(210.0));
        let d = GestureData::new(1, GestureType::TheFirstMove);
        let d = step(d, &s, 5.0);
        assert!(!d.complete);
        assert_eq!(d.state, 0);
    }

    #[test]
    fn test_the_first_move_requires_all_limbs_tracked() {
        let mut s = first_move_snapshot();
        s.tracked[AnkleRight as usize] = false;
        let d = GestureData::new(1, GestureType::TheFirstMove);
        let d = step(d, &s, 5.0);
        assert!(!d.complete);
    }
}
