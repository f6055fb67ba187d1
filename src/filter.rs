use crate::config::Smoothing;
use crate::math::Vec3;
use crate::skeleton::{BodyFrame, JointType, TrackingState, MAX_BODY_COUNT};

/// EMAベースの関節位置平滑化フィルタ
///
/// ボディスロットごと・関節ごとに前回位置を保持し、追跡中の関節のみ平滑化する。
/// 未追跡になった関節は状態を破棄し、次の追跡フレームをそのまま通す。
pub struct JointPositionFilter {
    alpha: f32,
    prev: [[Option<Vec3>; JointType::COUNT]; MAX_BODY_COUNT],
}

impl JointPositionFilter {
    pub fn new(smoothing_factor: f32) -> Self {
        Self {
            alpha: (1.0 - smoothing_factor).clamp(0.0, 1.0),
            prev: [[None; JointType::COUNT]; MAX_BODY_COUNT],
        }
    }

    pub fn from_preset(preset: Smoothing) -> Self {
        Self::new(preset.factor())
    }

    pub fn apply(&mut self, frame: &mut BodyFrame) {
        for (slot, body) in frame.bodies.iter_mut().enumerate() {
            if !body.is_tracked {
                self.prev[slot] = [None; JointType::COUNT];
                continue;
            }

            for (j, joint) in body.joints.iter_mut().enumerate() {
                if joint.state == TrackingState::NotTracked {
                    self.prev[slot][j] = None;
                    continue;
                }

                let smoothed = match self.prev[slot][j] {
                    Some(prev) => joint.position * self.alpha + prev * (1.0 - self.alpha),
                    None => joint.position,
                };
                joint.position = smoothed;
                self.prev[slot][j] = Some(smoothed);
            }
        }
    }

    pub fn reset(&mut self) {
        self.prev = [[None; JointType::COUNT]; MAX_BODY_COUNT];
    }
}
