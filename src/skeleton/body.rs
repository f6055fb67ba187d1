use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};

use super::joint::{JointType, TrackingState};

/// 1フレームで追跡できる最大人数
pub const MAX_BODY_COUNT: usize = 6;

/// 手の開閉状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandState {
    #[default]
    Unknown,
    NotTracked,
    Open,
    Closed,
    Lasso,
}

/// 手状態の信頼度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingConfidence {
    #[default]
    Low,
    High,
}

/// 単一関節のフレームデータ
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointData {
    pub state: TrackingState,
    /// センサー座標系の位置（メートル）
    pub raw_position: Vec3,
    /// ワールド座標系の位置（メートル）
    pub position: Vec3,
    /// 親関節からの方向ベクトル（ルートはゼロ）
    pub direction: Vec3,
    pub normal_rotation: Quat,
    pub mirrored_rotation: Quat,
}

impl Default for JointData {
    fn default() -> Self {
        Self {
            state: TrackingState::NotTracked,
            raw_position: Vec3::zeros(),
            position: Vec3::zeros(),
            direction: Vec3::zeros(),
            normal_rotation: Quat::identity(),
            mirrored_rotation: Quat::identity(),
        }
    }
}

/// 1人分のボディデータ
///
/// センサーからフレームごとに書き込まれ、パイプラインが推定関節・派生方向・
/// 関節向きを加えて上書きする。フレームをまたいで保持されない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyData {
    /// 追跡ID（0 = 無効）
    pub tracking_id: u64,
    pub is_tracked: bool,
    pub position: Vec3,
    pub joints: [JointData; JointType::COUNT],

    /// ボディ全体の向き（SpineBase の向きのコピー）
    pub normal_rotation: Quat,
    pub mirrored_rotation: Quat,

    /// 右腰から左腰への水平方向
    pub hips_direction: Vec3,
    /// 右肩から左肩への水平方向
    pub shoulders_direction: Vec3,
    /// 肩のラインから導出した体の回転角（度）
    pub body_turn_angle: f32,

    pub left_hand_direction: Vec3,
    pub right_hand_direction: Vec3,
    pub left_thumb_direction: Vec3,
    pub right_thumb_direction: Vec3,
    pub left_thumb_angle: f32,
    pub right_thumb_angle: f32,

    pub left_hand_state: HandState,
    pub right_hand_state: HandState,
    pub left_hand_confidence: TrackingConfidence,
    pub right_hand_confidence: TrackingConfidence,
}

impl Default for BodyData {
    fn default() -> Self {
        Self {
            tracking_id: 0,
            is_tracked: false,
            position: Vec3::zeros(),
            joints: [JointData::default(); JointType::COUNT],
            normal_rotation: Quat::identity(),
            mirrored_rotation: Quat::identity(),
            hips_direction: Vec3::zeros(),
            shoulders_direction: Vec3::zeros(),
            body_turn_angle: 0.0,
            left_hand_direction: Vec3::zeros(),
            right_hand_direction: Vec3::zeros(),
            left_thumb_direction: Vec3::zeros(),
            right_thumb_direction: Vec3::zeros(),
            left_thumb_angle: 0.0,
            right_thumb_angle: 0.0,
            left_hand_state: HandState::Unknown,
            right_hand_state: HandState::Unknown,
            left_hand_confidence: TrackingConfidence::Low,
            right_hand_confidence: TrackingConfidence::Low,
        }
    }
}

impl BodyData {
    pub fn joint(&self, joint: JointType) -> &JointData {
        &self.joints[joint as usize]
    }

    pub fn joint_mut(&mut self, joint: JointType) -> &mut JointData {
        &mut self.joints[joint as usize]
    }

    /// 各関節の direction を親関節との位置差から計算し直す
    pub fn refresh_directions(&mut self) {
        for index in 1..JointType::COUNT {
            let joint = match JointType::from_index(index) {
                Some(j) => j,
                None => continue,
            };
            let parent = joint.parent();

            if self.joints[index].state != TrackingState::NotTracked
                && self.joint(parent).state != TrackingState::NotTracked
            {
                self.joints[index].direction =
                    self.joints[index].position - self.joint(parent).position;
            } else {
                self.joints[index].direction = Vec3::zeros();
            }
        }
        self.joints[JointType::SpineBase as usize].direction = Vec3::zeros();
    }
}

/// 1フレーム分の全ボディデータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyFrame {
    pub bodies: [BodyData; MAX_BODY_COUNT],
    /// フレーム時刻（秒）
    pub rel_time: f32,
}

impl BodyFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追跡IDからボディを探す
    pub fn body_by_id(&self, tracking_id: u64) -> Option<(usize, &BodyData)> {
        self.bodies
            .iter()
            .enumerate()
            .find(|(_, b)| b.is_tracked && b.tracking_id == tracking_id)
    }
}
