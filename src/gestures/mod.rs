pub mod detect;

use crate::math::Vec3;
use crate::skeleton::JointType;

/// 完了したジェスチャーの再検出までの最小待ち時間（秒）
pub const MIN_TIME_BETWEEN_SAME_GESTURES: f32 = 0.0;
/// ホールド型ジェスチャーの保持時間（秒）
pub const POSE_COMPLETE_DURATION: f32 = 1.0;

/// 認識対象のジェスチャー種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureType {
    None,
    RaiseRightHand,
    RaiseLeftHand,
    Psi,
    Tpose,
    Stop,
    Wave,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    ZoomOut,
    ZoomIn,
    Wheel,
    Jump,
    Squat,
    Push,
    Pull,
    TheFirstMove,
    TheSecondMove,
    TheThirdMove,
    TheForthMove,
}

impl GestureType {
    /// 設定ファイルで使う名前
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RaiseRightHand => "raise_right_hand",
            Self::RaiseLeftHand => "raise_left_hand",
            Self::Psi => "psi",
            Self::Tpose => "tpose",
            Self::Stop => "stop",
            Self::Wave => "wave",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
            Self::SwipeUp => "swipe_up",
            Self::SwipeDown => "swipe_down",
            Self::ZoomOut => "zoom_out",
            Self::ZoomIn => "zoom_in",
            Self::Wheel => "wheel",
            Self::Jump => "jump",
            Self::Squat => "squat",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::TheFirstMove => "the_first_move",
            Self::TheSecondMove => "the_second_move",
            Self::TheThirdMove => "the_third_move",
            Self::TheForthMove => "the_forth_move",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "raise_right_hand" => Some(Self::RaiseRightHand),
            "raise_left_hand" => Some(Self::RaiseLeftHand),
            "psi" => Some(Self::Psi),
            "tpose" => Some(Self::Tpose),
            "stop" => Some(Self::Stop),
            "wave" => Some(Self::Wave),
            "swipe_left" => Some(Self::SwipeLeft),
            "swipe_right" => Some(Self::SwipeRight),
            "swipe_up" => Some(Self::SwipeUp),
            "swipe_down" => Some(Self::SwipeDown),
            "zoom_out" => Some(Self::ZoomOut),
            "zoom_in" => Some(Self::ZoomIn),
            "wheel" => Some(Self::Wheel),
            "jump" => Some(Self::Jump),
            "squat" => Some(Self::Squat),
            "push" => Some(Self::Push),
            "pull" => Some(Self::Pull),
            "the_first_move" => Some(Self::TheFirstMove),
            "the_second_move" => Some(Self::TheSecondMove),
            "the_third_move" => Some(Self::TheThirdMove),
            "the_forth_move" => Some(Self::TheForthMove),
            _ => None,
        }
    }

    /// 幾何的に曖昧な（同時進行させない）ジェスチャー
    pub fn conflicting(self) -> Vec<GestureType> {
        match self {
            Self::ZoomIn => vec![Self::ZoomOut, Self::Wheel],
            Self::ZoomOut => vec![Self::ZoomIn, Self::Wheel],
            Self::Wheel => vec![Self::ZoomIn, Self::ZoomOut],
            _ => Vec::new(),
        }
    }
}

/// 1ユーザー・1ジェスチャー種別分の追跡状態
#[derive(Debug, Clone)]
pub struct GestureData {
    pub user_id: u64,
    pub gesture: GestureType,
    /// フェーズ番号（意味はジェスチャーごとに異なる）
    pub state: u32,
    /// 最後のフェーズ遷移時刻（秒）
    pub timestamp: f32,
    /// ジェスチャーの基準関節
    pub joint: JointType,
    /// 基準関節のフェーズ遷移時点の位置
    pub joint_pos: Vec3,
    /// 連続ジェスチャーの出力座標（zoom倍率・wheel角度はz成分）
    pub screen_pos: Vec3,
    pub tag_float: f32,
    pub tag_vector: Vec3,
    pub tag_vector2: Vec3,
    /// 進捗 0〜1
    pub progress: f32,
    pub complete: bool,
    pub cancelled: bool,
    /// このジェスチャーの検出を抑止する競合ジェスチャー
    pub conflicts_with: Vec<GestureType>,
    /// この時刻までは検出を再開しない
    pub start_tracking_at_time: f32,
}

impl GestureData {
    pub fn new(user_id: u64, gesture: GestureType) -> Self {
        Self {
            user_id,
            gesture,
            state: 0,
            timestamp: 0.0,
            joint: JointType::SpineBase,
            joint_pos: Vec3::zeros(),
            screen_pos: Vec3::zeros(),
            tag_float: 0.0,
            tag_vector: Vec3::zeros(),
            tag_vector2: Vec3::zeros(),
            progress: 0.0,
            complete: false,
            cancelled: false,
            conflicts_with: gesture.conflicting(),
            start_tracking_at_time: 0.0,
        }
    }
}

/// ジェスチャー判定に使う関節スナップショット
///
/// 位置と追跡フラグのみ。認識関数はこのスナップショットに対して全域的で、
/// 欠けた関節は「ポーズ不成立」として扱われる。
#[derive(Debug, Clone)]
pub struct JointSnapshot {
    pub positions: [Vec3; JointType::COUNT],
    pub tracked: [bool; JointType::COUNT],
}

impl Default for JointSnapshot {
    fn default() -> Self {
        Self {
            positions: [Vec3::zeros(); JointType::COUNT],
            tracked: [false; JointType::COUNT],
        }
    }
}

impl JointSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pos(&self, joint: JointType) -> Vec3 {
        self.positions[joint as usize]
    }

    pub fn is_tracked(&self, joint: JointType) -> bool {
        self.tracked[joint as usize]
    }

    pub fn set(&mut self, joint: JointType, position: Vec3) {
        self.positions[joint as usize] = position;
        self.tracked[joint as usize] = true;
    }
}

/// ジェスチャー判定に必要な関節
pub const RELEVANT_JOINTS: [JointType; 16] = [
    JointType::HandLeft,
    JointType::HandRight,
    JointType::ElbowLeft,
    JointType::ElbowRight,
    JointType::ShoulderLeft,
    JointType::ShoulderRight,
    JointType::SpineBase,
    JointType::SpineShoulder,
    JointType::HipLeft,
    JointType::HipRight,
    JointType::KneeLeft,
    JointType::KneeRight,
    JointType::AnkleLeft,
    JointType::AnkleRight,
    JointType::WristLeft,
    JointType::WristRight,
];

/// ジェスチャーライフサイクルの通知先
///
/// 呼び出し順はユーザーごとに: user_detected → (in_progress* → completed/cancelled)* → user_lost
pub trait GestureListener {
    fn user_detected(&mut self, user_id: u64, user_index: usize);

    fn user_lost(&mut self, user_id: u64, user_index: usize);

    fn gesture_in_progress(
        &mut self,
        user_id: u64,
        user_index: usize,
        gesture: GestureType,
        progress: f32,
        joint: JointType,
        screen_pos: Vec3,
    );

    /// trueを返すとそのユーザーの全ジェスチャーがリセットされる
    fn gesture_completed(
        &mut self,
        user_id: u64,
        user_index: usize,
        gesture: GestureType,
        joint: JointType,
        screen_pos: Vec3,
    ) -> bool;

    /// trueを返すとそのジェスチャーのみリセットされる
    fn gesture_cancelled(
        &mut self,
        user_id: u64,
        user_index: usize,
        gesture: GestureType,
        joint: JointType,
    ) -> bool;
}
