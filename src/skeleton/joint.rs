use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// 骨格の25関節インデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum JointType {
    SpineBase = 0,
    SpineMid = 1,
    Neck = 2,
    Head = 3,
    ShoulderLeft = 4,
    ElbowLeft = 5,
    WristLeft = 6,
    HandLeft = 7,
    ShoulderRight = 8,
    ElbowRight = 9,
    WristRight = 10,
    HandRight = 11,
    HipLeft = 12,
    KneeLeft = 13,
    AnkleLeft = 14,
    FootLeft = 15,
    HipRight = 16,
    KneeRight = 17,
    AnkleRight = 18,
    FootRight = 19,
    SpineShoulder = 20,
    HandTipLeft = 21,
    ThumbLeft = 22,
    HandTipRight = 23,
    ThumbRight = 24,
}

impl JointType {
    pub const COUNT: usize = 25;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::SpineBase),
            1 => Some(Self::SpineMid),
            2 => Some(Self::Neck),
            3 => Some(Self::Head),
            4 => Some(Self::ShoulderLeft),
            5 => Some(Self::ElbowLeft),
            6 => Some(Self::WristLeft),
            7 => Some(Self::HandLeft),
            8 => Some(Self::ShoulderRight),
            9 => Some(Self::ElbowRight),
            10 => Some(Self::WristRight),
            11 => Some(Self::HandRight),
            12 => Some(Self::HipLeft),
            13 => Some(Self::KneeLeft),
            14 => Some(Self::AnkleLeft),
            15 => Some(Self::FootLeft),
            16 => Some(Self::HipRight),
            17 => Some(Self::KneeRight),
            18 => Some(Self::AnkleRight),
            19 => Some(Self::FootRight),
            20 => Some(Self::SpineShoulder),
            21 => Some(Self::HandTipLeft),
            22 => Some(Self::ThumbLeft),
            23 => Some(Self::HandTipRight),
            24 => Some(Self::ThumbRight),
            _ => None,
        }
    }

    /// 親関節（SpineBase は自分自身 = ルート）
    pub fn parent(self) -> Self {
        match self {
            Self::SpineBase => Self::SpineBase,
            Self::SpineMid => Self::SpineBase,
            Self::SpineShoulder => Self::SpineMid,
            Self::Neck => Self::SpineShoulder,
            Self::Head => Self::Neck,
            Self::ShoulderLeft | Self::ShoulderRight => Self::SpineShoulder,
            Self::ElbowLeft => Self::ShoulderLeft,
            Self::WristLeft => Self::ElbowLeft,
            Self::HandLeft => Self::WristLeft,
            Self::HandTipLeft => Self::HandLeft,
            Self::ThumbLeft => Self::WristLeft,
            Self::ElbowRight => Self::ShoulderRight,
            Self::WristRight => Self::ElbowRight,
            Self::HandRight => Self::WristRight,
            Self::HandTipRight => Self::HandRight,
            Self::ThumbRight => Self::WristRight,
            Self::HipLeft | Self::HipRight => Self::SpineBase,
            Self::KneeLeft => Self::HipLeft,
            Self::AnkleLeft => Self::KneeLeft,
            Self::FootLeft => Self::AnkleLeft,
            Self::KneeRight => Self::HipRight,
            Self::AnkleRight => Self::KneeRight,
            Self::FootRight => Self::AnkleRight,
        }
    }

    /// 向き導出に使う子関節（末端関節は自分自身）
    pub fn next(self) -> Self {
        match self {
            Self::SpineBase => Self::SpineMid,
            Self::SpineMid => Self::SpineShoulder,
            Self::SpineShoulder => Self::Neck,
            Self::Neck => Self::Head,
            Self::ShoulderLeft => Self::ElbowLeft,
            Self::ElbowLeft => Self::WristLeft,
            Self::WristLeft => Self::HandLeft,
            Self::HandLeft => Self::HandTipLeft,
            Self::ShoulderRight => Self::ElbowRight,
            Self::ElbowRight => Self::WristRight,
            Self::WristRight => Self::HandRight,
            Self::HandRight => Self::HandTipRight,
            Self::HipLeft => Self::KneeLeft,
            Self::KneeLeft => Self::AnkleLeft,
            Self::AnkleLeft => Self::FootLeft,
            Self::HipRight => Self::KneeRight,
            Self::KneeRight => Self::AnkleRight,
            Self::AnkleRight => Self::FootRight,
            // 末端
            Self::Head
            | Self::FootLeft
            | Self::FootRight
            | Self::HandTipLeft
            | Self::ThumbLeft
            | Self::HandTipRight
            | Self::ThumbRight => self,
        }
    }

    pub fn is_end(self) -> bool {
        self.next() == self
    }

    /// 左右反転した関節
    pub fn mirrored(self) -> Self {
        match self {
            Self::ShoulderLeft => Self::ShoulderRight,
            Self::ElbowLeft => Self::ElbowRight,
            Self::WristLeft => Self::WristRight,
            Self::HandLeft => Self::HandRight,
            Self::ShoulderRight => Self::ShoulderLeft,
            Self::ElbowRight => Self::ElbowLeft,
            Self::WristRight => Self::WristLeft,
            Self::HandRight => Self::HandLeft,
            Self::HipLeft => Self::HipRight,
            Self::KneeLeft => Self::KneeRight,
            Self::AnkleLeft => Self::AnkleRight,
            Self::FootLeft => Self::FootRight,
            Self::HipRight => Self::HipLeft,
            Self::KneeRight => Self::KneeLeft,
            Self::AnkleRight => Self::AnkleLeft,
            Self::FootRight => Self::FootLeft,
            Self::HandTipLeft => Self::HandTipRight,
            Self::ThumbLeft => Self::ThumbRight,
            Self::HandTipRight => Self::HandTipLeft,
            Self::ThumbRight => Self::ThumbLeft,
            other => other,
        }
    }

    /// ボーンの基準方向（この関節を子とするボーンの中立向き）
    pub fn base_direction(self) -> Vec3 {
        let up = Vec3::new(0.0, 1.0, 0.0);
        let down = Vec3::new(0.0, -1.0, 0.0);
        let left = Vec3::new(-1.0, 0.0, 0.0);
        let right = Vec3::new(1.0, 0.0, 0.0);
        let forward = Vec3::new(0.0, 0.0, 1.0);

        match self {
            Self::SpineBase => Vec3::zeros(),
            Self::SpineMid | Self::Neck | Self::Head | Self::SpineShoulder => up,
            Self::ShoulderLeft | Self::ElbowLeft | Self::WristLeft | Self::HandLeft
            | Self::HandTipLeft => left,
            Self::ShoulderRight | Self::ElbowRight | Self::WristRight | Self::HandRight
            | Self::HandTipRight => right,
            Self::HipLeft | Self::KneeLeft | Self::AnkleLeft => down,
            Self::HipRight | Self::KneeRight | Self::AnkleRight => down,
            Self::FootLeft | Self::FootRight | Self::ThumbLeft | Self::ThumbRight => forward,
        }
    }
}

/// 関節の追跡状態（信頼度順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TrackingState {
    #[default]
    NotTracked = 0,
    Inferred = 1,
    Tracked = 2,
}

impl TrackingState {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::NotTracked),
            1 => Some(Self::Inferred),
            2 => Some(Self::Tracked),
            _ => None,
        }
    }
}
