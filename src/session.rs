//! ユーザーごとのジェスチャー進行管理
//!
//! ジェスチャーの登録・評価・通知を1ユーザー単位で束ねる。評価自体は
//! [`crate::gestures::detect::step`] に委譲し、ここでは競合排除と
//! 完了後のスロットリングだけを扱う。

use std::collections::HashMap;

use tracing::debug;

use crate::gestures::{
    detect, GestureData, GestureListener, GestureType, JointSnapshot,
    MIN_TIME_BETWEEN_SAME_GESTURES,
};
use crate::skeleton::JointType;

pub struct GestureSession {
    min_time_between_gestures: f32,
    gestures: HashMap<u64, Vec<GestureData>>,
    /// ユーザーごとの次回評価可能時刻
    next_eligible: HashMap<u64, f32>,
}

impl GestureSession {
    pub fn new(min_time_between_gestures: f32) -> Self {
        Self {
            min_time_between_gestures,
            gestures: HashMap::new(),
            next_eligible: HashMap::new(),
        }
    }

    /// ジェスチャーの追跡を開始する。既に追跡中なら状態を作り直す。
    pub fn detect(&mut self, user_id: u64, gesture: GestureType, now: f32) {
        if gesture == GestureType::None {
            return;
        }

        let list = self.gestures.entry(user_id).or_default();
        let mut data = GestureData::new(user_id, gesture);
        data.timestamp = now;

        if let Some(existing) = list.iter_mut().find(|g| g.gesture == gesture) {
            *existing = data;
        } else {
            list.push(data);
        }

        self.next_eligible.entry(user_id).or_insert(0.0);
    }

    pub fn reset(&mut self, user_id: u64, gesture: GestureType, now: f32) {
        if let Some(list) = self.gestures.get_mut(&user_id) {
            if let Some(data) = list.iter_mut().find(|g| g.gesture == gesture) {
                reset_gesture(data, now);
            }
        }
    }

    pub fn reset_all(&mut self, user_id: u64, now: f32) {
        if let Some(list) = self.gestures.get_mut(&user_id) {
            for data in list.iter_mut() {
                reset_gesture(data, now);
            }
        }
    }

    /// 追跡対象から外す。登録されていたら true を返す。
    pub fn delete(&mut self, user_id: u64, gesture: GestureType) -> bool {
        match self.gestures.get_mut(&user_id) {
            Some(list) => {
                let before = list.len();
                list.retain(|g| g.gesture != gesture);
                before != list.len()
            }
            None => false,
        }
    }

    /// ユーザー離脱時の後始末
    pub fn remove_user(&mut self, user_id: u64) {
        self.gestures.remove(&user_id);
        self.next_eligible.remove(&user_id);
    }

    pub fn get(&self, user_id: u64, gesture: GestureType) -> Option<&GestureData> {
        self.gestures
            .get(&user_id)?
            .iter()
            .find(|g| g.gesture == gesture)
    }

    pub fn progress(&self, user_id: u64, gesture: GestureType) -> f32 {
        self.get(user_id, gesture).map_or(0.0, |g| g.progress)
    }

    pub fn is_complete(&self, user_id: u64, gesture: GestureType) -> bool {
        self.get(user_id, gesture).is_some_and(|g| g.complete)
    }

    pub fn tracked_gestures(&self, user_id: u64) -> Vec<GestureType> {
        self.gestures
            .get(&user_id)
            .map(|list| list.iter().map(|g| g.gesture).collect())
            .unwrap_or_default()
    }

    /// 1フレーム分の評価
    ///
    /// 完了直後のクールダウン中はユーザー全体をスキップする。競合する
    /// ジェスチャーが進行中のものは評価しない。
    pub fn evaluate(&mut self, user_id: u64, snapshot: &JointSnapshot, now: f32) {
        let eligible_at = self.next_eligible.get(&user_id).copied().unwrap_or(0.0);
        if now < eligible_at {
            return;
        }

        let Some(list) = self.gestures.get_mut(&user_id) else {
            return;
        };

        let mut throttle = false;
        for i in 0..list.len() {
            let data = list[i].clone();

            if now < data.start_tracking_at_time {
                continue;
            }
            let conflicted = list
                .iter()
                .any(|g| data.conflicts_with.contains(&g.gesture) && g.progress > 0.0);
            if conflicted {
                continue;
            }

            let stepped = detect::step(data, snapshot, now);
            if stepped.complete {
                throttle = true;
            }
            list[i] = stepped;
        }

        if throttle {
            self.next_eligible
                .insert(user_id, now + self.min_time_between_gestures);
        }
    }

    /// 評価結果をリスナーへ通知する
    ///
    /// 完了通知で true が返るとそのユーザーの全ジェスチャーをリセット、
    /// キャンセル通知で true が返ると当該ジェスチャーのみリセットする。
    pub fn dispatch(
        &mut self,
        user_id: u64,
        user_index: usize,
        listeners: &mut [Box<dyn GestureListener>],
        now: f32,
    ) {
        let Some(mut list) = self.gestures.remove(&user_id) else {
            return;
        };

        for i in 0..list.len() {
            let data = list[i].clone();

            if data.complete {
                debug!(
                    user_id,
                    gesture = data.gesture.name(),
                    "gesture completed"
                );
                let mut reset_user = false;
                for listener in listeners.iter_mut() {
                    if listener.gesture_completed(
                        user_id,
                        user_index,
                        data.gesture,
                        data.joint,
                        data.screen_pos,
                    ) {
                        reset_user = true;
                    }
                }
                if reset_user {
                    for g in list.iter_mut() {
                        reset_gesture(g, now);
                    }
                }
            } else if data.cancelled {
                debug!(
                    user_id,
                    gesture = data.gesture.name(),
                    "gesture cancelled"
                );
                let mut reset_one = false;
                for listener in listeners.iter_mut() {
                    if listener.gesture_cancelled(user_id, user_index, data.gesture, data.joint) {
                        reset_one = true;
                    }
                }
                if reset_one {
                    reset_gesture(&mut list[i], now);
                }
            } else if data.progress >= 0.1 {
                for listener in listeners.iter_mut() {
                    listener.gesture_in_progress(
                        user_id,
                        user_index,
                        data.gesture,
                        data.progress,
                        data.joint,
                        data.screen_pos,
                    );
                }
            }
        }

        self.gestures.insert(user_id, list);
    }
}

fn reset_gesture(data: &mut GestureData, now: f32) {
    data.state = 0;
    data.joint = JointType::SpineBase;
    data.progress = 0.0;
    data.complete = false;
    data.cancelled = false;
    data.start_tracking_at_time = now + MIN_TIME_BETWEEN_SAME_GESTURES;
}
