//! フレーム処理パイプライン
//!
//! ソースから受けた骨格フレームを平滑化・補完・姿勢推定まで通し、
//! ユーザー管理とジェスチャー評価につなぐ。[`Tracker`] がその全状態を持つ。

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::Config;
use crate::constraint::BoneOrientationConstraints;
use crate::filter::JointPositionFilter;
use crate::gestures::{GestureData, GestureListener, GestureType, JointSnapshot, RELEVANT_JOINTS};
use crate::math::{euler_deg, from_to_rotation, project, wrap_deg, Quat, Vec3};
use crate::orient::calculate_joint_orients;
use crate::session::GestureSession;
use crate::skeleton::{BodyData, BodyFrame, JointType, TrackingState, MAX_BODY_COUNT};
use crate::source::BodySource;

/// キャリブレーション候補を破棄するまでの猶予（秒）
const STALE_CALIBRATION_TIMEOUT: f32 = 60.0;

/// センサー固有の座標補正フック
pub type BodyFixup = Box<dyn FnMut(&mut BodyData)>;

/// 追跡エンジン本体
///
/// 1回の [`Tracker::tick`] が1フレーム分の処理に相当する。時刻は呼び出し側が
/// 与え、内部で実時間は参照しない。
pub struct Tracker {
    config: Config,
    frame: BodyFrame,
    filter: JointPositionFilter,
    session: GestureSession,
    constraints: BoneOrientationConstraints,
    listeners: Vec<Box<dyn GestureListener>>,

    /// 向き計算後・可動域制限前に呼ばれるバックエンド固有の補正
    fixup: Option<BodyFixup>,

    user_ids: Vec<u64>,
    user_indices: HashMap<u64, usize>,
    primary_user_id: u64,
    /// キャリブレーション待ちのユーザーごとのポーズ進行
    calibration: HashMap<u64, GestureData>,
}

impl Tracker {
    pub fn from_config(config: Config) -> Self {
        let filter = JointPositionFilter::from_preset(config.tracking.smoothing);
        let session = GestureSession::new(config.gestures.min_time_between_gestures);
        Self {
            config,
            frame: BodyFrame::new(),
            filter,
            session,
            constraints: BoneOrientationConstraints::with_default_constraints(),
            listeners: Vec::new(),
            fixup: None,
            user_ids: Vec::new(),
            user_indices: HashMap::new(),
            primary_user_id: 0,
            calibration: HashMap::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn GestureListener>) {
        self.listeners.push(listener);
    }

    pub fn set_body_fixup(&mut self, fixup: BodyFixup) {
        self.fixup = Some(fixup);
    }

    /// 1フレーム処理。新しいフレームが無ければ false を返す。
    pub fn tick(&mut self, source: &mut dyn BodySource, now: f32) -> bool {
        if !source.poll(&mut self.frame) {
            return false;
        }

        self.filter.apply(&mut self.frame);

        let mut in_range = [false; MAX_BODY_COUNT];
        for (index, body) in self.frame.bodies.iter().enumerate() {
            in_range[index] = self.body_in_range(body);
        }

        let mut frame = std::mem::take(&mut self.frame);
        for (index, body) in frame.bodies.iter_mut().enumerate() {
            if in_range[index] {
                self.process_body(body);
            }
        }
        self.frame = frame;

        // このフレームで見えなくなったユーザー
        let lost: Vec<u64> = self
            .user_ids
            .iter()
            .copied()
            .filter(|&id| {
                !self
                    .frame
                    .bodies
                    .iter()
                    .enumerate()
                    .any(|(i, b)| in_range[i] && b.tracking_id == id)
            })
            .collect();
        for id in lost {
            self.remove_user(id, now);
        }

        // ボディスロットの入れ替わりを索引へ反映
        for id in self.user_ids.clone() {
            if let Some((index, _)) = self.frame.body_by_id(id) {
                self.user_indices.insert(id, index);
            }
        }

        // 新規候補のキャリブレーション
        let mut added: Vec<(u64, usize)> = Vec::new();
        for (index, body) in self.frame.bodies.iter().enumerate() {
            if !in_range[index] || self.user_indices.contains_key(&body.tracking_id) {
                continue;
            }
            if self.primary_user_id == 0 && self.config.tracking.detect_closest_user {
                let z = body.position.z.abs();
                let closer_exists = self
                    .frame
                    .bodies
                    .iter()
                    .enumerate()
                    .any(|(i, b)| i != index && in_range[i] && b.position.z.abs() < z);
                if closer_exists {
                    continue;
                }
            }
            if !added.iter().any(|&(id, _)| id == body.tracking_id) {
                added.push((body.tracking_id, index));
            }
        }
        for (id, index) in added {
            self.calibrate_user(id, index, now);
        }

        // ジェスチャー評価と通知
        let ignore_inferred = self.config.tracking.ignore_inferred_joints;
        for (&id, &index) in &self.user_indices.clone() {
            let snapshot = gesture_snapshot(&self.frame.bodies[index], ignore_inferred);
            self.session.evaluate(id, &snapshot, now);
            self.session.dispatch(id, index, &mut self.listeners, now);
        }

        true
    }

    fn body_in_range(&self, body: &BodyData) -> bool {
        if !body.is_tracked {
            return false;
        }
        let z = body.position.z.abs();
        if z < self.config.tracking.min_user_distance {
            return false;
        }
        let max = self.config.tracking.max_user_distance;
        max <= 0.0 || z <= max
    }

    fn process_body(&mut self, body: &mut BodyData) {
        infer_hip(body, JointType::HipLeft, JointType::HipRight, JointType::SpineBase);
        infer_hip(body, JointType::HipRight, JointType::HipLeft, JointType::SpineBase);
        infer_hip(
            body,
            JointType::ShoulderLeft,
            JointType::ShoulderRight,
            JointType::SpineShoulder,
        );
        infer_hip(
            body,
            JointType::ShoulderRight,
            JointType::ShoulderLeft,
            JointType::SpineShoulder,
        );

        body.refresh_directions();
        calculate_special_directions(body);
        fixup_ankle(body, JointType::KneeLeft, JointType::AnkleLeft, JointType::FootLeft);
        fixup_ankle(body, JointType::KneeRight, JointType::AnkleRight, JointType::FootRight);

        calculate_joint_orients(body, self.config.tracking.ignore_inferred_joints);
        if let Some(fixup) = self.fixup.as_mut() {
            fixup(body);
        }
        if self.config.tracking.use_orientation_constraints {
            self.constraints.apply(body);
        }
    }

    fn remove_user(&mut self, user_id: u64, now: f32) {
        let index = self.user_indices.remove(&user_id).unwrap_or(0);
        self.user_ids.retain(|&id| id != user_id);
        self.session.remove_user(user_id);
        self.calibration.remove(&user_id);
        self.calibration
            .retain(|_, data| data.timestamp + STALE_CALIBRATION_TIMEOUT >= now);

        if self.primary_user_id == user_id {
            self.primary_user_id = self.user_ids.first().copied().unwrap_or(0);
        }

        info!(user_id, "user lost");
        for listener in self.listeners.iter_mut() {
            listener.user_lost(user_id, index);
        }
    }

    fn calibrate_user(&mut self, user_id: u64, index: usize, now: f32) {
        if !self.check_calibration_pose(user_id, index, now) {
            return;
        }

        self.user_ids.push(user_id);
        self.user_indices.insert(user_id, index);
        if self.primary_user_id == 0 {
            self.primary_user_id = user_id;
        }

        for name in self.config.gestures.startup_gestures.clone() {
            if let Some(gesture) = GestureType::from_name(&name) {
                self.session.detect(user_id, gesture, now);
            } else {
                debug!(gesture = %name, "unknown startup gesture ignored");
            }
        }

        info!(user_id, index, "user detected");
        for listener in self.listeners.iter_mut() {
            listener.user_detected(user_id, index);
        }
        self.filter.reset();
    }

    /// キャリブレーションポーズの成立判定
    ///
    /// ポーズ未設定なら即座に成立。進行状態はユーザー離脱か成立まで保持する。
    fn check_calibration_pose(&mut self, user_id: u64, index: usize, now: f32) -> bool {
        let pose = match GestureType::from_name(&self.config.gestures.calibration_pose) {
            Some(GestureType::None) | None => return true,
            Some(pose) => pose,
        };

        let entry = self.calibration.entry(user_id).or_insert_with(|| {
            let mut data = GestureData::new(user_id, pose);
            data.timestamp = now;
            data
        });
        if entry.user_id != user_id || entry.gesture != pose {
            let mut data = GestureData::new(user_id, pose);
            data.timestamp = now;
            *entry = data;
        }

        // キャリブレーションは生の関節位置で判定する
        let snapshot = calibration_snapshot(&self.frame.bodies[index]);
        let stepped = crate::gestures::detect::step(entry.clone(), &snapshot, now);
        if stepped.complete {
            self.calibration.remove(&user_id);
            return true;
        }
        *entry = stepped;
        false
    }

    // --- 照会 API ---

    pub fn primary_user_id(&self) -> u64 {
        self.primary_user_id
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    pub fn is_user_tracked(&self, user_id: u64) -> bool {
        self.user_indices.contains_key(&user_id)
    }

    pub fn user_index(&self, user_id: u64) -> Option<usize> {
        self.user_indices.get(&user_id).copied()
    }

    fn user_body(&self, user_id: u64) -> Option<&BodyData> {
        let index = self.user_index(user_id)?;
        self.frame.bodies.get(index)
    }

    pub fn is_joint_tracked(&self, user_id: u64, joint: JointType) -> bool {
        self.user_body(user_id).is_some_and(|body| {
            joint_tracked(
                body.joint(joint).state,
                self.config.tracking.ignore_inferred_joints,
            )
        })
    }

    pub fn joint_position(&self, user_id: u64, joint: JointType) -> Option<Vec3> {
        Some(self.user_body(user_id)?.joint(joint).position)
    }

    pub fn joint_direction(&self, user_id: u64, joint: JointType) -> Option<Vec3> {
        Some(self.user_body(user_id)?.joint(joint).direction)
    }

    pub fn joint_orientation(&self, user_id: u64, joint: JointType, mirrored: bool) -> Option<Quat> {
        let data = self.user_body(user_id)?.joint(joint);
        Some(if mirrored {
            data.mirrored_rotation
        } else {
            data.normal_rotation
        })
    }

    pub fn body_turn_angle(&self, user_id: u64) -> Option<f32> {
        Some(self.user_body(user_id)?.body_turn_angle)
    }

    pub fn detect_gesture(&mut self, user_id: u64, gesture: GestureType, now: f32) {
        self.session.detect(user_id, gesture, now);
    }

    pub fn reset_gesture(&mut self, user_id: u64, gesture: GestureType, now: f32) {
        self.session.reset(user_id, gesture, now);
    }

    pub fn delete_gesture(&mut self, user_id: u64, gesture: GestureType) -> bool {
        self.session.delete(user_id, gesture)
    }

    pub fn gesture_progress(&self, user_id: u64, gesture: GestureType) -> f32 {
        self.session.progress(user_id, gesture)
    }

    /// 完了済みか調べる。`reset_on_complete` なら読み取りと同時にリセットする。
    pub fn is_gesture_complete(
        &mut self,
        user_id: u64,
        gesture: GestureType,
        reset_on_complete: bool,
        now: f32,
    ) -> bool {
        let complete = self.session.is_complete(user_id, gesture);
        if complete && reset_on_complete {
            self.session.reset(user_id, gesture, now);
        }
        complete
    }
}

fn joint_tracked(state: TrackingState, ignore_inferred: bool) -> bool {
    if ignore_inferred {
        state == TrackingState::Tracked
    } else {
        state != TrackingState::NotTracked
    }
}

fn gesture_snapshot(body: &BodyData, ignore_inferred: bool) -> JointSnapshot {
    let mut snapshot = JointSnapshot::new();
    for joint in RELEVANT_JOINTS {
        let data = body.joint(joint);
        if joint_tracked(data.state, ignore_inferred) {
            snapshot.set(joint, data.position);
        }
    }
    snapshot
}

/// キャリブレーション用スナップショット: 生座標、推定関節も許容
fn calibration_snapshot(body: &BodyData) -> JointSnapshot {
    let mut snapshot = JointSnapshot::new();
    for joint in RELEVANT_JOINTS {
        let data = body.joint(joint);
        if data.state != TrackingState::NotTracked {
            snapshot.set(joint, data.raw_position);
        }
    }
    snapshot
}

/// 欠けた股関節・肩を反対側から鏡映で補完する
fn infer_hip(body: &mut BodyData, target: JointType, opposite: JointType, center: JointType) {
    if body.joint(target).state != TrackingState::NotTracked
        || body.joint(center).state == TrackingState::NotTracked
        || body.joint(opposite).state == TrackingState::NotTracked
    {
        return;
    }

    let center_raw = body.joint(center).raw_position;
    let center_pos = body.joint(center).position;
    let opposite_raw = body.joint(opposite).raw_position;
    let opposite_pos = body.joint(opposite).position;

    let data = body.joint_mut(target);
    data.state = TrackingState::Inferred;
    data.raw_position = center_raw + (center_raw - opposite_raw);
    data.position = center_pos + (center_pos - opposite_pos);
    data.direction = data.position - center_pos;
}

fn calculate_special_directions(body: &mut BodyData) {
    let up = Vec3::new(0.0, 1.0, 0.0);
    let right = Vec3::new(1.0, 0.0, 0.0);

    if body.joint(JointType::HipLeft).state != TrackingState::NotTracked
        && body.joint(JointType::HipRight).state != TrackingState::NotTracked
    {
        let dir =
            body.joint(JointType::HipRight).position - body.joint(JointType::HipLeft).position;
        body.hips_direction = dir - project(dir, up);
    }

    if body.joint(JointType::ShoulderLeft).state != TrackingState::NotTracked
        && body.joint(JointType::ShoulderRight).state != TrackingState::NotTracked
    {
        let dir = body.joint(JointType::ShoulderRight).position
            - body.joint(JointType::ShoulderLeft).position;
        body.shoulders_direction = dir - project(dir, up);

        let mut turn_dir = body.shoulders_direction;
        turn_dir.z = -turn_dir.z;
        body.body_turn_angle = wrap_deg(euler_deg(&from_to_rotation(right, turn_dir)).y);
    }

    hand_directions(
        body,
        JointType::WristLeft,
        JointType::HandLeft,
        JointType::ThumbLeft,
        true,
    );
    hand_directions(
        body,
        JointType::WristRight,
        JointType::HandRight,
        JointType::ThumbRight,
        false,
    );
}

fn hand_directions(
    body: &mut BodyData,
    wrist: JointType,
    hand: JointType,
    thumb: JointType,
    left: bool,
) {
    if body.joint(wrist).state != TrackingState::NotTracked
        && body.joint(hand).state != TrackingState::NotTracked
    {
        let dir = body.joint(hand).position - body.joint(wrist).position;
        if left {
            body.left_hand_direction = dir;
        } else {
            body.right_hand_direction = dir;
        }
    }

    let hand_dir = if left {
        body.left_hand_direction
    } else {
        body.right_hand_direction
    };
    if hand_dir != Vec3::zeros()
        && body.joint(wrist).state != TrackingState::NotTracked
        && body.joint(thumb).state != TrackingState::NotTracked
    {
        let dir = body.joint(thumb).position - body.joint(wrist).position;
        let thumb_dir = dir - project(dir, hand_dir);
        if left {
            body.left_thumb_direction = thumb_dir;
            body.left_thumb_angle = body.body_turn_angle;
        } else {
            body.right_thumb_direction = thumb_dir;
            body.right_thumb_angle = body.body_turn_angle;
        }
    }
}

/// 足先方向の成分を足首へ繰り上げ、足首・足の境界を安定させる
fn fixup_ankle(body: &mut BodyData, knee: JointType, ankle: JointType, foot: JointType) {
    if body.joint(knee).state == TrackingState::NotTracked
        || body.joint(ankle).state == TrackingState::NotTracked
        || body.joint(foot).state == TrackingState::NotTracked
    {
        return;
    }

    let foot_dir = body.joint(foot).direction;
    let ankle_dir = body.joint(ankle).direction;
    let projected = project(foot_dir, ankle_dir);

    let ankle_data = body.joint_mut(ankle);
    ankle_data.raw_position += projected;
    ankle_data.position += projected;
    body.joint_mut(foot).direction -= projected;
}
