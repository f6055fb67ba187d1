use anyhow::Result;
use kagura::config::Config;
use kagura::gestures::{GestureListener, GestureType};
use kagura::math::Vec3;
use kagura::pipeline::Tracker;
use kagura::skeleton::{BodyData, BodyFrame, JointType, TrackingState};
use kagura::source::BodySource;
use std::io::{self, Write};

const CONFIG_PATH: &str = "config.toml";
const FRAME_STEP: f32 = 1.0 / 30.0;

/// 対話操作で書き換える合成ボディをそのまま返すソース
struct SyntheticSource {
    frame: BodyFrame,
}

impl BodySource for SyntheticSource {
    fn poll(&mut self, frame: &mut BodyFrame) -> bool {
        *frame = self.frame.clone();
        true
    }

    fn describe(&self) -> String {
        "synthetic".to_string()
    }
}

struct PrintListener;

impl GestureListener for PrintListener {
    fn user_detected(&mut self, user_id: u64, user_index: usize) {
        println!("ユーザー検出: id={} index={}", user_id, user_index);
    }

    fn user_lost(&mut self, user_id: u64, _user_index: usize) {
        println!("ユーザー消失: id={}", user_id);
    }

    fn gesture_in_progress(
        &mut self,
        _user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        progress: f32,
        _joint: JointType,
        _screen_pos: Vec3,
    ) {
        println!("  進行中: {} ({:.0}%)", gesture.name(), progress * 100.0);
    }

    fn gesture_completed(
        &mut self,
        user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        _joint: JointType,
        _screen_pos: Vec3,
    ) -> bool {
        println!("完了: {} (user={})", gesture.name(), user_id);
        true
    }

    fn gesture_cancelled(
        &mut self,
        user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        _joint: JointType,
    ) -> bool {
        println!("キャンセル: {} (user={})", gesture.name(), user_id);
        true
    }
}

fn synthetic_body(tracking_id: u64) -> BodyData {
    let mut body = BodyData::default();
    body.is_tracked = true;
    body.tracking_id = tracking_id;
    body.position = Vec3::new(0.0, 1.0, 2.0);

    let joints = [
        (JointType::SpineBase, Vec3::new(0.0, 1.0, 2.0)),
        (JointType::SpineMid, Vec3::new(0.0, 1.2, 2.0)),
        (JointType::SpineShoulder, Vec3::new(0.0, 1.4, 2.0)),
        (JointType::Neck, Vec3::new(0.0, 1.5, 2.0)),
        (JointType::Head, Vec3::new(0.0, 1.6, 2.0)),
        (JointType::ShoulderLeft, Vec3::new(-0.2, 1.4, 2.0)),
        (JointType::ElbowLeft, Vec3::new(-0.3, 1.2, 2.0)),
        (JointType::WristLeft, Vec3::new(-0.3, 1.0, 2.0)),
        (JointType::HandLeft, Vec3::new(-0.3, 0.95, 2.0)),
        (JointType::ShoulderRight, Vec3::new(0.2, 1.4, 2.0)),
        (JointType::ElbowRight, Vec3::new(0.3, 1.2, 2.0)),
        (JointType::WristRight, Vec3::new(0.3, 1.0, 2.0)),
        (JointType::HandRight, Vec3::new(0.3, 0.95, 2.0)),
        (JointType::HipLeft, Vec3::new(-0.1, 0.95, 2.0)),
        (JointType::HipRight, Vec3::new(0.1, 0.95, 2.0)),
        (JointType::KneeLeft, Vec3::new(-0.1, 0.5, 2.0)),
        (JointType::KneeRight, Vec3::new(0.1, 0.5, 2.0)),
        (JointType::AnkleLeft, Vec3::new(-0.1, 0.1, 2.0)),
        (JointType::AnkleRight, Vec3::new(0.1, 0.1, 2.0)),
    ];
    for (joint, pos) in joints {
        let data = body.joint_mut(joint);
        data.state = TrackingState::Tracked;
        data.raw_position = pos;
        data.position = pos;
    }
    body
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let config = Config::load_or_default(CONFIG_PATH)?;

    println!("=== Kagura - ジェスチャー認識デモ ({}) ===", env!("GIT_VERSION"));
    println!();
    println!("コマンド:");
    println!("  u <id>        - 合成ユーザーを出現させる (例: u 1)");
    println!("  rh <y>        - 右手の高さを設定 (例: rh 1.7)");
    println!("  lh <y>        - 左手の高さを設定");
    println!("  g <name>      - ジェスチャーの追跡を開始 (例: g wave)");
    println!("  n [count]     - フレームを進める (省略時 1)");
    println!("  s             - 状態表示");
    println!("  q             - 終了");
    println!();

    let mut tracker = Tracker::from_config(config);
    tracker.add_listener(Box::new(PrintListener));

    let mut source = SyntheticSource {
        frame: BodyFrame::new(),
    };
    let mut now = 0.0f32;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "u" if parts.len() == 2 => {
                let id: u64 = parts[1].parse()?;
                source.frame.bodies[0] = synthetic_body(id);
                println!("ユーザー {} を配置しました", id);
            }
            "rh" if parts.len() == 2 => {
                let y: f32 = parts[1].parse()?;
                let data = source.frame.bodies[0].joint_mut(JointType::HandRight);
                data.position.y = y;
                data.raw_position.y = y;
                println!("右手: y = {}", y);
            }
            "lh" if parts.len() == 2 => {
                let y: f32 = parts[1].parse()?;
                let data = source.frame.bodies[0].joint_mut(JointType::HandLeft);
                data.position.y = y;
                data.raw_position.y = y;
                println!("左手: y = {}", y);
            }
            "g" if parts.len() == 2 => match GestureType::from_name(parts[1]) {
                Some(gesture) => {
                    let user = tracker.primary_user_id();
                    if user == 0 {
                        println!("ユーザーがいません");
                    } else {
                        tracker.detect_gesture(user, gesture, now);
                        println!("追跡開始: {}", gesture.name());
                    }
                }
                None => println!("不明なジェスチャー: {}", parts[1]),
            },
            "n" => {
                let count: usize = if parts.len() == 2 { parts[1].parse()? } else { 1 };
                for _ in 0..count {
                    now += FRAME_STEP;
                    source.frame.rel_time = now;
                    tracker.tick(&mut source, now);
                }
                println!("t = {:.2}s", now);
            }
            "s" => {
                println!("時刻: {:.2}s", now);
                println!("プライマリユーザー: {}", tracker.primary_user_id());
                for &id in tracker.user_ids() {
                    println!("  ユーザー {}:", id);
                    if let Some(pos) = tracker.joint_position(id, JointType::HandRight) {
                        println!("    右手: [{:.2}, {:.2}, {:.2}]", pos.x, pos.y, pos.z);
                    }
                }
            }
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", parts[0]);
            }
        }
    }

    Ok(())
}
