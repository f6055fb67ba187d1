use anyhow::{Context, Result};
use std::fs;

use kagura::config::Config;
use kagura::gestures::{GestureListener, GestureType};
use kagura::math::Vec3;
use kagura::pipeline::Tracker;
use kagura::skeleton::{BodyFrame, JointType};
use kagura::source::ScriptedSource;

const CONFIG_PATH: &str = "config.toml";

/// 認識結果を標準出力へ流すリスナー
struct ReplayListener {
    completed: usize,
    cancelled: usize,
}

impl GestureListener for ReplayListener {
    fn user_detected(&mut self, user_id: u64, user_index: usize) {
        println!("[user] detected id={} index={}", user_id, user_index);
    }

    fn user_lost(&mut self, user_id: u64, _user_index: usize) {
        println!("[user] lost id={}", user_id);
    }

    fn gesture_in_progress(
        &mut self,
        user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        progress: f32,
        _joint: JointType,
        _screen_pos: Vec3,
    ) {
        println!(
            "[gesture] {} user={} progress={:.2}",
            gesture.name(),
            user_id,
            progress
        );
    }

    fn gesture_completed(
        &mut self,
        user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        _joint: JointType,
        screen_pos: Vec3,
    ) -> bool {
        self.completed += 1;
        println!(
            "[gesture] {} COMPLETE user={} screen_z={:.2}",
            gesture.name(),
            user_id,
            screen_pos.z
        );
        true
    }

    fn gesture_cancelled(
        &mut self,
        user_id: u64,
        _user_index: usize,
        gesture: GestureType,
        _joint: JointType,
    ) -> bool {
        self.cancelled += 1;
        println!("[gesture] {} cancelled user={}", gesture.name(), user_id);
        true
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let path = std::env::args()
        .nth(1)
        .context("usage: replay <recording.json> [config.toml]")?;
    let config_path = std::env::args().nth(2).unwrap_or(CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)?;

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("録画ファイルを読めません: {}", path))?;
    let frames: Vec<BodyFrame> =
        serde_json::from_str(&raw).context("録画ファイルの形式が不正です")?;
    println!("録画: {} ({} フレーム)", path, frames.len());

    let mut tracker = Tracker::from_config(config);
    tracker.add_listener(Box::new(ReplayListener {
        completed: 0,
        cancelled: 0,
    }));

    let mut last_time = 0.0f32;
    let mut processed = 0usize;

    // フレーム時刻をそのまま評価クロックに使う
    for frame in frames {
        last_time = frame.rel_time;
        let mut one = ScriptedSource::new(vec![frame]);
        tracker.tick(&mut one, last_time);
        processed += 1;
    }

    println!(
        "再生完了: {} フレーム / {:.2}s",
        processed, last_time
    );
    Ok(())
}
