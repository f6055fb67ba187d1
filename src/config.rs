use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub gestures: GesturesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// ユーザーとして扱う最小距離（メートル）
    #[serde(default = "default_min_user_distance")]
    pub min_user_distance: f32,
    /// ユーザーとして扱う最大距離（メートル、0以下で無制限）
    #[serde(default)]
    pub max_user_distance: f32,
    /// 最初のユーザーを最も近いボディから選ぶ
    #[serde(default = "default_true")]
    pub detect_closest_user: bool,
    /// Inferred状態の関節を未追跡として扱う
    #[serde(default = "default_true")]
    pub ignore_inferred_joints: bool,
    /// 位置平滑化プリセット
    #[serde(default = "default_smoothing")]
    pub smoothing: Smoothing,
    /// 関節向きの可動域補正を行う
    #[serde(default = "default_true")]
    pub use_orientation_constraints: bool,
}

fn default_min_user_distance() -> f32 { 0.5 }
fn default_true() -> bool { true }
fn default_smoothing() -> Smoothing { Smoothing::Default }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            min_user_distance: default_min_user_distance(),
            max_user_distance: 0.0,
            detect_closest_user: default_true(),
            ignore_inferred_joints: default_true(),
            smoothing: default_smoothing(),
            use_orientation_constraints: default_true(),
        }
    }
}

/// 平滑化プリセット
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    None,
    Default,
    Medium,
    Aggressive,
}

impl Smoothing {
    /// 平滑化の強さ（0 = 無効、1 = 完全固定）
    pub fn factor(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Default => 0.5,
            Self::Medium => 0.5,
            Self::Aggressive => 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GesturesConfig {
    /// ジェスチャー完了後、同一ユーザーの次の検出までの待ち時間（秒）
    #[serde(default = "default_min_time_between_gestures")]
    pub min_time_between_gestures: f32,
    /// ユーザー登録に要求するキャリブレーションポーズ名（"none"で即登録）
    #[serde(default = "default_calibration_pose")]
    pub calibration_pose: String,
    /// ユーザー検出時に自動登録するジェスチャー名
    #[serde(default)]
    pub startup_gestures: Vec<String>,
}

fn default_min_time_between_gestures() -> f32 { 0.7 }
fn default_calibration_pose() -> String { "none".to_string() }

impl Default for GesturesConfig {
    fn default() -> Self {
        Self {
            min_time_between_gestures: default_min_time_between_gestures(),
            calibration_pose: default_calibration_pose(),
            startup_gestures: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// ファイルがなければデフォルト設定を返す
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracking.min_user_distance, 0.5);
        assert_eq!(config.tracking.max_user_distance, 0.0);
        assert!(config.tracking.detect_closest_user);
        assert_eq!(config.gestures.min_time_between_gestures, 0.7);
        assert_eq!(config.gestures.calibration_pose, "none");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [tracking]
            min_user_distance = 1.0
            smoothing = "aggressive"
            use_orientation_constraints = false

            [gestures]
            min_time_between_gestures = 0.5
            calibration_pose = "psi"
            startup_gestures = ["raise_right_hand", "wave"]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tracking.min_user_distance, 1.0);
        assert_eq!(config.tracking.smoothing, Smoothing::Aggressive);
        assert!(!config.tracking.use_orientation_constraints);
        assert_eq!(config.gestures.calibration_pose, "psi");
        assert_eq!(config.gestures.startup_gestures.len(), 2);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("[tracking]\nmax_user_distance = 3.0\n").unwrap();
        assert_eq!(config.tracking.max_user_distance, 3.0);
        assert_eq!(config.tracking.min_user_distance, 0.5);
        assert!(config.tracking.ignore_inferred_joints);
    }

    #[test]
    fn test_smoothing_factor() {
        assert_eq!(Smoothing::None.factor(), 0.0);
        assert!(Smoothing::Aggressive.factor() > Smoothing::Default.factor());
    }
}
