//! 骨格フレームの供給元
//!
//! センサー SDK への依存をここで切り離す。バックエンドは名前付きの
//! ファクトリとして登録し、利用側は [`BackendRegistry::open_first`] で
//! 最初に開けたものを使う。

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::skeleton::BodyFrame;

/// 骨格フレームを1枚ずつ供給するソース
pub trait BodySource {
    /// 新しいフレームがあれば `frame` を上書きして true を返す
    fn poll(&mut self, frame: &mut BodyFrame) -> bool;

    fn describe(&self) -> String;
}

type BackendFactory = fn() -> Result<Box<dyn BodySource>>;

/// 利用可能なセンサーバックエンドの登録簿
///
/// 登録順に初期化を試す。
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<(&'static str, BackendFactory)>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        self.backends.push((name, factory));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|(name, _)| *name).collect()
    }

    pub fn open(&self, name: &str) -> Result<Box<dyn BodySource>> {
        for (backend_name, factory) in &self.backends {
            if *backend_name == name {
                return factory();
            }
        }
        bail!("unknown body source backend: {}", name)
    }

    /// 登録順に初期化を試し、最初に成功したソースを返す
    pub fn open_first(&self) -> Result<Box<dyn BodySource>> {
        for (name, factory) in &self.backends {
            match factory() {
                Ok(source) => {
                    debug!(backend = *name, "body source opened");
                    return Ok(source);
                }
                Err(e) => {
                    warn!(backend = *name, error = %e, "body source unavailable");
                }
            }
        }
        bail!("no body source backend could be opened")
    }
}

/// 事前に用意したフレーム列を順に返すソース
///
/// リプレイとテストに使う。
pub struct ScriptedSource {
    frames: Vec<BodyFrame>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<BodyFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl BodySource for ScriptedSource {
    fn poll(&mut self, frame: &mut BodyFrame) -> bool {
        match self.frames.get(self.cursor) {
            Some(next) => {
                *frame = next.clone();
                self.cursor += 1;
                true
            }
            None => false,
        }
    }

    fn describe(&self) -> String {
        format!("scripted ({} frames)", self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_source_drains_in_order() {
        let mut a = BodyFrame::new();
        a.rel_time = 1.0;
        let mut b = BodyFrame::new();
        b.rel_time = 2.0;

        let mut source = ScriptedSource::new(vec![a, b]);
        let mut frame = BodyFrame::new();

        assert!(source.poll(&mut frame));
        assert_eq!(frame.rel_time, 1.0);
        assert!(source.poll(&mut frame));
        assert_eq!(frame.rel_time, 2.0);
        assert!(!source.poll(&mut frame));
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_registry_open_first_skips_failing_backend() {
        let mut registry = BackendRegistry::new();
        registry.register("broken", || bail!("device not connected"));
        registry.register("scripted", || {
            Ok(Box::new(ScriptedSource::new(Vec::new())) as Box<dyn BodySource>)
        });

        let source = registry.open_first().unwrap();
        assert!(source.describe().starts_with("scripted"));
    }

    #[test]
    fn test_registry_open_by_name() {
        let mut registry = BackendRegistry::new();
        registry.register("scripted", || {
            Ok(Box::new(ScriptedSource::new(Vec::new())) as Box<dyn BodySource>)
        });

        assert!(registry.open("scripted").is_ok());
        assert!(registry.open("kinect").is_err());
        assert_eq!(registry.names(), vec!["scripted"]);
    }
}
