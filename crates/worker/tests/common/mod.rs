#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use cardsmith_db::models::batch::TextBatch;
use cardsmith_db::models::render::CreateRender;
use cardsmith_worker::config::ThreadConfig;
use cardsmith_worker::sink::CandidateSink;

/// base64 of `<svg/>`.
pub const SVG_B64: &str = "PHN2Zy8+";

/// Write a bash script to a temp file; keep the handle alive while it runs.
pub fn write_script(body: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create temp file");
    writeln!(f, "#!/bin/bash").expect("write shebang");
    write!(f, "{body}").expect("write body");
    f
}

/// Run `script` through bash; the bundle is appended as `$1`.
pub fn thread_config(script: &tempfile::NamedTempFile, timeout: Duration) -> ThreadConfig {
    ThreadConfig {
        program: "bash".to_string(),
        args: vec![script.path().to_str().expect("path").to_string()],
        timeout,
    }
}

/// In-memory [`CandidateSink`] that can be told to fail.
#[derive(Default)]
pub struct MemorySink {
    pub renders: Mutex<Vec<CreateRender>>,
    pub scores: Mutex<HashMap<String, (i32, i32)>>,
    pub fail: bool,
}

impl MemorySink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn score(&self, id: &str) -> Option<(i32, i32)> {
        self.scores.lock().unwrap().get(id).copied()
    }
}

impl CandidateSink for MemorySink {
    async fn insert(&self, render: &CreateRender) -> Result<bool, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut renders = self.renders.lock().unwrap();
        if renders.iter().any(|r| r.id == render.id) {
            return Ok(false);
        }
        renders.push(render.clone());
        self.scores.lock().unwrap().insert(render.id.clone(), (0, 0));
        Ok(true)
    }

    async fn update_score(&self, id: &str, score: i32, total: i32) -> Result<bool, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut scores = self.scores.lock().unwrap();
        match scores.get_mut(id) {
            Some(entry) => {
                *entry = (score, total);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A claimed batch as the pipeline would receive it.
pub fn batch(id: &str) -> TextBatch {
    TextBatch {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        created: chrono::Utc::now(),
        worker: Some("abc123".to_string()),
        worker_alive: Some(chrono::Utc::now()),
        is_ready: false,
        is_front: true,
        timems: None,
        dimens: "wide".to_string(),
        texts: serde_json::json!({"name": "Jane Doe", "title": "Baker", "sorted": ["name", "title"]}),
        fonts: "Bungee".to_string(),
    }
}
