use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::db::Repository;
use crate::models::Platform;
use crate::probe::{GeoProbe, Outcome};

/// Probe double answering from per-URL scripts. The last scripted outcome
/// for a URL repeats; unscripted URLs get the fallback.
pub struct ScriptedProbe {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    fallback: Outcome,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(fallback: Outcome) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, url: &str, outcomes: impl IntoIterator<Item = Outcome>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.into_iter().collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl GeoProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Outcome {
        self.calls.lock().unwrap().push(url.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(self.fallback),
            Some(queue) => queue.front().copied().unwrap_or(self.fallback),
            None => self.fallback,
        }
    }
}

pub fn api_url(platform: Platform, slug: &str) -> String {
    format!("{}/api/v1/media/{}", platform.origin(), slug)
}

pub fn manifest_url(platform: Platform, slug: &str, lang: &str) -> String {
    format!(
        "{}/manifests/{}/{}/widevine/dash.mpd",
        platform.origin(),
        slug,
        lang
    )
}

pub async fn temp_store() -> (TempDir, Arc<Repository>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let store = Repository::new(path.to_str().unwrap()).await.unwrap();
    (dir, Arc::new(store))
}
