use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: i32,
    pub render_distance: i32,
    pub room_id: String,
    pub save_dir: PathBuf,
    pub autosave_interval_secs: u64,
    /// Mesh worker override; `None` derives the count from the hardware.
    pub worker_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            render_distance: 4,
            room_id: "world".to_string(),
            save_dir: PathBuf::from("saves"),
            autosave_interval_secs: 30,
            worker_threads: None,
        }
    }
}

impl EngineConfig {
    /// Reads the config file, falling back to defaults when it is missing or
    /// unparsable. A broken config never stops the engine from starting.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<EngineConfig>(&text) {
                Ok(config) => config.sanitized(),
                Err(err) => {
                    warn!(
                        "Failed to parse {}: {err}; using default settings",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, text)
    }

    pub fn sanitized(mut self) -> Self {
        self.render_distance = self.render_distance.clamp(1, 16);
        if self.room_id.is_empty() {
            self.room_id = "world".to_string();
        }
        if self.autosave_interval_secs == 0 {
            self.autosave_interval_secs = 30;
        }
        self.worker_threads = self.worker_threads.map(|count| count.clamp(1, 4));
        self
    }
}
