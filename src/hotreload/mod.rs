//! Hot reload of the combat config.
//!
//! - `notify` watches the config file's directory
//! - Edited files are parsed and validated before anything changes
//! - Valid configs replace the `CombatConfig` resource and retune every fighter in place
//! - Invalid configs are rejected and the running config stays (rollback)

use bevy::prelude::*;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};

use crate::combat::{CombatSet, Fighter};
use crate::config::{CombatConfig, ConfigError, DEFAULT_CONFIG_PATH};

pub struct HotReloadPlugin {
    pub path: PathBuf,
}

impl Default for HotReloadPlugin {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl Plugin for HotReloadPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HotReloadState {
            watched_file: Some(self.path.clone()),
            ..Default::default()
        })
        .add_event::<ConfigReloadEvent>()
        .add_event::<ReloadConfigRequest>()
        .add_systems(Startup, setup_config_watcher)
        .add_systems(Update, process_config_changes.before(CombatSet));
    }
}

#[derive(Resource, Debug, Default)]
pub struct HotReloadState {
    /// Watcher is running
    pub enabled: bool,
    pub watched_file: Option<PathBuf>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_reload_time: f64,
    pub last_error: Option<String>,
}

impl HotReloadState {
    /// Record the outcome of one reload attempt
    pub fn record(&mut self, result: &Result<CombatConfig, ConfigError>, now: f64) -> ConfigReloadEvent {
        let path = self.watched_file.clone().unwrap_or_default();
        match result {
            Ok(_) => {
                self.reload_count += 1;
                self.last_reload_success = true;
                self.last_reload_time = now;
                self.last_error = None;
                ConfigReloadEvent {
                    path,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                self.last_reload_success = false;
                self.last_error = Some(e.to_string());
                ConfigReloadEvent {
                    path,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Event, Debug, Clone)]
pub struct ConfigReloadEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

/// Reload the watched file now, without waiting for a filesystem event
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ReloadConfigRequest;

#[derive(Resource)]
struct WatcherResource {
    _watcher: RecommendedWatcher,
    receiver: Arc<Mutex<Receiver<notify::Result<Event>>>>,
}

fn setup_config_watcher(mut commands: Commands, mut state: ResMut<HotReloadState>) {
    let Some(config_path) = state.watched_file.clone() else {
        return;
    };

    if !config_path.exists() {
        warn!("Config file not found: {:?}, hot reload disabled", config_path);
        state.enabled = false;
        return;
    }

    let (tx, rx) = channel();
    let mut watcher = match notify::recommended_watcher(tx) {
        Ok(w) => w,
        Err(e) => {
            error!("Failed to create file watcher: {}", e);
            state.enabled = false;
            return;
        }
    };

    if let Err(e) = watcher.watch(watch_dir(&config_path), RecursiveMode::NonRecursive) {
        error!("Failed to watch config directory: {}", e);
        state.enabled = false;
        return;
    }

    state.enabled = true;
    commands.insert_resource(WatcherResource {
        _watcher: watcher,
        receiver: Arc::new(Mutex::new(rx)),
    });

    info!("Hot reload enabled for {:?}", config_path);
}

fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[allow(clippy::too_many_arguments)]
fn process_config_changes(
    watcher: Option<Res<WatcherResource>>,
    mut requests: EventReader<ReloadConfigRequest>,
    mut state: ResMut<HotReloadState>,
    mut config: ResMut<CombatConfig>,
    mut fighters: Query<&mut Fighter>,
    mut events: EventWriter<ConfigReloadEvent>,
    time: Res<Time>,
) {
    let mut pending = !requests.is_empty();
    requests.clear();

    if let Some(watcher) = watcher {
        if let Ok(receiver) = watcher.receiver.lock() {
            while let Ok(result) = receiver.try_recv() {
                match result {
                    Ok(event) if is_config_modify_event(&event, &state.watched_file) => pending = true,
                    Ok(_) => {}
                    Err(e) => warn!("File watcher error: {}", e),
                }
            }
        }
    }

    if !pending {
        return;
    }
    let Some(path) = state.watched_file.clone() else {
        return;
    };

    info!("Reloading combat config from {:?}", path);
    let result = CombatConfig::load(&path);
    let event = state.record(&result, time.elapsed_secs_f64());

    match result {
        Ok(new_config) => {
            for mut fighter in &mut fighters {
                fighter.0.apply_config(&new_config);
            }
            *config = new_config;
            info!("Combat config reloaded (count: {})", state.reload_count);
        }
        Err(e) => {
            error!("Combat config rejected, keeping previous: {}", e);
        }
    }
    events.send(event);
}

/// Modify/create event touching the watched file
fn is_config_modify_event(event: &Event, watched_file: &Option<PathBuf>) -> bool {
    let Some(watched_name) = watched_file.as_ref().and_then(|p| p.file_name()) else {
        return false;
    };
    (event.kind.is_modify() || event.kind.is_create())
        && event.paths.iter().any(|p| p.file_name() == Some(watched_name))
}

/// Serializable view of [`HotReloadState`]
#[derive(Debug, Serialize, Deserialize)]
pub struct HotReloadStatus {
    pub enabled: bool,
    pub watched_file: Option<String>,
    pub reload_count: u32,
    pub last_reload_success: bool,
    pub last_reload_time: f64,
    pub last_error: Option<String>,
}

impl HotReloadStatus {
    pub fn from_state(state: &HotReloadState) -> Self {
        Self {
            enabled: state.enabled,
            watched_file: state.watched_file.as_ref().map(|p| p.display().to_string()),
            reload_count: state.reload_count,
            last_reload_success: state.last_reload_success,
            last_reload_time: state.last_reload_time,
            last_error: state.last_error.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}
