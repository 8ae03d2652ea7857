use std::fs;
use std::path::{Path, PathBuf};

use bananagen_engine::{migrate, AtomicFileWriter, ExtensionSettings};
use engine_logging::{engine_error, engine_info, engine_warn};

/// Loads the settings file, upgrading older formats.
///
/// A missing file is created with defaults. A file that cannot be read or
/// migrated is left untouched and defaults are used for this run.
pub(crate) fn load_settings(path: &Path) -> ExtensionSettings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            engine_info!("No settings at {:?}; writing defaults", path);
            let settings = ExtensionSettings::default();
            save_settings(path, &settings);
            return settings;
        }
        Err(err) => {
            engine_error!("Failed to read settings from {:?}: {}", path, err);
            return ExtensionSettings::default();
        }
    };

    let raw = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            engine_error!("Failed to parse settings from {:?}: {}", path, err);
            return ExtensionSettings::default();
        }
    };

    match migrate(raw) {
        Ok(migration) => {
            if migration.changed() {
                engine_warn!(
                    "Migrated settings {:?} from {} to {}",
                    path,
                    migration.from,
                    migration.settings.format_version
                );
                save_settings(path, &migration.settings);
            }
            migration.settings
        }
        Err(err) => {
            engine_error!("Failed to load settings from {:?}: {}", path, err);
            ExtensionSettings::default()
        }
    }
}

pub(crate) fn save_settings(path: &Path, settings: &ExtensionSettings) {
    let content = match serde_json::to_vec_pretty(settings) {
        Ok(bytes) => bytes,
        Err(err) => {
            engine_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
        engine_error!("Settings path {:?} has no file name", path);
        return;
    };

    let writer = AtomicFileWriter::new(dir);
    if let Err(err) = writer.write(filename, &content) {
        engine_error!("Failed to write settings to {:?}: {}", path, err);
    }
}
