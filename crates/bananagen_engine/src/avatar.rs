use std::path::{Path, PathBuf};

use base64::Engine as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarKind {
    Character,
    Persona,
    Background,
}

impl AvatarKind {
    pub const ALL: [AvatarKind; 3] = [Self::Character, Self::Persona, Self::Background];
}

#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("failed to read avatar {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reference pictures attached to image requests on demand.
pub trait AvatarSource: Send + Sync {
    /// `data:` URL for the avatar, or `None` if none is configured or it
    /// could not be loaded.
    fn avatar_data_url(&self, kind: AvatarKind) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct FileAvatarSource {
    pub character: Option<PathBuf>,
    pub persona: Option<PathBuf>,
    pub background: Option<PathBuf>,
}

impl FileAvatarSource {
    fn path(&self, kind: AvatarKind) -> Option<&Path> {
        match kind {
            AvatarKind::Character => self.character.as_deref(),
            AvatarKind::Persona => self.persona.as_deref(),
            AvatarKind::Background => self.background.as_deref(),
        }
    }
}

impl AvatarSource for FileAvatarSource {
    fn avatar_data_url(&self, kind: AvatarKind) -> Option<String> {
        let path = self.path(kind)?;
        match load_data_url(path) {
            Ok(url) => Some(url),
            Err(err) => {
                engine_logging::engine_warn!("{}", err);
                None
            }
        }
    }
}

pub fn load_data_url(path: &Path) -> Result<String, AvatarError> {
    let bytes = std::fs::read(path).map_err(|source| AvatarError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for(path),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
