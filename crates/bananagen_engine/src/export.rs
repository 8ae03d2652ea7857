//! "Post to chat": writes a generated image and a chat message record that
//! references it.

use std::path::PathBuf;

use base64::Engine as _;
use bananagen_core::Entry;
use serde::Serialize;

use crate::filename::image_filename;
use crate::persist::{AtomicFileWriter, PersistError};

const POSTER_NAME: &str = "Narrator";
const POSTER_MODEL: &str = "BananaGen";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Only generated images can be posted to chat.")]
    NotAnImage,
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),
    #[error("invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to encode post record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Written only for inline `data:` images; remote images stay remote.
    pub image_path: Option<PathBuf>,
    pub record_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct PostRecord<'a> {
    name: &'a str,
    is_user: bool,
    is_system: bool,
    send_date: i64,
    mes: &'a str,
    extra: PostExtra<'a>,
}

#[derive(Debug, Serialize)]
struct PostExtra<'a> {
    image: &'a str,
    inline_image: bool,
    gen_id: i64,
    api: &'a str,
    model: &'a str,
}

struct DataUrl {
    mime: String,
    bytes: Vec<u8>,
}

fn decode_data_url(url: &str) -> Result<Option<DataUrl>, ExportError> {
    let Some(rest) = url.strip_prefix("data:") else {
        return Ok(None);
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::MalformedDataUrl("missing ','".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ExportError::MalformedDataUrl("not base64 encoded".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim())?;
    Ok(Some(DataUrl {
        mime: mime.to_string(),
        bytes,
    }))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Writes the image (if inline) and a `.json` post record next to it.
/// `sent_at_ms` is the post time in milliseconds since the epoch.
pub fn export_image_entry(
    entry: &Entry,
    writer: &AtomicFileWriter,
    sent_at_ms: i64,
) -> Result<ExportSummary, ExportError> {
    let image_ref = match entry.image_ref.as_deref() {
        Some(url) if entry.is_image() && !url.trim().is_empty() => url,
        _ => return Err(ExportError::NotAnImage),
    };

    let (image_path, image_field) = match decode_data_url(image_ref)? {
        Some(data) => {
            let filename = image_filename(entry.id, &entry.label, extension_for(&data.mime));
            let path = writer.write(&filename, &data.bytes)?;
            (Some(path), filename)
        }
        None => (None, image_ref.to_string()),
    };

    let record = PostRecord {
        name: POSTER_NAME,
        is_user: false,
        is_system: true,
        send_date: sent_at_ms,
        mes: entry.body.trim(),
        extra: PostExtra {
            image: &image_field,
            inline_image: true,
            gen_id: sent_at_ms,
            api: "manual",
            model: POSTER_MODEL,
        },
    };
    let json = serde_json::to_vec_pretty(&record)?;
    let record_path = writer.write(&image_filename(entry.id, &entry.label, "json"), &json)?;

    engine_logging::engine_info!(
        "posted entry {} to {}",
        entry.id,
        record_path.display()
    );
    Ok(ExportSummary {
        image_path,
        record_path,
    })
}
