// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic artifact path derivation and collision handling.
//!
//! Media lands under `<base>/<kind>/<file name>`. File names coming from the
//! source are sanitized for Windows-unsafe characters; name collisions get a
//! `-copyN` suffix before the extension chain so `a.tar.gz` becomes
//! `a-copy1.tar.gz`, never `a.tar-copy1.gz`.

use std::path::{Path, PathBuf};

use chatvault_core::types::{MediaKind, MessageDescriptor};

/// Replace characters that are invalid in Windows file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' => '-',
            '"' => '\'',
            '<' | '>' | '/' | '\\' | '|' | '?' | '*' | '+' => '_',
            other => other,
        })
        .collect()
}

/// Split a file name into (stem before the first dot, extension chain).
///
/// `"a.tar.gz"` -> `("a", ".tar.gz")`; `"noext"` -> `("noext", "")`.
/// A leading dot is treated as part of the stem (`".hidden"` has no chain).
fn split_suffix_chain(file_name: &str) -> (&str, &str) {
    if file_name.is_empty() {
        return ("", "");
    }
    match file_name[1..].find('.') {
        Some(idx) => file_name.split_at(idx + 1),
        None => (file_name, ""),
    }
}

/// Derive the deterministic target path for a message's media object.
///
/// Voice messages and video notes carry no original name and use a
/// timestamp-derived one; everything else uses the sanitized source name,
/// falling back to `<kind>_<remote id>`.
pub fn media_target_path(base_dir: &Path, msg: &MessageDescriptor) -> Option<PathBuf> {
    let media = msg.media.as_ref()?;
    let kind_dir = base_dir.join(media.kind.to_string());

    let file_name = match media.kind {
        MediaKind::Voice | MediaKind::VideoNote => {
            let date = msg.timestamp.format("%Y-%m-%d_%H-%M-%S");
            match media.file_format() {
                Some(ext) => format!("{}_{date}.{ext}", media.kind),
                None => format!("{}_{date}", media.kind),
            }
        }
        _ => match &media.file_name {
            Some(name) if !name.trim().is_empty() => sanitize_file_name(name),
            _ => match media.file_format() {
                Some(ext) => format!("{}_{}.{ext}", media.kind, media.remote_id),
                None => format!("{}_{}", media.kind, media.remote_id),
            },
        },
    };

    Some(kind_dir.join(file_name))
}

/// First path of the form `<stem>-copyN<suffixes>` that does not exist yet.
pub fn next_available_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, suffixes) = split_suffix_chain(&file_name);

    let mut counter: u32 = 1;
    loop {
        let candidate = parent.join(format!("{stem}-copy{counter}{suffixes}"));
        if !candidate.is_file() {
            return candidate;
        }
        counter += 1;
    }
}

/// Stem shared by a file and its `-copyN` variants (extension chain removed).
pub fn copy_family_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, _) = split_suffix_chain(&file_name);
    match stem.split_once("-copy") {
        Some((base, _)) => base.to_string(),
        None => stem.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatvault_core::types::{ChatId, MediaRef};
    use chrono::TimeZone;

    fn message_with_media(kind: MediaKind, file_name: Option<&str>) -> MessageDescriptor {
        MessageDescriptor {
            id: 1,
            chat_id: ChatId(10),
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 12, 23, 8, 4, 10).unwrap(),
            text: None,
            sender_id: None,
            reply_to: None,
            media: Some(MediaRef {
                kind,
                remote_id: "r42".into(),
                file_name: file_name.map(|s| s.to_string()),
                mime_type: Some("audio/ogg".into()),
                size: None,
            }),
        }
    }

    #[test]
    fn sanitizes_windows_unsafe_characters() {
        assert_eq!(
            sanitize_file_name("a:b<c>d\"e/f\\g|h?i*j+k"),
            "a-b_c_d'e_f_g_h_i_j_k"
        );
        assert_eq!(sanitize_file_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn document_uses_sanitized_source_name() {
        let msg = message_with_media(MediaKind::Document, Some("report:final.pdf"));
        let path = media_target_path(Path::new("/data"), &msg).unwrap();
        assert_eq!(path, PathBuf::from("/data/document/report-final.pdf"));
    }

    #[test]
    fn unnamed_media_falls_back_to_remote_id() {
        let msg = message_with_media(MediaKind::Audio, None);
        let path = media_target_path(Path::new("/data"), &msg).unwrap();
        assert_eq!(path, PathBuf::from("/data/audio/audio_r42.ogg"));
    }

    #[test]
    fn voice_uses_timestamp_name() {
        let msg = message_with_media(MediaKind::Voice, Some("ignored.ogg"));
        let path = media_target_path(Path::new("/data"), &msg).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/data/voice/voice_2025-12-23_08-04-10.ogg")
        );
    }

    #[test]
    fn no_media_yields_no_path() {
        let mut msg = message_with_media(MediaKind::Photo, None);
        msg.media = None;
        assert!(media_target_path(Path::new("/data"), &msg).is_none());
    }

    #[test]
    fn copy_suffix_goes_before_extension_chain() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("backup.tar.gz");
        std::fs::write(&original, b"x").unwrap();

        let next = next_available_path(&original);
        assert_eq!(next, dir.path().join("backup-copy1.tar.gz"));

        std::fs::write(&next, b"y").unwrap();
        assert_eq!(
            next_available_path(&original),
            dir.path().join("backup-copy2.tar.gz")
        );
    }

    #[test]
    fn copy_family_strips_copy_suffix() {
        assert_eq!(
            copy_family_stem(Path::new("/a/backup-copy3.tar.gz")),
            "backup"
        );
        assert_eq!(copy_family_stem(Path::new("/a/backup.tar.gz")), "backup");
    }
}
