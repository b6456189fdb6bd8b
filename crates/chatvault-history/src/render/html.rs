// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-contained HTML presentation documents.
//!
//! Each chat page lists every archived message in log order with an
//! `id`-anchored bubble; downloaded artifacts are linked by absolute
//! `file://` path so the page opens straight from disk. The index page
//! lists all known chats, most recently active first.

use std::fmt::Write;
use std::path::Path;

use chatvault_core::types::MediaKind;

use crate::entry::{ChatSummary, HistoryEntry};
use crate::render::{HistoryRenderer, format_size};

/// HTML renderer (the default presentation format).
pub struct HtmlRenderer;

impl HistoryRenderer for HtmlRenderer {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render_chat(&self, title: &str, entries: &[HistoryEntry]) -> String {
        let mut messages = String::new();
        for entry in entries {
            render_message(&mut messages, entry);
        }
        if messages.is_empty() {
            messages.push_str("      <div class=\"empty\">No messages</div>\n");
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
             <title>{title_esc}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n\
             <div class=\"container\">\n  <div class=\"header\">\n    \
             <a href=\"index.html\" class=\"back\">&#8592;</a>\n    \
             <div>\n      <div class=\"chat-title\">{title_esc}</div>\n      \
             <div class=\"chat-subtitle\">{count} messages</div>\n    </div>\n  </div>\n  \
             <div class=\"messages\">\n{messages}  </div>\n</div>\n</body>\n</html>\n",
            title_esc = escape(title),
            count = entries.len(),
        )
    }

    fn render_index(&self, chats: &[ChatSummary]) -> String {
        let mut ordered: Vec<&ChatSummary> = chats.iter().collect();
        ordered.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(a.chat_id.cmp(&b.chat_id))
        });

        let mut cards = String::new();
        for chat in ordered {
            let title = escape(&chat.title);
            let initial = chat
                .title
                .chars()
                .next()
                .map(|c| c.to_uppercase().to_string())
                .unwrap_or_else(|| "?".to_string());
            let date = chat
                .last_message_at
                .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let href = format!("chat_{}.html", chat.chat_id.unsigned_abs());
            let _ = write!(
                cards,
                "    <a href=\"{href}\" class=\"card\">\n      \
                 <div class=\"avatar\">{initial}</div>\n      \
                 <div class=\"card-title\">{title}</div>\n      \
                 <div class=\"card-info\"><span>&#128172; {count}</span><span>{date}</span></div>\n    \
                 </a>\n",
                initial = escape(&initial),
                count = chat.message_count,
            );
        }
        if cards.is_empty() {
            cards.push_str("    <div class=\"empty\">No chats archived yet</div>\n");
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
             <title>Chatvault Archive</title>\n<style>\n{STYLE}\n{INDEX_STYLE}\n</style>\n\
             </head>\n<body>\n<div class=\"container\">\n  <div class=\"header\">\n    \
             <div>\n      <div class=\"chat-title\">Chatvault Archive</div>\n      \
             <div class=\"chat-subtitle\">{count} chats</div>\n    </div>\n  </div>\n  \
             <div class=\"cards\">\n{cards}  </div>\n</div>\n</body>\n</html>\n",
            count = chats.len(),
        )
    }
}

fn render_message(out: &mut String, entry: &HistoryEntry) {
    let time = entry.timestamp.format("%d.%m.%Y %H:%M");

    let _ = write!(
        out,
        "      <div class=\"bubble\" id=\"message-{id}\">\n",
        id = entry.id
    );

    if let Some(reply_to) = entry.reply_to {
        let _ = write!(
            out,
            "        <div class=\"reply\">&#8617; reply to <a href=\"#message-{reply_to}\">#{reply_to}</a></div>\n",
        );
    }

    render_media(out, entry);

    if let Some(text) = &entry.text
        && !text.is_empty()
    {
        let _ = write!(out, "        <div class=\"text\">{}</div>\n", escape(text));
    }

    let _ = write!(
        out,
        "        <div class=\"footer\"><span class=\"time\">{time}</span></div>\n      </div>\n",
    );
}

fn render_media(out: &mut String, entry: &HistoryEntry) {
    let Some(kind) = entry.media_kind else {
        return;
    };

    match &entry.artifact_path {
        Some(path) => {
            let url = file_url(path);
            let name = display_name(entry, path);
            match kind {
                MediaKind::Photo => {
                    let _ = write!(
                        out,
                        "        <div class=\"media photo\"><a href=\"{url}\"><img src=\"{url}\" alt=\"{name}\" loading=\"lazy\"></a></div>\n",
                        url = escape(&url),
                        name = escape(&name),
                    );
                }
                MediaKind::Video | MediaKind::VideoNote => {
                    let _ = write!(
                        out,
                        "        <div class=\"media video\"><video controls preload=\"metadata\"><source src=\"{url}\"></video></div>\n",
                        url = escape(&url),
                    );
                }
                _ => {
                    let size = entry
                        .media_size
                        .map(format_size)
                        .unwrap_or_else(|| "unknown size".to_string());
                    let _ = write!(
                        out,
                        "        <div class=\"media file\"><a href=\"{url}\">{icon} {name}</a><span class=\"size\">{size} &middot; {kind}</span></div>\n",
                        url = escape(&url),
                        icon = icon_for(kind),
                        name = escape(&name),
                    );
                }
            }
        }
        None => {
            let name = entry
                .media_file_name
                .clone()
                .unwrap_or_else(|| kind.to_string());
            let size = entry
                .media_size
                .map(format_size)
                .unwrap_or_else(|| "unknown size".to_string());
            let _ = write!(
                out,
                "        <div class=\"media file missing\">{icon} {name}<span class=\"size\">{size} &middot; not downloaded</span></div>\n",
                icon = icon_for(kind),
                name = escape(&name),
            );
        }
    }
}

fn display_name(entry: &HistoryEntry, path: &Path) -> String {
    entry.media_file_name.clone().unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn icon_for(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Photo => "&#128444;",
        MediaKind::Video => "&#127916;",
        MediaKind::VideoNote => "&#127909;",
        MediaKind::Audio => "&#127925;",
        MediaKind::Voice => "&#127908;",
        MediaKind::Document => "&#128196;",
    }
}

/// Minimal HTML escaping for text interpolated into the documents.
fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = "\
:root { --bg: #0f0f0f; --panel: #212121; --bubble: #2b2b2b; --text: #e4e4e4; \
--muted: #8e8e93; --accent: #8774e1; --border: #2f2f2f; }
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; \
background: var(--bg); color: var(--text); min-height: 100vh; }
.container { max-width: 900px; margin: 0 auto; background: var(--panel); min-height: 100vh; }
.header { display: flex; align-items: center; gap: 12px; padding: 12px 20px; \
border-bottom: 1px solid var(--border); position: sticky; top: 0; background: var(--panel); }
.back { color: var(--text); text-decoration: none; font-size: 22px; }
.chat-title { font-size: 15px; font-weight: 500; }
.chat-subtitle { font-size: 13px; color: var(--muted); }
.messages { display: flex; flex-direction: column; gap: 8px; padding: 20px; }
.bubble { max-width: 70%; background: var(--bubble); border-radius: 12px; padding: 8px 12px; }
.reply { font-size: 13px; color: var(--muted); border-left: 3px solid var(--accent); \
padding-left: 8px; margin-bottom: 6px; }
.reply a { color: var(--accent); text-decoration: none; }
.text { font-size: 15px; line-height: 1.5; white-space: pre-wrap; word-wrap: break-word; margin: 4px 0; }
.media { margin: 4px 0; }
.media img, .media video { max-width: 100%; max-height: 500px; border-radius: 8px; display: block; }
.media.file { display: flex; flex-direction: column; gap: 2px; border: 1px solid var(--border); \
border-radius: 8px; padding: 10px 12px; }
.media.file a { color: var(--text); text-decoration: none; }
.media.file .size { font-size: 13px; color: var(--muted); }
.media.missing { opacity: 0.6; }
.footer { display: flex; justify-content: flex-end; margin-top: 4px; }
.time { font-size: 11px; color: var(--muted); }
.empty { text-align: center; padding: 60px 20px; color: var(--muted); }";

const INDEX_STYLE: &str = "\
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); \
gap: 16px; padding: 20px; }
.card { background: var(--bubble); border: 1px solid var(--border); border-radius: 12px; \
padding: 16px; text-decoration: none; color: var(--text); }
.avatar { width: 48px; height: 48px; border-radius: 50%; background: var(--accent); \
display: flex; align-items: center; justify-content: center; font-size: 20px; margin-bottom: 10px; }
.card-title { font-weight: 500; margin-bottom: 6px; }
.card-info { display: flex; justify-content: space-between; font-size: 13px; color: var(--muted); }";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn entry(id: i64, text: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            id,
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, id as u32, 0).unwrap(),
            text: text.map(|t| t.to_string()),
            sender_id: None,
            reply_to: None,
            media_kind: None,
            media_file_name: None,
            media_size: None,
            artifact_path: None,
            chat_title: None,
        }
    }

    #[test]
    fn renders_one_item_per_entry_in_log_order() {
        let entries = vec![entry(1, Some("first")), entry(2, Some("second")), entry(3, None)];
        let html = HtmlRenderer.render_chat("My Chat", &entries);

        assert_eq!(html.matches("class=\"bubble\"").count(), 3);
        let first = html.find("message-1").unwrap();
        let second = html.find("message-2").unwrap();
        let third = html.find("message-3").unwrap();
        assert!(first < second && second < third);
        assert!(html.contains("3 messages"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let entries = vec![entry(1, Some("a")), entry(2, Some("b"))];
        let once = HtmlRenderer.render_chat("Chat", &entries);
        let twice = HtmlRenderer.render_chat("Chat", &entries);
        assert_eq!(once, twice);
    }

    #[test]
    fn text_is_escaped() {
        let entries = vec![entry(1, Some("<script>alert('x')</script>"))];
        let html = HtmlRenderer.render_chat("a <b> & c", &entries);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &lt;b&gt; &amp; c"));
    }

    #[test]
    fn downloaded_photo_links_absolute_file_url() {
        let mut e = entry(1, None);
        e.media_kind = Some(MediaKind::Photo);
        e.artifact_path = Some(PathBuf::from("/data/photo/pic.jpg"));
        let html = HtmlRenderer.render_chat("Chat", &[e]);
        assert!(html.contains("file:///data/photo/pic.jpg"));
        assert!(html.contains("<img"));
    }

    #[test]
    fn missing_artifact_renders_not_downloaded() {
        let mut e = entry(2, None);
        e.media_kind = Some(MediaKind::Video);
        e.media_file_name = Some("clip.mp4".to_string());
        let html = HtmlRenderer.render_chat("Chat", &[e]);
        assert!(html.contains("not downloaded"));
        assert!(html.contains("clip.mp4"));
        assert!(!html.contains("file://"));
    }

    #[test]
    fn index_sorts_by_recency() {
        let older = ChatSummary {
            chat_id: 1,
            title: "Older".into(),
            message_count: 5,
            last_message_at: Some(chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        };
        let newer = ChatSummary {
            chat_id: -2,
            title: "Newer".into(),
            message_count: 9,
            last_message_at: Some(chrono::Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
        };
        let html = HtmlRenderer.render_index(&[older, newer]);
        assert!(html.find("Newer").unwrap() < html.find("Older").unwrap());
        assert!(html.contains("chat_2.html"));
    }
}
