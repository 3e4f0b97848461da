//! Server-rendered gallery page of stored photos.

use std::fmt::Write as _;

use chrono::Local;

use crate::store::PhotoRecord;

/// Object tags shown per card before truncating.
const MAX_TAGS: usize = 5;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #f4f5f7; color: #222; }
header { padding: 24px 32px; background: #fff; border-bottom: 1px solid #e2e4e8; }
h1 { margin: 0; font-size: 22px; }
.count { color: #666; font-size: 14px; margin-top: 4px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 20px; padding: 24px 32px; }
.card { background: #fff; border-radius: 10px; overflow: hidden; box-shadow: 0 1px 3px rgba(0,0,0,0.08); }
.card img { width: 100%; height: 220px; object-fit: cover; display: block; background: #ddd; }
.meta { padding: 12px 14px; }
.row { display: flex; justify-content: space-between; align-items: center; }
.user { font-weight: 600; }
.badge { color: #fff; font-size: 12px; padding: 2px 8px; border-radius: 10px; }
.time { color: #888; font-size: 12px; margin-top: 6px; }
.tags { margin-top: 8px; display: flex; flex-wrap: wrap; gap: 4px; }
.tag { background: #eef1f5; color: #445; font-size: 12px; padding: 2px 6px; border-radius: 4px; }
.tag.more { background: transparent; color: #888; }
.empty { padding: 48px 32px; color: #666; }
"#;

/// Render the full gallery page. Records are shown in the order given.
pub fn render_gallery(photos: &[PhotoRecord]) -> String {
    let mut html = String::with_capacity(4096 + photos.len() * 512);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Photo Gallery</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<header>\n<h1>Photo Gallery</h1>\n");
    let _ = writeln!(
        html,
        "<div class=\"count\">{} photo{}</div>",
        photos.len(),
        if photos.len() == 1 { "" } else { "s" }
    );
    html.push_str("</header>\n");

    if photos.is_empty() {
        html.push_str("<div class=\"empty\">No photos yet. Send one to the bot to get started.</div>\n");
    } else {
        html.push_str("<div class=\"grid\">\n");
        for photo in photos {
            render_card(&mut html, photo);
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, photo: &PhotoRecord) {
    let (badge_text, badge_color) = score_badge(photo.safe_score);
    let local_time = photo.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");

    let _ = write!(
        html,
        "<div class=\"card\">\n<img src=\"{url}\" alt=\"Photo from @{user}\" loading=\"lazy\">\n\
         <div class=\"meta\">\n<div class=\"row\"><span class=\"user\">@{user}</span>\
         <span class=\"badge\" style=\"background:{badge_color}\">{badge_text}</span></div>\n\
         <div class=\"time\">{local_time}</div>\n",
        url = escape_html(&photo.photo_url),
        user = escape_html(&photo.username),
    );

    if !photo.detected_objects.is_empty() {
        html.push_str("<div class=\"tags\">");
        for object in photo.detected_objects.iter().take(MAX_TAGS) {
            let _ = write!(html, "<span class=\"tag\">{}</span>", escape_html(&object.label));
        }
        let hidden = photo.detected_objects.len().saturating_sub(MAX_TAGS);
        if hidden > 0 {
            let _ = write!(html, "<span class=\"tag more\">+{hidden} more</span>");
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n</div>\n");
}

/// Badge label and colour for a safe score.
fn score_badge(score: Option<f64>) -> (String, &'static str) {
    let Some(score) = score else {
        return ("N/A".to_string(), "#9e9e9e");
    };
    let color = if score >= 0.95 {
        "#2e7d32"
    } else if score >= 0.85 {
        "#689f38"
    } else if score >= 0.7 {
        "#f9a825"
    } else if score >= 0.5 {
        "#ef6c00"
    } else {
        "#c62828"
    };
    (format!("{}%", (score * 100.0).round() as i64), color)
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
