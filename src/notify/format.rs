//! Message bodies for quake alerts (plain text + Matrix HTML).

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::QuakeAlert;
use crate::quake::QuakeRecord;

const MAPS_BASE_URL: &str = "https://www.google.com/maps?q=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub plain: String,
    pub html: String,
}

pub fn render(alert: &QuakeAlert) -> RenderedMessage {
    if alert.is_revision {
        render_revision(&alert.current, &alert.previous)
    } else {
        render_new(&alert.current)
    }
}

/// Magnitude with one decimal; unparsable text renders as 0.0.
fn mag(m: &str) -> String {
    format!("{:.1}", m.trim().parse::<f64>().unwrap_or(0.0))
}

fn coordinates(q: &QuakeRecord) -> String {
    format!("{}°N, {}°E", q.latitude, q.longitude)
}

fn maps_link(q: &QuakeRecord) -> String {
    let href = format!("{MAPS_BASE_URL}{},{}", q.latitude, q.longitude);
    format!(
        "<a href=\"{}\">{}</a>",
        encode_double_quoted_attribute(&href),
        encode_text(&coordinates(q))
    )
}

fn bulletin_link(q: &QuakeRecord) -> String {
    format!(
        "<a href=\"{}\">View PHIVOLCS report</a>",
        encode_double_quoted_attribute(&q.bulletin_reference)
    )
}

fn render_new(q: &QuakeRecord) -> RenderedMessage {
    let plain = format!(
        "🚨 New Earthquake Alert!\nDate & Time: {}\nLocation: {}\nMagnitude: {}\nDepth: {}km\nCoordinates: {}\nBulletin: {}\nStay safe! ⚠️",
        q.timestamp,
        q.location,
        mag(&q.magnitude),
        q.depth,
        coordinates(q),
        q.bulletin_reference,
    );
    let html = format!(
        "🚨 <b>New Earthquake Alert!</b><br><br>📅 <b>Date & Time:</b> {}<br>📍 <b>Location:</b> {}<br>📈 <b>Magnitude:</b> {}<br>📊 <b>Depth:</b> {}km<br>🧭 <b>Coordinates:</b> {}<br>📄 <b>Bulletin:</b> {}<br><br>Stay safe! ⚠️",
        encode_text(&q.timestamp),
        encode_text(&q.location),
        mag(&q.magnitude),
        encode_text(&q.depth),
        maps_link(q),
        bulletin_link(q),
    );
    RenderedMessage { plain, html }
}

fn render_revision(new: &QuakeRecord, old: &QuakeRecord) -> RenderedMessage {
    let (loc_plain, loc_html) = if new.location != old.location {
        (
            format!("New Location: {}\nPrevious: {}", new.location, old.location),
            format!(
                "<b>📍 New Location: {}</b><br>Old: {}",
                encode_text(&new.location),
                encode_text(&old.location)
            ),
        )
    } else {
        (
            format!("Location: {}", old.location),
            format!("📍 Location: {}", encode_text(&old.location)),
        )
    };

    let (mag_plain, mag_html) = if new.magnitude != old.magnitude {
        (
            format!("{} → {}", mag(&old.magnitude), mag(&new.magnitude)),
            format!("{} → <b>{}</b>", mag(&old.magnitude), mag(&new.magnitude)),
        )
    } else {
        (old.magnitude.clone(), encode_text(&old.magnitude).to_string())
    };

    let (depth_plain, depth_html) = if new.depth != old.depth {
        (
            format!("{} → {}", old.depth, new.depth),
            format!("{} → <b>{}</b>", encode_text(&old.depth), encode_text(&new.depth)),
        )
    } else {
        (old.depth.clone(), encode_text(&old.depth).to_string())
    };

    let (coord_plain, coord_html) =
        if new.latitude != old.latitude || new.longitude != old.longitude {
            (
                format!("{} → {}", coordinates(old), coordinates(new)),
                format!("{} → <b>{}</b>", maps_link(old), maps_link(new)),
            )
        } else {
            (coordinates(old), maps_link(old))
        };

    let plain = format!(
        "💡 Earthquake Bulletin Update!\nDate & Time: {}\n{}\nMagnitude: {}\nDepth: {}km\nCoordinates: {}\nBulletin: {}\nRevised by PHIVOLCS 🔄",
        new.timestamp, loc_plain, mag_plain, depth_plain, coord_plain, new.bulletin_reference,
    );
    let html = format!(
        "💡 <b>Earthquake Bulletin Update!</b><br><br>📅 <b>Date & Time:</b> {}<br>{}<br>📈 <b>Magnitude:</b> {}<br>📊 <b>Depth:</b> {}km<br>🧭 <b>Coordinates:</b> {}<br>📄 <b>Bulletin:</b> {}<br><br>Revised by PHIVOLCS 🔄",
        encode_text(&new.timestamp),
        loc_html,
        mag_html,
        depth_html,
        coord_html,
        bulletin_link(new),
    );
    RenderedMessage { plain, html }
}
