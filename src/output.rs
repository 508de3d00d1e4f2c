use std::fmt::Write;

use serde_json::{json, Value};

use crate::models::{MapView, MarkerDescriptor};

pub const POPUP_MAX_WIDTH: u32 = 300;
pub const ICON_COLOR: &str = "green";

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn popup_html(marker: &MarkerDescriptor) -> String {
    let mut html = String::new();
    let _ = write!(html, "<b>Water Body:</b> {}<br>", escape_html(&marker.key.water));
    let _ = write!(html, "<b>Town:</b> {}<br>", escape_html(&marker.key.town));
    let _ = write!(html, "<b>County:</b> {}<br>", escape_html(&marker.key.county));
    let _ = write!(html, "<b>Stocking Data:</b><br><ul>");

    for detail in &marker.details {
        let _ = write!(
            html,
            "<li><b>{}</b> - {} fish, Size: {} inches, Date: {}</li>",
            escape_html(&detail.species),
            detail.qty,
            detail.size_label(),
            escape_html(&detail.date)
        );
    }

    html.push_str("</ul>");
    html
}

pub fn to_geojson(markers: &[MarkerDescriptor], view: &MapView) -> Value {
    let features: Vec<Value> = markers
        .iter()
        .map(|marker| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [marker.longitude, marker.latitude],
                },
                "properties": {
                    "water": marker.key.water,
                    "town": marker.key.town,
                    "county": marker.key.county,
                    "details": marker.details.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "popup": popup_html(marker),
                    "popup_max_width": POPUP_MAX_WIDTH,
                    "icon_color": ICON_COLOR,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "view": {
            "center": [view.center_latitude, view.center_longitude],
            "zoom": view.zoom,
        },
        "features": features,
    })
}

pub fn to_json(markers: &[MarkerDescriptor]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(markers)?)
}
