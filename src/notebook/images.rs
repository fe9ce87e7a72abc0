//! Image detection and image size accounting

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::model::ImageKind;
use super::NotebookDocument;

static BASE64_PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"data:[^;]+;base64,([^"'\s)]+)"#).expect("valid regex"));

static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(https?://[^)"'\s]+)"#).expect("valid regex"));

static SRC_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src=["']([^"']+)["']"#).expect("valid regex"));

/// Whether markdown source contains any image marker
pub fn source_has_image(source: &str) -> bool {
    source.contains("![") || source.contains("<img") || has_data_image(source)
}

/// Whether a single markdown line carries an image
pub fn line_has_image(line: &str) -> bool {
    (line.contains("![") && line.contains(')')) || line.contains("<img") || has_data_image(line)
}

fn has_data_image(text: &str) -> bool {
    text.to_lowercase().contains("data:image")
}

/// Percentage (0-100) of the serialized notebook taken by image payloads
///
/// Output images count their serialized size. Markdown images count their
/// base64 payload, or their URL length for external images. Returns 0 when
/// the document cannot be measured.
pub fn image_size_impact(document: &NotebookDocument) -> u8 {
    match measure(document.value()) {
        Some((image, total)) if total > 0 => {
            let ratio = (image as f64 / total as f64) * 100.0;
            ratio.round().clamp(0.0, 100.0) as u8
        }
        Some(_) => 0,
        None => {
            debug!("Could not measure notebook image size");
            0
        }
    }
}

fn measure(value: &Value) -> Option<(usize, usize)> {
    let total = serde_json::to_string(value).ok()?.len();
    let mut image = 0;

    let cells = match value.get("cells") {
        None | Some(Value::Null) => return Some((0, total)),
        Some(cells) => cells.as_array()?,
    };

    for cell in cells {
        match cell.get("cell_type").and_then(Value::as_str) {
            Some("code") => image += output_image_size(cell)?,
            Some("markdown") => {
                if let Some(source) = cell.get("source").and_then(joined_text) {
                    image += source.split('\n').map(markdown_line_image_size).sum::<usize>();
                }
            }
            _ => {}
        }
    }

    Some((image, total))
}

fn output_image_size(cell: &Value) -> Option<usize> {
    let Some(outputs) = cell.get("outputs").and_then(Value::as_array) else {
        return Some(0);
    };

    let mut size = 0;
    for output in outputs {
        let is_rich = matches!(
            output.get("output_type").and_then(Value::as_str),
            Some("execute_result" | "display_data")
        );
        let Some(data) = output.get("data").filter(|_| is_rich) else {
            continue;
        };
        for kind in ImageKind::ALL {
            if let Some(payload) = data.get(kind.mime()).filter(|v| is_truthy(v)) {
                size += serde_json::to_string(payload).ok()?.len();
            }
        }
    }
    Some(size)
}

fn markdown_line_image_size(line: &str) -> usize {
    if !line_has_image(line) {
        return 0;
    }
    if let Some(payload) = BASE64_PAYLOAD.captures(line).and_then(|c| c.get(1)) {
        return payload.as_str().len();
    }
    if line.contains("![") || line.contains("<img") {
        let url = HTTP_URL
            .captures(line)
            .or_else(|| SRC_ATTRIBUTE.captures(line))
            .and_then(|c| c.get(1));
        if let Some(url) = url {
            return url.as_str().len();
        }
    }
    0
}

fn joined_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
