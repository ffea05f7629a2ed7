//! Plotly figure model and HTML document writer.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::BackendError;
use crate::style::merge_json;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Traces plus layout, serialized straight into `Plotly.newPlot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Map<String, Value>,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trace(&mut self, trace: Value) {
        self.data.push(trace);
    }

    fn push_layout_item(&mut self, key: &str, item: Value) {
        let entry = self
            .layout
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = entry {
            items.push(item);
        } else {
            *entry = Value::Array(vec![item]);
        }
    }

    pub fn add_annotation(&mut self, annotation: Value) {
        self.push_layout_item("annotations", annotation);
    }

    pub fn add_shape(&mut self, shape: Value) {
        self.push_layout_item("shapes", shape);
    }

    pub fn annotations(&self) -> &[Value] {
        self.layout_array("annotations")
    }

    pub fn shapes(&self) -> &[Value] {
        self.layout_array("shapes")
    }

    fn layout_array(&self, key: &str) -> &[Value] {
        match self.layout.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Merge `patch` into the layout key by key.
    pub fn update_layout(&mut self, patch: Value) {
        let mut layout = Value::Object(std::mem::take(&mut self.layout));
        merge_json(&mut layout, &patch);
        if let Value::Object(map) = layout {
            self.layout = map;
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Standalone HTML page that loads plotly.js and draws the figure.
    pub fn to_html(&self, title: &str) -> String {
        let width = self.layout.get("width").and_then(Value::as_u64).unwrap_or(1200);
        let height = self.layout.get("height").and_then(Value::as_u64).unwrap_or(900);
        let background = self
            .layout
            .get("paper_bgcolor")
            .and_then(Value::as_str)
            .unwrap_or("#000000");
        let config = json!({
            "scrollZoom": true,
            "displaylogo": false,
            "responsive": true,
        });
        // Keep a "</script>" inside a label from closing the inline script.
        let data = serde_json::to_string(&self.data)
            .unwrap_or_else(|_| "[]".into())
            .replace("</", "<\\/");
        let layout = serde_json::to_string(&self.layout)
            .unwrap_or_else(|_| "{}".into())
            .replace("</", "<\\/");

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}" charset="utf-8"></script>
</head>
<body style="margin:0;background:{background};">
<div id="skychart" style="width:{width}px;height:{height}px;"></div>
<script>
Plotly.newPlot("skychart", {data}, {layout}, {config});
</script>
</body>
</html>
"#,
            title = html_escape(title),
            cdn = PLOTLY_CDN,
        )
    }

    pub fn write_html(&self, path: &Path, title: &str) -> Result<(), BackendError> {
        std::fs::write(path, self.to_html(title)).map_err(|source| BackendError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub(crate) fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_layout_merges() {
        let mut fig = Figure::new();
        fig.update_layout(json!({"margin": {"l": 10, "r": 10}, "dragmode": "pan"}));
        fig.update_layout(json!({"margin": {"b": 80}}));
        assert_eq!(fig.layout["margin"], json!({"l": 10, "r": 10, "b": 80}));
        assert_eq!(fig.layout["dragmode"], "pan");
    }

    #[test]
    fn test_annotations_accumulate() {
        let mut fig = Figure::new();
        assert!(fig.annotations().is_empty());
        fig.add_annotation(json!({"text": "N"}));
        fig.add_annotation(json!({"text": "S"}));
        fig.add_shape(json!({"type": "rect"}));
        assert_eq!(fig.annotations().len(), 2);
        assert_eq!(fig.shapes().len(), 1);
    }

    #[test]
    fn test_html_loads_plotly() {
        let mut fig = Figure::new();
        fig.add_trace(json!({"type": "scattergl", "x": [1], "y": [2]}));
        let html = fig.to_html("Orion <test>");
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("<script"));
        assert!(html.contains("Orion &lt;test&gt;"));
        assert!(html.contains("\"scattergl\""));
    }
}
