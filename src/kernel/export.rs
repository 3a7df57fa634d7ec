//! Download artifacts built from file and console state.

use super::files::{File, DEFAULT_EXTENSION};
use super::output::{Channel, OutputSink};

pub const CONSOLE_DUMP_NAME: &str = "output.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Raw,
    Html,
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub body: String,
}

pub fn export_raw(file: &File) -> ExportArtifact {
    ExportArtifact {
        file_name: file.name().to_string(),
        mime: "text/plain",
        body: file.content().to_string(),
    }
}

pub fn export_html(file: &File) -> ExportArtifact {
    let name = file.name();
    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Python Code Export</title>
    <style>
        body {{ font-family: monospace; background: #1e1e1e; color: #d4d4d4; padding: 20px; }}
        pre {{ background: #2d2d30; padding: 20px; border-radius: 5px; overflow-x: auto; }}
    </style>
</head>
<body>
    <h1>Python Code - {title}</h1>
    <pre><code>{code}</code></pre>
</body>
</html>"#,
        title = escape_html(name),
        code = escape_html(file.content()),
    );

    ExportArtifact {
        file_name: html_file_name(name),
        mime: "text/html",
        body,
    }
}

pub fn export_console(sink: &OutputSink) -> ExportArtifact {
    let mut body = String::new();
    for entry in sink.entries(Channel::Console) {
        body.push_str(&entry.display_line());
        body.push('\n');
    }
    ExportArtifact {
        file_name: CONSOLE_DUMP_NAME.to_string(),
        mime: "text/plain",
        body,
    }
}

fn html_file_name(name: &str) -> String {
    let stem = name.strip_suffix(DEFAULT_EXTENSION).unwrap_or(name);
    format!("{stem}.html")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/export.rs"]
mod tests;
