use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// YAML for `.yaml`/`.yml`, JSON for everything else.
pub fn detect_format(path: &Path) -> Format {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Format::Yaml,
        _ => Format::Json,
    }
}

/// A parse error with exact source location.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(jsonschema_form::parse))]
pub struct ParseDiagnostic {
    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: SourceSpan,

    pub message: String,
}

/// Convert 1-based line and column to a byte offset in content.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut offset = 0;
    for (i, l) in content.lines().enumerate() {
        if i + 1 == line {
            return offset + col.saturating_sub(1);
        }
        offset += l.len() + 1;
    }
    offset.min(content.len())
}

/// # Errors
///
/// Returns a [`ParseDiagnostic`] pointing at the offending location.
pub fn parse(content: &str, file_name: &str, format: Format) -> Result<Value, ParseDiagnostic> {
    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| ParseDiagnostic {
            src: NamedSource::new(file_name, content.to_string()),
            span: line_col_to_offset(content, e.line(), e.column()).into(),
            message: e.to_string(),
        }),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| ParseDiagnostic {
            src: NamedSource::new(file_name, content.to_string()),
            span: e.location().map_or(0, |loc| loc.index()).into(),
            message: e.to_string(),
        }),
    }
}

/// Read and parse a JSON or YAML document.
///
/// Parse failures are returned as a bare [`ParseDiagnostic`] so callers can
/// downcast and render them.
pub fn read(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse(&content, &path.display().to_string(), detect_format(path))?)
}

fn serialize(value: &Value, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            let mut out = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
            out.push('\n');
            Ok(out)
        }
        Format::Yaml => serde_yaml::to_string(value).context("failed to serialize YAML"),
    }
}

/// Write `value` to `output` (format chosen by extension), or as JSON to
/// stdout when no path is given.
pub fn write(value: &Value, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let text = serialize(value, detect_format(path))?;
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{}", serialize(value, Format::Json)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_yaml_by_extension() {
        assert_eq!(detect_format(Path::new("values.yaml")), Format::Yaml);
        assert_eq!(detect_format(Path::new("values.yml")), Format::Yaml);
        assert_eq!(detect_format(Path::new("schema.json")), Format::Json);
        assert_eq!(detect_format(Path::new("schema")), Format::Json);
    }

    #[test]
    fn line_col_offsets() {
        assert_eq!(line_col_to_offset("hello\nworld", 1, 1), 0);
        assert_eq!(line_col_to_offset("hello\nworld", 2, 3), 8);
        assert_eq!(line_col_to_offset("hello", 5, 1), 5);
    }

    #[test]
    fn json_errors_point_at_the_failure() {
        let content = "{\n  \"a\": 1,\n  \"b\": \n}";
        let err = parse(content, "broken.json", Format::Json).expect_err("invalid JSON");
        assert_eq!(err.span.offset(), line_col_to_offset(content, 4, 1));
        assert!(err.message.contains("line 4"));
    }

    #[test]
    fn parses_yaml_documents() -> anyhow::Result<()> {
        let value = parse("labels:\n  team: web\n", "values.yaml", Format::Yaml)?;
        assert_eq!(value, json!({"labels": {"team": "web"}}));
        Ok(())
    }

    #[test]
    fn writes_by_output_extension() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let value = json!({"labels": {"team": "web"}});

        let json_path = tmp.path().join("out.json");
        write(&value, Some(&json_path))?;
        assert_eq!(read(&json_path)?, value);

        let yaml_path = tmp.path().join("out.yaml");
        write(&value, Some(&yaml_path))?;
        assert_eq!(fs::read_to_string(&yaml_path)?, "labels:\n  team: web\n");
        Ok(())
    }
}
