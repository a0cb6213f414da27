//! JSON parsing helpers for transport response bodies.

use anyhow::Result;

/// Parse JSON and, on failure, report the serde path to the offending value
/// plus a snippet of the line where the error occurred.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(de) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner = err.inner();
            let snippet = error_snippet(body, inner.line(), inner.column());
            let path = err.path().to_string();
            let message = if path.is_empty() || path == "." {
                format!("{inner}\n{snippet}")
            } else {
                format!("at path '{path}': {inner}\n{snippet}")
            };
            Err(anyhow::anyhow!(message))
        }
    }
}

/// A short slice of the offending line with a caret under the error column.
fn error_snippet(body: &str, line: usize, column: usize) -> String {
    let target = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    if target.is_empty() {
        return "(empty line)".to_owned();
    }

    // line/column are 1-based
    let error_idx = column.saturating_sub(1).min(target.len());
    let start = error_idx.saturating_sub(10);
    let end = (error_idx + 10).min(target.len());

    let caret = " ".repeat(error_idx - start) + "^";
    format!("...{}...\n   {caret}", &target[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Agent {
        name: String,
    }

    #[test]
    fn valid_json_parses() {
        let agent: Agent = parse_json_with_context(r#"{"name": "triage"}"#).unwrap();
        assert_eq!(agent.name, "triage");
    }

    #[test]
    fn error_includes_path_and_snippet() {
        #[derive(Debug, Deserialize)]
        struct Page {
            #[allow(dead_code)]
            agents: Vec<Agent>,
        }

        let err = parse_json_with_context::<Page>(r#"{"agents": [{"name": null}]}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("agents[0].name"));
        assert!(message.contains("^"));
    }

    #[test]
    fn error_on_truncated_body() {
        let err = parse_json_with_context::<Agent>(r#"{"name": "tri"#).unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
