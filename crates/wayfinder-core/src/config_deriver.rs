//! Derives the config payload from the final state via the template.

use serde_json::Value;
use tracing::debug;

use wayfinder_types::payload::ConfigPayload;

use crate::expression::{ExpressionError, ExpressionEvaluator};
use crate::state::State;

#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    #[error("config template failed: {0}")]
    Evaluation(#[from] ExpressionError),

    #[error("config template produced an invalid payload: {0}")]
    InvalidPayload(String),
}

/// Evaluate `template` (a JEXL expression) against the state and read the
/// result as a [`ConfigPayload`].
///
/// The result must be an object carrying `url` (or `target`) and `body`.
pub fn derive_config(
    template: &str,
    state: &State,
    evaluator: &ExpressionEvaluator,
) -> Result<ConfigPayload, DeriveError> {
    let value = evaluator.evaluate(template.trim(), state.as_value())?;

    let Value::Object(map) = &value else {
        return Err(DeriveError::InvalidPayload(format!(
            "expected an object, got {value}"
        )));
    };
    if !map.contains_key("body") {
        return Err(DeriveError::InvalidPayload("missing 'body'".to_string()));
    }

    let payload: ConfigPayload =
        serde_json::from_value(value).map_err(|e| DeriveError::InvalidPayload(e.to_string()))?;
    debug!(url = %payload.url, "Derived config payload");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn firmware_state() -> State {
        let mut state = State::new();
        state
            .set(&"device.board".parse().unwrap(), json!("esp32"))
            .unwrap();
        state
            .set(&"wifi.enabled".parse().unwrap(), json!(true))
            .unwrap();
        state
    }

    #[test]
    fn test_template_reads_state() {
        let template = r#"
            {
                "url": "https://build.example/firmware",
                "body": { "board": device.board, "wifi": wifi.enabled }
            }
        "#;
        let eval = ExpressionEvaluator::new();

        let payload = derive_config(template, &firmware_state(), &eval).unwrap();
        assert_eq!(payload.url, "https://build.example/firmware");
        assert_eq!(payload.body["board"], json!("esp32"));
        assert_eq!(payload.body["wifi"], json!(true));
        assert!(payload.filename.is_none());
    }

    #[test]
    fn test_template_may_name_target_and_filename() {
        let template = r#"{ "target": "https://b.example/" + device.board, "body": {}, "filename": device.board + ".bin" }"#;
        let eval = ExpressionEvaluator::new();

        let payload = derive_config(template, &firmware_state(), &eval).unwrap();
        assert_eq!(payload.url, "https://b.example/esp32");
        assert_eq!(payload.filename.as_deref(), Some("esp32.bin"));
    }

    #[test]
    fn test_syntax_error_is_an_evaluation_error() {
        let eval = ExpressionEvaluator::new();
        let err = derive_config(r#"{ "url": "#, &firmware_state(), &eval).unwrap_err();
        assert!(matches!(err, DeriveError::Evaluation(_)));
    }

    #[test]
    fn test_non_object_result_is_invalid() {
        let eval = ExpressionEvaluator::new();
        let err = derive_config("device.board", &firmware_state(), &eval).unwrap_err();
        assert!(matches!(err, DeriveError::InvalidPayload(_)));
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        let eval = ExpressionEvaluator::new();

        let err = derive_config(r#"{ "url": "https://x.example" }"#, &firmware_state(), &eval).unwrap_err();
        assert!(matches!(err, DeriveError::InvalidPayload(msg) if msg.contains("body")));

        let err = derive_config(r#"{ "body": {} }"#, &firmware_state(), &eval).unwrap_err();
        assert!(matches!(err, DeriveError::InvalidPayload(msg) if msg.contains("url")));
    }
}
