//! Human-readable error descriptions and structured JSON error formatting.

use ergo_core::ConfigError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: {ce}.\nLikely causes: a settings value is out of the range the pipeline accepts.\nHow to fix: edit the settings TOML and rerun; defaults always validate."
        );
    }

    let msg = err.to_string();
    if msg.contains("parse settings") {
        return format!(
            "What happened: the settings file is not valid TOML.\nLikely causes: a typo or a misplaced quote.\nHow to fix: check the file against the documented schema. Original: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 0 success, 1 generic error, 2 invalid configuration.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    if err.to_string().contains("parse settings") || err.to_string().contains("invalid settings")
    {
        return 2;
    }
    1
}

/// Structured JSON for errors when `--json` is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_maps_to_exit_code_two() {
        let err = eyre::Report::new(ConfigError::ZeroMagnetCount);
        assert_eq!(exit_code_for_error(&err), 2);
    }

    #[test]
    fn generic_error_maps_to_exit_code_one() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn format_error_json_is_valid_json() {
        let err = eyre::eyre!("boom");
        let text = format_error_json(&err);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["reason"], "Error");
    }
}
