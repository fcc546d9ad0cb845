// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Utility functions for service configuration.
//!
//! - [`config_helpers`]: Parse service parameters from JSON

use crate::error::FrameError;

/// Helper functions for parsing service parameters from JSON values.
pub mod config_helpers {
    use super::FrameError;
    use serde::Deserialize;

    /// Parses parameters from an optional JSON value, using defaults if not provided.
    /// This is the preferred approach for services with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Configuration` if parameters are present but malformed.
    pub fn parse_config_optional<T>(params: Option<&serde_json::Value>) -> Result<T, FrameError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        match params {
            None | Some(serde_json::Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| FrameError::Configuration(format!("Failed to parse config: {e}"))),
        }
    }

    /// Parses parameters from an optional JSON value, returning an error if not provided.
    /// Use this for services that require explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Configuration` if `params` is `None` or if deserialization fails.
    pub fn parse_config_required<T>(params: Option<&serde_json::Value>) -> Result<T, FrameError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = params
            .ok_or_else(|| FrameError::Configuration("Configuration required".to_string()))?
            .clone();
        serde_json::from_value(value)
            .map_err(|e| FrameError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Parses parameters with detailed error messages.
    /// Use this when you want to provide context about what failed to parse.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Configuration` if `params` is `None` or if deserialization fails.
    pub fn parse_config_with_context<T>(
        params: Option<&serde_json::Value>,
        context: &str,
    ) -> Result<T, FrameError>
    where
        T: for<'de> Deserialize<'de>,
    {
        params.map_or_else(
            || Err(FrameError::Configuration(format!("{context} configuration required"))),
            |p| {
                serde_json::from_value(p.clone()).map_err(|e| {
                    FrameError::Configuration(format!("Failed to parse {context}: {e}"))
                })
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::config_helpers::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Params {
        level: f32,
    }

    #[test]
    fn optional_falls_back_to_default() {
        let params: Params = parse_config_optional(None).unwrap();
        assert_eq!(params, Params::default());
        let params: Params =
            parse_config_optional(Some(&serde_json::json!({"level": 0.5}))).unwrap();
        assert!((params.level - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn optional_rejects_malformed_params() {
        let result: Result<Params, _> =
            parse_config_optional(Some(&serde_json::json!({"level": "loud"})));
        assert!(result.is_err());
    }

    #[test]
    fn required_needs_params() {
        assert!(parse_config_required::<Params>(None).is_err());
        let err = parse_config_with_context::<Params>(None, "gain").unwrap_err();
        assert_eq!(err.to_string(), "configuration error: gain configuration required");
    }
}
