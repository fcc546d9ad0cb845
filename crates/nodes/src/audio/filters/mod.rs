// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{config_helpers, FrameError, Service, ServiceRegistry, ServiceType};
use std::sync::Arc;

pub mod gain;
use gain::{AudioGainConfig, AudioGainFilter};

use schemars::schema_for;

/// Registers all available audio filters with the registry.
///
/// # Panics
///
/// Panics if config schemas cannot be serialized to JSON (should never happen).
#[allow(clippy::expect_used)] // Schema serialization should never fail for valid types
pub fn register_audio_filters(registry: &mut ServiceRegistry) {
    // --- Register AudioGainFilter ---
    #[cfg(feature = "audio_gain")]
    {
        registry.register_with_description(
            "audio::gain",
            ServiceType::Filter,
            |params: Option<&serde_json::Value>| {
                let config = config_helpers::parse_config_optional(params)?;
                let filter = AudioGainFilter::new(config).map_err(|e| {
                    FrameError::Configuration(format!("Invalid gain configuration: {e}"))
                })?;
                Ok(Service::Filter(Arc::new(filter)))
            },
            serde_json::to_value(schema_for!(AudioGainConfig))
                .expect("AudioGainConfig schema should serialize to JSON"),
            vec!["audio".to_string(), "filters".to_string()],
            "Adjusts audio volume by applying a linear gain multiplier to all samples \
             when the frame's audio is pulled.",
        );
    }
}
