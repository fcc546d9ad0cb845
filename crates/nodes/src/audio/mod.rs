// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! This module contains all built-in audio services and their registration logic.

use framekit_core::ServiceRegistry;

pub mod filters;
pub mod tone;

use schemars::schema_for;

/// Registers all available audio services with the registry.
///
/// # Panics
///
/// Panics if config schemas cannot be serialized to JSON (should never happen).
#[allow(clippy::expect_used)] // Schema serialization should never fail for valid types
pub fn register_audio_services(registry: &mut ServiceRegistry) {
    // Call the registration functions from the submodules.
    filters::register_audio_filters(registry);

    // Register the tone generator
    #[cfg(feature = "audio_tone")]
    {
        use framekit_core::{config_helpers, FrameError, Service, ServiceType};
        use std::sync::Arc;
        use tone::{ToneConfig, ToneProducer};

        registry.register_with_description(
            "audio::tone",
            ServiceType::Producer,
            |params: Option<&serde_json::Value>| {
                let config = config_helpers::parse_config_optional(params)?;
                let producer = ToneProducer::new(config).map_err(|e| {
                    FrameError::Configuration(format!("Invalid tone configuration: {e}"))
                })?;
                Ok(Service::Producer(Arc::new(producer)))
            },
            serde_json::to_value(schema_for!(ToneConfig))
                .expect("ToneConfig schema should serialize to JSON"),
            vec!["audio".to_string(), "generators".to_string()],
            "Generates a continuous sine tone. Each frame's samples start where the \
             previous frame's ended, so seeking keeps the phase.",
        );
    }
}
