// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! This module contains all built-in video services and their registration logic.

use framekit_core::ServiceRegistry;

pub mod color;
pub mod filters;

/// Registers all available video services with the registry.
///
/// # Panics
///
/// Panics if config schemas cannot be serialized to JSON (should never happen).
#[allow(clippy::expect_used)] // Schema serialization should never fail for valid types
pub fn register_video_services(registry: &mut ServiceRegistry) {
    filters::register_video_filters(registry);

    // Register the solid color producer
    #[cfg(feature = "video_color")]
    {
        use color::{ColorConfig, ColorProducer};
        use framekit_core::{config_helpers, FrameError, Service, ServiceType};
        use schemars::schema_for;
        use std::sync::Arc;

        registry.register_with_description(
            "video::color",
            ServiceType::Producer,
            |params: Option<&serde_json::Value>| {
                let config: ColorConfig = config_helpers::parse_config_optional(params)?;
                let producer = ColorProducer::new(&config).map_err(|e| {
                    FrameError::Configuration(format!("Invalid color configuration: {e}"))
                })?;
                Ok(Service::Producer(Arc::new(producer)))
            },
            serde_json::to_value(schema_for!(ColorConfig))
                .expect("ColorConfig schema should serialize to JSON"),
            vec!["video".to_string(), "generators".to_string()],
            "Produces frames of a single solid color at any requested size. \
             Audio is marked as silence.",
        );
    }
}
