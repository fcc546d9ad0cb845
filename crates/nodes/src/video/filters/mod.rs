// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{config_helpers, FrameError, Service, ServiceRegistry, ServiceType};
use std::sync::Arc;

pub mod brightness;
use brightness::{BrightnessConfig, BrightnessFilter};
pub mod invert;
use invert::InvertFilter;

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;

/// Registers all available video filters with the registry.
///
/// # Panics
///
/// Panics if config schemas cannot be serialized to JSON (should never happen).
#[allow(clippy::expect_used)] // Schema serialization should never fail for valid types
pub fn register_video_filters(registry: &mut ServiceRegistry) {
    // --- Register BrightnessFilter ---
    #[cfg(feature = "video_filters")]
    {
        registry.register_with_description(
            "video::brightness",
            ServiceType::Filter,
            |params: Option<&serde_json::Value>| {
                let config = config_helpers::parse_config_optional(params)?;
                let filter = BrightnessFilter::new(config).map_err(|e| {
                    FrameError::Configuration(format!("Invalid brightness configuration: {e}"))
                })?;
                Ok(Service::Filter(Arc::new(filter)))
            },
            serde_json::to_value(schema_for!(BrightnessConfig))
                .expect("BrightnessConfig schema should serialize to JSON"),
            vec!["video".to_string(), "filters".to_string()],
            "Scales luma in YUV 4:2:2 around black level. Chroma is left untouched.",
        );
    }

    // --- Register InvertFilter ---
    #[cfg(feature = "video_filters")]
    {
        #[derive(Deserialize, Debug, Default, JsonSchema)]
        #[serde(default)]
        pub struct InvertConfig {}

        registry.register_with_description(
            "video::invert",
            ServiceType::Filter,
            |params: Option<&serde_json::Value>| {
                let _: InvertConfig = config_helpers::parse_config_optional(params)?;
                Ok(Service::Filter(Arc::new(InvertFilter)))
            },
            serde_json::to_value(schema_for!(InvertConfig))
                .expect("InvertConfig schema should serialize to JSON"),
            vec!["video".to_string(), "filters".to_string()],
            "Inverts the RGB channels of each pixel, keeping alpha.",
        );
    }
}
