// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::{config_helpers, FrameError, Service, ServiceRegistry, ServiceType};
use std::sync::Arc;

pub mod chain;
pub mod convert;
pub mod cut;
pub mod mix;

pub use chain::{Chain, MixProducer};
pub use cut::CutProducer;

/// Registers the core filters and transitions with the registry.
///
/// Note: `CutProducer`, `Chain` and `MixProducer` wrap other services and
/// are built directly rather than from JSON parameters.
///
/// # Panics
///
/// Panics if config schemas cannot be serialized to JSON (should never happen).
#[allow(clippy::expect_used)] // Schema serialization should never fail for valid types
pub fn register_core_services(registry: &mut ServiceRegistry) {
    use schemars::schema_for;

    // --- Register ConvertFilter ---
    #[cfg(feature = "convert")]
    {
        use convert::{ConvertConfig, ConvertFilter};

        registry.register_with_description(
            "core::convert",
            ServiceType::Filter,
            |params: Option<&serde_json::Value>| {
                let config: ConvertConfig = config_helpers::parse_config_optional(params)?;
                Ok(Service::Filter(Arc::new(ConvertFilter::new(config))))
            },
            serde_json::to_value(schema_for!(ConvertConfig))
                .expect("ConvertConfig schema should serialize to JSON"),
            vec!["core".to_string()],
            "Installs the software image and audio converters on each frame, \
             optionally forcing data through a given format.",
        );
    }

    // --- Register MixTransition ---
    #[cfg(feature = "mix")]
    {
        use mix::{MixConfig, MixTransition};

        registry.register_with_description(
            "core::mix",
            ServiceType::Transition,
            |params: Option<&serde_json::Value>| {
                let config = config_helpers::parse_config_optional(params)?;
                let transition = MixTransition::new(config).map_err(|e| {
                    FrameError::Configuration(format!("Invalid mix configuration: {e}"))
                })?;
                Ok(Service::Transition(Arc::new(transition)))
            },
            serde_json::to_value(schema_for!(MixConfig))
                .expect("MixConfig schema should serialize to JSON"),
            vec!["core".to_string(), "transitions".to_string()],
            "Dissolves the second track's image over the first (respecting its alpha) \
             and crossfades their audio.",
        );
    }
}
