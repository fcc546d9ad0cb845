// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use framekit_core::ServiceRegistry;

// Declare the top-level feature modules directly.
pub mod audio;
pub mod core;
pub mod video;

#[cfg(test)]
pub mod test_utils;

/// A single function to register all built-in services.
pub fn register_services(registry: &mut ServiceRegistry) {
    // Call the registration function for each feature module.
    core::register_core_services(registry);
    audio::register_audio_services(registry);
    video::register_video_services(registry);

    tracing::info!("Finished registering built-in services.");
}
