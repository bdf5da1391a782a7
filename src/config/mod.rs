//! Configuration and settings management.
//!
//! This module provides run settings types and loading. Settings are stored
//! in the user's config directory as JSON.

mod settings;

pub use settings::{
    ClassifierBackend, ClassifierSettings, GmailSettings, OutputSettings, PipelineSettings,
    SearchSettings, Settings, SettingsError, API_TOKEN_ENV,
};
