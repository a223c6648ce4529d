//! Runtime settings resolved from flags and environment.

/// Owner label used when none is configured.
pub const DEFAULT_OWNER: &str = "owner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Script label that maps to the machine owner.
    pub owner_label: String,
}

impl Settings {
    /// Build settings from the raw flag/env values.
    ///
    /// A missing or blank owner falls back to `DEFAULT_OWNER` with a warning,
    /// since every administrative call in a script is checked against it.
    /// Call after tracing is initialized so the warning is not lost.
    pub fn resolve(owner: Option<String>) -> Self {
        let owner_label = match owner.map(|o| o.trim().to_string()) {
            Some(label) if !label.is_empty() => label,
            _ => {
                tracing::warn!("VENDING_OWNER not set; using default owner label \"{DEFAULT_OWNER}\"");
                DEFAULT_OWNER.to_string()
            }
        };

        Self { owner_label }
    }
}
