//! Shared User-Agent string for all HTTP traffic.
//!
//! Single source for project URL and UA format so listing, image, and auth
//! traffic stay consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/snooharvest/snooharvest";

/// Default User-Agent identifying the tool and its version.
///
/// The listing API rejects generic client User-Agents, so every request
/// carries this identity unless the operator overrides it.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("snooharvest/{version} (image-corpus-harvester; +{PROJECT_UA_URL})")
}
