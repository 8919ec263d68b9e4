//! User-Agent string sent to tuners and artwork hosts.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/dvrsync";

/// Default User-Agent for all requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("dvrsync/{version} (+{PROJECT_UA_URL})")
}
