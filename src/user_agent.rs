//! Shared User-Agent strings for page, login and file requests.
//!
//! Single source for the project URL and UA format so all traffic from one
//! run identifies itself consistently.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/harvester";

/// Desktop browser User-Agent for sites that reject unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default User-Agent (identifies the tool).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("harvester/{version} (+{PROJECT_UA_URL})")
}

/// Picks the User-Agent for a run.
#[must_use]
pub fn select_user_agent(browser: bool) -> String {
    if browser {
        BROWSER_USER_AGENT.to_string()
    } else {
        default_user_agent()
    }
}
