//! Deployment base path handling.

/// Base path for the router (e.g., `/go` when hosted under a subdirectory).
///
/// Taken from `PUBLIC_URL` at compile time. Returns `None` when no base path
/// is configured so the router falls back to root.
#[must_use]
pub fn router_base() -> Option<String> {
    router_base_with_base(option_env!("PUBLIC_URL").unwrap_or(""))
}

fn router_base_with_base(base: &str) -> Option<String> {
    let base = base.trim_end_matches('/').trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}
