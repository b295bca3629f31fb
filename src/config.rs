/// Application-level constants
pub const APP_NAME: &str = "LabClear";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default base URL of the analysis service.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Environment variable overriding the analysis service base URL.
pub const API_URL_ENV: &str = "LABCLEAR_API_URL";

/// Base URL of the analysis service, from the environment or the default.
pub fn api_url() -> String {
    std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "labclear=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_points_at_local_backend() {
        assert!(DEFAULT_API_URL.starts_with("http://localhost:8080"));
        assert!(DEFAULT_API_URL.ends_with("/api"));
    }

    #[test]
    fn app_name_is_labclear() {
        assert_eq!(APP_NAME, "LabClear");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
