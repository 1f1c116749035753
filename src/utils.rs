use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "daybook-dev",
            Profile::Prod => "daybook",
        }
    }
}

/// Get the configuration directory path for daybook
/// If profile is Dev, uses "daybook-dev" instead of "daybook"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "daybook", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for daybook
/// If profile is Dev, uses "daybook-dev" instead of "daybook"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "daybook", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(expand_path("/tmp/daybook.db"), PathBuf::from("/tmp/daybook.db"));
        assert_eq!(expand_path("relative/x.db"), PathBuf::from("relative/x.db"));
    }

    #[test]
    fn test_expand_path_replaces_tilde() {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            assert_eq!(expand_path("~/x.db"), home.join("x.db"));
        }
    }

    #[test]
    fn test_profile_app_names_differ() {
        assert_ne!(Profile::Dev.app_name(), Profile::Prod.app_name());
    }
}
