//! Resolved settings for one filter run

use std::path::{Path, PathBuf};
use std::time::Duration;

use acomms_config::{FilterConfig, TruncatePolicy};
use acomms_sources::{StartAt, TailConfig};

use crate::error::{PipelineError, Result};

/// Filter settings with every path resolved
///
/// Built from `[filter]` after command line overrides have been applied.
#[derive(Debug, Clone)]
pub struct FilterSettings {
    /// Raw log to tail, canonical when it or its directory exists
    pub target: PathBuf,

    /// Directory receiving the category outputs
    pub output_dir: PathBuf,

    /// Output file prefix
    pub name: String,

    /// Cursor file
    pub cursor_path: PathBuf,

    /// Start position when the cursor file has nothing for `target`
    pub start_at: StartAt,

    pub poll_interval: Duration,
    pub missing_backoff_max: Duration,
    pub on_truncate: TruncatePolicy,
    pub durable: bool,
}

impl FilterSettings {
    /// Resolve settings from the `[filter]` section
    ///
    /// # Errors
    ///
    /// Fails if `target` or `output_dir` is unset.
    pub fn from_config(filter: &FilterConfig) -> Result<Self> {
        let target = filter
            .target
            .as_deref()
            .map(resolve_target)
            .ok_or(PipelineError::MissingSetting("target"))?;
        let output_dir = filter
            .output_dir
            .clone()
            .ok_or(PipelineError::MissingSetting("output_dir"))?;
        let cursor_path = filter
            .effective_cursor_path()
            .ok_or_else(|| PipelineError::NoCursorPath {
                target: target.clone(),
            })?;

        let start_at = match filter.start_at {
            acomms_config::StartAt::Beginning => StartAt::Beginning,
            acomms_config::StartAt::End => StartAt::End,
        };

        Ok(Self {
            target,
            output_dir,
            name: filter.name.clone(),
            cursor_path,
            start_at,
            poll_interval: filter.poll_interval,
            missing_backoff_max: filter.missing_backoff_max.max(filter.poll_interval),
            on_truncate: filter.on_truncate,
            durable: filter.durable,
        })
    }

    /// Reader configuration for these settings
    pub fn tail_config(&self) -> TailConfig {
        TailConfig {
            poll_interval: self.poll_interval,
            start_at: self.start_at,
            ..Default::default()
        }
    }
}

/// Absolute, normalized form of the raw log path
///
/// The cursor file records the target it belongs to, so spellings of the
/// same file must compare equal. A raw log that does not exist yet resolves
/// through its directory.
fn resolve_target(target: &Path) -> PathBuf {
    if let Ok(path) = target.canonicalize() {
        return path;
    }
    if let (Some(parent), Some(file)) = (target.parent(), target.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(file);
        }
    }
    std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use acomms_config::ProfileKind;
    use tempfile::TempDir;

    fn filter() -> FilterConfig {
        FilterConfig {
            target: Some(PathBuf::from("/data/raw/sentry_raw.txt")),
            output_dir: Some(PathBuf::from("/data/filtered")),
            name: "sentry".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config() {
        let settings = FilterSettings::from_config(&filter()).unwrap();
        assert_eq!(settings.target, PathBuf::from("/data/raw/sentry_raw.txt"));
        assert_eq!(
            settings.cursor_path,
            PathBuf::from("/data/filtered/.sentry_vehicle.cursor.json")
        );
        assert_eq!(settings.start_at, StartAt::Beginning);
        assert_eq!(settings.on_truncate, TruncatePolicy::Stop);
        assert_eq!(settings.tail_config().poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_explicit_cursor_and_start_at_end() {
        let config = FilterConfig {
            cursor_path: Some(PathBuf::from("/var/lib/acomms/usbl.json")),
            start_at: acomms_config::StartAt::End,
            profile: ProfileKind::Positioning,
            ..filter()
        };
        let settings = FilterSettings::from_config(&config).unwrap();
        assert_eq!(settings.cursor_path, PathBuf::from("/var/lib/acomms/usbl.json"));
        assert_eq!(settings.tail_config().start_at, StartAt::End);
    }

    #[test]
    fn test_missing_target() {
        let config = FilterConfig {
            target: None,
            ..filter()
        };
        assert!(matches!(
            FilterSettings::from_config(&config),
            Err(PipelineError::MissingSetting("target"))
        ));
    }

    #[test]
    fn test_missing_output_dir() {
        let config = FilterConfig {
            output_dir: None,
            ..filter()
        };
        assert!(matches!(
            FilterSettings::from_config(&config),
            Err(PipelineError::MissingSetting("output_dir"))
        ));
    }

    #[test]
    fn test_target_spellings_resolve_equal() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("raw.txt"), "").unwrap();

        let resolve = |target: PathBuf| {
            let config = FilterConfig {
                target: Some(target),
                ..filter()
            };
            FilterSettings::from_config(&config).unwrap().target
        };

        let plain = resolve(dir.path().join("raw.txt"));
        assert_eq!(resolve(dir.path().join("./raw.txt")), plain);
        assert_eq!(resolve(dir.path().join("sub/../raw.txt")), plain);
        assert!(plain.is_absolute());
    }

    #[test]
    fn test_target_not_created_yet() {
        let dir = TempDir::new().unwrap();
        let config = FilterConfig {
            target: Some(dir.path().join("./later.txt")),
            ..filter()
        };
        let settings = FilterSettings::from_config(&config).unwrap();
        assert_eq!(
            settings.target,
            dir.path().canonicalize().unwrap().join("later.txt")
        );
    }

    #[test]
    fn test_relative_target_is_absolute() {
        let config = FilterConfig {
            target: Some(PathBuf::from("no_such_dir/raw.txt")),
            ..filter()
        };
        let settings = FilterSettings::from_config(&config).unwrap();
        assert!(settings.target.is_absolute());
        assert!(settings.target.ends_with("no_such_dir/raw.txt"));
    }

    #[test]
    fn test_backoff_never_below_poll_interval() {
        let config = FilterConfig {
            poll_interval: Duration::from_secs(2),
            missing_backoff_max: Duration::from_secs(1),
            ..filter()
        };
        let settings = FilterSettings::from_config(&config).unwrap();
        assert_eq!(settings.missing_backoff_max, Duration::from_secs(2));
    }
}
