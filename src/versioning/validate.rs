//! Repository layout validation: checks a directory against a list of
//! required files and directories. Nothing here raises: every problem,
//! including an unusable input, is expressed in the returned report and
//! callers present the findings as they see fit.

use std::path::PathBuf;

/// What a repository directory is expected to contain.
#[derive(Debug, Clone, Default)]
pub struct RepositoryLayout {
    pub directory: PathBuf,
    pub required_files: Vec<String>,
    pub required_dirs: Vec<String>,
}

/// Findings for one layout check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// True when the directory exists and nothing required is missing.
    pub repository_valid: bool,
    /// Required entries that were found.
    pub existing: Vec<String>,
    /// Required entries that were not found (or had the wrong kind).
    pub missing: Vec<String>,
    /// Set when the directory itself was unusable.
    pub error: Option<String>,
}

/// Check `layout.directory` for the required files and directories.
pub fn validate_repository(layout: &RepositoryLayout) -> ValidationReport {
    let mut report = ValidationReport::default();

    if layout.directory.as_os_str().is_empty() {
        report.error = Some("directory path is blank".to_string());
        return report;
    }
    if !layout.directory.is_dir() {
        report.error = Some(format!(
            "`{}` does not exist or is not a directory",
            layout.directory.display()
        ));
        return report;
    }

    for file in &layout.required_files {
        if layout.directory.join(file).is_file() {
            report.existing.push(file.clone());
        } else {
            report.missing.push(file.clone());
        }
    }
    for dir in &layout.required_dirs {
        if layout.directory.join(dir).is_dir() {
            report.existing.push(dir.clone());
        } else {
            report.missing.push(dir.clone());
        }
    }

    report.repository_valid = report.missing.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A blank directory is reported, not raised.
    #[test]
    fn test_blank_directory() {
        let report = validate_repository(&RepositoryLayout::default());
        assert!(!report.repository_valid);
        assert!(report.error.is_some());
    }

    /// A missing directory is reported in the error field.
    #[test]
    fn test_missing_directory() {
        let report = validate_repository(&RepositoryLayout {
            directory: PathBuf::from("/nonexistent/eisenkan"),
            ..Default::default()
        });
        assert!(!report.repository_valid);
        assert!(report.error.unwrap().contains("/nonexistent/eisenkan"));
    }

    /// Present and absent entries are split between existing and missing.
    #[test]
    fn test_partial_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("board.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("tasks")).unwrap();

        let report = validate_repository(&RepositoryLayout {
            directory: dir.path().to_path_buf(),
            required_files: vec!["board.json".to_string(), "rules.json".to_string()],
            required_dirs: vec!["tasks".to_string()],
        });

        assert!(!report.repository_valid);
        assert_eq!(report.existing, vec!["board.json", "tasks"]);
        assert_eq!(report.missing, vec!["rules.json"]);
        assert!(report.error.is_none());
    }

    /// A complete layout validates.
    #[test]
    fn test_complete_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("board.json"), "{}").unwrap();

        let report = validate_repository(&RepositoryLayout {
            directory: dir.path().to_path_buf(),
            required_files: vec!["board.json".to_string()],
            required_dirs: vec![],
        });
        assert!(report.repository_valid);
    }

    /// A file standing where a directory is required counts as missing.
    #[test]
    fn test_wrong_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tasks"), "not a dir").unwrap();

        let report = validate_repository(&RepositoryLayout {
            directory: dir.path().to_path_buf(),
            required_files: vec![],
            required_dirs: vec!["tasks".to_string()],
        });
        assert!(!report.repository_valid);
        assert_eq!(report.missing, vec!["tasks"]);
    }
}
