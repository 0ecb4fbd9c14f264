//! Locating the template workbook and naming the filled copy.

use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_TEMPLATE: &str = "template/AMEISE-planning-template-v1.95-ip.xlsx";

/// Directory under the project root searched when the requested template is missing.
pub const TEMPLATE_DIR: &str = "template";

const FILLED_SUFFIX: &str = "_filled";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template directory not found: {0}; create it and put the planning workbook there")]
    MissingDir(PathBuf),
    #[error("no .xlsx files found in {0}; put the planning template there")]
    NoCandidates(PathBuf),
    #[error("invalid template search pattern")]
    Pattern(#[from] glob::PatternError),
}

fn is_preferred(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.contains("planning-template") || name.contains("ameise")
}

fn is_candidate(path: &Path) -> bool {
    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    // Office lock files and our own output are never templates.
    !stem.starts_with("~$") && !stem.ends_with(FILLED_SUFFIX)
}

/// Returns `root/requested` when it exists, otherwise the best `.xlsx` in
/// `root/template`: names mentioning the planning template or AMEISE first,
/// then alphabetical order.
pub fn resolve_template(root: &Path, requested: &Path) -> Result<PathBuf, TemplateError> {
    let path = root.join(requested);
    if path.is_file() {
        info!("Using template from env path: {}", path.display());
        return Ok(path);
    }

    let dir = root.join(TEMPLATE_DIR);
    if !dir.is_dir() {
        return Err(TemplateError::MissingDir(dir));
    }

    let pattern = format!("{}/*.xlsx", Pattern::escape(&dir.to_string_lossy()));
    let mut candidates: Vec<PathBuf> = glob(&pattern)?
        .filter_map(Result::ok)
        .filter(|p| is_candidate(p))
        .collect();
    candidates.sort();

    let chosen = candidates
        .iter()
        .find(|p| is_preferred(p))
        .or_else(|| candidates.first())
        .cloned()
        .ok_or_else(|| TemplateError::NoCandidates(dir.clone()))?;

    info!(
        "TEMPLATE_PATH not found ({}); auto-selected template: {}",
        path.display(),
        chosen.display()
    );
    Ok(chosen)
}

/// `<dir>/<stem>_filled.xlsx` next to the template.
pub fn filled_output_path(template: &Path) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "template".to_string());
    template.with_file_name(format!("{stem}{FILLED_SUFFIX}.xlsx"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn existing_requested_path_wins() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("template")).unwrap();
        touch(&root.path().join("template"), "ameise.xlsx");
        touch(root.path(), "mine.xlsx");

        let chosen = resolve_template(root.path(), Path::new("mine.xlsx")).unwrap();
        assert_eq!(chosen, root.path().join("mine.xlsx"));
    }

    #[test]
    fn discovery_prefers_planning_templates_and_skips_outputs() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("template");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "a-notes.xlsx");
        touch(&dir, "AMEISE-planning-template-v1.95-ip_filled.xlsx");
        touch(&dir, "AMEISE-planning-template-v2.xlsx");
        touch(&dir, "~$AMEISE-planning-template-v2.xlsx");

        let chosen = resolve_template(root.path(), Path::new(DEFAULT_TEMPLATE)).unwrap();
        assert_eq!(chosen, dir.join("AMEISE-planning-template-v2.xlsx"));
    }

    #[test]
    fn discovery_falls_back_to_first_workbook() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("template");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "zeta.xlsx");
        touch(&dir, "beta.xlsx");
        touch(&dir, "readme.txt");

        let chosen = resolve_template(root.path(), Path::new(DEFAULT_TEMPLATE)).unwrap();
        assert_eq!(chosen, dir.join("beta.xlsx"));
    }

    #[test]
    fn missing_directory_and_empty_directory_are_fatal() {
        let root = tempfile::tempdir().unwrap();
        let err = resolve_template(root.path(), Path::new(DEFAULT_TEMPLATE)).unwrap_err();
        assert!(matches!(err, TemplateError::MissingDir(_)));

        fs::create_dir(root.path().join("template")).unwrap();
        let err = resolve_template(root.path(), Path::new(DEFAULT_TEMPLATE)).unwrap_err();
        assert!(matches!(err, TemplateError::NoCandidates(_)));
    }

    #[test]
    fn filled_output_sits_next_to_template() {
        let out = filled_output_path(Path::new("template/AMEISE-planning-template-v1.95-ip.xlsx"));
        assert_eq!(
            out,
            PathBuf::from("template/AMEISE-planning-template-v1.95-ip_filled.xlsx")
        );
    }
}
