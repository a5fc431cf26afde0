use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use walkdir::WalkDir;

/// Deterministic 1x1 transparent PNG so the binary fixture needs no
/// external asset.
const PNG_1X1_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8/x8AAwMCAO6wZSYAAAAASUVORK5CYII=";

/// Fixture tree used by the smoke run. Mixed-case extensions on purpose:
/// the server is expected to normalize them.
const TEXT_FIXTURES: &[(&str, &str)] = &[
    ("doc/Report.DOCX", "DOCX placeholder (content ignored by stateless server)\n"),
    ("ppt/Slides.PPTX", "PPTX placeholder (content ignored by stateless server)\n"),
    ("xlsx/Data.XLSX", "XLSX placeholder (content ignored by stateless server)\n"),
    ("pdf/Spec.PDF", "%PDF-1.1\n% minimal placeholder\n%%EOF\n"),
    ("txt/readme.txt", "hello from txt\n"),
    ("md/notes.MD", "# notes\n\n- tiny fixture file\n"),
    ("csv/table.CSV", "id,value\n1,alpha\n"),
    ("html/page.html", "<!doctype html><title>fixture</title><p>hi</p>"),
    ("json/config.json", "{\n  \"ok\": true\n}\n"),
];

pub const FIXTURE_COUNT: usize = TEXT_FIXTURES.len() + 1;

/// Write the deterministic fixture tree under `dir`.
pub fn generate(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::with_capacity(FIXTURE_COUNT);
    for (rel, content) in TEXT_FIXTURES {
        created.push(write_fixture(dir, rel, content.as_bytes())?);
    }
    let png = STANDARD
        .decode(PNG_1X1_B64)
        .context("corrupt built-in png fixture")?;
    created.push(write_fixture(dir, "img/pixel.png", &png)?);
    Ok(created)
}

fn write_fixture(dir: &Path, rel: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Collect fixture files, asserting the expected count so a half-written
/// tree fails fast instead of skewing the summary.
pub fn collect(dir: &Path, expected: usize) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        bail!("fixtures directory not found: {}", dir.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();

    if files.len() != expected {
        bail!(
            "expected exactly {expected} fixture files, found {} in {}",
            files.len(),
            dir.display()
        );
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generate_then_collect_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let created = generate(tmp.path()).unwrap();
        assert_eq!(created.len(), FIXTURE_COUNT);

        let collected = collect(tmp.path(), FIXTURE_COUNT).unwrap();
        assert_eq!(collected.len(), FIXTURE_COUNT);
        assert!(collected.iter().any(|p| p.ends_with("doc/Report.DOCX")));
        assert!(collected.iter().any(|p| p.ends_with("img/pixel.png")));
    }

    #[test]
    fn collect_rejects_wrong_count() {
        let tmp = tempfile::tempdir().unwrap();
        generate(tmp.path()).unwrap();
        assert!(collect(tmp.path(), FIXTURE_COUNT + 1).is_err());
    }

    #[test]
    fn collect_rejects_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(collect(&tmp.path().join("nope"), FIXTURE_COUNT).is_err());
    }
}
