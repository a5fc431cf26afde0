use crate::error::{LifecycleError, Result};

/// Deterministically normalize a resource path.
///
/// Rules, applied in order:
/// - Strip leading/trailing whitespace.
/// - Convert backslashes to forward slashes.
/// - Collapse repeated slashes.
/// - Remove a leading `./`.
/// - Remove trailing `/`.
/// - Lowercase only the file extension; the base name keeps its case.
///
/// The result is stable under re-normalization:
/// `normalize(normalize(p)) == normalize(p)`.
pub fn normalize_resource_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(LifecycleError::InvalidPath(
            "resource_path must be a non-empty string".to_string(),
        ));
    }

    let mut p = path.trim().replace('\\', "/");
    while p.contains("//") {
        p = p.replace("//", "/");
    }
    let p = p.strip_prefix("./").unwrap_or(&p);
    let p = p.trim_end_matches('/');
    if p.is_empty() {
        return Err(LifecycleError::InvalidPath(
            "resource_path resolves to empty after normalization".to_string(),
        ));
    }

    // Printable ASCII only (0x20..=0x7E); conservative on purpose.
    if !p.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        return Err(LifecycleError::InvalidPath(
            "resource_path contains invalid characters".to_string(),
        ));
    }

    Ok(match p.rfind('.') {
        Some(dot) => format!("{}{}", &p[..=dot], p[dot + 1..].to_ascii_lowercase()),
        None => p.to_string(),
    })
}

/// Normalized file extension (without the dot), or empty if there is none.
pub fn extension(path: &str) -> Result<String> {
    let p = normalize_resource_path(path)?;
    Ok(match p.rfind('.') {
        Some(dot) => p[dot + 1..].to_string(),
        None => String::new(),
    })
}
