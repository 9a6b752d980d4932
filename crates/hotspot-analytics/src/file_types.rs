use std::collections::BTreeSet;

use crate::queries::ChangeRow;

/// Distinct file-path extensions observed in the given rows, without the
/// leading dot. A path with no extension contributes nothing.
pub fn compute_file_types(rows: &[ChangeRow]) -> Vec<String> {
    let mut extensions: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        if let Some(ext) = extension_of(&row.file_path) {
            extensions.insert(ext);
        }
    }
    extensions.into_iter().collect()
}

fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let mut parts = file_name.rsplitn(2, '.');
    let ext = parts.next()?;
    let stem = parts.next();
    if stem.is_none() || stem == Some("") {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_extension() {
        assert_eq!(extension_of("src/main.rs"), Some("rs".to_string()));
        assert_eq!(extension_of("Dockerfile"), None);
        assert_eq!(extension_of(".gitignore"), None);
        assert_eq!(extension_of("a/b/c.test.ts"), Some("ts".to_string()));
    }
}
