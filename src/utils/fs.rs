use std::path::{Path, PathBuf};

/// Look for a directory named `name` in `start` and each of its ancestors.
///
/// Falls back to `start` itself when no ancestor has one, so `images` ends up next to the
/// executable's working directory when the project layout is not found.
pub fn find_directory_from(start: &Path, name: &str) -> PathBuf {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| start.to_path_buf())
}

/// [`find_directory_from`] the current working directory
pub fn find_directory(name: &str) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_directory_from(&cwd, name)
}

#[cfg(test)]
mod tests {
    use super::find_directory_from;

    #[test]
    fn finds_directory_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(root.join("images")).unwrap();

        assert_eq!(find_directory_from(&nested, "images"), root.join("images"));
        assert_eq!(
            find_directory_from(&nested, "no-such-directory-here"),
            nested
        );
    }
}
