use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::ExecError;

fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

/// Resolve `name` the way `execvp` would. A name containing `/` is taken as
/// a path; anything else is looked up in each entry of `search_path` in turn.
pub fn find_executable(name: &str, search_path: Option<&str>) -> Result<PathBuf, ExecError> {
    if name.contains('/') {
        let path = PathBuf::from(name);
        if !path.exists() {
            return Err(ExecError::CommandNotFound(name.to_owned()));
        }
        if !is_executable(&path) {
            return Err(ExecError::NotExecutable(name.to_owned()));
        }
        return Ok(path);
    }
    search_path
        .and_then(|search_path| {
            env::split_paths(search_path)
                .map(|dir| dir.join(name))
                .find(|candidate| is_executable(candidate))
        })
        .ok_or_else(|| ExecError::CommandNotFound(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn make_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn searches_entries_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(first.path(), "tool", 0o644);
        let expected = make_file(second.path(), "tool", 0o755);
        let search_path = format!("{}:{}", first.path().display(), second.path().display());
        assert_eq!(find_executable("tool", Some(&search_path)).unwrap(), expected);
    }

    #[test]
    fn missing_from_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let search_path = dir.path().display().to_string();
        assert!(matches!(
            find_executable("definitely-not-here", Some(&search_path)),
            Err(ExecError::CommandNotFound(_))
        ));
        assert!(matches!(
            find_executable("ls", None),
            Err(ExecError::CommandNotFound(_))
        ));
    }

    #[test]
    fn names_with_a_slash_skip_the_search() {
        let dir = tempfile::tempdir().unwrap();
        let script = make_file(dir.path(), "run.sh", 0o755);
        let plain = make_file(dir.path(), "data.txt", 0o644);
        let name = script.display().to_string();
        assert_eq!(find_executable(&name, None).unwrap(), script);
        assert!(matches!(
            find_executable(&plain.display().to_string(), None),
            Err(ExecError::NotExecutable(_))
        ));
        assert!(matches!(
            find_executable(&dir.path().display().to_string(), None),
            Err(ExecError::NotExecutable(_))
        ));
    }
}
