use regex::Regex;
use std::sync::OnceLock;

fn slashes() -> &'static Regex {
    static SLASHES: OnceLock<Regex> = OnceLock::new();
    SLASHES.get_or_init(|| Regex::new(r"/+").unwrap())
}

/// Returns true when the string is empty or only whitespace.
pub fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// Normalizes a remote path to the protocol's form.
///
/// Backslashes become forward slashes, runs of slashes collapse, and the
/// trailing slash is dropped. A blank path means the working directory.
pub fn ftp_path(path: &str) -> String {
    if is_blank(path) {
        return "./".to_string();
    }

    let path = path.replace('\\', "/");
    let path = slashes().replace_all(&path, "/");
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Joins a relative remote path onto an absolute working directory.
pub fn join_ftp_path(dir: &str, path: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let path = path.trim_start_matches("./");
    ftp_path(&format!("{}/{}", dir, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftp_path_normalization() {
        assert_eq!(ftp_path("/pub//incoming/"), "/pub/incoming");
        assert_eq!(ftp_path("dir\\sub\\file.txt"), "dir/sub/file.txt");
        assert_eq!(ftp_path("///"), "/");
        assert_eq!(ftp_path("   "), "./");
        assert_eq!(ftp_path("a.txt"), "a.txt");
    }

    #[test]
    fn test_join_ftp_path() {
        assert_eq!(join_ftp_path("/home/user", "a.txt"), "/home/user/a.txt");
        assert_eq!(join_ftp_path("/", "a.txt"), "/a.txt");
        assert_eq!(join_ftp_path("/home/user/", "./docs/b.txt"), "/home/user/docs/b.txt");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \t"));
        assert!(!is_blank("x"));
    }
}
