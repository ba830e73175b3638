//! Opening a resource fork from the filesystem.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Resolve the path that carries the resource-fork bytes of `path`.
///
/// On Darwin, the resource fork of a file lives behind the
/// `..namedfork/rsrc` pseudo-path; everywhere else a `.rsrc` sidecar or the
/// raw file itself is all that's available, so the path is returned
/// unchanged and callers are expected to already be pointing at a bare fork
/// (e.g. extracted via AppleSingle/MacBinary, or a `.rsrc` file produced by
/// a cross-platform archiver).
pub fn resource_fork_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if cfg!(target_os = "macos") {
        path.join("..namedfork/rsrc")
    } else {
        path.to_path_buf()
    }
}

/// Read the whole resource fork of `path` into memory.
///
/// This tries the platform named-fork path first and falls back to reading
/// `path` itself verbatim, so it also works transparently on a bare
/// `.rsrc` file or a MacBinary-unwrapped fork on any platform.
pub fn read_resource_fork(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    let fork_path = resource_fork_path(path);

    match fs::read(&fork_path) {
        Ok(bytes) => Ok(bytes),
        Err(_) if fork_path != path => fs::read(path),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_resource_fork_falls_back_to_plain_file() {
        let path = std::env::temp_dir().join(format!("rsrc-io-test-{}.bin", std::process::id()));
        fs::write(&path, b"abcdef").unwrap();

        let content = read_resource_fork(&path).unwrap();

        assert_eq!(content, b"abcdef");

        let _ = fs::remove_file(&path);
    }
}
