#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};

/// Share link for `id` in the `/file/d/<id>/view` form.
pub fn share_link(id: &str) -> String {
    format!("https://drive.google.com/file/d/{id}/view?usp=sharing")
}

/// Endpoint URL that routes downloads to the mock server.
pub fn mock_endpoint(server_uri: &str) -> String {
    format!("{server_uri}/download?export=download")
}

/// Sorted names of the files directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter_map(|path: PathBuf| path.file_name()?.to_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
