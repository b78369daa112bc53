//! Cache file naming (§6): `schema_<sanitized_server>_<sanitized_database>.json`
//! under the configured cache directory, with every non-alphanumeric
//! character in the identifier replaced by `_`.

use std::path::{Path, PathBuf};

pub fn sanitize(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn cache_file_path(directory: &Path, server: &str, database: &str) -> PathBuf {
    directory.join(format!("schema_{}_{}.json", sanitize(server), sanitize(database)))
}
