mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{Database, History, Logger, Rooms, Server, Settings, UnknownRoomPolicy};
pub use storage::Storage;

use std::env;
use std::io;
use std::path::PathBuf;

fn project_root() -> Result<PathBuf, io::Error> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // development and testing environments
        Ok(PathBuf::from(manifest_dir))
    } else {
        // runtime root relative path `folder/executable` -> `folder/`
        let exe = env::current_exe()?;
        exe.parent()
            .map(|path| path.to_path_buf())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))
    }
}

/// Resolves a leading `~/` against the project root.
pub fn normalize_path(path: &str) -> Result<PathBuf, io::Error> {
    match path.strip_prefix("~/") {
        Some(relative) => Ok(project_root()?.join(relative)),
        None => Ok(PathBuf::from(path)),
    }
}
