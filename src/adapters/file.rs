use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;
use std::io::ErrorKind;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores each key as `<base_path>/<encoded key>.json`.
///
/// Keys are encoded byte by byte: ASCII letters, digits and `-` are kept and
/// every other byte becomes `_XX` (uppercase hex), so distinct keys always map
/// to distinct files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }
}

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "_{:02X}", byte);
        }
    }
    encoded
}

impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let target = self.path_for(key);
        // Unique per write so overlapping writes never share a temp file.
        let tmp = self.base_path.join(format!(
            ".{}.{}.{}.tmp",
            encode_key(key),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&tmp, value).await?;
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
