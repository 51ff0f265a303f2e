use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use sha2::{Digest, Sha256};

use super::error::StorageError;

const CHUNK: usize = 64 * 1024;
const HASH_PREFIX_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Weapon,
    Attachment,
}

impl ObjectKind {
    fn dir(self) -> &'static str {
        match self {
            Self::Weapon => "weapons",
            Self::Attachment => "attachments",
        }
    }
}

/// What an upload is allowed to be, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Model,
    Image,
}

impl FileClass {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" | "gltf" => Some(Self::Model),
            "png" | "jpg" | "jpeg" | "webp" => Some(Self::Image),
            _ => None,
        }
    }

    fn dir(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Image => "images",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path relative to the store root, `/`-separated.
    pub reference: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Content-addressed file store for uploaded models and thumbnails.
#[derive(Resource, Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, reference: &str) -> PathBuf {
        reference
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Copy `src` into the store in chunks, reporting progress in `[0, 1]`. Rejects
    /// unsupported extensions before touching the file.
    pub fn upload(
        &self,
        src: &Path,
        kind: ObjectKind,
        item_id: &str,
        mut progress: impl FnMut(f32),
    ) -> Result<StoredObject, StorageError> {
        let class =
            FileClass::of(src).ok_or_else(|| StorageError::InvalidFileType(src.to_path_buf()))?;
        let file_name = src
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidFileType(src.to_path_buf()))?
            .replace(char::is_whitespace, "_");

        let dir = self.root.join(class.dir()).join(kind.dir());
        std::fs::create_dir_all(&dir)?;

        let mut input = File::open(src)?;
        let total = input.metadata()?.len();
        let part_path = dir.join(format!(".{item_id}_{file_name}.part"));
        let mut output = File::create(&part_path)?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK];
        let mut copied: u64 = 0;
        progress(0.0);
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            output.write_all(&buf[..n])?;
            copied += n as u64;
            if total > 0 {
                progress((copied as f64 / total as f64).min(1.0) as f32);
            }
        }
        output.flush()?;
        drop(output);

        let sha256 = hex::encode(hasher.finalize());
        let stored_name = format!("{item_id}_{}_{file_name}", &sha256[..HASH_PREFIX_LEN]);
        std::fs::rename(&part_path, dir.join(&stored_name))?;
        progress(1.0);

        let reference = format!("{}/{}/{stored_name}", class.dir(), kind.dir());
        info!("Stored {} ({copied} bytes) as {reference}", src.display());
        Ok(StoredObject {
            reference,
            bytes: copied,
            sha256,
        })
    }

    /// `false` when nothing was stored under `reference`.
    pub fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        match std::fs::remove_file(self.resolve(reference)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
