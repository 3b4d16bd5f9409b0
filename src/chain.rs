//! Append-only chain metadata store.
//!
//! Backing file is one JSON object per line so the log is self-delimiting:
//! a crash mid-append leaves at most one torn trailing line, which recovery
//! truncates. Appends fsync before the in-memory mirror advances.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use crate::errors::{ChainError, ChainResult};
use crate::types::BlockMeta;

pub struct ChainStore {
    path: PathBuf,
    inner: RwLock<ChainInner>,
}

struct ChainInner {
    file: File,
    metas: Vec<BlockMeta>,
}

impl ChainStore {
    /// Open the metadata log, replaying existing records and truncating a
    /// partial trailing record left by a crash.
    pub fn open(path: &Path) -> ChainResult<Self> {
        let mut metas = Vec::new();
        if path.exists() {
            let data = std::fs::read(path)?;
            let valid_len = parse_log(&data, &mut metas)?;
            if valid_len < data.len() {
                warn!(
                    path = %path.display(),
                    dropped = data.len() - valid_len,
                    "truncating torn trailing chain metadata record"
                );
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(valid_len as u64)?;
                file.sync_data()?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: RwLock::new(ChainInner { file, metas }),
        })
    }

    /// Append one record, enforcing hash linkage against the current head.
    pub fn append(&self, meta: BlockMeta) -> ChainResult<()> {
        let mut inner = self.inner.write();
        let expected_id = inner.metas.last().map(|m| m.id).unwrap_or(0) + 1;
        if meta.id != expected_id {
            return Err(ChainError::Validation(format!(
                "non-sequential block id {} (expected {expected_id})",
                meta.id
            )));
        }
        let head_hash = inner.metas.last().map(|m| m.hash.as_str()).unwrap_or("");
        if meta.previous_hash != head_hash {
            return Err(ChainError::Validation(format!(
                "previous hash of block {} does not match chain head",
                meta.id
            )));
        }
        let mut line = serde_json::to_string(&meta)?;
        line.push('\n');
        inner.file.write_all(line.as_bytes())?;
        inner.file.sync_data()?;
        inner.metas.push(meta);
        Ok(())
    }

    /// Hash of the chain head, or the empty string on an empty chain.
    pub fn last_hash(&self) -> String {
        self.inner
            .read()
            .metas
            .last()
            .map(|m| m.hash.clone())
            .unwrap_or_default()
    }

    /// Id of the chain head; 0 denotes the empty chain.
    pub fn last_id(&self) -> u64 {
        self.inner.read().metas.last().map(|m| m.id).unwrap_or(0)
    }

    pub fn get_meta(&self, id: u64) -> Option<BlockMeta> {
        if id == 0 {
            return None;
        }
        self.inner.read().metas.get((id - 1) as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().metas.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse the newline-delimited log, returning the byte length of the valid
/// prefix. A torn final record is tolerated; corruption before the tail is
/// not.
fn parse_log(data: &[u8], metas: &mut Vec<BlockMeta>) -> ChainResult<usize> {
    let mut offset = 0usize;
    let mut valid_len = 0usize;
    while offset < data.len() {
        let Some(nl) = data[offset..].iter().position(|b| *b == b'\n') else {
            break;
        };
        let line = &data[offset..offset + nl];
        let line_end = offset + nl + 1;
        if line.is_empty() {
            offset = line_end;
            valid_len = line_end;
            continue;
        }
        match serde_json::from_slice::<BlockMeta>(line) {
            Ok(meta) => {
                check_linkage(metas.last(), &meta)?;
                metas.push(meta);
                offset = line_end;
                valid_len = line_end;
            }
            Err(err) => {
                if line_end >= data.len() {
                    break;
                }
                return Err(ChainError::Config(format!(
                    "corrupt chain metadata record at byte {offset}: {err}"
                )));
            }
        }
    }
    Ok(valid_len)
}

fn check_linkage(head: Option<&BlockMeta>, next: &BlockMeta) -> ChainResult<()> {
    let expected_id = head.map(|m| m.id).unwrap_or(0) + 1;
    let head_hash = head.map(|m| m.hash.as_str()).unwrap_or("");
    if next.id != expected_id || next.previous_hash != head_hash {
        return Err(ChainError::Config(format!(
            "chain metadata linkage broken at block {}",
            next.id
        )));
    }
    Ok(())
}
