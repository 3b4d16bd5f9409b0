//! Content store for full block bodies, one JSON file per block id.
//!
//! Writes go to a temp file in the same directory and are renamed into
//! place, so a block file is either absent or complete.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::ChainResult;
use crate::types::Block;

pub struct BlockStore {
    dir: PathBuf,
}

impl BlockStore {
    pub fn open(dir: &Path) -> ChainResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn block_path(&self, id: u64) -> PathBuf {
        self.dir.join(format!("block_{id}.json"))
    }

    /// Persist the full block under its id. Failure leaves no partial file;
    /// callers must not record chain metadata when this fails.
    pub fn put(&self, block: &Block) -> ChainResult<()> {
        let data = serde_json::to_vec(block)?;
        let tmp_path = self.dir.join(format!(".block_{}.json.tmp", block.id));
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&data)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, self.block_path(block.id))?;
        Ok(())
    }

    pub fn get(&self, id: u64) -> ChainResult<Option<Block>> {
        let path = self.block_path(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::types::{Audit, FileInfo, UserInfo};

    fn block(id: u64) -> Block {
        let audit = Audit {
            req_id: format!("r{id}"),
            timestamp: 1_700_000_000,
            access_type: "READ".to_string(),
            file_info: FileInfo {
                file_id: "f1".to_string(),
                file_name: "x".to_string(),
            },
            user_info: UserInfo {
                user_id: "u1".to_string(),
                user_name: "alice".to_string(),
            },
            signature: String::new(),
            public_key: String::new(),
        };
        Block::build(id, String::new(), vec![audit])
    }

    #[test]
    fn put_then_get_roundtrips_the_block() {
        let dir = tempdir().expect("tempdir");
        let store = BlockStore::open(dir.path()).expect("open");
        let stored = block(1);
        store.put(&stored).expect("put");
        let loaded = store.get(1).expect("get").expect("present");
        assert_eq!(loaded.id, stored.id);
        assert_eq!(loaded.hash, stored.hash);
        assert_eq!(loaded.audits.len(), 1);
    }

    #[test]
    fn get_of_missing_block_is_none() {
        let dir = tempdir().expect("tempdir");
        let store = BlockStore::open(dir.path()).expect("open");
        assert!(store.get(7).expect("get").is_none());
    }

    #[test]
    fn put_leaves_no_temp_files_behind() {
        let dir = tempdir().expect("tempdir");
        let store = BlockStore::open(dir.path()).expect("open");
        store.put(&block(1)).expect("put");
        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["block_1.json".to_string()]);
    }
}
