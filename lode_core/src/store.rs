//! Store management and object I/O.

use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use crate::object::{CompressionType, HEADER_SIZE, ObjectHeader, ObjectType};
use crate::refs::RefManager;
use crate::scan::Snapshot;
use crate::tree::TreeEntry;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Compression threshold: blobs >= 4KB are compressed.
const COMPRESSION_THRESHOLD: usize = 4096;

/// A content-addressed object store.
///
/// Objects are immutable once written; reads verify the payload against its
/// content identity, so a store handle can be shared freely across concurrent
/// readers.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    algorithm: Algorithm,
}

impl Store {
    /// Initialize a new store at the given path.
    ///
    /// Creates the directory structure:
    /// - `objects/blake3-256/` for storing objects
    /// - `refs/` for named snapshot roots
    /// - `config` file with version and algorithm
    pub fn init<P: AsRef<Path>>(root: P, algorithm: Algorithm) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)?;

        let objects_dir = root.join("objects").join(algorithm.as_str());
        fs::create_dir_all(&objects_dir)?;

        let refs_dir = root.join("refs");
        fs::create_dir_all(&refs_dir)?;

        let config_path = root.join("config");
        let config_content = format!("version=1\nalgo={}\n", algorithm.as_str());
        fs::write(&config_path, config_content)?;

        Ok(Self { root, algorithm })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let algorithm = Self::parse_config(&config_content)?;

        let objects_dir = root.join("objects").join(algorithm.as_str());
        if !objects_dir.exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }

        let refs_dir = root.join("refs");
        if !refs_dir.exists() {
            return Err(Error::invalid_store(&root, "refs directory missing"));
        }

        Ok(Self { root, algorithm })
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some("1") {
            return Err(Error::invalid_object(format!(
                "Unsupported config version: {:?}",
                version
            )));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_object("Missing algo in config"))?;
        Algorithm::parse(algo_str)
    }

    /// Get the path to an object file given its hash.
    ///
    /// Returns: `objects/{algorithm}/{prefix}/{suffix}`
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.root
            .join("objects")
            .join(self.algorithm.as_str())
            .join(hash.prefix())
            .join(hash.suffix())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the algorithm used by this store.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Get the reference manager for this store.
    pub fn refs(&self) -> RefManager<'_> {
        RefManager::new(self)
    }

    /// View the snapshot rooted at the given tree hash.
    pub fn snapshot(&self, root: Hash) -> Snapshot<'_> {
        Snapshot::new(self, root)
    }

    /// Read an object header from a file.
    pub(crate) fn read_object_header(&self, path: &Path) -> Result<ObjectHeader> {
        let mut file = fs::File::open(path)?;
        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;
        ObjectHeader::decode(&header_buf)
    }

    /// Read the full payload of an object.
    pub(crate) fn read_object_payload(&self, path: &Path, expected_len: u64) -> Result<Vec<u8>> {
        let mut file = fs::File::open(path)?;

        // Skip header
        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;

        if payload.len() != expected_len as usize {
            return Err(Error::corrupted_object(
                path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    expected_len,
                    payload.len()
                ),
            ));
        }

        Ok(payload)
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(
        &self,
        hash: &Hash,
        header: &ObjectHeader,
        payload: &[u8],
    ) -> Result<()> {
        let obj_path = self.object_path(hash);

        let parent = obj_path
            .parent()
            .ok_or_else(|| Error::invalid_store(&obj_path, "object path has no parent"))?;
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&header.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;

        temp_file.persist(&obj_path)?;

        Ok(())
    }

    /// Store a blob from a reader.
    ///
    /// Returns the hash of the stored blob. Blobs at or above 4KB are stored
    /// zstd-compressed; the hash is always of the uncompressed data.
    pub fn put_blob<R: Read>(&self, mut reader: R) -> Result<Hash> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;

        let hash = Hash::hash_bytes(&payload);

        // Deduplication: identical content is already present
        let obj_path = self.object_path(&hash);
        if obj_path.exists() {
            return Ok(hash);
        }

        let (stored_payload, compression) = if payload.len() >= COMPRESSION_THRESHOLD {
            (compress_zstd(&payload)?, CompressionType::Zstd)
        } else {
            (payload, CompressionType::None)
        };

        let header = ObjectHeader::new(
            ObjectType::Blob,
            self.algorithm,
            compression,
            stored_payload.len() as u64,
        );

        self.write_object_atomic(&hash, &header, &stored_payload)?;

        Ok(hash)
    }

    /// Retrieve a blob by hash.
    ///
    /// Returns the blob content, decompressed and verified against the hash.
    pub fn get_blob(&self, hash: &Hash) -> Result<Vec<u8>> {
        let obj_path = self.object_path(hash);

        if !obj_path.exists() {
            return Err(Error::object_not_found(hash.to_hex()));
        }

        let header = self.read_object_header(&obj_path)?;

        if header.object_type != ObjectType::Blob {
            return Err(Error::invalid_object_type(
                ObjectType::Blob.as_str(),
                header.object_type.as_str(),
            ));
        }

        let stored_payload = self.read_object_payload(&obj_path, header.payload_len)?;

        let payload = match header.compression {
            CompressionType::None => stored_payload,
            CompressionType::Zstd => decompress_zstd(&stored_payload)?,
        };

        // Corruption detection
        let computed_hash = Hash::hash_bytes(&payload);
        if computed_hash != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    hash.to_hex(),
                    computed_hash.to_hex()
                ),
            ));
        }

        Ok(payload)
    }

    /// Stream a blob to a writer.
    pub fn blob_to_writer<W: Write>(&self, hash: &Hash, mut writer: W) -> Result<()> {
        let payload = self.get_blob(hash)?;
        writer.write_all(&payload)?;
        Ok(())
    }

    /// Store a tree from a list of entries.
    ///
    /// Entries are sorted into canonical name order before encoding, so the
    /// returned hash depends only on the entry set. Trees are not compressed.
    pub fn put_tree(&self, entries: Vec<TreeEntry>) -> Result<Hash> {
        let payload = crate::tree::encode_tree(entries);
        let hash = Hash::hash_bytes(&payload);

        let obj_path = self.object_path(&hash);
        if obj_path.exists() {
            return Ok(hash);
        }

        let header = ObjectHeader::new(
            ObjectType::Tree,
            self.algorithm,
            CompressionType::None,
            payload.len() as u64,
        );

        self.write_object_atomic(&hash, &header, &payload)?;

        Ok(hash)
    }

    /// Retrieve a tree by hash.
    ///
    /// Returns the entries in canonical name order, verified against the hash.
    pub fn get_tree(&self, hash: &Hash) -> Result<Vec<TreeEntry>> {
        let obj_path = self.object_path(hash);

        if !obj_path.exists() {
            return Err(Error::object_not_found(hash.to_hex()));
        }

        let header = self.read_object_header(&obj_path)?;

        if header.object_type != ObjectType::Tree {
            return Err(Error::invalid_object_type(
                ObjectType::Tree.as_str(),
                header.object_type.as_str(),
            ));
        }

        let payload = self.read_object_payload(&obj_path, header.payload_len)?;

        let computed_hash = Hash::hash_bytes(&payload);
        if computed_hash != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    hash.to_hex(),
                    computed_hash.to_hex()
                ),
            ));
        }

        crate::tree::decode_tree(&payload)
    }

    /// Resolve a slash-separated relative path against a root tree.
    ///
    /// Returns the content identity of the entry at that path. The empty path
    /// resolves to the root identity itself. A missing component, or a blob in
    /// a non-final position, is a [`Error::PathNotFound`].
    pub fn lookup_path(&self, root: &Hash, path: &str) -> Result<Hash> {
        if path.is_empty() {
            return Ok(*root);
        }

        let mut current = *root;
        let mut components = path.split('/').peekable();

        while let Some(component) = components.next() {
            if component.is_empty() {
                return Err(Error::path_not_found(path));
            }

            let entries = self.get_tree(&current)?;
            let entry = entries
                .iter()
                .find(|e| e.name == component)
                .ok_or_else(|| Error::path_not_found(path))?;

            if components.peek().is_none() {
                return Ok(entry.hash);
            }

            if !entry.is_tree() {
                return Err(Error::path_not_found(path));
            }
            current = entry.hash;
        }

        // Split of a non-empty path always yields at least one component
        Err(Error::path_not_found(path))
    }
}

/// Compress data using zstd at the default level.
fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 0).map_err(Error::from)
}

/// Decompress zstd data.
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EntryType, file_modes};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("store"), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    fn blob_entry(store: &Store, name: &str, content: &[u8]) -> TreeEntry {
        let hash = store.put_blob(content).unwrap();
        TreeEntry::new(EntryType::Blob, file_modes::REGULAR, hash, name.to_string()).unwrap()
    }

    fn tree_entry(name: &str, hash: Hash) -> TreeEntry {
        TreeEntry::new(EntryType::Tree, file_modes::DIRECTORY, hash, name.to_string()).unwrap()
    }

    #[test]
    fn test_init_and_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store");

        let store = Store::init(&path, Algorithm::Blake3).unwrap();
        assert_eq!(store.algorithm(), Algorithm::Blake3);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.algorithm(), Algorithm::Blake3);
    }

    #[test]
    fn test_open_missing_store_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Store::open(temp_dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_put_get_blob_roundtrip() {
        let (_tmp, store) = test_store();

        let hash = store.put_blob(&b"small blob"[..]).unwrap();
        assert_eq!(hash, Hash::hash_bytes(b"small blob"));
        assert_eq!(store.get_blob(&hash).unwrap(), b"small blob");
    }

    #[test]
    fn test_large_blob_compressed_hash_stable() {
        let (_tmp, store) = test_store();

        // Above the compression threshold; hash must still match raw content
        let data = vec![7u8; 64 * 1024];
        let hash = store.put_blob(&data[..]).unwrap();
        assert_eq!(hash, Hash::hash_bytes(&data));
        assert_eq!(store.get_blob(&hash).unwrap(), data);

        let header = store.read_object_header(&store.object_path(&hash)).unwrap();
        assert_eq!(header.compression, CompressionType::Zstd);
    }

    #[test]
    fn test_get_missing_blob_fails() {
        let (_tmp, store) = test_store();
        let hash = Hash::hash_bytes(b"never stored");
        assert!(matches!(
            store.get_blob(&hash),
            Err(Error::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_put_get_tree_roundtrip() {
        let (_tmp, store) = test_store();

        let entries = vec![
            blob_entry(&store, "b.txt", b"two"),
            blob_entry(&store, "a.txt", b"one"),
        ];

        let hash = store.put_tree(entries).unwrap();
        let retrieved = store.get_tree(&hash).unwrap();

        assert_eq!(retrieved.len(), 2);
        assert_eq!(retrieved[0].name, "a.txt");
        assert_eq!(retrieved[1].name, "b.txt");
    }

    #[test]
    fn test_put_tree_deduplicates() {
        let (_tmp, store) = test_store();

        let entries = vec![blob_entry(&store, "f", b"x")];
        let hash1 = store.put_tree(entries.clone()).unwrap();
        let hash2 = store.put_tree(entries).unwrap();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_get_tree_rejects_blob_object() {
        let (_tmp, store) = test_store();
        let blob_hash = store.put_blob(&b"not a tree"[..]).unwrap();
        assert!(matches!(
            store.get_tree(&blob_hash),
            Err(Error::InvalidObjectType { .. })
        ));
    }

    #[test]
    fn test_lookup_path_empty_is_root() {
        let (_tmp, store) = test_store();
        let root = store.put_tree(vec![blob_entry(&store, "f", b"x")]).unwrap();
        assert_eq!(store.lookup_path(&root, "").unwrap(), root);
    }

    #[test]
    fn test_lookup_path_nested() {
        let (_tmp, store) = test_store();

        let file = blob_entry(&store, "data.txt", b"payload");
        let file_hash = file.hash;
        let inner = store.put_tree(vec![file]).unwrap();
        let middle = store.put_tree(vec![tree_entry("inner", inner)]).unwrap();
        let root = store.put_tree(vec![tree_entry("middle", middle)]).unwrap();

        assert_eq!(store.lookup_path(&root, "middle").unwrap(), middle);
        assert_eq!(store.lookup_path(&root, "middle/inner").unwrap(), inner);
        assert_eq!(
            store.lookup_path(&root, "middle/inner/data.txt").unwrap(),
            file_hash
        );
    }

    #[test]
    fn test_lookup_path_missing_component() {
        let (_tmp, store) = test_store();
        let root = store.put_tree(vec![blob_entry(&store, "f", b"x")]).unwrap();

        assert!(matches!(
            store.lookup_path(&root, "missing"),
            Err(Error::PathNotFound { .. })
        ));
        assert!(matches!(
            store.lookup_path(&root, "f/under-a-blob"),
            Err(Error::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_corrupted_blob_detected() {
        let (_tmp, store) = test_store();
        let hash = store.put_blob(&b"original"[..]).unwrap();

        // Flip payload bytes behind the store's back
        let obj_path = store.object_path(&hash);
        let mut bytes = fs::read(&obj_path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&obj_path, bytes).unwrap();

        assert!(matches!(
            store.get_blob(&hash),
            Err(Error::CorruptedObject { .. })
        ));
    }
}
