//! Fixed-size page storage for the skip tree and inverted index.
//!
//! Pages are addressed by a 32-bit [`PageId`] and read/written as owned
//! values rather than borrowed references: callers clone a page out,
//! mutate the clone, and write it back. This keeps every tree operation
//! free of long-lived borrows into the page cache, at the cost of a clone
//! per navigation step.


use bincode::config::{self, Config as BincodeConfig};
use bincode::serde::{decode_from_slice, encode_into_slice};
use common::{IndexError, IndexResult, PageId};
use hashbrown::HashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Fixed page size in bytes for every disk-backed page store.
pub const PAGE_SIZE: usize = 4096;

fn bincode_config() -> impl BincodeConfig {
    config::legacy()
}

/// Storage for fixed-size pages of node type `N`, addressed by [`PageId`].
///
/// `load_page`/`load_and_modify_page` return owned clones; `write_page`
/// writes a (possibly mutated) clone back. A page id that was never
/// allocated is a contract violation and panics rather than returning an
/// error, matching the "assertion-level" classification in the error
/// taxonomy.
pub trait PageManager<N: Clone> {
    fn load_page(&mut self, id: PageId) -> IndexResult<N>;
    fn load_and_modify_page(&mut self, id: PageId) -> IndexResult<N>;
    fn write_page(&mut self, id: PageId, node: N) -> IndexResult<()>;
    fn new_page(&mut self, node: N) -> IndexResult<PageId>;
    fn delete_page(&mut self, id: PageId) -> IndexResult<()>;
    fn commit(&mut self) -> IndexResult<()>;
    fn flush(&mut self) -> IndexResult<()>;
    fn empty(&self) -> bool;
    fn current_memory_used(&self) -> usize;
}

/// In-memory page store. Never touches disk; `commit`/`flush` are no-ops
/// beyond dropping dirty tracking.
#[derive(Debug, Default)]
pub struct MemoryPageManager<N> {
    pages: HashMap<PageId, N>,
    free_list: Vec<PageId>,
    num_pages: u32,
}

impl<N> MemoryPageManager<N> {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            free_list: Vec::new(),
            num_pages: 0,
        }
    }
}

impl<N: Clone> PageManager<N> for MemoryPageManager<N> {
    fn load_page(&mut self, id: PageId) -> IndexResult<N> {
        match self.pages.get(&id) {
            Some(node) => Ok(node.clone()),
            None => panic!("page store contract violation: {id:?} was never allocated"),
        }
    }

    fn load_and_modify_page(&mut self, id: PageId) -> IndexResult<N> {
        self.load_page(id)
    }

    fn write_page(&mut self, id: PageId, node: N) -> IndexResult<()> {
        self.pages.insert(id, node);
        Ok(())
    }

    fn new_page(&mut self, node: N) -> IndexResult<PageId> {
        let id = self.free_list.pop().unwrap_or_else(|| {
            let id = PageId(self.num_pages);
            self.num_pages += 1;
            id
        });
        self.pages.insert(id, node);
        Ok(id)
    }

    fn delete_page(&mut self, id: PageId) -> IndexResult<()> {
        self.pages.remove(&id);
        self.free_list.push(id);
        Ok(())
    }

    fn commit(&mut self) -> IndexResult<()> {
        Ok(())
    }

    fn flush(&mut self) -> IndexResult<()> {
        Ok(())
    }

    fn empty(&self) -> bool {
        self.num_pages == 0
    }

    fn current_memory_used(&self) -> usize {
        self.pages.len() * std::mem::size_of::<N>()
    }
}

/// Disk-backed page store. Pages live in a dense file of `PAGE_SIZE`
/// slots; a sidecar file at `<path>.header` holds the free list so it
/// survives a restart. Writes only become durable on `commit`/`flush`.
#[derive(Debug)]
pub struct DiskPageManager<N> {
    file: File,
    header_path: PathBuf,
    page_size: usize,
    file_pages: u32,
    num_pages: u32,
    free_list: Vec<PageId>,
    cache: HashMap<PageId, N>,
    dirty: HashMap<PageId, bool>,
    _marker: PhantomData<N>,
}

impl<N: Clone + Serialize + DeserializeOwned> DiskPageManager<N> {
    /// Creates a fresh page file at `path`, truncating any existing
    /// contents. `page_size` fixes the slot size for every page written
    /// through this manager; [`PAGE_SIZE`] is the default most callers want.
    pub fn create(path: impl AsRef<Path>, page_size: usize) -> IndexResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let header_path = header_path_for(path);
        let manager = Self {
            file,
            header_path,
            page_size,
            file_pages: 0,
            num_pages: 0,
            free_list: Vec::new(),
            cache: HashMap::new(),
            dirty: HashMap::new(),
            _marker: PhantomData,
        };
        manager.write_header()?;
        Ok(manager)
    }

    /// Attaches to an existing page file at `path`. `page_size` must match
    /// the value the file was created with; it is not itself persisted.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> IndexResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        let file_len = file.metadata()?.len();
        let file_pages = (file_len / page_size as u64) as u32;
        let header_path = header_path_for(path);
        let free_list = if header_path.exists() {
            let bytes = std::fs::read(&header_path)?;
            let (ids, _): (Vec<u32>, usize) = decode_from_slice(&bytes, bincode_config())
                .map_err(|e| IndexError::Codec(format!("failed to decode free list: {e}")))?;
            ids.into_iter().map(PageId).collect()
        } else {
            Vec::new()
        };
        Ok(Self {
            file,
            header_path,
            page_size,
            file_pages,
            num_pages: file_pages,
            free_list,
            cache: HashMap::new(),
            dirty: HashMap::new(),
            _marker: PhantomData,
        })
    }

    fn write_header(&self) -> IndexResult<()> {
        let ids: Vec<u32> = self.free_list.iter().map(|id| id.0).collect();
        let bytes = bincode::serde::encode_to_vec(&ids, bincode_config())
            .map_err(|e| IndexError::Codec(format!("failed to encode free list: {e}")))?;
        std::fs::write(&self.header_path, bytes)?;
        Ok(())
    }

    fn read_page_from_disk(&mut self, id: PageId) -> IndexResult<N> {
        let offset = id.0 as u64 * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.page_size];
        self.file.read_exact(&mut buf)?;
        let (node, _): (N, usize) = decode_from_slice(&buf, bincode_config())
            .map_err(|e| IndexError::Codec(format!("failed to decode page {id:?}: {e}")))?;
        Ok(node)
    }

    fn write_page_to_disk(&mut self, id: PageId, node: &N) -> IndexResult<()> {
        let mut buf = vec![0u8; self.page_size];
        let len = encode_into_slice(node, &mut buf, bincode_config())
            .map_err(|e| IndexError::Codec(format!("failed to encode page {id:?}: {e}")))?;
        if len > self.page_size {
            return Err(IndexError::Codec(format!(
                "page {id:?} too large: {len} bytes (max {})",
                self.page_size
            )));
        }
        let offset = id.0 as u64 * self.page_size as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }
}

fn header_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".header");
    PathBuf::from(s)
}

impl<N: Clone + Serialize + DeserializeOwned> PageManager<N> for DiskPageManager<N> {
    fn load_page(&mut self, id: PageId) -> IndexResult<N> {
        if let Some(node) = self.cache.get(&id) {
            return Ok(node.clone());
        }
        if id.0 >= self.file_pages {
            panic!("page store contract violation: {id:?} was never allocated");
        }
        let node = self.read_page_from_disk(id)?;
        self.cache.insert(id, node.clone());
        Ok(node)
    }

    fn load_and_modify_page(&mut self, id: PageId) -> IndexResult<N> {
        let node = self.load_page(id)?;
        self.dirty.insert(id, true);
        Ok(node)
    }

    fn write_page(&mut self, id: PageId, node: N) -> IndexResult<()> {
        self.cache.insert(id, node);
        self.dirty.insert(id, true);
        Ok(())
    }

    fn new_page(&mut self, node: N) -> IndexResult<PageId> {
        let id = self.free_list.pop().unwrap_or_else(|| {
            let id = PageId(self.num_pages);
            self.num_pages += 1;
            id
        });
        self.cache.insert(id, node);
        self.dirty.insert(id, true);
        Ok(id)
    }

    fn delete_page(&mut self, id: PageId) -> IndexResult<()> {
        self.cache.remove(&id);
        self.dirty.remove(&id);
        self.free_list.push(id);
        Ok(())
    }

    fn commit(&mut self) -> IndexResult<()> {
        let dirty_ids: Vec<PageId> = self.dirty.keys().copied().collect();
        for id in dirty_ids {
            let node = self
                .cache
                .get(&id)
                .expect("dirty page missing from cache")
                .clone();
            self.write_page_to_disk(id, &node)?;
        }
        self.dirty.clear();
        self.file_pages = self.file_pages.max(self.num_pages);
        self.write_header()?;
        self.file.sync_all()?;
        Ok(())
    }

    fn flush(&mut self) -> IndexResult<()> {
        self.commit()?;
        self.cache.clear();
        Ok(())
    }

    fn empty(&self) -> bool {
        self.num_pages == 0
    }

    fn current_memory_used(&self) -> usize {
        self.cache.len() * std::mem::size_of::<N>()
    }
}
