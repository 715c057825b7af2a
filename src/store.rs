use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::limits::MAX_USER_NAME_LEN;
use crate::model::WeekTemplate;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Corrupt(&'static str),
    Encode(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "io error: {e}"),
            StoreError::Corrupt(msg) => write!(f, "corrupt week file: {msg}"),
            StoreError::Encode(e) => write!(f, "encode error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Whole-object store for one user's week. Loaded once per session,
/// saved after every commit.
#[async_trait]
pub trait WeekStore: Send + Sync {
    /// `None` when the user has never saved a week.
    async fn load(&self) -> Result<Option<WeekTemplate>, StoreError>;

    async fn save(&self, week: &WeekTemplate) -> Result<(), StoreError>;
}

// ── In-memory ────────────────────────────────────────────────────

/// Weeks for many users in one shared map. Each handle reads and writes
/// the entry for its own user.
#[derive(Clone)]
pub struct MemoryStore {
    weeks: Arc<DashMap<String, WeekTemplate>>,
    user: String,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new(user: &str) -> Self {
        Self {
            weeks: Arc::new(DashMap::new()),
            user: user.to_string(),
            fail_saves: Arc::new(AtomicBool::new(false)),
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Handle for another user over the same map.
    pub fn for_user(&self, user: &str) -> Self {
        Self {
            weeks: self.weeks.clone(),
            user: user.to_string(),
            fail_saves: Arc::new(AtomicBool::new(false)),
            saves: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Make subsequent saves fail with an io error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves through this handle.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<WeekTemplate> {
        self.weeks.get(&self.user).map(|e| e.value().clone())
    }

    pub fn put(&self, week: WeekTemplate) {
        self.weeks.insert(self.user.clone(), week);
    }
}

#[async_trait]
impl WeekStore for MemoryStore {
    async fn load(&self) -> Result<Option<WeekTemplate>, StoreError> {
        Ok(self.stored())
    }

    async fn save(&self, week: &WeekTemplate) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::other("save rejected")));
        }
        self.weeks.insert(self.user.clone(), week.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── File-backed ──────────────────────────────────────────────────

/// Encode a week to `[len][bincode][crc32]`.
fn encode_week(writer: &mut impl Write, week: &WeekTemplate) -> Result<(), StoreError> {
    let payload = bincode::serialize(week).map_err(|e| StoreError::Encode(e.to_string()))?;
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(())
}

fn decode_week(bytes: &[u8]) -> Result<WeekTemplate, StoreError> {
    let header: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(StoreError::Corrupt("truncated header"))?;
    let len = u32::from_le_bytes(header) as usize;
    let payload = bytes
        .get(4..4 + len)
        .ok_or(StoreError::Corrupt("truncated payload"))?;
    let stored_crc: [u8; 4] = bytes
        .get(4 + len..8 + len)
        .and_then(|b| b.try_into().ok())
        .ok_or(StoreError::Corrupt("truncated checksum"))?;
    if u32::from_le_bytes(stored_crc) != crc32fast::hash(payload) {
        return Err(StoreError::Corrupt("checksum mismatch"));
    }
    bincode::deserialize(payload).map_err(|_| StoreError::Corrupt("undecodable payload"))
}

/// One file per user under a data directory.
///
/// Saves write a temp file, fsync, and rename it over the week file, so a
/// crash leaves either the old week or the new one.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path, user: &str) -> io::Result<Self> {
        if user.len() > MAX_USER_NAME_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "user name too long"));
        }
        if user.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty user name"));
        }
        // The name is the file name, so it must map one-to-one.
        if !user.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("user name {user:?} may only contain A-Z, a-z, 0-9, '_' and '-'"),
            ));
        }
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(format!("{user}.week")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, week: &WeekTemplate) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("week.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        encode_week(&mut writer, week)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl WeekStore for FileStore {
    async fn load(&self) -> Result<Option<WeekTemplate>, StoreError> {
        let mut file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_week(&bytes).map(Some)
    }

    async fn save(&self, week: &WeekTemplate) -> Result<(), StoreError> {
        self.write_atomic(week)
    }
}
