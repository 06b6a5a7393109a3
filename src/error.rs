use std::path::PathBuf;

/// Ошибки библиотеки. Проблемы отдельных записей сюда не попадают:
/// они становятся сиротами в дереве, а не ошибками.
#[derive(Debug, thiserror::Error)]
pub enum MftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open MFT {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid MFT record size: {0}")]
    InvalidRecordSize(usize),

    #[error("Invalid bytes per sector: {0}")]
    InvalidSectorSize(u16),

    #[error("MFT {} is smaller than one record ({size} bytes)", .path.display())]
    TooSmall { path: PathBuf, size: u64 },

    #[error("Invalid meta file {}: {source}", .path.display())]
    Meta {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {0} not found")]
    RecordNotFound(u64),

    #[error("Record {0} cannot be decoded")]
    UndecodableRecord(u64),
}

pub type Result<T> = std::result::Result<T, MftError>;
