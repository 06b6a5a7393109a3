use serde::{Deserialize, Serialize};

/// Одна строка JSONL-экспорта дерева
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TreeEntry {
    pub entry_number: u64,
    pub sequence_number: u16,

    pub parent_entry_number: Option<u64>,

    pub is_directory: bool,
    pub file_name: String,

    #[serde(rename = "Full_Path")]
    pub full_path: String,

    pub children_count: usize,

    pub is_orphan: bool,
    pub orphan_reason: Option<String>,

    pub source_file: String,
}

/// Sidecar `<mft>.meta.json` рядом с дампом.
/// Поля, которые здесь не нужны, при чтении игнорируются.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MftMeta {
    pub bytes_per_sector: u16,
    pub mft_record_size: u32,
    #[serde(default)]
    pub volume_serial_number: u64,
    #[serde(default)]
    pub source: String,
}
