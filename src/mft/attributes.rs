use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use super::utils::{filetime_to_datetime, reference_record_number, reference_sequence};

pub const ATTR_STANDARD_INFORMATION: u32 = 0x10;
pub const ATTR_ATTRIBUTE_LIST: u32 = 0x20;
pub const ATTR_FILE_NAME: u32 = 0x30;
pub const ATTR_DATA: u32 = 0x80;
pub const ATTR_END: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone)]
pub struct StandardInformation {
    pub creation_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub mft_modified_time: DateTime<Utc>,
    pub accessed_time: DateTime<Utc>,
    pub file_attributes: u32,
    pub security_id: u32,
}

impl StandardInformation {
    pub fn parse(data: &[u8]) -> Option<Self> {
        // 48 байт - минимальный размер (Windows NT/2000)
        if data.len() < 48 { return None; }

        let file_attributes = LittleEndian::read_u32(&data[32..36]);

        // Security ID есть только в версии NTFS 3.x (смещение 52)
        let security_id = if data.len() >= 56 {
            LittleEndian::read_u32(&data[52..56])
        } else {
            0
        };

        Some(Self {
            creation_time: filetime_to_datetime(LittleEndian::read_u64(&data[0..8])),
            modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[8..16])),
            mft_modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[16..24])),
            accessed_time: filetime_to_datetime(LittleEndian::read_u64(&data[24..32])),
            file_attributes,
            security_id,
        })
    }
}

/// Пространство имён $FILE_NAME
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNamespace {
    Posix,
    Win32,
    Dos,
    Win32AndDos,
    Unknown(u8),
}

impl From<u8> for FileNamespace {
    fn from(value: u8) -> Self {
        match value {
            0 => FileNamespace::Posix,
            1 => FileNamespace::Win32,
            2 => FileNamespace::Dos,
            3 => FileNamespace::Win32AndDos,
            other => FileNamespace::Unknown(other),
        }
    }
}

impl std::fmt::Display for FileNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileNamespace::Posix => write!(f, "POSIX (0x0)"),
            FileNamespace::Win32 => write!(f, "Win32 (0x1)"),
            FileNamespace::Dos => write!(f, "DOS (0x2)"),
            FileNamespace::Win32AndDos => write!(f, "Win32+DOS (0x3)"),
            FileNamespace::Unknown(v) => write!(f, "Unknown ({:#x})", v),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileNameAttribute {
    pub parent_directory_reference: u64,
    pub creation_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
    pub mft_modified_time: DateTime<Utc>,
    pub accessed_time: DateTime<Utc>,
    pub allocated_size: u64,
    pub logical_size: u64,
    pub name_type: u8,
    pub name: String,
}

impl FileNameAttribute {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 66 { return None; }

        let name_length = data[64] as usize;
        let name_type = data[65];
        let name_offset = 66;
        let name_bytes_len = name_length * 2;
        if data.len() < name_offset + name_bytes_len { return None; }

        let name_u16: Vec<u16> = data[name_offset..name_offset + name_bytes_len]
            .chunks_exact(2)
            .map(LittleEndian::read_u16)
            .collect();

        let name = String::from_utf16_lossy(&name_u16);

        Some(Self {
            parent_directory_reference: LittleEndian::read_u64(&data[0..8]),
            creation_time: filetime_to_datetime(LittleEndian::read_u64(&data[8..16])),
            modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[16..24])),
            mft_modified_time: filetime_to_datetime(LittleEndian::read_u64(&data[24..32])),
            accessed_time: filetime_to_datetime(LittleEndian::read_u64(&data[32..40])),
            allocated_size: LittleEndian::read_u64(&data[40..48]),
            logical_size: LittleEndian::read_u64(&data[48..56]),
            name_type,
            name,
        })
    }

    /// Номер родительской записи (маскированный)
    pub fn parent_record_number(&self) -> u64 {
        reference_record_number(self.parent_directory_reference)
    }

    /// Sequence, который родитель имел на момент записи ссылки
    pub fn expected_parent_sequence(&self) -> u16 {
        reference_sequence(self.parent_directory_reference)
    }

    pub fn namespace(&self) -> FileNamespace {
        FileNamespace::from(self.name_type)
    }

    /// Win32 и Win32+DOS имена считаются основными
    pub fn is_primary_name(&self) -> bool {
        self.name_type == 1 || self.name_type == 3
    }
}
