//! Сборка сырых записей MFT для интеграционных тестов.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};
use tempfile::NamedTempFile;

pub use mft_tree_forge::mft::utils::make_reference;

const ATTR_STANDARD_INFORMATION: u32 = 0x10;
const ATTR_ATTRIBUTE_LIST: u32 = 0x20;
const ATTR_FILE_NAME: u32 = 0x30;
const ATTR_DATA: u32 = 0x80;

/// Описание одной записи; в байты превращается через [`RecordImage::to_bytes`]
#[derive(Debug, Clone)]
pub struct RecordImage {
    pub number: u64,
    pub sequence: u16,
    pub flags: u16,
    pub base_reference: u64,
    pub names: Vec<(u64, String, u8)>,
    pub data_size: Option<u64>,
    pub extents: Vec<u64>,
    pub standard_information: bool,
    pub torn: bool,
    pub signature: [u8; 4],
    /// Номер в заголовке (0x2C), если отличается от слота
    pub header_number: Option<u32>,
}

impl RecordImage {
    pub fn file(number: u64, sequence: u16) -> Self {
        Self {
            number,
            sequence,
            flags: 0x01,
            base_reference: 0,
            names: Vec::new(),
            data_size: None,
            extents: Vec::new(),
            standard_information: true,
            torn: false,
            signature: *b"FILE",
            header_number: None,
        }
    }

    pub fn dir(number: u64, sequence: u16) -> Self {
        Self { flags: 0x03, ..Self::file(number, sequence) }
    }

    /// Win32-имя в каталоге `parent`
    pub fn named(self, parent: u64, name: &str) -> Self {
        self.named_in(parent, name, 1)
    }

    pub fn named_in(mut self, parent: u64, name: &str, namespace: u8) -> Self {
        self.names.push((parent, name.to_string(), namespace));
        self
    }

    pub fn with_data(mut self, size: u64) -> Self {
        self.data_size = Some(size);
        self
    }

    pub fn deleted(mut self) -> Self {
        self.flags &= !0x01;
        self
    }

    /// Экстент базовой записи `base`
    pub fn extension_of(mut self, base: u64) -> Self {
        self.base_reference = base;
        self.standard_information = false;
        self
    }

    /// $ATTRIBUTE_LIST, ссылающийся на указанные экстенты
    pub fn with_extents(mut self, extents: &[u64]) -> Self {
        self.extents = extents.to_vec();
        self
    }

    pub fn torn(mut self) -> Self {
        self.torn = true;
        self
    }

    /// Запись лежит в своём слоте, но в заголовке указан другой номер
    pub fn header_number(mut self, number: u32) -> Self {
        self.header_number = Some(number);
        self
    }

    pub fn baad(mut self) -> Self {
        self.signature = *b"BAAD";
        self
    }

    pub fn to_bytes(&self, record_size: usize, bytes_per_sector: usize) -> Vec<u8> {
        let mut buf = vec![0u8; record_size];
        let usa_count = record_size / bytes_per_sector + 1;
        let usa_offset = 0x30usize;
        let first_attr = align8(usa_offset + usa_count * 2);

        buf[0..4].copy_from_slice(&self.signature);
        LittleEndian::write_u16(&mut buf[4..6], usa_offset as u16);
        LittleEndian::write_u16(&mut buf[6..8], usa_count as u16);
        LittleEndian::write_u64(&mut buf[8..16], 0x1000 + self.number);
        LittleEndian::write_u16(&mut buf[16..18], self.sequence);
        LittleEndian::write_u16(&mut buf[18..20], self.names.len().max(1) as u16);
        LittleEndian::write_u16(&mut buf[20..22], first_attr as u16);
        LittleEndian::write_u16(&mut buf[22..24], self.flags);
        LittleEndian::write_u32(&mut buf[28..32], record_size as u32);
        LittleEndian::write_u64(&mut buf[32..40], self.base_reference);
        LittleEndian::write_u32(&mut buf[0x2C..0x30], self.header_number.unwrap_or(self.number as u32));

        let mut off = first_attr;
        if self.standard_information {
            off = put_resident(&mut buf, off, ATTR_STANDARD_INFORMATION, &standard_information_value());
        }
        if !self.extents.is_empty() {
            let value = attribute_list_value(self.number, self.sequence, &self.extents);
            off = put_resident(&mut buf, off, ATTR_ATTRIBUTE_LIST, &value);
        }
        for (parent, name, namespace) in &self.names {
            off = put_resident(&mut buf, off, ATTR_FILE_NAME, &file_name_value(*parent, name, *namespace));
        }
        if let Some(size) = self.data_size {
            off = put_nonresident(&mut buf, off, ATTR_DATA, size);
        }
        LittleEndian::write_u32(&mut buf[off..off + 4], 0xFFFF_FFFF);
        LittleEndian::write_u32(&mut buf[24..28], (off + 8) as u32);

        // USN в хвосты секторов, оригинальные байты - в массив USA
        let usn = [0x01, 0x00];
        buf[usa_offset..usa_offset + 2].copy_from_slice(&usn);
        for i in 1..usa_count {
            let tail = i * bytes_per_sector - 2;
            let slot = usa_offset + i * 2;
            buf[slot] = buf[tail];
            buf[slot + 1] = buf[tail + 1];
            buf[tail..tail + 2].copy_from_slice(&usn);
        }
        if self.torn {
            buf[record_size - 2] = 0x02;
        }
        buf
    }
}

fn align8(value: usize) -> usize {
    (value + 7) & !7
}

fn put_resident(buf: &mut [u8], off: usize, attr_type: u32, value: &[u8]) -> usize {
    let len = align8(24 + value.len());
    LittleEndian::write_u32(&mut buf[off..off + 4], attr_type);
    LittleEndian::write_u32(&mut buf[off + 4..off + 8], len as u32);
    buf[off + 8] = 0;
    LittleEndian::write_u16(&mut buf[off + 10..off + 12], 0x18);
    LittleEndian::write_u32(&mut buf[off + 16..off + 20], value.len() as u32);
    LittleEndian::write_u16(&mut buf[off + 20..off + 22], 0x18);
    buf[off + 24..off + 24 + value.len()].copy_from_slice(value);
    off + len
}

fn put_nonresident(buf: &mut [u8], off: usize, attr_type: u32, size: u64) -> usize {
    let len = 0x48;
    LittleEndian::write_u32(&mut buf[off..off + 4], attr_type);
    LittleEndian::write_u32(&mut buf[off + 4..off + 8], len as u32);
    buf[off + 8] = 1;
    LittleEndian::write_u16(&mut buf[off + 10..off + 12], 0x40);
    LittleEndian::write_u64(&mut buf[off + 0x28..off + 0x30], align8(size as usize) as u64);
    LittleEndian::write_u64(&mut buf[off + 0x30..off + 0x38], size);
    LittleEndian::write_u64(&mut buf[off + 0x38..off + 0x40], size);
    off + len
}

fn standard_information_value() -> Vec<u8> {
    let mut value = vec![0u8; 72];
    // 2020-01-01T00:00:00Z
    let filetime = 132_223_104_000_000_000u64;
    for i in 0..4 {
        LittleEndian::write_u64(&mut value[i * 8..i * 8 + 8], filetime);
    }
    LittleEndian::write_u32(&mut value[32..36], 0x20);
    value
}

fn file_name_value(parent: u64, name: &str, namespace: u8) -> Vec<u8> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let mut value = vec![0u8; 66 + units.len() * 2];
    LittleEndian::write_u64(&mut value[0..8], parent);
    value[64] = units.len() as u8;
    value[65] = namespace;
    for (i, unit) in units.iter().enumerate() {
        LittleEndian::write_u16(&mut value[66 + i * 2..68 + i * 2], *unit);
    }
    value
}

/// $STANDARD_INFORMATION в базовой записи, $FILE_NAME - в экстентах
fn attribute_list_value(base: u64, sequence: u16, extents: &[u64]) -> Vec<u8> {
    let mut entries = vec![(ATTR_STANDARD_INFORMATION, make_reference(base, sequence))];
    for extent in extents {
        entries.push((ATTR_FILE_NAME, make_reference(*extent, 1)));
    }

    let mut value = vec![0u8; entries.len() * 32];
    for (i, (attr_type, reference)) in entries.into_iter().enumerate() {
        let off = i * 32;
        LittleEndian::write_u32(&mut value[off..off + 4], attr_type);
        LittleEndian::write_u16(&mut value[off + 4..off + 6], 32);
        value[off + 7] = 0x1A;
        LittleEndian::write_u64(&mut value[off + 16..off + 24], reference);
    }
    value
}

/// Дамп из `slots` записей по 1024 байта; незанятые слоты заполнены нулями
pub fn write_mft(images: &[RecordImage], slots: u64) -> NamedTempFile {
    write_mft_with(images, slots, 1024, 512)
}

pub fn write_mft_with(
    images: &[RecordImage],
    slots: u64,
    record_size: usize,
    bytes_per_sector: usize,
) -> NamedTempFile {
    let mut data = vec![0u8; slots as usize * record_size];
    for image in images {
        let off = image.number as usize * record_size;
        data[off..off + record_size].copy_from_slice(&image.to_bytes(record_size, bytes_per_sector));
    }
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    file
}

/// Корень: каталог 5, ссылается сам на себя
pub fn root() -> RecordImage {
    RecordImage::dir(5, 5).named(make_reference(5, 5), ".")
}
