use byteorder::{ByteOrder, LittleEndian};

use super::attributes::{
    FileNameAttribute, StandardInformation, ATTR_DATA, ATTR_END, ATTR_FILE_NAME,
    ATTR_STANDARD_INFORMATION,
};
use super::utils::{filetime_to_datetime, RECORD_NUMBER_MASK};

#[derive(Debug)]
pub struct MftRecordHeader {
    pub signature: String, // "FILE" или "BAAD"
    pub update_sequence_offset: u16,
    pub update_sequence_size: u16,
    pub logfile_sequence_number: u64,
    pub sequence_number: u16,
    pub hard_link_count: u16,
    pub first_attribute_offset: u16,
    pub flags: u16, // 0x01 = InUse, 0x02 = Directory
    pub real_size: u32,
    pub allocated_size: u32,
    pub base_record_reference: u64,
    /// Номер записи по смещению 0x2C (только NTFS 3.1+, где USA начинается с 0x30)
    pub record_number: Option<u32>,
}

impl MftRecordHeader {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 48 { return None; }

        let sig = String::from_utf8_lossy(&data[0..4]).into_owned();
        if sig != "FILE" && sig != "BAAD" {
            return None; // Пропускаем мусор
        }

        let update_sequence_offset = LittleEndian::read_u16(&data[4..6]);
        let record_number = if update_sequence_offset >= 0x30 {
            Some(LittleEndian::read_u32(&data[0x2C..0x30]))
        } else {
            None
        };

        Some(Self {
            signature: sig,
            update_sequence_offset,
            update_sequence_size: LittleEndian::read_u16(&data[6..8]),
            logfile_sequence_number: LittleEndian::read_u64(&data[8..16]),
            sequence_number: LittleEndian::read_u16(&data[16..18]),
            hard_link_count: LittleEndian::read_u16(&data[18..20]),
            first_attribute_offset: LittleEndian::read_u16(&data[20..22]),
            flags: LittleEndian::read_u16(&data[22..24]),
            real_size: LittleEndian::read_u32(&data[24..28]),
            allocated_size: LittleEndian::read_u32(&data[28..32]),
            base_record_reference: LittleEndian::read_u64(&data[32..40]),
            record_number,
        })
    }

    pub fn is_in_use(&self) -> bool {
        self.flags & 0x01 != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & 0x02 != 0
    }

    pub fn is_extension(&self) -> bool {
        self.base_record_reference & RECORD_NUMBER_MASK != 0
    }
}

/// Один атрибут внутри записи. Для резидентных есть `value`,
/// для нерезидентных - `data_size` из заголовка.
#[derive(Debug)]
pub struct RawAttribute<'a> {
    pub attr_type: u32,
    pub non_resident: bool,
    pub name: String,
    pub value: Option<&'a [u8]>,
    pub data_size: Option<u64>,
}

/// Обход атрибутов записи с ограничением по real_size
pub struct AttributeIter<'a> {
    buf: &'a [u8],
    offset: usize,
    used_end: usize,
}

impl<'a> AttributeIter<'a> {
    pub fn new(buf: &'a [u8], header: &MftRecordHeader) -> Self {
        let offset = header.first_attribute_offset as usize;
        // Строгое ограничение по real_size (защита от мусора в slack-пространстве)
        let mut used_end = std::cmp::min(header.real_size as usize, buf.len());
        if used_end < offset { used_end = buf.len(); } // Защита от битого real_size
        Self { buf, offset, used_end }
    }
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = RawAttribute<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = self.buf;
        let attr_offset = self.offset;
        if attr_offset + 9 > self.used_end { return None; }

        let attr_type = LittleEndian::read_u32(&buf[attr_offset..attr_offset + 4]);
        if attr_type == ATTR_END || attr_type == 0 { return None; }
        let attr_len = LittleEndian::read_u32(&buf[attr_offset + 4..attr_offset + 8]) as usize;
        if attr_len == 0 || attr_offset.saturating_add(attr_len) > self.used_end { return None; }

        let attr_end = attr_offset + attr_len;
        let non_resident = buf[attr_offset + 8] != 0;
        let name = read_attr_name(buf, attr_offset, attr_end);

        let mut value = None;
        let mut data_size = None;
        if non_resident {
            data_size = read_nonresident_data_size(buf, attr_offset, attr_end);
        } else if attr_offset + 22 <= attr_end {
            let value_len = LittleEndian::read_u32(&buf[attr_offset + 16..attr_offset + 20]) as usize;
            let value_off = LittleEndian::read_u16(&buf[attr_offset + 20..attr_offset + 22]) as usize;
            let content_start = attr_offset.saturating_add(value_off);
            let content_end = std::cmp::min(content_start.saturating_add(value_len), attr_end);
            value = buf.get(content_start..content_end);
            data_size = Some(value_len as u64);
        }

        self.offset = attr_end;
        Some(RawAttribute { attr_type, non_resident, name, value, data_size })
    }
}

fn read_attr_name(record: &[u8], attr_offset: usize, attr_end: usize) -> String {
    if attr_offset + 12 > attr_end { return String::new(); }
    let name_len = record[attr_offset + 9] as usize;
    let name_off = LittleEndian::read_u16(&record[attr_offset + 10..attr_offset + 12]) as usize;
    if name_len == 0 { return String::new(); }
    let name_start = attr_offset.saturating_add(name_off);
    let name_end = name_start.saturating_add(name_len * 2);
    if name_end > attr_end { return String::new(); }

    let u16s: Vec<u16> = record[name_start..name_end]
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .collect();
    String::from_utf16_lossy(&u16s)
}

fn read_nonresident_data_size(record: &[u8], attr_offset: usize, attr_end: usize) -> Option<u64> {
    if attr_offset + 0x38 > attr_end { return None; }
    Some(LittleEndian::read_u64(&record[attr_offset + 0x30..attr_offset + 0x38]))
}

/// Декодированная запись MFT в том виде, в каком её потребляет построитель дерева
#[derive(Debug, Clone)]
pub struct MftRecord {
    pub record_number: u64,
    pub sequence_number: u16,
    pub flags: u16,
    pub hard_link_count: u16,
    pub logfile_sequence_number: u64,
    pub torn_write: bool,
    pub standard_information: Option<StandardInformation>,
    /// Все $FILE_NAME в порядке появления (базовая запись, затем экстенты)
    pub file_names: Vec<FileNameAttribute>,
    /// Размер безымянного $DATA
    pub data_size: Option<u64>,
}

impl MftRecord {
    /// Пустая запись без атрибутов (для MemorySource и тестов)
    pub fn new(record_number: u64, sequence_number: u16, is_directory: bool) -> Self {
        Self {
            record_number: record_number & RECORD_NUMBER_MASK,
            sequence_number,
            flags: if is_directory { 0x03 } else { 0x01 },
            hard_link_count: 1,
            logfile_sequence_number: 0,
            torn_write: false,
            standard_information: None,
            file_names: Vec::new(),
            data_size: None,
        }
    }

    /// Добавляет Win32-имя с указанной ссылкой на родителя
    pub fn with_file_name(mut self, parent_reference: u64, name: impl Into<String>) -> Self {
        let epoch = filetime_to_datetime(0);
        self.file_names.push(FileNameAttribute {
            parent_directory_reference: parent_reference,
            creation_time: epoch,
            modified_time: epoch,
            mft_modified_time: epoch,
            accessed_time: epoch,
            allocated_size: 0,
            logical_size: 0,
            name_type: 1,
            name: name.into(),
        });
        self
    }

    /// Декодирует базовую запись и её экстенты.
    /// `buffers[0]` - базовая запись после fixup, остальные - экстенты.
    pub fn decode(slot: u64, buffers: &[Vec<u8>]) -> Option<Self> {
        let base = buffers.first()?;
        let header = MftRecordHeader::parse(base)?;

        let record_number = header
            .record_number
            .map(|n| n as u64)
            .unwrap_or(slot);

        let mut record = Self {
            record_number,
            sequence_number: header.sequence_number,
            flags: header.flags,
            hard_link_count: header.hard_link_count,
            logfile_sequence_number: header.logfile_sequence_number,
            torn_write: false,
            standard_information: None,
            file_names: Vec::new(),
            data_size: None,
        };

        for buf in buffers {
            let buf_header = match MftRecordHeader::parse(buf) {
                Some(h) => h,
                None => continue,
            };
            for attr in AttributeIter::new(buf, &buf_header) {
                match attr.attr_type {
                    ATTR_STANDARD_INFORMATION => {
                        if record.standard_information.is_none() {
                            record.standard_information = attr.value.and_then(StandardInformation::parse);
                        }
                    }
                    ATTR_FILE_NAME => {
                        if let Some(fn_attr) = attr.value.and_then(FileNameAttribute::parse) {
                            record.file_names.push(fn_attr);
                        }
                    }
                    ATTR_DATA if attr.name.is_empty() => {
                        if record.data_size.is_none() {
                            record.data_size = attr.data_size;
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(record)
    }

    pub fn is_in_use(&self) -> bool {
        self.flags & 0x01 != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & 0x02 != 0
    }

    /// Имя, определяющее положение в дереве: первое Win32 / Win32+DOS,
    /// иначе первое встреченное.
    pub fn filename_information(&self) -> Option<&FileNameAttribute> {
        self.file_names
            .iter()
            .find(|f| f.is_primary_name())
            .or_else(|| self.file_names.first())
    }

    /// Для каталогов 0, для файлов - $DATA, иначе logical size из $FILE_NAME
    pub fn size(&self) -> u64 {
        if self.is_directory() {
            return 0;
        }
        self.data_size
            .or_else(|| self.filename_information().map(|f| f.logical_size))
            .unwrap_or(0)
    }
}
