use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use super::attributes::ATTR_ATTRIBUTE_LIST;
use super::record::{AttributeIter, MftRecord, MftRecordHeader};
use super::utils::reference_record_number;
use crate::error::{MftError, Result};
use crate::models::MftMeta;
use crate::tree::source::{RecordSlot, RecordSource};

pub const DEFAULT_RECORD_SIZE: usize = 1024;
pub const DEFAULT_BYTES_PER_SECTOR: u16 = 512;

#[derive(Debug, PartialEq)]
pub enum FixupResult {
    Ok,
    TornWrite,
    Failed,
}

pub fn apply_fixups(data: &mut [u8], header: &MftRecordHeader, bytes_per_sector: u16) -> FixupResult {
    let bytes_per_sector = bytes_per_sector as usize;
    if bytes_per_sector == 0 || data.len() % bytes_per_sector != 0 { return FixupResult::Failed; }
    let usa_offset = header.update_sequence_offset as usize;
    let usa_count = header.update_sequence_size as usize;
    if usa_count < 2 || usa_offset + usa_count * 2 > data.len() { return FixupResult::Failed; }

    let usn_0 = data[usa_offset];
    let usn_1 = data[usa_offset + 1];
    let sectors_in_record = data.len() / bytes_per_sector;
    let max_fixups = std::cmp::min(usa_count - 1, sectors_in_record);
    let mut torn_write = false;

    for i in 1..=max_fixups {
        let sector_tail = i * bytes_per_sector - 2;

        if data[sector_tail] != usn_0 || data[sector_tail + 1] != usn_1 { torn_write = true; }

        let fixup_off = usa_offset + i * 2;
        data[sector_tail] = data[fixup_off];
        data[sector_tail + 1] = data[fixup_off + 1];
    }
    if torn_write { FixupResult::TornWrite } else { FixupResult::Ok }
}

fn meta_path_for_mft(mft_path: &Path) -> PathBuf {
    let mut name = mft_path.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Читает `<mft>.meta.json`, если он есть. Битый файл - ошибка.
pub fn load_mft_meta(mft_path: &Path) -> Result<Option<MftMeta>> {
    let meta_path = meta_path_for_mft(mft_path);
    let file = match File::open(&meta_path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MftError::Io(e)),
    };
    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|source| MftError::Meta { path: meta_path, source })
}

/// Источник записей поверх сырого дампа $MFT.
///
/// Каждое чтение явно позиционируется на `n * record_size`, поэтому
/// последовательный проход и чтение по номеру не мешают друг другу.
pub struct MftFile {
    reader: BufReader<File>,
    path: PathBuf,
    file_size: u64,
    record_size: usize,
    bytes_per_sector: u16,
    cursor: u64,
}

impl MftFile {
    /// Открывает дамп; размеры записи/сектора берутся из meta-файла, иначе 1024/512
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let (record_size, bytes_per_sector) = load_mft_meta(path)?
            .map(|meta| (meta.mft_record_size as usize, meta.bytes_per_sector))
            .unwrap_or((DEFAULT_RECORD_SIZE, DEFAULT_BYTES_PER_SECTOR));
        Self::open_with(path, record_size, bytes_per_sector)
    }

    pub fn open_with(path: impl AsRef<Path>, record_size: usize, bytes_per_sector: u16) -> Result<Self> {
        let path = path.as_ref();
        if record_size < 1024 || !record_size.is_power_of_two() {
            return Err(MftError::InvalidRecordSize(record_size));
        }
        if bytes_per_sector < 256 || !bytes_per_sector.is_power_of_two() || record_size % bytes_per_sector as usize != 0 {
            return Err(MftError::InvalidSectorSize(bytes_per_sector));
        }

        let file = File::open(path).map_err(|source| MftError::Open { path: path.to_path_buf(), source })?;
        let file_size = file.metadata()?.len();
        if file_size < record_size as u64 {
            return Err(MftError::TooSmall { path: path.to_path_buf(), size: file_size });
        }
        debug!(path = %path.display(), file_size, record_size, bytes_per_sector, "MFT открыт");

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            file_size,
            record_size,
            bytes_per_sector,
            cursor: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn total_records(&self) -> u64 {
        self.file_size / self.record_size as u64
    }

    /// Сырой буфер слота (без fixup). `None` - за пределами файла.
    pub fn read_raw(&mut self, entry_num: u64) -> Result<Option<Vec<u8>>> {
        Ok(self.read_slot(entry_num)?)
    }

    fn read_slot(&mut self, entry_num: u64) -> std::io::Result<Option<Vec<u8>>> {
        if entry_num >= self.total_records() { return Ok(None); }
        let offset = entry_num * self.record_size as u64;
        let mut buf = vec![0u8; self.record_size];
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut buf)?;
        Ok(Some(buf))
    }

    /// Читает слот, применяет fixup и собирает экстенты.
    /// `Some((is_extension, record))` или `None` для пустого/битого слота.
    fn load_record(&mut self, entry_num: u64) -> std::io::Result<Option<(bool, MftRecord)>> {
        let mut buf = match self.read_slot(entry_num)? {
            Some(b) => b,
            None => return Ok(None),
        };
        let header = match MftRecordHeader::parse(&buf) {
            Some(h) => h,
            None => return Ok(None),
        };
        if header.signature == "BAAD" { return Ok(None); }

        let fixup_res = apply_fixups(&mut buf, &header, self.bytes_per_sector);
        if fixup_res == FixupResult::Failed {
            debug!(record = entry_num, "Fixup не применился");
            return Ok(None);
        }

        let is_extension = header.is_extension();
        let buffers = if is_extension {
            vec![buf]
        } else {
            self.gather_record_buffers(entry_num, buf, &header)?
        };

        Ok(MftRecord::decode(entry_num, &buffers).map(|mut record| {
            record.torn_write = fixup_res == FixupResult::TornWrite;
            (is_extension, record)
        }))
    }

    /// Базовая запись плюс экстенты из резидентного $ATTRIBUTE_LIST
    fn gather_record_buffers(
        &mut self,
        entry_num: u64,
        base_buffer: Vec<u8>,
        header: &MftRecordHeader,
    ) -> std::io::Result<Vec<Vec<u8>>> {
        let mut extents_to_fetch = BTreeSet::new();

        for attr in AttributeIter::new(&base_buffer, header) {
            if attr.attr_type != ATTR_ATTRIBUTE_LIST { continue; }
            if attr.non_resident {
                debug!(record = entry_num, "Нерезидентный $ATTRIBUTE_LIST пропущен");
                continue;
            }
            let list = match attr.value {
                Some(v) => v,
                None => continue,
            };

            let mut list_off = 0;
            while list_off + 24 <= list.len() {
                let ext_type = LittleEndian::read_u32(&list[list_off..list_off + 4]);
                if ext_type == 0 { break; }
                let ext_len = LittleEndian::read_u16(&list[list_off + 4..list_off + 6]) as usize;
                if ext_len == 0 || list_off + ext_len > list.len() { break; }

                let extent_entry = reference_record_number(LittleEndian::read_u64(&list[list_off + 16..list_off + 24]));
                if extent_entry != entry_num && extent_entry > 0 && extent_entry < self.total_records() {
                    extents_to_fetch.insert(extent_entry);
                }
                list_off += ext_len;
            }
        }

        let mut buffers = vec![base_buffer];
        for extent_entry in extents_to_fetch {
            let mut ext_buf = match self.read_slot(extent_entry)? {
                Some(b) => b,
                None => continue,
            };
            if let Some(eh) = MftRecordHeader::parse(&ext_buf) {
                // экстент должен ссылаться обратно на базовую запись
                if reference_record_number(eh.base_record_reference) != entry_num { continue; }
                if apply_fixups(&mut ext_buf, &eh, self.bytes_per_sector) != FixupResult::Failed {
                    buffers.push(ext_buf);
                }
            }
        }
        Ok(buffers)
    }
}

impl RecordSource for MftFile {
    fn next_record(&mut self) -> Option<MftRecord> {
        while self.cursor < self.total_records() {
            let entry_num = self.cursor;
            self.cursor += 1;

            match self.load_record(entry_num) {
                Ok(Some((false, record))) => return Some(record),
                // экстенты уже вошли в свои базовые записи
                Ok(Some((true, _))) | Ok(None) => continue,
                Err(e) => {
                    // один нечитаемый слот не останавливает проход
                    warn!(record = entry_num, error = %e, "Слот MFT не прочитан");
                    continue;
                }
            }
        }
        None
    }

    fn fetch_record_by_number(&mut self, record_number: u64) -> RecordSlot {
        if record_number >= self.total_records() {
            return RecordSlot::OutOfRange;
        }
        match self.load_record(record_number) {
            Ok(Some((_, record))) => RecordSlot::Record(record),
            Ok(None) => RecordSlot::Empty,
            Err(e) => {
                warn!(record = record_number, error = %e, "Не удалось прочитать запись");
                RecordSlot::Empty
            }
        }
    }

    fn estimated_total(&self) -> u64 {
        self.total_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with_usa(offset: u16, count: u16) -> MftRecordHeader {
        let mut buf = vec![0u8; 1024];
        buf[0..4].copy_from_slice(b"FILE");
        LittleEndian::write_u16(&mut buf[4..6], offset);
        LittleEndian::write_u16(&mut buf[6..8], count);
        MftRecordHeader::parse(&buf).unwrap()
    }

    #[test]
    fn test_fixups_restore_sector_tails() {
        let header = header_with_usa(0x30, 3);
        let mut data = vec![0u8; 1024];
        // USN = 0x0007, оригинальные хвосты секторов - AA BB и CC DD
        data[0x30] = 0x07;
        data[0x32] = 0xAA;
        data[0x33] = 0xBB;
        data[0x34] = 0xCC;
        data[0x35] = 0xDD;
        data[510] = 0x07;
        data[1022] = 0x07;

        assert_eq!(apply_fixups(&mut data, &header, 512), FixupResult::Ok);
        assert_eq!(&data[510..512], &[0xAA, 0xBB]);
        assert_eq!(&data[1022..1024], &[0xCC, 0xDD]);
    }

    #[test]
    fn test_fixups_torn_write() {
        let header = header_with_usa(0x30, 3);
        let mut data = vec![0u8; 1024];
        data[0x30] = 0x07;
        data[510] = 0x07;
        data[1022] = 0x08;
        assert_eq!(apply_fixups(&mut data, &header, 512), FixupResult::TornWrite);
    }

    #[test]
    fn test_fixups_bad_geometry() {
        let header = header_with_usa(0x30, 3);
        let mut data = vec![0u8; 1000];
        assert_eq!(apply_fixups(&mut data, &header, 512), FixupResult::Failed);

        let header = header_with_usa(0x3FF, 3);
        let mut data = vec![0u8; 1024];
        assert_eq!(apply_fixups(&mut data, &header, 512), FixupResult::Failed);
    }

    #[test]
    fn test_meta_path() {
        assert_eq!(meta_path_for_mft(Path::new("/tmp/MFT")), PathBuf::from("/tmp/MFT.meta.json"));
    }
}
