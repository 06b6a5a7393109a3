//! Источники записей для построителя дерева.

use std::collections::HashMap;

use crate::mft::record::MftRecord;
use crate::mft::utils::RECORD_NUMBER_MASK;

/// Результат произвольного чтения записи по номеру
#[derive(Debug, Clone)]
pub enum RecordSlot {
    /// В слоте валидная запись
    Record(MftRecord),
    /// Слот существует, но пуст / не распознан
    Empty,
    /// Номер за пределами таблицы
    OutOfRange,
}

impl RecordSlot {
    pub fn into_record(self) -> Option<MftRecord> {
        match self {
            RecordSlot::Record(record) => Some(record),
            RecordSlot::Empty | RecordSlot::OutOfRange => None,
        }
    }
}

/// Источник записей: один последовательный проход плюс чтение по номеру.
///
/// Построитель предполагает, что источником пользуется только он сам.
pub trait RecordSource {
    /// Следующая валидная запись в порядке хранения, пустые слоты пропускаются
    fn next_record(&mut self) -> Option<MftRecord>;

    /// Чтение записи по номеру, не сдвигает последовательный курсор
    fn fetch_record_by_number(&mut self, record_number: u64) -> RecordSlot;

    /// Оценка общего числа записей (для прогресса)
    fn estimated_total(&self) -> u64;
}

/// Источник поверх уже декодированных записей.
///
/// `order` задаёт последовательный порядок, `slots` - что вернёт чтение
/// по номеру. Слоты, которых нет в `order`, можно добавить через
/// [`MemorySource::with_hidden`], пустые - через [`MemorySource::with_empty`].
#[derive(Debug, Default)]
pub struct MemorySource {
    order: Vec<u64>,
    slots: HashMap<u64, Option<MftRecord>>,
    cursor: usize,
    capacity: u64,
}

impl MemorySource {
    pub fn new(records: Vec<MftRecord>) -> Self {
        let mut source = Self::default();
        for record in records {
            source.order.push(record.record_number);
            source.insert_slot(record.record_number, Some(record));
        }
        source
    }

    /// Запись доступна только через fetch, в последовательном проходе её нет
    pub fn with_hidden(mut self, record: MftRecord) -> Self {
        self.insert_slot(record.record_number, Some(record));
        self
    }

    /// Пустой (нераспределённый) слот
    pub fn with_empty(mut self, record_number: u64) -> Self {
        self.insert_slot(record_number & RECORD_NUMBER_MASK, None);
        self
    }

    fn insert_slot(&mut self, record_number: u64, record: Option<MftRecord>) {
        self.capacity = self.capacity.max(record_number + 1);
        self.slots.insert(record_number, record);
    }

    /// Начать последовательный проход заново
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl RecordSource for MemorySource {
    fn next_record(&mut self) -> Option<MftRecord> {
        while let Some(&number) = self.order.get(self.cursor) {
            self.cursor += 1;
            if let Some(Some(record)) = self.slots.get(&number) {
                return Some(record.clone());
            }
        }
        None
    }

    fn fetch_record_by_number(&mut self, record_number: u64) -> RecordSlot {
        if record_number >= self.capacity {
            return RecordSlot::OutOfRange;
        }
        match self.slots.get(&record_number) {
            Some(Some(record)) => RecordSlot::Record(record.clone()),
            _ => RecordSlot::Empty,
        }
    }

    fn estimated_total(&self) -> u64 {
        self.capacity
    }
}
