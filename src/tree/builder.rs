//! Построение дерева каталогов из плоской таблицы MFT.
//!
//! Один последовательный проход по источнику. Если родитель записи ещё не
//! встречался, он читается по номеру и разрешается рекурсивно, а результат
//! запоминается в том же реестре. Поздняя встреча такой записи в
//! последовательном проходе - ожидаемый конфликт, он просто пропускается.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use super::node::{Node, OrphanReason, Registry, UNNAMED};
use super::source::{RecordSlot, RecordSource};
use super::MftTree;
use crate::mft::record::MftRecord;

/// Зарезервированный номер корневого каталога
pub const ROOT_RECORD_NUMBER: u64 = 5;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Номер записи корня
    pub root_record: u64,
    /// Через сколько записей вызывать прогресс
    pub progress_interval: u64,
    /// Максимальная глубина рекурсивного разрешения предков
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root_record: ROOT_RECORD_NUMBER,
            progress_interval: 100,
            max_depth: 512,
        }
    }
}

/// Итог разрешения одной записи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Запись уже в реестре (конфликт, не ошибка)
    AlreadyResolved,
    /// Прикреплена к родителю с указанным номером
    Attached(u64),
    /// Стала сиротой
    Orphan(OrphanReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Записей из последовательного прохода
    pub records_processed: u64,
    pub attached: u64,
    pub orphans: u64,
    /// Повторные встречи уже разрешённых записей
    pub conflicts: u64,
    /// Чтений родителей по номеру
    pub parent_fetches: u64,
}

type ProgressFn<'a> = Box<dyn FnMut(u64, u64) + 'a>;

pub struct TreeBuilder<'a> {
    options: BuildOptions,
    progress: Option<ProgressFn<'a>>,
    registry: Registry,
    /// Записи, чьи предки сейчас разрешаются выше по стеку
    in_progress: HashSet<u64>,
    stats: BuildStats,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            progress: None,
            registry: Registry::new(),
            in_progress: HashSet::new(),
            stats: BuildStats::default(),
        }
    }

    /// Колбэк `(обработано, примерно_всего)`, вызывается каждые `progress_interval` записей
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(u64, u64) + 'a,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn build<S: RecordSource + ?Sized>(mut self, source: &mut S) -> MftTree {
        let total = source.estimated_total();
        // total - только оценка для прогресса, резерв ограничен
        self.registry.reserve(total.min(1 << 20) as usize);
        info!(estimated_total = total, "Построение дерева MFT");

        let interval = self.options.progress_interval.max(1);
        let mut processed = 0u64;

        while let Some(record) = source.next_record() {
            processed += 1;

            if self.resolve(source, &record, 0) == Resolution::AlreadyResolved {
                trace!(record = record.record_number, "Запись уже разрешена как предок");
                self.stats.conflicts += 1;
            }

            if processed % interval == 0 {
                if let Some(progress) = self.progress.as_mut() {
                    progress(processed, total);
                }
            }
        }

        self.stats.records_processed = processed;
        info!(
            records = processed,
            nodes = self.registry.len(),
            orphans = self.stats.orphans,
            conflicts = self.stats.conflicts,
            "Дерево MFT построено"
        );

        MftTree::new(self.registry, self.options.root_record, self.stats)
    }

    /// Разрешает одну запись; при необходимости рекурсивно тянет предков.
    pub fn resolve<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
        record: &MftRecord,
        depth: usize,
    ) -> Resolution {
        let rec_num = record.record_number;

        if self.registry.contains(rec_num) {
            return Resolution::AlreadyResolved;
        }

        // нет имени -> сирота "???"
        let fn_attr = match record.filename_information() {
            Some(f) => f,
            None => return self.orphan(record, UNNAMED.to_string(), OrphanReason::Unnamed),
        };

        let name = fn_attr.name.clone();
        let parent_num = fn_attr.parent_record_number();
        let expected_seq = fn_attr.expected_parent_sequence();

        // цикл из одного узла (так выглядит и корень)
        if parent_num == rec_num {
            return self.orphan(record, name, OrphanReason::SelfReference);
        }

        match self.registry.get(parent_num) {
            Some(parent) => {
                if parent.sequence_number() != expected_seq {
                    debug!(
                        record = rec_num,
                        parent = parent_num,
                        expected = expected_seq,
                        actual = parent.sequence_number(),
                        "Устаревшая ссылка на родителя"
                    );
                    return self.orphan(record, name, OrphanReason::StaleParent);
                }
            }
            None => {
                if let Some(reason) = self.resolve_parent(source, rec_num, parent_num, expected_seq, depth) {
                    return self.orphan(record, name, reason);
                }
            }
        }

        let node = Node::attached(rec_num, record.sequence_number, name, parent_num, record.is_directory());
        if !self.registry.insert(node) {
            debug!(record = rec_num, "Номер занят во время разрешения предков");
            return Resolution::AlreadyResolved;
        }
        self.stats.attached += 1;
        Resolution::Attached(parent_num)
    }

    /// Дотягивает отсутствующего родителя. `Some(reason)` - ребёнок становится сиротой.
    fn resolve_parent<S: RecordSource + ?Sized>(
        &mut self,
        source: &mut S,
        rec_num: u64,
        parent_num: u64,
        expected_seq: u16,
        depth: usize,
    ) -> Option<OrphanReason> {
        if self.in_progress.contains(&parent_num) {
            debug!(record = rec_num, parent = parent_num, "Цикл в цепочке родителей");
            return Some(OrphanReason::Cycle);
        }

        if depth >= self.options.max_depth {
            debug!(record = rec_num, depth, "Превышена глубина разрешения предков");
            return Some(OrphanReason::DepthExceeded);
        }

        self.stats.parent_fetches += 1;
        let parent = match source.fetch_record_by_number(parent_num) {
            RecordSlot::Record(parent) => parent,
            RecordSlot::Empty | RecordSlot::OutOfRange => {
                debug!(record = rec_num, parent = parent_num, "Родительский слот пуст");
                return Some(OrphanReason::MissingParent);
            }
        };

        // в слоте родителя лежит запись с другим номером в заголовке
        if parent.record_number != parent_num {
            debug!(
                record = rec_num,
                parent = parent_num,
                header = parent.record_number,
                "Номер в заголовке не совпадает со слотом"
            );
            return Some(OrphanReason::MissingParent);
        }

        if parent.sequence_number != expected_seq {
            debug!(
                record = rec_num,
                parent = parent_num,
                expected = expected_seq,
                actual = parent.sequence_number,
                "Слот родителя переиспользован"
            );
            return Some(OrphanReason::StaleParent);
        }

        self.in_progress.insert(rec_num);
        // конфликт здесь означает "уже разрешён" и дальше не идёт
        let _ = self.resolve(source, &parent, depth + 1);
        self.in_progress.remove(&rec_num);

        if !self.registry.contains(parent_num) {
            return Some(OrphanReason::MissingParent);
        }
        None
    }

    fn orphan(&mut self, record: &MftRecord, name: String, reason: OrphanReason) -> Resolution {
        let node = Node::orphan(
            record.record_number,
            record.sequence_number,
            name,
            record.is_directory(),
            reason,
        );
        if !self.registry.insert(node) {
            debug!(record = record.record_number, "Номер занят во время разрешения предков");
            return Resolution::AlreadyResolved;
        }
        self.stats.orphans += 1;
        Resolution::Orphan(reason)
    }
}
