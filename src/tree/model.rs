//! Модель одного открытого MFT: источник записей плюс кэш построенного дерева.

use std::path::Path;

use super::builder::{BuildOptions, TreeBuilder};
use super::node::Node;
use super::source::{RecordSlot, RecordSource};
use super::MftTree;
use crate::error::{MftError, Result};
use crate::mft::parser::MftFile;
use crate::mft::record::MftRecord;

pub struct MftModel<S: RecordSource = MftFile> {
    source: S,
    options: BuildOptions,
    tree: Option<MftTree>,
}

impl MftModel<MftFile> {
    /// Открывает дамп. Ошибки открытия возникают здесь, до построения.
    pub fn open(path: impl AsRef<Path>, options: BuildOptions) -> Result<Self> {
        Ok(Self::from_source(MftFile::open(path)?, options))
    }
}

impl<S: RecordSource> MftModel<S> {
    pub fn from_source(source: S, options: BuildOptions) -> Self {
        Self { source, options, tree: None }
    }

    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    /// Строит дерево, если оно ещё не построено; повторный вызов ничего не делает.
    pub fn fetch<F>(&mut self, progress: F) -> &MftTree
    where
        F: FnMut(u64, u64),
    {
        let Self { source, options, tree } = self;
        tree.get_or_insert_with(|| {
            TreeBuilder::new(options.clone())
                .with_progress(progress)
                .build(source)
        })
    }

    /// Дерево без прогресса (строится при первом обращении)
    pub fn tree(&mut self) -> &MftTree {
        self.fetch(|_, _| {})
    }

    pub fn get_root(&mut self) -> Result<&Node> {
        let root_record = self.options.root_record;
        self.get_node(root_record)
    }

    pub fn get_node(&mut self, record_number: u64) -> Result<&Node> {
        self.tree()
            .get(record_number)
            .ok_or(MftError::RecordNotFound(record_number))
    }

    /// Повторное чтение записи для детального просмотра
    pub fn record(&mut self, record_number: u64) -> Result<MftRecord> {
        match self.source.fetch_record_by_number(record_number) {
            RecordSlot::Record(record) => Ok(record),
            RecordSlot::Empty => Err(MftError::UndecodableRecord(record_number)),
            RecordSlot::OutOfRange => Err(MftError::RecordNotFound(record_number)),
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
