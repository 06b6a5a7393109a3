//! Восстановление дерева каталогов NTFS из сырого дампа $MFT.
//!
//! `mft` - декодер записей и источник записей поверх файла,
//! `tree` - построитель дерева, реестр узлов и модель открытого файла.

pub mod error;
pub mod mft;
pub mod models;
pub mod output;
pub mod tree;

pub use error::{MftError, Result};
pub use mft::parser::MftFile;
pub use mft::record::MftRecord;
pub use tree::{
    BuildOptions, MemorySource, MftModel, MftTree, Node, OrphanReason, RecordSlot, RecordSource,
    Resolution, TreeBuilder,
};
