pub mod builder;
pub mod model;
pub mod node;
pub mod source;

use std::collections::HashSet;

pub use builder::{BuildOptions, BuildStats, Resolution, TreeBuilder, ROOT_RECORD_NUMBER};
pub use model::MftModel;
pub use node::{Node, OrphanReason, Registry, UNNAMED};
pub use source::{MemorySource, RecordSlot, RecordSource};

/// Результат построения: реестр узлов, номер корня и статистика
#[derive(Debug)]
pub struct MftTree {
    registry: Registry,
    root_record: u64,
    stats: BuildStats,
}

impl MftTree {
    pub(crate) fn new(registry: Registry, root_record: u64, stats: BuildStats) -> Self {
        Self { registry, root_record, stats }
    }

    pub fn root_record(&self) -> u64 {
        self.root_record
    }

    pub fn root(&self) -> Option<&Node> {
        self.registry.get(self.root_record)
    }

    pub fn get(&self, record_number: u64) -> Option<&Node> {
        self.registry.get(record_number)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Сироты в порядке появления (корень тоже здесь - он ссылается сам на себя)
    pub fn orphans(&self) -> impl Iterator<Item = &Node> {
        self.registry
            .orphans()
            .iter()
            .filter_map(move |n| self.registry.get(*n))
    }

    /// Дети для отображения: сначала каталоги, затем файлы, внутри - по имени
    pub fn sorted_children(&self, record_number: u64) -> Vec<&Node> {
        let mut children: Vec<&Node> = match self.registry.get(record_number) {
            Some(node) => node.children().iter().filter_map(|c| self.registry.get(*c)).collect(),
            None => return Vec::new(),
        };
        children.sort_by(|a, b| {
            b.is_directory()
                .cmp(&a.is_directory())
                .then_with(|| a.name().cmp(b.name()))
        });
        children
    }

    /// Путь вида `\Windows\System32\notepad.exe`.
    /// Для узлов вне корня путь начинается с `<ORPHAN>` и верхнего известного предка.
    pub fn path_of(&self, record_number: u64) -> Option<String> {
        let mut parts = Vec::new();
        let mut visited = HashSet::new();
        let mut current = record_number;
        let mut detached = false;

        loop {
            let node = self.registry.get(current)?;
            if !visited.insert(current) {
                parts.push("<CORRUPTED_LOOP>");
                break;
            }
            if current == self.root_record {
                break;
            }
            parts.push(node.name());
            match node.parent() {
                Some(parent) => current = parent,
                None => {
                    detached = true;
                    break;
                }
            }
        }

        parts.reverse();
        let prefix = if detached { "<ORPHAN>" } else { "" };
        Some(format!("{}\\{}", prefix, parts.join("\\")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mft::record::MftRecord;
    use crate::mft::utils::make_reference;

    fn sample_tree() -> MftTree {
        let mut source = MemorySource::new(vec![
            MftRecord::new(5, 5, true).with_file_name(make_reference(5, 5), "."),
            MftRecord::new(30, 1, false).with_file_name(make_reference(5, 5), "b.txt"),
            MftRecord::new(31, 1, true).with_file_name(make_reference(5, 5), "Zeta"),
            MftRecord::new(32, 1, false).with_file_name(make_reference(5, 5), "a.txt"),
            MftRecord::new(33, 1, true).with_file_name(make_reference(5, 5), "Alpha"),
            MftRecord::new(34, 1, false).with_file_name(make_reference(33, 1), "inner.log"),
            MftRecord::new(35, 1, false).with_file_name(make_reference(35, 1), "self.bin"),
        ]);
        TreeBuilder::new(BuildOptions::default()).build(&mut source)
    }

    #[test]
    fn test_sorted_children_dirs_first() {
        let tree = sample_tree();
        let names: Vec<_> = tree.sorted_children(5).iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta", "a.txt", "b.txt"]);
        // порядок вставки не меняется
        assert_eq!(tree.root().unwrap().children(), &[30, 31, 32, 33]);
        assert!(tree.sorted_children(999).is_empty());
    }

    #[test]
    fn test_paths() {
        let tree = sample_tree();
        assert_eq!(tree.path_of(5).unwrap(), "\\");
        assert_eq!(tree.path_of(34).unwrap(), "\\Alpha\\inner.log");
        assert_eq!(tree.path_of(35).unwrap(), "<ORPHAN>\\self.bin");
        assert!(tree.path_of(999).is_none());
    }

    #[test]
    fn test_orphans_include_root() {
        let tree = sample_tree();
        let orphans: Vec<_> = tree.orphans().map(|n| n.record_number()).collect();
        assert_eq!(orphans, vec![5, 35]);
    }
}
