use std::collections::HashMap;

/// Имя для записей без $FILE_NAME
pub const UNNAMED: &str = "???";

/// Почему узел не удалось прикрепить к родителю
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrphanReason {
    /// Нет атрибута $FILE_NAME
    Unnamed,
    /// Родитель - сама запись (в том числе корень)
    SelfReference,
    /// Родительский слот пуст или вне таблицы
    MissingParent,
    /// Слот родителя переиспользован: sequence не совпадает
    StaleParent,
    /// Родитель в процессе разрешения выше по стеку (цикл длиннее одного узла)
    Cycle,
    /// Цепочка предков длиннее допустимой глубины
    DepthExceeded,
}

impl OrphanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrphanReason::Unnamed => "unnamed",
            OrphanReason::SelfReference => "self-reference",
            OrphanReason::MissingParent => "missing-parent",
            OrphanReason::StaleParent => "stale-parent",
            OrphanReason::Cycle => "cycle",
            OrphanReason::DepthExceeded => "depth-exceeded",
        }
    }
}

impl std::fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Узел дерева. Родитель хранится как номер записи (невладеющая ссылка),
/// дети - упорядоченный список номеров.
#[derive(Debug, Clone)]
pub struct Node {
    record_number: u64,
    sequence_number: u16,
    name: String,
    parent: Option<u64>,
    children: Vec<u64>,
    is_directory: bool,
    orphan_reason: Option<OrphanReason>,
}

impl Node {
    pub(crate) fn attached(
        record_number: u64,
        sequence_number: u16,
        name: String,
        parent: u64,
        is_directory: bool,
    ) -> Self {
        Self {
            record_number,
            sequence_number,
            name,
            parent: Some(parent),
            children: Vec::new(),
            is_directory,
            orphan_reason: None,
        }
    }

    pub(crate) fn orphan(
        record_number: u64,
        sequence_number: u16,
        name: String,
        is_directory: bool,
        reason: OrphanReason,
    ) -> Self {
        Self {
            record_number,
            sequence_number,
            name,
            parent: None,
            children: Vec::new(),
            is_directory,
            orphan_reason: Some(reason),
        }
    }

    pub fn record_number(&self) -> u64 {
        self.record_number
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<u64> {
        self.parent
    }

    /// Дети в порядке первого разрешения
    pub fn children(&self) -> &[u64] {
        &self.children
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_orphan(&self) -> bool {
        self.parent.is_none()
    }

    pub fn orphan_reason(&self) -> Option<OrphanReason> {
        self.orphan_reason
    }
}

/// Реестр: номер записи -> узел. Вставка однократная и окончательная.
#[derive(Debug, Default)]
pub struct Registry {
    nodes: HashMap<u64, Node>,
    orphans: Vec<u64>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    pub fn contains(&self, record_number: u64) -> bool {
        self.nodes.contains_key(&record_number)
    }

    pub fn get(&self, record_number: u64) -> Option<&Node> {
        self.nodes.get(&record_number)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Сироты в порядке вставки
    pub fn orphans(&self) -> &[u64] {
        &self.orphans
    }

    /// Вставляет узел и, если у него есть родитель, дописывает его в детей родителя.
    /// Возвращает false, если номер уже занят (реестр не меняется).
    pub(crate) fn insert(&mut self, node: Node) -> bool {
        let record_number = node.record_number;
        if self.nodes.contains_key(&record_number) {
            return false;
        }

        match node.parent {
            Some(parent) => match self.nodes.get_mut(&parent) {
                Some(parent_node) => parent_node.children.push(record_number),
                None => return false,
            },
            None => self.orphans.push(record_number),
        }

        self.nodes.insert(record_number, node);
        true
    }
}
