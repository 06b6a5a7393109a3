use clap::{Args, Parser, Subcommand};

const ASCII_LOGO: &str = r#"
  __  __ ______ _______   _______            ______
 |  \/  |  ____|__   __| |__   __|          |  ____|
 | \  / | |__     | |       | |_ __ ___  ___| |__ ___  _ __ __ _  ___
 | |\/| |  __|    | |       | | '__/ _ \/ _ \  __/ _ \| '__/ _` |/ _ \
 | |  | | |       | |       | | | |  __/  __/ | | (_) | | | (_| |  __/
 |_|  |_|_|       |_|       |_|_|  \___|\___|_|  \___/|_|  \__, |\___|
                                                            __/ |
                                                           |___/
"#;

const EXAMPLES: &str = r#"
ПРИМЕРЫ ИСПОЛЬЗОВАНИЯ:

  1. ДЕРЕВО (Tree)
     Показать дерево каталогов (3 уровня) вместе с файлами:
     mft_tree_forge tree --path C:\MftDump\mft.raw --depth 3 --files

  2. СИРОТЫ (Orphans)
     Записи, которые не удалось прикрепить к корню, с причиной:
     mft_tree_forge orphans -p mft.raw

  3. ЗАПИСЬ (Record)
     Подробности по записи 42 с hex-дампом:
     mft_tree_forge record -p mft.raw -n 42 --hex

  4. ЭКСПОРТ (Export)
     Выгрузить все узлы дерева в JSONL:
     mft_tree_forge export -p mft.raw -j tree.jsonl

  Размер записи и сектора берутся из mft.raw.meta.json, если он есть (иначе 1024/512).
  Подробный лог: RUST_LOG=debug
"#;

#[derive(Parser, Debug)]
#[command(name = "MFTTreeForge")]
#[command(version = "1.0")]
#[command(before_help = ASCII_LOGO)]
#[command(about = "DFIR tool: reconstructs the NTFS directory tree from a raw $MFT")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Общие параметры источника
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Путь к raw MFT
    #[arg(short, long)]
    pub path: String,
    /// Размер записи (перекрывает meta-файл)
    #[arg(long)]
    pub record_size: Option<usize>,
    /// Размер сектора для fixup (перекрывает meta-файл)
    #[arg(long)]
    pub bytes_per_sector: Option<u16>,
    /// Предел глубины рекурсивного разрешения предков
    #[arg(long, default_value_t = 512)]
    pub max_depth: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Печатает восстановленное дерево от корня
    Tree {
        #[command(flatten)]
        source: SourceArgs,
        /// Сколько уровней показывать
        #[arg(short, long)]
        depth: Option<usize>,
        /// Показывать файлы, а не только каталоги
        #[arg(short, long)]
        files: bool,
    },
    /// Список сирот с причиной
    Orphans {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Детальный просмотр одной записи
    Record {
        #[command(flatten)]
        source: SourceArgs,
        /// Номер записи
        #[arg(short, long)]
        number: u64,
        /// Добавить hex-дамп записи
        #[arg(long)]
        hex: bool,
    },
    /// Экспорт всех узлов в JSONL (1 строка - 1 узел)
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Путь к итоговому JSONL
        #[arg(short = 'j', long)]
        out_json: String,
    },
}
