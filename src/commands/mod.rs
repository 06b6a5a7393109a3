pub mod export;
pub mod orphans;
pub mod record;
pub mod tree;

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use mft_tree_forge::mft::parser::{load_mft_meta, DEFAULT_BYTES_PER_SECTOR, DEFAULT_RECORD_SIZE};
use mft_tree_forge::tree::{BuildOptions, MftModel, MftTree};
use mft_tree_forge::MftFile;

use crate::cli::SourceArgs;

/// Открывает дамп с учётом переопределений из командной строки
pub fn open_model(args: &SourceArgs) -> Result<MftModel> {
    let meta = load_mft_meta(Path::new(&args.path))?;
    // флаги командной строки важнее meta-файла
    let record_size = args
        .record_size
        .or(meta.as_ref().map(|m| m.mft_record_size as usize))
        .unwrap_or(DEFAULT_RECORD_SIZE);
    let bytes_per_sector = args
        .bytes_per_sector
        .or(meta.as_ref().map(|m| m.bytes_per_sector))
        .unwrap_or(DEFAULT_BYTES_PER_SECTOR);

    let file = MftFile::open_with(&args.path, record_size, bytes_per_sector)
        .with_context(|| format!("Не удалось открыть MFT {}", args.path))?;

    println!(
        "[*] {}: {} записей по {} байт",
        args.path,
        file.total_records(),
        file.record_size()
    );

    let options = BuildOptions { max_depth: args.max_depth, ..BuildOptions::default() };
    Ok(MftModel::from_source(file, options))
}

/// Строит дерево с индикатором прогресса
pub fn build_with_progress(model: &mut MftModel) -> Result<&MftTree> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%)")?
            .progress_chars("##-"),
    );

    let tree = model.fetch(|count, total| {
        bar.set_length(total);
        bar.set_position(count);
    });
    bar.finish_and_clear();

    let stats = tree.stats();
    println!(
        "[+] Узлов: {}, сирот: {}, конфликтов: {}, чтений родителей: {}",
        tree.len(),
        stats.orphans,
        stats.conflicts,
        stats.parent_fetches
    );
    Ok(tree)
}
