use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use mft_tree_forge::models::TreeEntry;
use mft_tree_forge::output::JsonlWriter;
use mft_tree_forge::tree::MftTree;

use super::{build_with_progress, open_model};
use crate::cli::SourceArgs;

pub fn run(args: &SourceArgs, out_json: &str) -> Result<()> {
    println!("[*] Запуск Export");

    let mut model = open_model(args)?;
    let tree = build_with_progress(&mut model)?;

    let file = File::create(out_json).with_context(|| format!("Не удалось создать {}", out_json))?;
    let mut writer = JsonlWriter::new(BufWriter::new(file));
    let written = export_tree(tree, &args.path, &mut writer)?;
    writer.flush()?;

    println!("[+] Выгружено узлов: {} -> {}", written, out_json);
    Ok(())
}

/// Пишет все узлы в порядке номеров записей
pub fn export_tree<W: Write>(tree: &MftTree, source_file: &str, writer: &mut JsonlWriter<W>) -> Result<u64> {
    let mut numbers: Vec<u64> = tree.registry().iter().map(|n| n.record_number()).collect();
    numbers.sort_unstable();

    for number in numbers {
        let node = match tree.get(number) {
            Some(n) => n,
            None => continue,
        };
        let entry = TreeEntry {
            entry_number: node.record_number(),
            sequence_number: node.sequence_number(),
            parent_entry_number: node.parent(),
            is_directory: node.is_directory(),
            file_name: node.name().to_string(),
            full_path: tree.path_of(number).unwrap_or_default(),
            children_count: node.children().len(),
            is_orphan: node.is_orphan(),
            orphan_reason: node.orphan_reason().map(|r| r.to_string()),
            source_file: source_file.to_string(),
        };
        writer.write(&entry)?;
    }
    Ok(writer.written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mft_tree_forge::mft::utils::make_reference;
    use mft_tree_forge::{BuildOptions, MemorySource, MftRecord, TreeBuilder};

    #[test]
    fn test_export_sorted_by_record() {
        let mut source = MemorySource::new(vec![
            MftRecord::new(20, 1, false).with_file_name(make_reference(10, 1), "notepad.exe"),
            MftRecord::new(5, 5, true).with_file_name(make_reference(5, 5), "."),
            MftRecord::new(10, 1, true).with_file_name(make_reference(5, 5), "Windows"),
        ]);
        let tree = TreeBuilder::new(BuildOptions::default()).build(&mut source);

        let mut buf = Vec::new();
        let mut writer = JsonlWriter::new(&mut buf);
        assert_eq!(export_tree(&tree, "MFT", &mut writer).unwrap(), 3);
        let lines: Vec<serde_json::Value> = String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let numbers: Vec<_> = lines.iter().map(|v| v["EntryNumber"].as_u64().unwrap()).collect();
        assert_eq!(numbers, vec![5, 10, 20]);
        assert_eq!(lines[2]["Full_Path"], "\\Windows\\notepad.exe");
        assert_eq!(lines[2]["ParentEntryNumber"], 10);
        assert_eq!(lines[0]["IsOrphan"], true);
        assert_eq!(lines[0]["OrphanReason"], "self-reference");
    }
}
