use std::fmt::Write as _;

use anyhow::{Context, Result};

use mft_tree_forge::mft::record::MftRecord;

use super::open_model;
use crate::cli::SourceArgs;

pub fn run(args: &SourceArgs, number: u64, hex: bool) -> Result<()> {
    println!("[*] Запуск Record #{}", number);

    let mut model = open_model(args)?;
    let record = model
        .record(number)
        .with_context(|| format!("Запись {} недоступна", number))?;

    // путь берём из дерева, если запись в него попала
    let path = model.tree().path_of(record.record_number);

    print!("{}", describe_record(&record, path.as_deref()));

    if hex {
        if let Some(raw) = model.source_mut().read_raw(number)? {
            println!("\n[Hex]");
            print!("{}", format_hex(&raw));
        }
    }
    Ok(())
}

/// Текстовое описание записи: заголовок, $STANDARD_INFORMATION и все $FILE_NAME
pub fn describe_record(record: &MftRecord, path: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Record:        {}", record.record_number);
    let _ = writeln!(out, "Sequence:      {}", record.sequence_number);
    let _ = writeln!(out, "In use:        {}", record.is_in_use());
    let _ = writeln!(out, "Directory:     {}", record.is_directory());
    let _ = writeln!(out, "Hard links:    {}", record.hard_link_count);
    let _ = writeln!(out, "Size:          {}", record.size());
    let _ = writeln!(out, "LSN:           {}", record.logfile_sequence_number);
    if record.torn_write {
        let _ = writeln!(out, "Torn write:    true");
    }
    let _ = writeln!(out, "Path:          {}", path.unwrap_or("-"));

    if let Some(si) = &record.standard_information {
        let _ = writeln!(out, "\n[$STANDARD_INFORMATION]");
        let _ = writeln!(out, "  Created:     {}", si.creation_time.to_rfc3339());
        let _ = writeln!(out, "  Modified:    {}", si.modified_time.to_rfc3339());
        let _ = writeln!(out, "  MFT changed: {}", si.mft_modified_time.to_rfc3339());
        let _ = writeln!(out, "  Accessed:    {}", si.accessed_time.to_rfc3339());
        let _ = writeln!(out, "  Attributes:  {:#010x}", si.file_attributes);
    }

    for (i, name) in record.file_names.iter().enumerate() {
        let _ = writeln!(out, "\n[$FILE_NAME #{}]", i);
        let _ = writeln!(out, "  Name:        {}", name.name);
        let _ = writeln!(out, "  Namespace:   {}", name.namespace());
        let _ = writeln!(
            out,
            "  Parent:      {} (seq {})",
            name.parent_record_number(),
            name.expected_parent_sequence()
        );
        let _ = writeln!(out, "  Allocated:   {}", name.allocated_size);
        let _ = writeln!(out, "  Logical:     {}", name.logical_size);
        let _ = writeln!(out, "  Created:     {}", name.creation_time.to_rfc3339());
        let _ = writeln!(out, "  Modified:    {}", name.modified_time.to_rfc3339());
        let _ = writeln!(out, "  MFT changed: {}", name.mft_modified_time.to_rfc3339());
        let _ = writeln!(out, "  Accessed:    {}", name.accessed_time.to_rfc3339());
    }
    out
}

/// Классический дамп: смещение, 16 байт в hex, ASCII
pub fn format_hex(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(16).enumerate() {
        let _ = write!(out, "{:08x}  ", row * 16);
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => { let _ = write!(out, "{:02x} ", b); }
                None => out.push_str("   "),
            }
        }
        out.push(' ');
        for b in chunk {
            out.push(if b.is_ascii_graphic() || *b == b' ' { *b as char } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mft_tree_forge::mft::utils::make_reference;

    #[test]
    fn test_hex_rows() {
        let mut data = b"FILE0\x00\x03\x00".to_vec();
        data.extend_from_slice(&[0u8; 10]);
        let dump = format_hex(&data);
        let lines: Vec<_> = dump.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  46 49 4c 45 30 00 03 00"));
        assert!(lines[0].ends_with("FILE0..........."));
        assert!(lines[1].starts_with("00000010  00 00 "));
        assert!(lines[1].ends_with(" .."));
    }

    #[test]
    fn test_describe_lists_all_names() {
        let mut record = MftRecord::new(64, 3, false)
            .with_file_name(make_reference(5, 5), "PROGRA~1.TXT")
            .with_file_name(make_reference(5, 5), "Program notes.txt");
        record.file_names[0].name_type = 2;

        let text = describe_record(&record, Some("\\Program notes.txt"));
        assert!(text.contains("Record:        64"));
        assert!(text.contains("Path:          \\Program notes.txt"));
        assert!(text.contains("[$FILE_NAME #0]"));
        assert!(text.contains("Namespace:   DOS (0x2)"));
        assert!(text.contains("Name:        Program notes.txt"));
        assert!(text.contains("Parent:      5 (seq 5)"));
        assert!(!text.contains("[$STANDARD_INFORMATION]"));
    }
}
