use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};

use anyhow::Result;

use mft_tree_forge::tree::MftTree;

use super::{build_with_progress, open_model};
use crate::cli::SourceArgs;

pub fn run(args: &SourceArgs) -> Result<()> {
    println!("[*] Запуск Orphans");

    let mut model = open_model(args)?;
    let tree = build_with_progress(&mut model)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    render_orphans(tree, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Сироты (без корня) и сводка по причинам
pub fn render_orphans<W: Write>(tree: &MftTree, out: &mut W) -> io::Result<()> {
    let mut by_reason = BTreeMap::new();

    writeln!(out, "{:>10}  {:<15} {:>8}  NAME", "RECORD", "REASON", "CHILDREN")?;
    for node in tree.orphans().filter(|n| n.record_number() != tree.root_record()) {
        let reason = node.orphan_reason().map(|r| r.as_str()).unwrap_or("-");
        *by_reason.entry(reason).or_insert(0usize) += 1;
        writeln!(
            out,
            "{:>10}  {:<15} {:>8}  {}",
            node.record_number(),
            reason,
            node.children().len(),
            node.name()
        )?;
    }

    writeln!(out)?;
    for (reason, count) in by_reason {
        writeln!(out, "{:<15} {}", reason, count)?;
    }
    Ok(())
}
