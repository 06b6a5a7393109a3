use std::io::{self, BufWriter, Write};

use anyhow::{bail, Result};

use mft_tree_forge::tree::{MftTree, Node};

use super::{build_with_progress, open_model};
use crate::cli::SourceArgs;

pub fn run(args: &SourceArgs, depth: Option<usize>, show_files: bool) -> Result<()> {
    println!("[*] Запуск Tree");

    let mut model = open_model(args)?;
    let tree = build_with_progress(&mut model)?;

    if tree.root().is_none() {
        bail!("Корневая запись {} не найдена в MFT", tree.root_record());
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    render_tree(tree, &mut out, depth, show_files)?;
    out.flush()?;
    Ok(())
}

/// Печатает дерево от корня: сначала каталоги, затем файлы, по имени
pub fn render_tree<W: Write>(
    tree: &MftTree,
    out: &mut W,
    max_depth: Option<usize>,
    show_files: bool,
) -> io::Result<()> {
    let root = match tree.root() {
        Some(r) => r,
        None => return Ok(()),
    };
    writeln!(out, "\\ [{}]", root.record_number())?;
    render_children(tree, root, out, 1, max_depth, show_files)
}

fn render_children<W: Write>(
    tree: &MftTree,
    node: &Node,
    out: &mut W,
    level: usize,
    max_depth: Option<usize>,
    show_files: bool,
) -> io::Result<()> {
    if max_depth.map_or(false, |d| level > d) {
        return Ok(());
    }

    for child in tree.sorted_children(node.record_number()) {
        if !child.is_directory() && !show_files {
            continue;
        }
        let suffix = if child.is_directory() { "\\" } else { "" };
        writeln!(
            out,
            "{}{}{} [{}]",
            "  ".repeat(level),
            child.name(),
            suffix,
            child.record_number()
        )?;
        if child.is_directory() {
            render_children(tree, child, out, level + 1, max_depth, show_files)?;
        }
    }
    Ok(())
}
