use anyhow::{Context, Result};
use markdown_loom_config::Config;
use markdown_loom_engine::ast::UuidIds;
use markdown_loom_engine::parsing::rope::preview;
use markdown_loom_engine::{Ast, Editor, NodeId, io};
use relative_path::RelativePathBuf;
use std::{env, path::PathBuf, process};
use tracing_subscriber::EnvFilter;

const PREVIEW_LEN: usize = 60;
const USAGE: &str = "Usage: markdown-loom-cli <normalize [--write] | tree> <document.md>";

enum Command {
    /// Print (or write back) the canonical text.
    Normalize { write: bool },
    /// Print an outline of the block tree.
    Tree,
}

fn parse_args(args: &[String]) -> Option<(Command, RelativePathBuf)> {
    let (command, rest) = args.split_first()?;
    let (command, rest) = match (command.as_str(), rest) {
        ("normalize", [flag, rest @ ..]) if flag == "--write" => (Command::Normalize { write: true }, rest),
        ("normalize", rest) => (Command::Normalize { write: false }, rest),
        ("tree", rest) => (Command::Tree, rest),
        _ => return None,
    };
    match rest {
        [path] => Some((command, RelativePathBuf::from(path.as_str()))),
        _ => None,
    }
}

/// One line per block: indentation by depth, the kind tag, and for leaves
/// a preview of the block text with newlines escaped.
fn outline(ast: &Ast) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(ast.root(), 0)];
    while let Some((id, depth)) = stack.pop() {
        let Some(block) = ast.block(id) else {
            continue;
        };
        out.push_str(&format!("{}{}", "  ".repeat(depth), block.kind.tag()));
        if block.kind.is_leaf() {
            out.push_str(&format!(" {:?}", preview(&block.text, PREVIEW_LEN)));
        }
        out.push('\n');
        stack.extend(ast.children(id).iter().rev().map(|child| (*child, depth + 1)));
    }
    out
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, document)) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    // Documents resolve against the configured root, or the working directory
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    let root = match config.documents_path {
        Some(path) => path,
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    tracing::debug!(%document, root = %root.display(), "opening document");
    let source = io::read_document(&document, &root).with_context(|| format!("reading {document}"))?;
    let editor = Editor::with_options(&source, config.editor, Box::new(UuidIds));

    match command {
        Command::Normalize { write: true } => {
            editor
                .save_to(&root, &document)
                .with_context(|| format!("writing {document}"))?;
        }
        Command::Normalize { write: false } => println!("{}", editor.text()),
        Command::Tree => print!("{}", outline(editor.ast())),
    }
    Ok(())
}
