// Each bench target compiles this module separately and uses a subset of it.
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with *some* **content** and `code`.\n\n- Bullet point\n  - Nested item\n- [ ] Task item\n\n> Quoted [link](https://example.com)\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_long_list(items: usize) -> String {
    (0..items)
        .map(|i| format!("{}- item {i} with _emphasis_\n", "  ".repeat(i % 3)))
        .collect()
}
