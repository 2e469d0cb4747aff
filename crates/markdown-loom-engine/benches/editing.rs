use criterion::{Criterion, criterion_group, criterion_main};
use markdown_loom_engine::Editor;
use markdown_loom_engine::ast::SequentialIds;
use markdown_loom_engine::ast::query::{flatten_leaves, get_first_inline};
use markdown_loom_engine::EngineOptions;
mod common;

fn editor(content: &str) -> Editor {
    Editor::with_options(content, EngineOptions::default(), Box::new(SequentialIds::new()))
}

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editing");
    group.sample_size(10);
    let content = common::generate_markdown_content(100);

    group.bench_function("insert_text_large_document", |b| {
        b.iter_batched(
            || editor(&content),
            |mut ed| {
                let leaf = flatten_leaves(ed.ast())[2];
                let inline = ed.ast().block(leaf).and_then(get_first_inline).map(|i| i.id);
                if let Some(inline) = inline {
                    ed.insert_text(inline, 0, "x");
                }
                ed
            },
            criterion::BatchSize::LargeInput,
        );
    });

    let list = common::generate_long_list(200);
    group.bench_function("enter_in_long_list", |b| {
        b.iter_batched(
            || editor(&list),
            |mut ed| {
                let leaf = flatten_leaves(ed.ast())[100];
                let inline = ed.ast().block(leaf).and_then(get_first_inline).map(|i| i.id);
                if let Some(inline) = inline {
                    ed.enter(inline, 2);
                }
                ed
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_typing);
criterion_main!(benches);
