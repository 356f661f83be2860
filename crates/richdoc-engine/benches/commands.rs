use criterion::{Criterion, criterion_group, criterion_main};
use richdoc_engine::editing::{Cmd, Document, Element, Node, Point, Selection};

fn large_document(blocks: usize) -> Document {
    let blocks = (0..blocks)
        .map(|i| Node::Element(Element::paragraph(format!("paragraph {i} with some text"))))
        .collect();
    Document::from_blocks(blocks).unwrap()
}

fn bench_command_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.sample_size(10);

    let doc = large_document(100);

    group.bench_function("insert_literal", |b| {
        let mut d = doc.clone();
        b.iter(|| {
            let patch = d
                .apply(&Cmd::InsertLiteral {
                    text: std::hint::black_box("x".to_string()),
                })
                .unwrap();
            std::hint::black_box(patch);
        });
    });

    group.bench_function("toggle_code_block", |b| {
        let mut d = doc.clone();
        b.iter(|| {
            let patch = d.apply(&Cmd::ToggleCodeBlock).unwrap();
            std::hint::black_box(patch);
        });
    });

    group.bench_function("toggle_bold_split", |b| {
        b.iter(|| {
            let mut d = doc.clone();
            d.set_selection(Selection::range(
                Point::new([0, 0], 1),
                Point::new([50, 0], 3),
            ))
            .unwrap();
            let patch = d.apply(&Cmd::ToggleBold).unwrap();
            std::hint::black_box(patch);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_command_dispatch);
criterion_main!(benches);
