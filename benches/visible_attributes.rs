//! Visible attributes benchmarks.
//!
//! Measures the cost of answering the host's per-frame visible-area query
//! on long transcripts, with and without the cache, and the cost of a
//! batch update near the bottom of the list.
//!
//! Run with: cargo bench --bench visible_attributes

#![allow(missing_docs)] // criterion macros generate undocumented items

use chat_layout::config::{CompensationAnchor, LayoutSettings};
use chat_layout::model::{ItemPath, ModelState, Rect, Size};
use chat_layout::state::{
    ElementSpec, ScanMode, SectionSpec, SectionedDataSource, StateController, StructuralChange,
    Viewport,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

const VIEWPORT_HEIGHT: f64 = 800.0;

/// Scroll position in the transcript.
#[derive(Debug, Clone, Copy)]
enum ScrollPosition {
    Start,
    Middle,
    End,
}

impl ScrollPosition {
    fn name(&self) -> &'static str {
        match self {
            ScrollPosition::Start => "start",
            ScrollPosition::Middle => "middle",
            ScrollPosition::End => "end",
        }
    }

    fn offset(&self, content_height: f64) -> f64 {
        let max = (content_height - VIEWPORT_HEIGHT).max(0.0);
        match self {
            ScrollPosition::Start => 0.0,
            ScrollPosition::Middle => max / 2.0,
            ScrollPosition::End => max,
        }
    }
}

/// Transcript of `sections` sections with `items` cells each, cell heights
/// cycling through a few typical message sizes.
fn transcript(sections: usize, items: usize) -> SectionedDataSource {
    let heights = [44.0, 88.0, 132.0, 60.0, 250.0];
    SectionedDataSource::new(
        (0..sections)
            .map(|_| SectionSpec {
                items: (0..items)
                    .map(|i| ElementSpec::estimated(375.0, heights[i % heights.len()]))
                    .collect(),
                ..SectionSpec::default()
            })
            .map(|section| section.with_supplementary(ElementSpec::exact(375.0, 24.0), ElementSpec::exact(375.0, 8.0)))
            .collect(),
    )
}

fn controller(source: &SectionedDataSource) -> StateController {
    let settings = LayoutSettings {
        estimated_item_size: Size::new(375.0, 60.0),
        inter_item_spacing: 4.0,
        inter_section_spacing: 12.0,
        compensation_anchor: CompensationAnchor::Bottom,
        ..LayoutSettings::default()
    };
    let mut controller = StateController::new(settings, Viewport::new(Size::new(375.0, VIEWPORT_HEIGHT)));
    controller.reload_data(source);
    controller
}

fn content_height(controller: &StateController) -> f64 {
    controller
        .content_size(ModelState::BeforeUpdate)
        .map_or(0.0, |size| size.height)
}

fn bench_scan_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("visible_scan");
    let source = transcript(20, 500);
    let controller = controller(&source);
    let height = content_height(&controller);

    for position in [ScrollPosition::Start, ScrollPosition::Middle, ScrollPosition::End] {
        let rect = Rect::new(0.0, position.offset(height), 375.0, VIEWPORT_HEIGHT);
        for (mode, name) in [(ScanMode::Accelerated, "accelerated"), (ScanMode::Exhaustive, "exhaustive")] {
            group.bench_with_input(BenchmarkId::new(name, position.name()), &rect, |b, rect| {
                b.iter(|| black_box(controller.scan_attributes(*rect, ModelState::BeforeUpdate, mode)));
            });
        }
    }
    group.finish();
}

fn bench_cached_scrolling(c: &mut Criterion) {
    let source = transcript(20, 500);
    let mut controller = controller(&source);
    let start = ScrollPosition::End.offset(content_height(&controller));

    // Small per-frame deltas stay inside the widened cache key
    c.bench_function("visible_attributes_cached_scroll", |b| {
        let mut step = 0u32;
        b.iter(|| {
            step = (step + 1) % 64;
            let rect = Rect::new(0.0, start - f64::from(step) * 3.0, 375.0, VIEWPORT_HEIGHT);
            black_box(controller.visible_attributes(rect, ModelState::BeforeUpdate))
        });
    });
}

fn bench_batch_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_update");
    for items in [100usize, 1_000, 10_000] {
        let source = transcript(1, items);
        let base = controller(&source);
        let mut after = source.clone();
        let path = ItemPath::new(0, items);
        after.insert_item(path, ElementSpec::estimated(375.0, 44.0));
        let changes = [StructuralChange::ItemInsert { path }];

        group.bench_with_input(BenchmarkId::new("append_and_commit", items), &items, |b, _| {
            b.iter_batched(
                || base.clone(),
                |mut controller| {
                    controller
                        .process(&changes, &after)
                        .expect("benchmark batch is consistent");
                    controller.commit();
                    controller
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan_modes, bench_cached_scrolling, bench_batch_update);
criterion_main!(benches);
