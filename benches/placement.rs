use cartolabel::cache::LabelCache;
use cartolabel::config::EngineConfig;
use cartolabel::geom::merge_line_network;
use cartolabel::render::SvgCanvas;
use cartolabel::style::{Expression, Feature, OPTION_GROUP, TextSymbolizer};
use cartolabel::theme::Theme;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use geo::{Geometry, LineString, Point, Rect};
use std::hint::black_box;

fn fragmented_streets(streets: usize, fragments: usize) -> Vec<LineString<f64>> {
    let mut lines = Vec::new();
    for street in 0..streets {
        let y = 10.0 + street as f64 * 7.0;
        for fragment in 0..fragments {
            let x0 = fragment as f64 * 12.0;
            lines.push(LineString::from(vec![(x0, y), (x0 + 12.0, y)]));
        }
    }
    lines
}

fn bench_line_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_merge");
    for &fragments in &[8usize, 32, 128] {
        let input = fragmented_streets(10, fragments);
        group.bench_with_input(
            BenchmarkId::from_parameter(fragments),
            &input,
            |b, input| {
                b.iter(|| black_box(merge_line_network(input.clone())));
            },
        );
    }
    group.finish();
}

fn populated_cache(labels: usize) -> LabelCache {
    let mut cache = LabelCache::new(EngineConfig::default());
    cache.start();
    cache.start_layer("poi");
    let symbolizer =
        TextSymbolizer::new(Expression::property("name")).with_option(OPTION_GROUP, "false");
    for i in 0..labels {
        let feature = Feature::new().with("name", format!("Place {i}"));
        let x = 30.0 + (i % 32) as f64 * 38.0;
        let y = 20.0 + (i / 32) as f64 * 22.0;
        cache.put(
            "poi",
            &symbolizer,
            &feature,
            Geometry::Point(Point::new(x, y)),
            None,
        );
    }
    cache.end_layer("poi");
    cache
}

fn bench_paint_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("paint_pass");
    for &labels in &[50usize, 200, 800] {
        group.bench_with_input(BenchmarkId::from_parameter(labels), &labels, |b, &labels| {
            b.iter_batched(
                || populated_cache(labels),
                |mut cache| {
                    let mut canvas = SvgCanvas::new(1280.0, 720.0, Theme::light());
                    let placed = cache
                        .end(&mut canvas, Rect::new((0.0, 0.0), (1280.0, 720.0)))
                        .unwrap();
                    black_box((placed.len(), canvas.finish().len()))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_line_merge, bench_paint_pass);
criterion_main!(benches);
