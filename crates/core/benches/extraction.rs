use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use urltitle_core::{TitleSelector, netloc, title_from_partial_html};

fn synthetic_page(head_padding: usize) -> Vec<u8> {
    let mut html = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&"<script>var config = {\"a\": [1, 2, 3]};</script>".repeat(head_padding));
    html.push_str("<title>Benchmark Page Title | Example</title></head><body>");
    html.push_str(&"<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>".repeat(200));
    html.push_str("</body></html>");
    html.into_bytes()
}

fn bench_partial_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("title_from_partial_html");

    for (name, padding) in [("early", 0), ("8KB", 180), ("64KB", 1400)] {
        let page = synthetic_page(padding);
        group.bench_with_input(BenchmarkId::new("title_tag", name), &page, |b, page| {
            b.iter(|| title_from_partial_html(black_box(page), encoding_rs::UTF_8, &TitleSelector::TitleTag))
        });
    }

    let truncated = synthetic_page(180);
    let cut = truncated.windows(9).position(|w| w == b"Benchmark").unwrap_or(truncated.len()) + 9;
    group.bench_function("truncated", |b| {
        b.iter(|| title_from_partial_html(black_box(&truncated[..cut]), encoding_rs::UTF_8, &TitleSelector::TitleTag))
    });

    let selector: TitleSelector = "meta_property(og:title)".parse().unwrap();
    let og = b"<html><head><meta property=\"og:title\" content=\"Open Graph Title\"><title>Plain</title></head>";
    group.bench_function("meta_property", |b| {
        b.iter(|| title_from_partial_html(black_box(og), encoding_rs::UTF_8, &selector))
    });

    group.finish();
}

fn bench_netloc(c: &mut Criterion) {
    let urls = [
        "https://www.example.com/path/to/article?id=1",
        "example.com/x",
        "https://webcache.googleusercontent.com/search?q=cache:https://www.reuters.com/article/abc",
    ];

    c.bench_function("netloc", |b| {
        b.iter(|| {
            for url in urls {
                black_box(netloc(black_box(url)));
            }
        })
    });
}

criterion_group!(benches, bench_partial_html, bench_netloc);
criterion_main!(benches);
