extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use css_inliner_lib::{css_inline, InlineOptions};

fn bench_large_document(c: &mut Criterion) {
    let mut big_html = String::with_capacity(2_000_000);
    big_html.push_str("<html><head><style>.c0{color:red}</style></head><body><div>");
    for i in 0..10_000 {
        big_html.push_str(&format!("<p class=\"c{}\">Test</p>", i % 10));
    }
    big_html.push_str("</div></body></html>");

    let options = InlineOptions { silent: true };
    c.bench_function("large_document", |b| {
        b.iter(|| css_inline::inline(&big_html, &options))
    });
}

fn bench_many_rules(c: &mut Criterion) {
    let mut css = String::new();
    for i in 0..500 {
        css.push_str(&format!(".c{} {{ margin: {}px }}\n", i, i));
        css.push_str(&format!(".c{}:hover {{ font-size: {}px }}\n", i, i));
    }
    let mut html = format!("<html><head><style>{}</style></head><body>", css);
    for i in 0..500 {
        html.push_str(&format!("<span class=\"c{}\">x</span>", i));
    }
    html.push_str("</body></html>");

    let options = InlineOptions { silent: true };
    c.bench_function("many_rules", |b| b.iter(|| css_inline::inline(&html, &options)));
}

criterion_group!(benches, bench_large_document, bench_many_rules);
criterion_main!(benches);
