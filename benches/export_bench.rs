use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slidewright::extract::{extract_slide, RawNode, RawSlide, Rect};
use slidewright::pptx::build_pptx;
use slidewright::rendering::measure_slide;
use slidewright::theme::Theme;
use slidewright::Viewport;
use std::collections::BTreeMap;

// A dense slide: a heading plus a grid of stat boxes and text blocks.
fn raw_slide() -> RawSlide {
    let mut nodes = vec![RawNode {
        type_tag: "heading".to_string(),
        text: "Quarterly   review\n".to_string(),
        rect: Rect { x: 96.0, y: 54.0, width: 1200.0, height: 120.0 },
        attrs: BTreeMap::new(),
    }];
    for i in 0..40 {
        let col = (i % 8) as f64;
        let row = (i / 8) as f64;
        let mut attrs = BTreeMap::new();
        attrs.insert("value".to_string(), format!("{}%", i * 2));
        nodes.push(RawNode {
            type_tag: if i % 2 == 0 { "stat-box" } else { "text" }.to_string(),
            text: format!("Metric {}\nsecond line", i),
            rect: Rect { x: 96.0 + col * 220.0, y: 220.0 + row * 160.0, width: 200.0, height: 140.0 },
            attrs,
        });
    }
    RawSlide {
        container: Some(Rect { x: 0.0, y: 0.0, width: 1920.0, height: 1080.0 }),
        layout: Some("grid".to_string()),
        background: None,
        nodes,
    }
}

fn static_html() -> String {
    let mut html = String::from(r#"<section data-export-slide style="width:1920px;height:1080px">"#);
    for i in 0..40 {
        html.push_str(&format!(
            r#"<div data-export-type="text" style="position:absolute;left:{}px;top:{}px;width:200px;height:140px">Block {}</div>"#,
            96 + (i % 8) * 220,
            220 + (i / 8) * 160,
            i
        ));
    }
    html.push_str("</section>");
    html
}

fn bench_extract(c: &mut Criterion) {
    let raw = raw_slide();
    c.bench_function("extract_slide", |b| b.iter(|| extract_slide(black_box(&raw))));

    let document = scraper::Html::parse_document(&static_html());
    c.bench_function("measure_static_slide", |b| {
        b.iter(|| measure_slide(black_box(&document), 0, Viewport::default()))
    });
}

fn bench_package(c: &mut Criterion) {
    let slide = extract_slide(&raw_slide());
    let slides = vec![slide; 12];
    let theme = Theme::lookup("slate").expect("theme");
    c.bench_function("build_pptx_12_slides", |b| {
        b.iter(|| build_pptx(black_box(&slides), theme, "bench").expect("package"))
    });
}

criterion_group!(benches, bench_extract, bench_package);
criterion_main!(benches);
