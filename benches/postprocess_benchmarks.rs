use bgremover_pro::{
    config::FolderPreset, OutputFormat, OutputFormatHandler, PostProcessPlan, ProcessingSettings,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};

fn test_image(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let alpha = if (x + y) % 7 == 0 { 0 } else { 255 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, alpha])
    })
}

fn bench_plans(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_process_plan");
    group.sample_size(20);

    let plans = [
        ("resize_50", ProcessingSettings::builder().resize_percent(50).build()),
        ("smooth_2", ProcessingSettings::builder().smoothing_radius(2).build()),
        ("upscale_2", ProcessingSettings::builder().upscale_factor(2).build()),
    ];

    for size in [256_u32, 512] {
        let image = test_image(size);
        for (name, settings) in &plans {
            let Ok(settings) = settings else { continue };
            let plan = PostProcessPlan::from_settings(settings);
            group.bench_with_input(BenchmarkId::new(*name, size), &image, |b, image| {
                b.iter(|| plan.apply(black_box(image.clone())));
            });
        }

        let preset = PostProcessPlan::from_preset(&FolderPreset::default());
        group.bench_with_input(BenchmarkId::new("folder_preset", size), &image, |b, image| {
            b.iter(|| preset.apply(black_box(image.clone())));
        });
    }
    group.finish();
}

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let image = test_image(512);

    for format in [OutputFormat::Png, OutputFormat::Jpeg] {
        group.bench_function(format.display_name(), |b| {
            b.iter(|| OutputFormatHandler::convert_and_encode(black_box(image.clone()), format, 90));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plans, bench_encoding);
criterion_main!(benches);
