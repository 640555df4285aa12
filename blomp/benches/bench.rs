use blomp::{
    codec::{deserialize, serialize},
    header::FileHeader,
    BlockTreeDesc, Image, Pixel,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn test_image(width: u32, height: u32) -> Image {
    let mut img = Image::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let fx = x as f32 / width as f32;
            let fy = y as f32 / height as f32;
            let ring = ((fx - 0.5).powi(2) + (fy - 0.5).powi(2)).sqrt();
            img.set(x, y, Pixel::new(fx, fy, (ring * 8.0).fract()));
        }
    }
    img
}

fn build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build tree");
    let img = test_image(512, 512);
    let pixel_count = (img.width() * img.height()) as u64;

    for max_depth in [4, 6, 8] {
        let desc = BlockTreeDesc::new(max_depth, 0.02).unwrap();

        group.throughput(criterion::Throughput::Elements(pixel_count));
        group.bench_with_input(BenchmarkId::new("sequential", max_depth), &desc, |b, desc| {
            b.iter(|| blomp::build_tree(&img, desc).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("parallel", max_depth), &desc, |b, desc| {
            b.iter(|| blomp::build_tree_parallel(&img, desc).unwrap())
        });
    }
}

fn codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let img = test_image(512, 512);

    for threshold in [0.0, 0.005, 0.05] {
        let desc = BlockTreeDesc::new(6, threshold).unwrap();
        let tree = blomp::build_tree(&img, &desc).unwrap();
        let stream = serialize(&tree).unwrap();
        let header = FileHeader::new(img.width(), img.height(), desc.max_depth);

        group.throughput(criterion::Throughput::Elements(tree.node_count()));
        group.bench_with_input(BenchmarkId::new("serialize", threshold), &tree, |b, tree| {
            b.iter(|| serialize(tree).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("deserialize", threshold), &stream, |b, stream| {
            b.iter(|| deserialize(&header, &mut stream.clone()).unwrap())
        });
    }
}

criterion_group!(benches, build, codec);
criterion_main!(benches);
