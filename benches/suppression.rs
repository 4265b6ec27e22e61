use divan::{black_box, Bencher};
use keypoint_bench::harris::{self, HarrisParams};
use keypoint_bench::{filter_keypoints, KeyPoint, Rect, RingBuffer};
use ndarray::Array2;

fn main() {
    divan::main();
}

/// Response map with an isolated peak every `spacing` pixels and a plateau in between.
fn response_map(rows: usize, cols: usize, spacing: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        if row % spacing == 0 && col % spacing == 0 {
            200. + ((row + col) % 50) as f32
        } else if (row / spacing + col / spacing) % 2 == 0 {
            120.
        } else {
            0.
        }
    })
}

#[divan::bench(args = [8, 16, 32])]
fn suppress(bencher: Bencher, spacing: usize) {
    let response = response_map(375, 1242, spacing);
    let params = HarrisParams::default();

    bencher.bench_local(|| black_box(harris::suppress(response.view(), &params)));
}

#[divan::bench]
fn roi_filter(bencher: Bencher) {
    let keypoints: Vec<KeyPoint> = (0..5000)
        .map(|i| KeyPoint::new((i * 7 % 1242) as f32, (i * 13 % 375) as f32, 7.))
        .collect();
    let focus = Rect::new(535, 180, 180, 150);

    bencher.bench_local(|| black_box(filter_keypoints(&keypoints, &focus)));
}

#[divan::bench]
fn ring_buffer_push(bencher: Bencher) {
    bencher.bench_local(|| {
        let mut buffer = RingBuffer::new(2);
        for i in 0..1000 {
            black_box(buffer.push(vec![i; 16]));
        }
        buffer
    });
}
