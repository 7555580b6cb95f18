#![allow(dead_code)]

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use kolam_reader::PixelField;

/// White field with black filled dots of `radius` on an `n` x `n` lattice.
pub fn dot_lattice(size: u32, n: i32, spacing: i32, origin: i32, radius: i32) -> GrayImage {
    let mut img = GrayImage::from_pixel(size, size, Luma([255]));
    for r in 0..n {
        for c in 0..n {
            draw_filled_circle_mut(
                &mut img,
                (origin + c * spacing, origin + r * spacing),
                radius,
                Luma([0]),
            );
        }
    }
    img
}

/// White field with one closed square stroke of `width` pixels and no dots.
pub fn square_stroke(size: u32, origin: i32, side: u32, width: u32) -> GrayImage {
    let mut img = GrayImage::from_pixel(size, size, Luma([255]));
    draw_filled_rect_mut(&mut img, Rect::at(origin, origin).of_size(side, side), Luma([0]));
    let inner = side - 2 * width;
    let offset = origin + width as i32;
    draw_filled_rect_mut(&mut img, Rect::at(offset, offset).of_size(inner, inner), Luma([255]));
    img
}

/// Deterministic pseudo-random bytes (LCG), no symmetry by construction.
pub fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        Luma([(state >> 24) as u8])
    })
}

/// Noise mirrored left to right.
pub fn mirrored_noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let base = noise(width, height, seed);
    GrayImage::from_fn(width, height, |x, y| {
        let mx = x.min(width - 1 - x);
        *base.get_pixel(mx, y)
    })
}

pub fn field(img: GrayImage) -> PixelField {
    let (w, h) = img.dimensions();
    PixelField::from_gray(w as usize, h as usize, img.into_raw()).expect("valid gray buffer")
}
