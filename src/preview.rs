//! Raster PNG preview of a reconstruction, drawn with plotters.

use plotters::prelude::*;

use crate::config::ReconstructConfig;
use crate::curves::Curve;
use crate::dots::Dot;
use crate::reconstruct::CanvasTransform;

/// Parse `#rrggbb`; anything else falls back to `default`.
fn parse_hex(color: &str, default: RGBColor) -> RGBColor {
    let Some(hex) = color.strip_prefix('#') else {
        return default;
    };
    if hex.len() != 6 {
        return default;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => RGBColor(r, g, b),
        _ => default,
    }
}

/// Rasterises the canonical scene in-memory as an RGBA pixel buffer of
/// `canvas_size` x `canvas_size`, matching what the SVG describes.
pub fn render_preview_rgba(
    dots: &[Dot],
    curves: &[Curve],
    source_width: usize,
    source_height: usize,
    config: &ReconstructConfig,
) -> Result<Vec<u8>, String> {
    let size = config.canvas_size;
    if size == 0 {
        return Ok(Vec::new());
    }
    let pixel_count = (size as usize)
        .checked_mul(size as usize)
        .ok_or_else(|| "canvas_size overflow".to_string())?;

    let background = parse_hex(&config.background, RGBColor(254, 243, 199));
    let brush = parse_hex(&config.brush, RGBColor(146, 64, 14));
    let tf = CanvasTransform::new(source_width, source_height, size);
    let to_px = |p: (i32, i32)| {
        let (x, y) = tf.apply(p);
        (x.round() as i32, y.round() as i32)
    };

    let mut rgb = vec![255u8; pixel_count * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (size, size)).into_drawing_area();
        root.fill(&background).map_err(|e| e.to_string())?;

        let stroke = brush.stroke_width(config.stroke_width.round().max(1.0) as u32);
        for curve in curves {
            let path: Vec<(i32, i32)> = curve.points().iter().map(|&p| to_px(p)).collect();
            root.draw(&PathElement::new(path, stroke))
                .map_err(|e| e.to_string())?;
        }

        for d in dots {
            root.draw(&Circle::new(to_px((d.x, d.y)), config.dot_radius, brush.filled()))
                .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    let mut rgba = vec![255u8; pixel_count * 4];
    for i in 0..pixel_count {
        rgba[i * 4] = rgb[i * 3];
        rgba[i * 4 + 1] = rgb[i * 3 + 1];
        rgba[i * 4 + 2] = rgb[i * 3 + 2];
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_with_fallback() {
        let fallback = RGBColor(1, 2, 3);
        let c = parse_hex("#92400e", fallback);
        assert_eq!((c.0, c.1, c.2), (0x92, 0x40, 0x0e));
        let bad = parse_hex("brown", fallback);
        assert_eq!((bad.0, bad.1, bad.2), (1, 2, 3));
    }

    #[test]
    fn dot_is_painted_at_scaled_position() {
        let cfg = ReconstructConfig::default();
        let dots = [Dot {
            x: 50,
            y: 50,
            radius: 5,
            votes: 30,
        }];
        let rgba = render_preview_rgba(&dots, &[], 100, 100, &cfg).unwrap();
        assert_eq!(rgba.len(), 400 * 400 * 4);
        let at = |x: usize, y: usize| {
            let i = (y * 400 + x) * 4;
            (rgba[i], rgba[i + 1], rgba[i + 2])
        };
        assert_eq!(at(200, 200), (0x92, 0x40, 0x0e));
        assert_eq!(at(5, 5), (0xfe, 0xf3, 0xc7));
    }
}
