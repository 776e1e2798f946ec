//! Block compression of mip levels.

use intel_tex_2::bc7;

/// Compress one RGBA8 mip level to BC7.
///
/// Levels whose dimensions are not multiples of 4 are padded by repeating the
/// edge texels. Uses intel_tex_2 (ISPC-based) fast settings.
pub fn compress_bc7(pixels: &[u8], width: u32, height: u32, has_alpha: bool) -> Vec<u8> {
    let w = width.max(1) as usize;
    let h = height.max(1) as usize;

    // Calculate block dimensions (round up to 4x4 blocks)
    let blocks_x = w.div_ceil(4);
    let blocks_y = h.div_ceil(4);
    let mut output = vec![0u8; blocks_x * blocks_y * 16];

    let padded_width = blocks_x * 4;
    let padded_height = blocks_y * 4;
    let input = pad_to_blocks(pixels, w, h, padded_width, padded_height);

    let surface = intel_tex_2::RgbaSurface {
        width: padded_width as u32,
        height: padded_height as u32,
        stride: (padded_width * 4) as u32,
        data: &input,
    };

    let settings = if has_alpha {
        bc7::alpha_fast_settings()
    } else {
        bc7::opaque_fast_settings()
    };
    bc7::compress_blocks_into(&settings, &surface, &mut output);

    output
}

/// Extend an RGBA8 image to the padded size, clamping reads to the last row/column.
fn pad_to_blocks(
    pixels: &[u8],
    w: usize,
    h: usize,
    padded_width: usize,
    padded_height: usize,
) -> Vec<u8> {
    if w == padded_width && h == padded_height {
        return pixels.to_vec();
    }

    let mut padded = vec![0u8; padded_width * padded_height * 4];
    for y in 0..padded_height {
        for x in 0..padded_width {
            let src_idx = (y.min(h - 1) * w + x.min(w - 1)) * 4;
            let dst_idx = (y * padded_width + x) * 4;
            padded[dst_idx..dst_idx + 4].copy_from_slice(&pixels[src_idx..src_idx + 4]);
        }
    }
    padded
}
