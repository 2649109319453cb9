//! Colour handling for segment display values.
//!
//! DICOM stores segment colours as `RecommendedDisplayCIELabValue`, a CIELab
//! triple rescaled to the unsigned 16-bit range. Display colours arrive as
//! sRGB bytes from the segmentation representation.

pub type Rgba = [u8; 4];

/// D65 reference white used for the XYZ to Lab step.
const REFERENCE_WHITE: [f64; 3] = [0.950_456, 1.0, 1.088_754];

const SEGMENT_COLOR_LUT: [Rgba; 16] = [
    [221, 84, 84, 255],
    [77, 228, 121, 255],
    [166, 70, 235, 255],
    [189, 180, 116, 255],
    [109, 182, 222, 255],
    [221, 186, 84, 255],
    [84, 221, 114, 255],
    [230, 98, 177, 255],
    [116, 134, 228, 255],
    [228, 150, 77, 255],
    [96, 212, 196, 255],
    [205, 110, 110, 255],
    [152, 230, 90, 255],
    [118, 82, 214, 255],
    [214, 205, 82, 255],
    [82, 156, 214, 255],
];

/// Colour assigned to a segment when neither the representation nor the
/// segment itself carries one. Index 0 is background and fully transparent.
pub fn default_segment_color(segment_index: u16) -> Rgba {
    if segment_index == 0 {
        return [0, 0, 0, 0];
    }
    SEGMENT_COLOR_LUT[(usize::from(segment_index) - 1) % SEGMENT_COLOR_LUT.len()]
}

fn linearize(channel: f64) -> f64 {
    if channel > 0.040_45 {
        ((channel + 0.055) / 1.055).powf(2.4)
    } else {
        channel / 12.92
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008_856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// Converts sRGB in `[0, 1]` to CIELab (L in `[0, 100]`).
pub fn rgb_to_cielab(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb.map(|channel| linearize(channel.clamp(0.0, 1.0)));
    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

    let fx = lab_f(x / REFERENCE_WHITE[0]);
    let fy = lab_f(y / REFERENCE_WHITE[1]);
    let fz = lab_f(z / REFERENCE_WHITE[2]);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Rescales CIELab to the DICOM unsigned 16-bit encoding.
pub fn cielab_to_dicom_lab(lab: [f64; 3]) -> [f64; 3] {
    [
        lab[0] * 65_535.0 / 100.0,
        (lab[1] + 128.0) * 65_535.0 / 255.0,
        (lab[2] + 128.0) * 65_535.0 / 255.0,
    ]
}

pub fn rgb_to_dicom_lab(rgb: [f64; 3]) -> [f64; 3] {
    cielab_to_dicom_lab(rgb_to_cielab(rgb))
}
