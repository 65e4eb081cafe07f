// ── Colour and scale conversions ──
//
// The gateway speaks RGB triples and 0–100 percentages; UIs usually want
// hue/saturation and 0–255 brightness. The HSV math uses the canonical
// hexcone formulas, with hue and saturation in [0, 1] and value on the
// same scale as the RGB input.

/// RGB to HSV. `h` and `s` are in `[0, 1]`, `v` keeps the input scale.
pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let v = maxc;
    if (maxc - minc).abs() < f64::EPSILON {
        return (0.0, 0.0, v);
    }
    let range = maxc - minc;
    let s = range / maxc;
    let rc = (maxc - r) / range;
    let gc = (maxc - g) / range;
    let bc = (maxc - b) / range;
    let h = if (r - maxc).abs() < f64::EPSILON {
        bc - gc
    } else if (g - maxc).abs() < f64::EPSILON {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), s, v)
}

/// HSV to RGB. Inverse of [`rgb_to_hsv`].
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s.abs() < f64::EPSILON {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Truncate a float channel into `0..=255`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// `[h°, s%, v%]` of an RGB triple, each rounded to the nearest integer.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn rgb_to_hsv_percent(rgb: [u8; 3]) -> [u16; 3] {
    let (h, s, v) = rgb_to_hsv(f64::from(rgb[0]), f64::from(rgb[1]), f64::from(rgb[2]));
    [
        (h * 360.0).round() as u16,
        (s * 100.0).round() as u16,
        (v * 100.0 / 255.0).round() as u16,
    ]
}

/// RGB triple for hue in degrees, saturation and value in percent.
pub fn hsv_percent_to_rgb(hue: f64, saturation: f64, value: f64) -> [u8; 3] {
    let (r, g, b) = hsv_to_rgb(hue / 360.0, saturation / 100.0, value * 255.0 / 100.0);
    [channel(r), channel(g), channel(b)]
}

/// 0–100 gateway percentage to a 0–255 UI brightness.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn percent_to_brightness(percent: u8) -> u8 {
    (f64::from(percent.min(100)) * 255.0 / 100.0).round() as u8
}

/// 0–255 UI brightness to a 0–100 gateway percentage.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn brightness_to_percent(brightness: u8) -> u8 {
    (f64::from(brightness) * 100.0 / 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hue_distance(a: u16, b: u16) -> u16 {
        let d = a.abs_diff(b) % 360;
        d.min(360 - d)
    }

    #[test]
    fn primary_colours() {
        assert_eq!(rgb_to_hsv_percent([255, 0, 0]), [0, 100, 100]);
        assert_eq!(rgb_to_hsv_percent([0, 255, 0]), [120, 100, 100]);
        assert_eq!(rgb_to_hsv_percent([0, 0, 255]), [240, 100, 100]);
        assert_eq!(rgb_to_hsv_percent([128, 128, 128]), [0, 0, 50]);
    }

    #[test]
    fn hsv_to_rgb_truncates_channels() {
        assert_eq!(hsv_percent_to_rgb(0.0, 100.0, 100.0), [255, 0, 0]);
        assert_eq!(hsv_percent_to_rgb(60.0, 100.0, 100.0), [255, 255, 0]);
        assert_eq!(hsv_percent_to_rgb(360.0, 100.0, 100.0), [255, 0, 0]);
        assert_eq!(hsv_percent_to_rgb(200.0, 0.0, 100.0), [255, 255, 255]);
    }

    #[test]
    fn hue_saturation_survive_a_round_trip() {
        for hue in (0..=360).step_by(15) {
            for sat in [20_u16, 35, 50, 80, 100] {
                let rgb = hsv_percent_to_rgb(f64::from(hue), f64::from(sat), 100.0);
                let [h, s, v] = rgb_to_hsv_percent(rgb);
                assert!(
                    hue_distance(h, hue) <= 3,
                    "hue {hue} sat {sat}: got {h} via {rgb:?}"
                );
                assert!(s.abs_diff(sat) <= 2, "hue {hue} sat {sat}: got s={s}");
                assert_eq!(v, 100);
            }
        }
    }

    #[test]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    fn low_saturation_hue_stays_within_one_channel_step() {
        // At saturation s% the channels span 2.55 * s levels, so one level
        // of truncation moves the hue by up to 60 / (2.55 * s) degrees.
        for sat in 1_u16..=10 {
            let tolerance = (60.0 / (2.55 * f64::from(sat))).ceil() as u16;
            for hue in 0_u16..360 {
                let rgb = hsv_percent_to_rgb(f64::from(hue), f64::from(sat), 100.0);
                let [h, s, _] = rgb_to_hsv_percent(rgb);
                assert!(
                    hue_distance(h, hue) <= tolerance,
                    "hue {hue} sat {sat}: got {h} via {rgb:?}, tolerance {tolerance}"
                );
                assert_eq!(s, sat, "hue {hue} sat {sat}: got s={s}");
            }
        }
    }

    #[test]
    fn brightness_scales_are_inverse() {
        for pct in 0..=100 {
            assert_eq!(brightness_to_percent(percent_to_brightness(pct)), pct);
        }
        assert_eq!(percent_to_brightness(100), 255);
        assert_eq!(percent_to_brightness(250), 255);
    }
}
