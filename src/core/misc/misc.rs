use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Seconds elapsed since the first call in this process.
pub fn time_dt() -> f64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    return epoch.elapsed().as_secs_f64();
}

#[inline]
pub fn gamma_correct(value: f32) -> f32 {
    if value <= 0.0031308 {
        return 12.92 * value;
    } else {
        return 1.055 * f32::powf(value, 1.0 / 2.4) - 0.055;
    }
}

#[inline]
pub fn saturate(value: f32) -> f32 {
    return value.clamp(0.0, 1.0);
}

#[inline]
pub fn float_to_byte(value: f32) -> u8 {
    return f32::clamp(255.0 * value + 0.5, 0.0, 255.0) as u8;
}

#[inline]
pub fn align_up(offset: usize, alignment: usize) -> usize {
    return (offset + alignment - 1) / alignment * alignment;
}

#[inline]
pub fn divide_up(x: i32, y: i32) -> i32 {
    return (x + y - 1) / y;
}
