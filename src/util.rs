/// Formats a weight with thousands separators, rounding to a whole number
/// unless the value is small and fractional.
pub fn format_weight(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    if value.abs() < 10.0 && value.fract().abs() > f64::EPSILON {
        return format!("{value:.2}");
    }

    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        grouped.push('-');
    }
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Stable hue in `0.0..1.0` for the `index`-th of `count` top-level branches.
pub fn branch_hue(index: usize, count: usize) -> f32 {
    index as f32 / (count + 1) as f32
}
