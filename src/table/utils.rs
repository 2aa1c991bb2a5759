/// Markers that read as a missing cell, in addition to the empty string.
const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 1) Turn a raw CSV field into a cell: `None` if empty or an NA marker.
pub fn clean_cell(raw: &str) -> Option<String> {
    if raw.is_empty() || NA_MARKERS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// 2) Coerce a cell to an integer for summing. Anything non-numeric is 0.
///
/// Decimal text (`"10.0"`) is truncated toward zero; non-finite values are 0.
pub fn coerce_int(cell: Option<&str>) -> i64 {
    let Some(s) = cell.map(str::trim) else {
        return 0;
    };
    if let Ok(v) = s.parse::<i64>() {
        return v;
    }
    match s.parse::<f64>() {
        // `as` saturates at the i64 bounds
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

/// 3) Render an integer with `,` thousands separators.
pub fn format_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_maps_na_markers_to_none() {
        assert_eq!(clean_cell(""), None);
        assert_eq!(clean_cell("NA"), None);
        assert_eq!(clean_cell("null"), None);
        assert_eq!(clean_cell("Widget"), Some("Widget".to_string()));
        // whitespace is data, not a marker
        assert_eq!(clean_cell(" "), Some(" ".to_string()));
    }

    #[test]
    fn coerce_int_handles_mixed_cells() {
        assert_eq!(coerce_int(Some("42")), 42);
        assert_eq!(coerce_int(Some(" -7 ")), -7);
        assert_eq!(coerce_int(Some("10.0")), 10);
        assert_eq!(coerce_int(Some("3.9")), 3);
        assert_eq!(coerce_int(Some("abc")), 0);
        assert_eq!(coerce_int(Some("inf")), 0);
        assert_eq!(coerce_int(None), 0);
    }

    #[test]
    fn format_thousands_groups_digits() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(15000), "15,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-1234), "-1,234");
        assert_eq!(format_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }
}
