/// Strips markup tags, quotes and control characters from scanner or API text.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '"' | '\'' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// True when the barcode is a plain run of digits, the only shape worth
/// sending to an external product catalog.
pub fn is_numeric_barcode(barcode: &str) -> bool {
    !barcode.is_empty() && barcode.bytes().all(|b| b.is_ascii_digit())
}
