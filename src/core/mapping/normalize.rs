//! Per-field normalization rules
//!
//! Deterministic vocabulary and format rules applied while assembling output
//! lines. These reproduce the downstream consumer's expectations exactly,
//! including the fixed 30-minute discharge estimate.

/// Map the free-text insurance state to its numeric code. Unknown or empty
/// input defaults to "1".
pub fn normalize_insurance_state(value: &str) -> &'static str {
    match value.to_uppercase().as_str() {
        "ASEGURADO" => "1",
        "NO ASEGURADO" => "2",
        "VEHICULO FANTASMA" | "VEHICULO EN FUGA" => "3",
        "POLIZA FALSA" => "4",
        "ASEGURADO D.2497" => "6",
        "NO ASEGURADO - PROPIETARIO INDETERMINADO" => "7",
        "NO ASEGURADO - SIN PLACA" => "8",
        _ => "1",
    }
}

/// Map the accident-victim condition to its numeric code. Defaults to "1".
pub fn normalize_condition(value: &str) -> &'static str {
    match value.to_uppercase().as_str() {
        "CONDUCTOR" => "1",
        "PEATON" => "2",
        "OCUPANTE" => "3",
        "CICLISTA" => "4",
        _ => "1",
    }
}

/// Document types are carried as their first two characters, except the
/// temporary-permit code "PPT" which the consumer expects as "PT".
pub fn normalize_doc_type(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed == "PPT" {
        return "PT".to_string();
    }
    trimmed.chars().take(2).collect()
}

/// Render an ISO-leading date (`YYYY-MM-DD...`) as `dd/mm/yyyy`. Anything
/// that doesn't split into three dash-separated parts renders blank.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let head: String = value.chars().take(10).collect();
    let parts: Vec<&str> = head.split('-').collect();
    if parts.len() != 3 {
        return String::new();
    }
    let year: u32 = parts[0].parse().unwrap_or(0);
    let month: u32 = parts[1].parse().unwrap_or(0);
    let day: u32 = parts[2].parse().unwrap_or(0);
    format!("{day:02}/{month:02}/{year:02}")
}

/// Discharge time estimate: admission plus 30 minutes, clock wrapping at
/// 24:00. Empty admission renders "00:00". This is a fixed heuristic, not a
/// real discharge time.
pub fn shift_discharge_time(admission: &str) -> String {
    if admission.is_empty() {
        return "00:00".to_string();
    }
    let head: String = admission.chars().take(5).collect();
    let mut parts = head.split(':');
    let mut hours: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let mut minutes: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    if minutes > 29 {
        minutes -= 30;
        hours += 1;
        if hours > 23 {
            hours = 0;
        }
    } else {
        minutes += 30;
    }
    format!("{hours:02}:{minutes:02}")
}

/// Split the stored `code-description` service rendering into its parts.
pub fn split_service(value: &str) -> (String, String) {
    let mut parts = value.splitn(2, '-');
    let code = parts.next().unwrap_or("").trim().to_string();
    let description = parts.next().unwrap_or("").trim().to_string();
    (code, description)
}

/// Quantity must be a positive number; anything else defaults to "1".
pub fn normalize_quantity(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(quantity) if quantity > 0.0 => value.trim().to_string(),
        _ => "1".to_string(),
    }
}

/// Unit value falls back to the invoice total when absent or non-numeric.
pub fn normalize_unit_value(value: &str, total: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.parse::<f64>().is_err() {
        total.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Nth whitespace-separated word of a free-text name field.
pub fn extract_word(text: &str, index: usize) -> String {
    text.split_whitespace()
        .nth(index)
        .unwrap_or("")
        .to_string()
}

/// First five characters (`HH:MM` of a stored time).
pub fn clock_prefix(value: &str) -> String {
    value.chars().take(5).collect()
}

pub fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        value.chars().take(max).collect()
    } else {
        value.to_string()
    }
}

/// Two-character department prefix of a five-digit locality code.
pub fn department_prefix(code: &str) -> String {
    code.chars().take(2).collect()
}

/// Three-character municipality suffix of a five-digit locality code.
pub fn municipality_suffix(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let start = chars.len().saturating_sub(3);
    chars[start..].iter().collect()
}

/// Municipality digits as stored in the legacy claim row: characters 2..5 of
/// the combined locality code.
pub fn municipality_mid(code: &str) -> String {
    code.chars().skip(2).take(3).collect()
}
