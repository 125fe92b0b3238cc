/// Local-format phone as expected by the partner.
///
/// Keeps ASCII digits only, then drops a leading `55` country code while the
/// number is longer than 11 digits. The result is a fixed point, so applying
/// the function twice changes nothing.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    let mut local = digits.as_str();
    while local.len() > 11 && local.starts_with("55") {
        local = &local[2..];
    }
    local.to_string()
}
