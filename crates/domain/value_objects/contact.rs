use url::form_urlencoded;

const WHATSAPP_BASE_URL: &str = "https://wa.me";

/// Public address of a profile page, used inside outgoing greetings.
pub fn profile_url(public_base_url: &str, username: &str) -> String {
    format!("{}/profiles/{}", public_base_url.trim_end_matches('/'), username)
}

/// WhatsApp deep link to `phone_number` with a prefilled greeting.
/// Returns `None` when the number has no digits.
pub fn whatsapp_link(phone_number: &str, target_username: &str, actor_profile_url: &str) -> Option<String> {
    let digits: String = phone_number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let greeting = format!(
        "Hi {}! I found your profile on LOVENY. Here's my profile: {}",
        target_username, actor_profile_url
    );
    // byte_serialize emits '+' for spaces and escapes literal '+' as %2B.
    let text: String = form_urlencoded::byte_serialize(greeting.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    Some(format!("{}/{}?text={}", WHATSAPP_BASE_URL, digits, text))
}
