pub fn about() -> Vec<String> {
    vec![
        "Scans QR codes and flags links that contain known suspicious keywords."
            .to_string(),
        "\n".to_string(),
        "The check is a plain keyword match. It is not a phishing or malware scanner, \
        no link is ever opened or sent anywhere."
            .to_string(),
        format!(
            "Flagged keywords: {}",
            crate::verdict::FLAGGED_TOKENS.join(", ")
        ),
        format!("Version: {}", env!("CARGO_PKG_VERSION")),
    ]
}
