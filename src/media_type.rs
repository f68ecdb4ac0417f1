/// The `type/subtype` part of a media type, lowercased, without parameters
pub fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// JSON media types: `application/json` and any `+json` structured suffix
pub fn is_json(media_type: &str) -> bool {
    let essence = essence(media_type);
    essence.contains("application/json") || essence.ends_with("+json")
}

/// Whether a concrete media type is covered by a declared range such as
/// `application/*` or `*/*`
pub fn covers(range: &str, media_type: &str) -> bool {
    let range = essence(range);
    let media_type = essence(media_type);

    if range == "*/*" || range == media_type {
        return true;
    }
    match range.strip_suffix("/*") {
        Some(main) => media_type
            .split('/')
            .next()
            .map_or(false, |candidate| candidate == main),
        None => false,
    }
}
