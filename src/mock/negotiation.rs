use crate::media_type::essence;

/// Chooses a response media type for an `Accept` header
///
/// Exact matches are tried across all Accept entries first, then `type/*`
/// ranges, then `*/*`. Quality parameters are ignored; entry order decides.
pub fn negotiate<'a>(accept: Option<&str>, available: &[&'a str]) -> Option<&'a str> {
    let first = available.first().copied();

    let accept = accept.map(str::trim).unwrap_or("");
    if accept.is_empty() || accept == "*/*" {
        return first;
    }

    let entries: Vec<String> = accept
        .split(',')
        .map(essence)
        .filter(|entry| !entry.is_empty())
        .collect();

    for entry in &entries {
        if let Some(found) = available.iter().copied().find(|a| essence(a) == *entry) {
            return Some(found);
        }
    }

    for entry in &entries {
        let Some(main) = entry.strip_suffix("/*") else { continue };
        if main == "*" {
            continue;
        }
        let prefix = format!("{}/", main);
        if let Some(found) = available.iter().copied().find(|a| essence(a).starts_with(&prefix)) {
            return Some(found);
        }
    }

    if entries.iter().any(|entry| entry == "*/*") {
        return first;
    }
    None
}
