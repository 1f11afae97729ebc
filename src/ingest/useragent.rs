/// User-agent classifier: maps a raw User-Agent string to normalized
/// browser and operating system labels via substring matching.
///
/// Classification is total — anything unrecognized (including the empty
/// string) falls back to the default labels below.

/// Label used when no browser family is recognized.
pub const OTHER_BROWSER: &str = "Other";

/// Label used when no operating system is recognized.
pub const UNKNOWN_OS: &str = "Unknown";

/// Browser and OS labels for one user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub browser: String,
    pub os: String,
}

/// Classify a User-Agent string. Never fails; unrecognized input yields
/// `Other` / `Unknown`.
pub fn classify(ua: &str) -> Classification {
    Classification {
        browser: detect_browser(ua).unwrap_or(OTHER_BROWSER).to_string(),
        os: detect_os(ua).unwrap_or(UNKNOWN_OS).to_string(),
    }
}

fn detect_browser(ua: &str) -> Option<&'static str> {
    // Order matters: check more specific patterns first
    if ua.contains("Edg/") || ua.contains("Edge/") {
        Some("Edge")
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        Some("Opera")
    } else if ua.contains("Chrome/") && !ua.contains("Chromium/") {
        Some("Chrome")
    } else if ua.contains("Chromium/") {
        Some("Chromium")
    } else if ua.contains("Safari/") && !ua.contains("Chrome/") {
        Some("Safari")
    } else if ua.contains("Firefox/") {
        Some("Firefox")
    } else {
        None
    }
}

fn detect_os(ua: &str) -> Option<&'static str> {
    if ua.contains("Windows") {
        Some("Windows")
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iOS") {
        // Check iOS before macOS since iPhone UAs contain "Mac OS X"
        Some("iOS")
    } else if ua.contains("Mac OS X") || ua.contains("macOS") {
        Some("macOS")
    } else if ua.contains("Android") {
        Some("Android")
    } else if ua.contains("CrOS") {
        Some("Chrome OS")
    } else if ua.contains("Linux") {
        Some("Linux")
    } else {
        None
    }
}
