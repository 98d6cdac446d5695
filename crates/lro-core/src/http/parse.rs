//! Parse raw HTTP response header lines into `Headers`.

use super::Headers;

/// Parse collected header lines. When redirects were followed, libcurl hands us
/// the headers of every hop; only the block after the last status line is kept.
pub fn parse_header_lines(lines: &[String]) -> Headers {
    let mut headers = Headers::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers = Headers::new();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim(), value.trim());
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_tracking_headers() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 202 Accepted",
            "Location: https://api.example/op/123?api-version=1",
            "Retry-After: 5",
        ]));
        assert_eq!(
            h.get("location"),
            Some("https://api.example/op/123?api-version=1")
        );
        assert_eq!(h.get("retry-after"), Some("5"));
    }

    #[test]
    fn keeps_only_final_hop_after_redirect() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: https://elsewhere/",
            "",
            "HTTP/1.1 200 OK",
            "Content-Type: application/json",
        ]));
        assert_eq!(h.get("location"), None);
        assert_eq!(h.get("content-type"), Some("application/json"));
    }

    #[test]
    fn value_may_contain_colons() {
        let h = parse_header_lines(&lines(&["Operation-Location: https://h:8443/op/1"]));
        assert_eq!(h.get("Operation-Location"), Some("https://h:8443/op/1"));
    }
}
