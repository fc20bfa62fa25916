//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::parser::{
        normalize_path, parse_cookies, parse_header_line, parse_request, parse_request_head, Error,
        HttpRequest, Method,
    };

    const INDEX: &str = "index.html";

    #[test]
    fn test_parse_simple_get_request() {
        let result = parse_request_head("GET /index.html HTTP/1.1", &["Host: example.com"], INDEX).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/index.html");
        assert_eq!(result.request_line, "GET /index.html HTTP/1.1");
        assert_eq!(result.headers.get("host").unwrap(), "example.com");
    }

    #[test]
    fn test_header_keys_are_lowercased() {
        let lines = ["Host: example.com", "User-Agent: test", "ACCEPT: */*", "X-Custom-Thing: 1"];
        let result = parse_request_head("GET / HTTP/1.1", &lines, INDEX).unwrap();
        assert_eq!(result.headers.len(), 4);
        assert!(result.headers.keys().all(|k| *k == k.to_lowercase()));
        assert_eq!(result.headers.get("accept").unwrap(), "*/*");
        assert_eq!(result.header("User-Agent"), Some("test"));
        assert!(result.has_header("X-CUSTOM-THING"));
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let lines = ["Accept: text/plain", "accept: text/html"];
        let result = parse_request_head("GET /a HTTP/1.1", &lines, INDEX).unwrap();
        assert_eq!(result.header("accept"), Some("text/html"));
    }

    #[test]
    fn test_header_value_keeps_everything_after_first_delimiter() {
        let (key, value) = parse_header_line("Referer: http://x.test: 8080/").unwrap();
        assert_eq!(key, "referer");
        assert_eq!(value, "http://x.test: 8080/");
    }

    #[test]
    fn test_all_supported_methods() {
        for method in Method::ALL {
            let line = format!("{method} /thing HTTP/1.1");
            let result = parse_request_head::<&str>(&line, &[], INDEX).unwrap();
            assert_eq!(result.method, method);
        }
    }

    #[test]
    fn test_unsupported_method() {
        let result = parse_request_head("OPTIONS /index.html HTTP/1.1", &["Host: example.com"], INDEX);
        assert!(matches!(result, Err(Error::UnsupportedMethod(ref m)) if m == "OPTIONS"));
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let result = parse_request_head::<&str>("get /index.html HTTP/1.1", &[], INDEX);
        assert_eq!(result, Err(Error::UnsupportedMethod("get".to_string())));
    }

    #[test]
    fn test_missing_path_is_bad_request() {
        let result = parse_request_head::<&str>("GET", &[], INDEX);
        assert!(matches!(result, Err(Error::BadRequest(ref l)) if l == "GET"));

        let result = parse_request_head::<&str>("GET  /double-space HTTP/1.1", &[], INDEX);
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_bad_request_is_reported_before_method() {
        let result = parse_request_head::<&str>("BREW", &[], INDEX);
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_malformed_header_aborts_request() {
        let lines = ["Host: example.com", "InvalidHeader", "Accept: */*"];
        let result = parse_request_head("GET /index.html HTTP/1.1", &lines, INDEX);
        assert_eq!(result, Err(Error::MalformedHeader("InvalidHeader".to_string())));
    }

    #[test]
    fn test_header_without_space_after_colon_is_malformed() {
        let result = parse_header_line("Host:example.com");
        assert!(matches!(result, Err(Error::MalformedHeader(_))));
    }

    #[test]
    fn test_empty_header_section() {
        let result = parse_request_head::<&str>("GET /index.html HTTP/1.1", &[], INDEX).unwrap();
        assert!(result.headers.is_empty());
        assert!(result.cookies.is_empty());
    }

    #[test]
    fn test_cookies_mirror_cookie_header() {
        let lines = ["Host: example.com", "Cookie: visits=3; theme=dark; session=a=b"];
        let result = parse_request_head("GET /index.html HTTP/1.1", &lines, INDEX).unwrap();

        let expected: HashMap<String, String> = [
            ("visits", "3"),
            ("theme", "dark"),
            ("session", "a=b"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(result.cookies, expected);
        assert_eq!(result.cookie("theme"), Some("dark"));
    }

    #[test]
    fn test_cookie_without_value() {
        let result = parse_request_head("GET /index.html HTTP/1.1", &["Cookie: flag"], INDEX).unwrap();
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookie("flag"), Some(""));
    }

    #[test]
    fn test_cookies_ignore_other_headers() {
        let lines = ["Set-Cookie: a=1", "X-Cookie: b=2"];
        let result = parse_request_head("GET /index.html HTTP/1.1", &lines, INDEX).unwrap();
        assert!(result.cookies.is_empty());
    }

    #[test]
    fn test_parse_cookies_directly() {
        let cookies = parse_cookies("a=1; b; c=");
        assert_eq!(cookies.get("a").unwrap(), "1");
        assert_eq!(cookies.get("b").unwrap(), "");
        assert_eq!(cookies.get("c").unwrap(), "");
    }

    #[test]
    fn test_trailing_slash_expands_to_index_page() {
        let result = parse_request_head::<&str>("GET / HTTP/1.1", &[], INDEX).unwrap();
        assert_eq!(result.path, "/index.html");

        let result = parse_request_head::<&str>("GET /docs/ HTTP/1.1", &[], "home.htm").unwrap();
        assert_eq!(result.path, "/docs/home.htm");
    }

    #[test]
    fn test_normalize_path_leaves_files_alone() {
        assert_eq!(normalize_path("/a/b.html", INDEX), "/a/b.html");
        assert_eq!(normalize_path("/a/", INDEX), "/a/index.html");
    }

    #[test]
    fn test_parse_request_from_bytes() {
        let request = b"\r\nPOST /form HTTP/1.1\r\nHost: example.com\r\nContent-Length: 0\r\n\r\nbody";
        let result = parse_request(request, INDEX).unwrap();
        assert_eq!(result.method, Method::POST);
        assert_eq!(result.path, "/form");
        assert_eq!(result.headers.len(), 2);
        assert_eq!(result.header("content-length"), Some("0"));
    }

    #[test]
    fn test_parse_request_empty_input() {
        assert!(matches!(parse_request(b"", INDEX), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_new_lowercases_header_names() {
        let headers = vec![("Cookie".to_string(), "k=v".to_string())];
        let request = HttpRequest::new(Method::DELETE, "/x", "DELETE /x HTTP/1.1", headers);
        assert_eq!(request.header("cookie"), Some("k=v"));
        assert_eq!(request.cookie("k"), Some("v"));
    }
}
