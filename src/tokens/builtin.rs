//! Built-in tokens.
//!
//! Every built-in renders a value or a defined placeholder; a missing header,
//! address, or status never fails a render.

use chrono::{DateTime, Utc};

use super::datetime::DateTimeFormat;
use super::host::HostInfo;
use crate::domain::exchange::split_host_port;
use crate::domain::timeline::elapsed_ms;
use crate::domain::{RequestView, ResponseView};

/// Placeholder for values that are absent or not yet known.
pub const UNRESOLVED: &str = "-";

/// Everything a built-in token may read during one render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub request: &'a RequestView,
    pub response: &'a ResponseView,
    /// Wall clock reading taken once per render.
    pub now: DateTime<Utc>,
    pub host: &'a HostInfo,
}

/// The closed set of tokens every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinToken {
    Method,
    Url,
    Status,
    Level,
    Port,
    RemoteAddr,
    Host,
    Hostname,
    ComputerName,
    ServerIp,
    Query,
    ResponseTime,
    DateTime,
    Time,
    Referrer,
    HttpVersion,
    UserAgent,
    RequestHeader,
    ResponseHeader,
}

impl BuiltinToken {
    pub const ALL: [BuiltinToken; 19] = [
        Self::Method,
        Self::Url,
        Self::Status,
        Self::Level,
        Self::Port,
        Self::RemoteAddr,
        Self::Host,
        Self::Hostname,
        Self::ComputerName,
        Self::ServerIp,
        Self::Query,
        Self::ResponseTime,
        Self::DateTime,
        Self::Time,
        Self::Referrer,
        Self::HttpVersion,
        Self::UserAgent,
        Self::RequestHeader,
        Self::ResponseHeader,
    ];

    /// Name used to reference the token in templates.
    pub fn name(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Url => "url",
            Self::Status => "status",
            Self::Level => "level",
            Self::Port => "port",
            Self::RemoteAddr => "remote-addr",
            Self::Host => "host",
            Self::Hostname => "hostname",
            Self::ComputerName => "computer-name",
            Self::ServerIp => "server-ip",
            Self::Query => "query",
            Self::ResponseTime => "response-time",
            Self::DateTime => "date-time",
            Self::Time => "time",
            Self::Referrer => "referrer",
            Self::HttpVersion => "http-version",
            Self::UserAgent => "user-agent",
            Self::RequestHeader => "req",
            Self::ResponseHeader => "res",
        }
    }

    /// Renders the token against one exchange.
    ///
    /// `arg` is the bracketed template argument, e.g. the header name of
    /// `:req[content-type]` or the sub-format of `:date-time[iso]`.
    pub fn render(self, ctx: &RenderContext<'_>, arg: Option<&str>) -> Option<String> {
        let req = ctx.request;
        let res = ctx.response;

        let value = match self {
            Self::Method => req.method().to_string(),
            Self::Url => req.url().to_string(),
            Self::Status => res
                .status()
                .map(|s| s.as_u16().to_string())
                .unwrap_or_else(unresolved),
            Self::Level => level(res),
            Self::Port => req
                .host_header()
                .and_then(|h| split_host_port(h).1)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .unwrap_or_else(unresolved),
            Self::RemoteAddr => remote_address(req).unwrap_or_else(unresolved),
            Self::Host => req
                .host_header()
                .map(|h| split_host_port(h).0)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .unwrap_or_else(unresolved),
            Self::Hostname => req.hostname().map(str::to_string).unwrap_or_else(unresolved),
            Self::ComputerName => ctx
                .host
                .computer_name()
                .map(str::to_string)
                .unwrap_or_else(unresolved),
            Self::ServerIp => ctx
                .host
                .server_ip()
                .map(|ip| ip.to_string())
                .unwrap_or_else(unresolved),
            Self::Query => req.query().map(str::to_string).unwrap_or_else(unresolved),
            Self::ResponseTime => response_time(req, res).unwrap_or_else(unresolved),
            Self::DateTime => return DateTimeFormat::parse(arg).map(|f| f.render(ctx.now)),
            Self::Time => DateTimeFormat::Time.render(ctx.now),
            Self::Referrer => req
                .header("referer")
                .or_else(|| req.header("referrer"))
                .unwrap_or_else(unresolved),
            Self::HttpVersion => format!("{:?}", req.version()),
            Self::UserAgent => req.header("user-agent").unwrap_or_else(unresolved),
            Self::RequestHeader => arg
                .and_then(|field| req.header(field))
                .unwrap_or_else(unresolved),
            Self::ResponseHeader => arg
                .and_then(|field| res.header(field))
                .unwrap_or_else(unresolved),
        };

        Some(value)
    }
}

/// Client address: `X-Forwarded-For`, then the address captured at
/// interception, then the live peer address. First non-empty wins.
pub fn remote_address(req: &RequestView) -> Option<String> {
    req.header("x-forwarded-for")
        .filter(|v| !v.is_empty())
        .or_else(|| {
            req.captured_remote_address()
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

fn level(res: &ResponseView) -> String {
    let Some(status) = res.status() else {
        return unresolved();
    };

    let code = status.as_u16();
    let level = if code >= 500 {
        "ERROR"
    } else if code >= 400 {
        "WARN"
    } else if code >= 200 {
        "INFO"
    } else {
        "0"
    };

    level.to_string()
}

fn response_time(req: &RequestView, res: &ResponseView) -> Option<String> {
    let start = req.started_at()?;
    let end = res.finished_at()?;
    Some(format!("{:.3}", elapsed_ms(start, end)))
}

fn unresolved() -> String {
    UNRESOLVED.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestTimeline;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, Response, StatusCode, Version};
    use chrono::TimeZone;
    use std::net::SocketAddr;
    use std::time::{Duration, Instant};

    fn host() -> HostInfo {
        HostInfo::new("web-01", Some("10.0.0.5".parse().unwrap()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
    }

    fn request(builder: axum::http::request::Builder) -> RequestView {
        RequestView::from_request(&builder.body(Body::empty()).unwrap())
    }

    fn response(status: StatusCode) -> ResponseView {
        let res = Response::builder()
            .status(status)
            .header("Content-Type", "text/plain")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2")
            .body(Body::from("ok"))
            .unwrap();
        ResponseView::from_response(&res, Instant::now())
    }

    fn render(token: BuiltinToken, req: &RequestView, res: &ResponseView, arg: Option<&str>) -> Option<String> {
        let host = host();
        let ctx = RenderContext {
            request: req,
            response: res,
            now: now(),
            host: &host,
        };
        token.render(&ctx, arg)
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = BuiltinToken::ALL.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BuiltinToken::ALL.len());
    }

    #[test]
    fn test_method_and_url() {
        let req = request(Request::builder().method("DELETE").uri("/people/7?force=1"));
        let res = ResponseView::pending();

        assert_eq!(render(BuiltinToken::Method, &req, &res, None).unwrap(), "DELETE");
        assert_eq!(render(BuiltinToken::Url, &req, &res, None).unwrap(), "/people/7?force=1");
        assert_eq!(render(BuiltinToken::Query, &req, &res, None).unwrap(), "force=1");
    }

    #[test]
    fn test_query_absent() {
        let req = request(Request::builder().uri("/people"));
        assert_eq!(
            render(BuiltinToken::Query, &req, &ResponseView::pending(), None).unwrap(),
            "-"
        );
    }

    #[test]
    fn test_status_pending_and_finished() {
        let req = request(Request::builder().uri("/"));

        assert_eq!(
            render(BuiltinToken::Status, &req, &ResponseView::pending(), None).unwrap(),
            "-"
        );
        assert_eq!(
            render(BuiltinToken::Status, &req, &response(StatusCode::NOT_FOUND), None).unwrap(),
            "404"
        );
    }

    #[test]
    fn test_level_ranges() {
        let req = request(Request::builder().uri("/"));
        let cases = [
            (StatusCode::SERVICE_UNAVAILABLE, "ERROR"),
            (StatusCode::INTERNAL_SERVER_ERROR, "ERROR"),
            (StatusCode::UNAUTHORIZED, "WARN"),
            (StatusCode::PERMANENT_REDIRECT, "INFO"),
            (StatusCode::OK, "INFO"),
            (StatusCode::SWITCHING_PROTOCOLS, "0"),
        ];

        for (status, expected) in cases {
            assert_eq!(
                render(BuiltinToken::Level, &req, &response(status), None).unwrap(),
                expected,
                "status {status}"
            );
        }

        assert_eq!(
            render(BuiltinToken::Level, &req, &ResponseView::pending(), None).unwrap(),
            "-"
        );
    }

    #[test]
    fn test_host_port_hostname() {
        let req = request(Request::builder().uri("/").header("Host", "shop.example.com:8080"));
        let res = ResponseView::pending();

        assert_eq!(render(BuiltinToken::Host, &req, &res, None).unwrap(), "shop.example.com");
        assert_eq!(render(BuiltinToken::Port, &req, &res, None).unwrap(), "8080");
        assert_eq!(render(BuiltinToken::Hostname, &req, &res, None).unwrap(), "shop.example.com");
    }

    #[test]
    fn test_host_tokens_without_host_header() {
        let req = request(Request::builder().uri("/"));
        let res = ResponseView::pending();

        assert_eq!(render(BuiltinToken::Host, &req, &res, None).unwrap(), "-");
        assert_eq!(render(BuiltinToken::Port, &req, &res, None).unwrap(), "-");
        assert_eq!(render(BuiltinToken::Hostname, &req, &res, None).unwrap(), "-");
    }

    #[test]
    fn test_server_identity() {
        let req = request(Request::builder().uri("/"));
        let res = ResponseView::pending();

        assert_eq!(render(BuiltinToken::ComputerName, &req, &res, None).unwrap(), "web-01");
        assert_eq!(render(BuiltinToken::ServerIp, &req, &res, None).unwrap(), "10.0.0.5");
    }

    #[test]
    fn test_remote_addr_prefers_forwarded_for() {
        let mut raw = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "10.0.0.2:4000".parse().unwrap();
        raw.extensions_mut().insert(ConnectInfo(peer));
        let timeline = RequestTimeline::start(Some("10.0.0.3".to_string()));
        let req = RequestView::from_request(&raw).with_timeline(&timeline);

        assert_eq!(
            render(BuiltinToken::RemoteAddr, &req, &ResponseView::pending(), None).unwrap(),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_remote_addr_fallback_order() {
        let mut raw = Request::builder().uri("/").body(Body::empty()).unwrap();
        let peer: SocketAddr = "10.0.0.2:4000".parse().unwrap();
        raw.extensions_mut().insert(ConnectInfo(peer));

        let live_only = RequestView::from_request(&raw);
        assert_eq!(remote_address(&live_only).as_deref(), Some("10.0.0.2"));

        let timeline = RequestTimeline::start(Some("10.0.0.3".to_string()));
        let captured = RequestView::from_request(&raw).with_timeline(&timeline);
        assert_eq!(remote_address(&captured).as_deref(), Some("10.0.0.3"));

        let nothing = request(Request::builder().uri("/"));
        assert_eq!(
            render(BuiltinToken::RemoteAddr, &nothing, &ResponseView::pending(), None).unwrap(),
            "-"
        );
    }

    #[test]
    fn test_response_time() {
        let timeline = RequestTimeline::start(None);
        let raw = Request::builder().uri("/").body(Body::empty()).unwrap();
        let req = RequestView::from_request(&raw).with_timeline(&timeline);

        assert_eq!(
            render(BuiltinToken::ResponseTime, &req, &ResponseView::pending(), None).unwrap(),
            "-"
        );

        let res = Response::new(Body::empty());
        let finished = ResponseView::from_response(
            &res,
            timeline.start_monotonic() + Duration::from_micros(12_345),
        );
        assert_eq!(
            render(BuiltinToken::ResponseTime, &req, &finished, None).unwrap(),
            "12.345"
        );
    }

    #[test]
    fn test_response_time_without_start() {
        let req = request(Request::builder().uri("/"));
        assert_eq!(
            render(BuiltinToken::ResponseTime, &req, &response(StatusCode::OK), None).unwrap(),
            "-"
        );
    }

    #[test]
    fn test_date_time_formats() {
        let req = request(Request::builder().uri("/"));
        let res = ResponseView::pending();

        assert_eq!(
            render(BuiltinToken::DateTime, &req, &res, Some("date")).unwrap(),
            "2024-03-05"
        );
        assert_eq!(
            render(BuiltinToken::DateTime, &req, &res, Some("clf")).unwrap(),
            "05/2/2024:00:00:00 +0000"
        );
        assert_eq!(
            render(BuiltinToken::DateTime, &req, &res, None).unwrap(),
            "Tue, 05 Mar 2024 00:00:00 GMT"
        );
        assert_eq!(render(BuiltinToken::Time, &req, &res, None).unwrap(), "00:00:00");
        assert!(render(BuiltinToken::DateTime, &req, &res, Some("epoch")).is_none());
    }

    #[test]
    fn test_referrer_user_agent_version() {
        let req = request(
            Request::builder()
                .uri("/")
                .version(Version::HTTP_2)
                .header("Referer", "https://example.com/")
                .header("User-Agent", "curl/8.5.0"),
        );
        let res = ResponseView::pending();

        assert_eq!(
            render(BuiltinToken::Referrer, &req, &res, None).unwrap(),
            "https://example.com/"
        );
        assert_eq!(render(BuiltinToken::UserAgent, &req, &res, None).unwrap(), "curl/8.5.0");
        assert_eq!(render(BuiltinToken::HttpVersion, &req, &res, None).unwrap(), "HTTP/2.0");
    }

    #[test]
    fn test_referrer_alternate_spelling_and_absent() {
        let res = ResponseView::pending();

        let req = request(Request::builder().uri("/").header("Referrer", "https://a.example/"));
        assert_eq!(
            render(BuiltinToken::Referrer, &req, &res, None).unwrap(),
            "https://a.example/"
        );

        let req = request(Request::builder().uri("/"));
        assert_eq!(render(BuiltinToken::Referrer, &req, &res, None).unwrap(), "-");
        assert_eq!(render(BuiltinToken::UserAgent, &req, &res, None).unwrap(), "-");
    }

    #[test]
    fn test_request_header_token() {
        let req = request(
            Request::builder()
                .uri("/")
                .header("Accept", "text/html")
                .header("Accept", "application/json"),
        );
        let res = ResponseView::pending();

        assert_eq!(
            render(BuiltinToken::RequestHeader, &req, &res, Some("ACCEPT")).unwrap(),
            "text/html, application/json"
        );
        assert_eq!(
            render(BuiltinToken::RequestHeader, &req, &res, Some("x-request-id")).unwrap(),
            "-"
        );
        assert_eq!(render(BuiltinToken::RequestHeader, &req, &res, None).unwrap(), "-");
    }

    #[test]
    fn test_response_header_token() {
        let req = request(Request::builder().uri("/"));
        let res = response(StatusCode::OK);

        assert_eq!(
            render(BuiltinToken::ResponseHeader, &req, &res, Some("content-length")).unwrap(),
            "2"
        );
        assert_eq!(
            render(BuiltinToken::ResponseHeader, &req, &res, Some("set-cookie")).unwrap(),
            "a=1, b=2"
        );
        assert_eq!(
            render(
                BuiltinToken::ResponseHeader,
                &req,
                &ResponseView::pending(),
                Some("content-type")
            )
            .unwrap(),
            "-"
        );
    }
}
