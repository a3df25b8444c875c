//! The closed set of header fields the parser keeps.

use std::fmt;

/// A recognized request header field.
///
/// Matching is case-sensitive, with `host` accepted as an alias for `Host`.
/// Every other field name is dropped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Host,
    UserAgent,
    Accept,
    ContentType,
    Authorization,
    AcceptEncoding,
    ContentLength,
    Referer,
    Cookie,
    Origin,
    CacheControl,
    XForwardedFor,
    XRequestedWith,
    Connection,
}

impl HeaderField {
    /// Look up a field by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "Host" | "host" => HeaderField::Host,
            "User-Agent" => HeaderField::UserAgent,
            "Accept" => HeaderField::Accept,
            "Content-Type" => HeaderField::ContentType,
            "Authorization" => HeaderField::Authorization,
            "Accept-Encoding" => HeaderField::AcceptEncoding,
            "Content-Length" => HeaderField::ContentLength,
            "Referer" => HeaderField::Referer,
            "Cookie" => HeaderField::Cookie,
            "Origin" => HeaderField::Origin,
            "Cache-Control" => HeaderField::CacheControl,
            "X-Forwarded-For" => HeaderField::XForwardedFor,
            "X-Requested-With" => HeaderField::XRequestedWith,
            "Connection" => HeaderField::Connection,
            _ => return None,
        };
        Some(field)
    }

    /// The canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderField::Host => "Host",
            HeaderField::UserAgent => "User-Agent",
            HeaderField::Accept => "Accept",
            HeaderField::ContentType => "Content-Type",
            HeaderField::Authorization => "Authorization",
            HeaderField::AcceptEncoding => "Accept-Encoding",
            HeaderField::ContentLength => "Content-Length",
            HeaderField::Referer => "Referer",
            HeaderField::Cookie => "Cookie",
            HeaderField::Origin => "Origin",
            HeaderField::CacheControl => "Cache-Control",
            HeaderField::XForwardedFor => "X-Forwarded-For",
            HeaderField::XRequestedWith => "X-Requested-With",
            HeaderField::Connection => "Connection",
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
