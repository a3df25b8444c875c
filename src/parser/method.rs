//! Route method groups.
//!
//! Requests keep their method as raw text. A `Method` only names one of the
//! four groups the router keeps, so anything else is looked up, fails to
//! convert and finds no route.

use std::fmt;
use std::str::FromStr;

use crate::parser::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
}

impl Method {
    /// Every group, in the order registered endpoints are listed.
    pub const ALL: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

    /// The method token as it appears on the request line.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Method tokens are case-sensitive.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str() == token)
            .ok_or_else(|| Error::InvalidMethod(token.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
