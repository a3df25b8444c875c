//! Route template compilation.
//!
//! A template such as `/users/:id/posts/:post` is literal text except for
//! `:name` tokens, which match one or more characters other than `/`. The
//! compiled pattern is anchored at both ends.

use std::collections::HashMap;

use regex::Regex;

use crate::server::error::Error;

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    params: Vec<String>,
}

impl PathPattern {
    /// Compile a route template.
    ///
    /// A `:` not followed by a word character is kept as a literal colon.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoute`] when a parameter name is declared twice.
    pub fn compile(template: &str) -> Result<Self, Error> {
        let mut pattern = String::with_capacity(template.len() + 16);
        pattern.push('^');
        let mut params: Vec<String> = Vec::new();

        let bytes = template.as_bytes();
        let mut literal_start = 0;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b':' {
                i += 1;
                continue;
            }

            let name_start = i + 1;
            let name_end = name_start
                + bytes[name_start..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                    .count();
            if name_end == name_start {
                i += 1;
                continue;
            }

            let name = &template[name_start..name_end];
            if params.iter().any(|p| p == name) {
                return Err(Error::InvalidRoute {
                    template: template.to_string(),
                    reason: format!("parameter :{name} is declared more than once"),
                });
            }

            pattern.push_str(&regex::escape(&template[literal_start..i]));
            pattern.push_str("([^/]+)");
            params.push(name.to_string());

            literal_start = name_end;
            i = name_end;
        }
        pattern.push_str(&regex::escape(&template[literal_start..]));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| Error::InvalidRoute {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            params,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Declared parameter names, in template order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether `path` structurally matches the template.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Capture every declared parameter from `path`.
    ///
    /// Returns `None` when `path` does not match.
    pub fn extract(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    captures
                        .get(i + 1)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}
