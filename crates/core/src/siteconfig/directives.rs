use crate::error::{Result, UrlTitleError};
use crate::siteconfig::selector::TitleSelector;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Represents a single site override directive
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// URL rewriting (paired, applied in order)
    UrlPattern(String),
    UrlReplacement(String),

    /// Title rewriting (paired, applied in order)
    TitlePattern(String),
    TitleReplacement(String),

    /// HTTP configuration
    UserAgent(String),
    HttpHeader(String, String),

    /// Extraction
    TitleSelector(String),
    RetryTitle(String),

    /// Behavior options
    Webcache(bool),
    SubstituteUrlWithTitle(bool),
}

/// A compiled `(pattern, replacement)` pair
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl RewriteRule {
    /// Apply the rule, replacing every match
    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, self.replacement.as_str()).into_owned()
    }
}

impl PartialEq for RewriteRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.replacement == other.replacement
    }
}

/// Per-host override entry; every field is optional and an absent field
/// keeps the default behavior for that concern only
#[derive(Debug, Clone, Default)]
pub struct SiteOverride {
    /// URL rewrite rules (first changing rule wins)
    pub url_rewrites: Vec<RewriteRule>,
    /// Title rewrite rules (all applied in order)
    pub title_rewrites: Vec<RewriteRule>,

    pub user_agent: Option<String>,
    pub http_headers: BTreeMap<String, String>,

    /// Custom title selector replacing the `<title>` tag
    pub title_selector: Option<TitleSelector>,
    /// Placeholder titles that warrant another fetch
    pub retry_title: Option<RetryPattern>,

    pub webcache: Option<bool>,
    pub substitute_url_with_title: Option<bool>,

    pending_url_pattern: Option<Regex>,
    pending_title_pattern: Option<Regex>,
}

/// Regex wrapper comparable by source text
#[derive(Debug, Clone)]
pub struct RetryPattern(pub Regex);

impl PartialEq for RetryPattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl SiteOverride {
    /// Create a new empty override entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directive to this entry
    ///
    /// Patterns are compiled here; a replacement must follow its pattern.
    pub fn add_directive(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::UrlPattern(pattern) => {
                if self.pending_url_pattern.is_some() {
                    return Err(site_error("url_pattern without url_replacement"));
                }
                self.pending_url_pattern = Some(compile(&pattern)?);
            }
            Directive::UrlReplacement(replacement) => {
                let pattern = self
                    .pending_url_pattern
                    .take()
                    .ok_or_else(|| site_error("url_replacement without preceding url_pattern"))?;
                self.url_rewrites.push(RewriteRule { pattern, replacement });
            }
            Directive::TitlePattern(pattern) => {
                if self.pending_title_pattern.is_some() {
                    return Err(site_error("title_pattern without title_replacement"));
                }
                self.pending_title_pattern = Some(compile(&pattern)?);
            }
            Directive::TitleReplacement(replacement) => {
                let pattern = self
                    .pending_title_pattern
                    .take()
                    .ok_or_else(|| site_error("title_replacement without preceding title_pattern"))?;
                self.title_rewrites.push(RewriteRule { pattern, replacement });
            }
            Directive::UserAgent(agent) => self.user_agent = Some(agent),
            Directive::HttpHeader(name, value) => {
                if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(&value).is_err() {
                    return Err(site_error(&format!("Invalid HTTP header {}: {}", name, value)));
                }
                self.http_headers.insert(name, value);
            }
            Directive::TitleSelector(expr) => self.title_selector = Some(expr.parse()?),
            Directive::RetryTitle(pattern) => self.retry_title = Some(RetryPattern(compile(&pattern)?)),
            Directive::Webcache(value) => self.webcache = Some(value),
            Directive::SubstituteUrlWithTitle(value) => self.substitute_url_with_title = Some(value),
        }
        Ok(())
    }

    /// Check that every pattern got its replacement
    pub fn finish(&self) -> Result<()> {
        if self.pending_url_pattern.is_some() {
            return Err(site_error("url_pattern without url_replacement"));
        }
        if self.pending_title_pattern.is_some() {
            return Err(site_error("title_pattern without title_replacement"));
        }
        Ok(())
    }

    /// Merge another entry into this one
    /// Rules accumulate; scalar options from `other` take precedence
    pub fn merge(&mut self, other: &SiteOverride) {
        self.url_rewrites.extend(other.url_rewrites.iter().cloned());
        self.title_rewrites.extend(other.title_rewrites.iter().cloned());

        if other.user_agent.is_some() {
            self.user_agent.clone_from(&other.user_agent);
        }
        for (name, value) in &other.http_headers {
            self.http_headers.insert(name.clone(), value.clone());
        }
        if other.title_selector.is_some() {
            self.title_selector.clone_from(&other.title_selector);
        }
        if other.retry_title.is_some() {
            self.retry_title.clone_from(&other.retry_title);
        }
        if other.webcache.is_some() {
            self.webcache = other.webcache;
        }
        if other.substitute_url_with_title.is_some() {
            self.substitute_url_with_title = other.substitute_url_with_title;
        }
    }

    /// Apply the first URL rule that matches and changes the URL
    pub fn rewrite_url(&self, url: &str) -> Option<String> {
        self.url_rewrites.iter().find_map(|rule| {
            let rewritten = rule.apply(url);
            (rewritten != url).then_some(rewritten)
        })
    }

    /// Apply every title rule in order
    pub fn rewrite_title(&self, title: &str) -> String {
        let mut title = title.to_string();
        for rule in &self.title_rewrites {
            let rewritten = rule.apply(&title);
            if rewritten != title {
                tracing::info!("Substituted title \"{}\" with \"{}\".", title, rewritten);
                title = rewritten;
            }
        }
        title
    }

    /// Whether a title is a known placeholder
    pub fn is_placeholder_title(&self, title: &str) -> bool {
        self.retry_title.as_ref().is_some_and(|p| p.0.is_match(title))
    }

    /// Get effective webcache setting (default: false)
    pub fn uses_webcache(&self) -> bool {
        self.webcache.unwrap_or(false)
    }

    /// Get effective title-as-URL setting (default: false)
    pub fn substitutes_url_with_title(&self) -> bool {
        self.substitute_url_with_title.unwrap_or(false)
    }

    /// Check if this entry is effectively empty
    pub fn is_empty(&self) -> bool {
        self.url_rewrites.is_empty()
            && self.title_rewrites.is_empty()
            && self.user_agent.is_none()
            && self.http_headers.is_empty()
            && self.title_selector.is_none()
            && self.retry_title.is_none()
            && self.webcache.is_none()
            && self.substitute_url_with_title.is_none()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| site_error(&format!("Invalid pattern '{}': {}", pattern, e)))
}

fn site_error(message: &str) -> UrlTitleError {
    UrlTitleError::SiteConfigError(message.to_string())
}

/// Parse a directive line from the override file format
pub fn parse_directive(line: &str) -> Result<Directive> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(site_error("Empty or comment line"));
    }

    let Some((key, value)) = line.split_once(':') else {
        return Err(site_error(&format!("Invalid directive format: {}", line)));
    };
    let key = key.trim();
    let value = value.trim();

    match key {
        "url_pattern" => Ok(Directive::UrlPattern(value.to_string())),
        "url_replacement" => Ok(Directive::UrlReplacement(value.to_string())),
        "title_pattern" => Ok(Directive::TitlePattern(value.to_string())),
        "title_replacement" => Ok(Directive::TitleReplacement(value.to_string())),

        "user_agent" => Ok(Directive::UserAgent(value.to_string())),
        "title_selector" => Ok(Directive::TitleSelector(value.to_string())),
        "retry_title" => Ok(Directive::RetryTitle(value.to_string())),

        "webcache" => Ok(Directive::Webcache(parse_boolean(value)?)),
        "substitute_url_with_title" => Ok(Directive::SubstituteUrlWithTitle(parse_boolean(value)?)),

        _ => {
            if let Some(header_name) = key.strip_prefix("http_header(") {
                match header_name.strip_suffix(')') {
                    Some(header_name) if !header_name.trim().is_empty() => {
                        Ok(Directive::HttpHeader(header_name.trim().to_string(), value.to_string()))
                    }
                    _ => Err(site_error(&format!("Invalid http_header format: {}", key))),
                }
            } else {
                Err(site_error(&format!("Unknown directive: {}", key)))
            }
        }
    }
}

/// Parse a boolean value from the override file format
fn parse_boolean(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(site_error(&format!("Invalid boolean value: {}", value))),
    }
}
