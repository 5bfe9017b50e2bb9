use crate::error::{Result, UrlTitleError};
use crate::siteconfig::directives::{SiteOverride, parse_directive};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Site override file parser
#[derive(Debug)]
pub struct ConfigParser;

impl ConfigParser {
    /// Parse a single override file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<SiteOverride> {
        let file = std::fs::File::open(&path).map_err(|e| {
            UrlTitleError::SiteConfigError(format!("Cannot open file {}: {}", path.as_ref().display(), e))
        })?;

        let reader = BufReader::new(file);
        Self::parse_reader(reader).map_err(|e| {
            UrlTitleError::SiteConfigError(format!("{}: {}", path.as_ref().display(), strip_prefix(&e)))
        })
    }

    /// Parse overrides from a reader
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<SiteOverride> {
        let mut entry = SiteOverride::new();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line
                .map_err(|e| UrlTitleError::SiteConfigError(format!("Read error at line {}: {}", line_number, e)))?;
            Self::parse_line(&mut entry, &line, line_number)?;
        }

        entry.finish()?;
        Ok(entry)
    }

    /// Parse overrides from a string
    pub fn parse_string(content: &str) -> Result<SiteOverride> {
        let mut entry = SiteOverride::new();

        for (index, line) in content.lines().enumerate() {
            Self::parse_line(&mut entry, line, index + 1)?;
        }

        entry.finish()?;
        Ok(entry)
    }

    fn parse_line(entry: &mut SiteOverride, line: &str, line_number: usize) -> Result<()> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        parse_directive(line)
            .and_then(|directive| entry.add_directive(directive))
            .map_err(|e| UrlTitleError::SiteConfigError(format!("Parse error at line {}: {}", line_number, strip_prefix(&e))))
    }
}

fn strip_prefix(error: &UrlTitleError) -> String {
    match error {
        UrlTitleError::SiteConfigError(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_string_basic() {
        let content = r#"
# arXiv
url_pattern: /pdf/(?P<id>.+?)(?:\.pdf)?$
url_replacement: /abs/${id}
user_agent: Mozilla/5.0
webcache: no
"#;

        let entry = ConfigParser::parse_string(content).unwrap();

        assert_eq!(entry.url_rewrites.len(), 1);
        assert_eq!(entry.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(entry.webcache, Some(false));
        assert_eq!(
            entry.rewrite_url("https://arxiv.org/pdf/1810.04805.pdf"),
            Some("https://arxiv.org/abs/1810.04805".to_string())
        );
    }

    #[test]
    fn test_parse_string_http_headers() {
        let content = r#"
http_header(Accept): */*
http_header(Accept-Encoding): gzip
"#;

        let entry = ConfigParser::parse_string(content).unwrap();

        assert_eq!(entry.http_headers.len(), 2);
        assert_eq!(entry.http_headers.get("Accept-Encoding"), Some(&"gzip".to_string()));
    }

    #[test]
    fn test_parse_string_selector() {
        let content = r#"title_selector: text(.topictitle) + " - " + meta_name(product)"#;

        let entry = ConfigParser::parse_string(content).unwrap();

        assert_eq!(
            entry.title_selector.map(|s| s.to_string()),
            Some(r#"text(.topictitle) + " - " + meta_name(product)"#.to_string())
        );
    }

    #[test]
    fn test_parse_reader() {
        let content = "title_pattern: ^(?P<name>.+?) - Google Drive$\ntitle_replacement: ${name} - Colaboratory\n";

        let entry = ConfigParser::parse_reader(Cursor::new(content)).unwrap();

        assert_eq!(entry.title_rewrites.len(), 1);
        assert_eq!(entry.rewrite_title("x.ipynb - Google Drive"), "x.ipynb - Colaboratory");
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = ConfigParser::parse_string("# comment\nuser_agent: x\nbogus: 1\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);

        let err = ConfigParser::parse_string("url_pattern: (\n").unwrap_err();
        assert!(err.to_string().contains("line 1"), "{}", err);

        let err = ConfigParser::parse_string("title_selector: text(\n").unwrap_err();
        assert!(err.to_string().contains("line 1"), "{}", err);
    }

    #[test]
    fn test_parse_unpaired_pattern() {
        assert!(ConfigParser::parse_string("url_pattern: ^http:").is_err());
        assert!(ConfigParser::parse_string("title_replacement: x").is_err());
    }

    #[test]
    fn test_parse_empty_and_comments() {
        let entry = ConfigParser::parse_string("# only\n\n   # comments\n").unwrap();
        assert!(entry.is_empty());
    }
}
