//! Front-matter parsing and writing
//!
//! Post files look like:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: "2024-01-15"
//! excerpt: "First lines..."
//! tags: ["rust", "blog"]
//! readTime: 3
//! views: 0
//! tableOfContents: [{"level": 1, "text": "Intro", "id": "intro"}]
//! ---
//!
//! # Intro
//! ...
//! ```
//!
//! `views` is a legacy field: it is written as 0 for compatibility and
//! ignored on read, the stats store owns view counts.

use serde::{Deserialize, Deserializer};
use std::fmt::Write;
use thiserror::Error;

use super::post::TocEntry;

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Reading time in minutes from a number or numeric string, rounded up.
/// Anything else counts as absent so the estimate is used instead.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    let minutes = match value {
        Some(serde_yaml::Value::Number(n)) => n.as_u64().map(|m| m as f64).or_else(|| n.as_f64()),
        Some(serde_yaml::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(minutes
        .filter(|m| m.is_finite() && *m > 0.0 && *m <= u32::MAX as f64)
        .map(|m| m.ceil() as u32))
}

/// Front matter exactly as written in the file, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawFrontMatter {
    title: Option<String>,
    date: Option<String>,
    excerpt: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    tags: Vec<String>,
    #[serde(deserialize_with = "lenient_minutes")]
    read_time: Option<u32>,
    table_of_contents: Vec<TocEntry>,
}

/// Validated front matter of a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub read_time: Option<u32>,
    pub table_of_contents: Vec<TocEntry>,
}

/// Why a file could not be read as a post
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("no front matter block")]
    Missing,
    #[error("front matter is not closed with ---")]
    Unterminated,
    #[error("invalid front matter: {0}")]
    Yaml(String),
    #[error("front matter is missing required field '{0}'")]
    MissingField(&'static str),
}

impl FrontMatter {
    /// Parse front matter from file content.
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        let rest = content
            .strip_prefix("---")
            .ok_or(FrontMatterError::Missing)?;
        let rest = rest.trim_start_matches([' ', '\t']);
        let rest = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .ok_or(FrontMatterError::Missing)?;

        let (yaml_content, remaining) = split_closing_fence(rest)?;
        let body = remaining.trim_start_matches(['\n', '\r']);

        let raw: RawFrontMatter = if yaml_content.trim().is_empty() {
            RawFrontMatter::default()
        } else {
            serde_yaml::from_str(yaml_content)
                .map_err(|e| FrontMatterError::Yaml(e.to_string()))?
        };

        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(FrontMatterError::MissingField("title"))?;
        let date = raw
            .date
            .filter(|d| !d.trim().is_empty())
            .ok_or(FrontMatterError::MissingField("date"))?;

        Ok((
            FrontMatter {
                title,
                date,
                excerpt: raw.excerpt,
                tags: raw.tags,
                read_time: raw.read_time.filter(|minutes| *minutes > 0),
                table_of_contents: raw.table_of_contents,
            },
            body,
        ))
    }

    /// Serialize as a front matter block followed by a blank line and the body.
    ///
    /// Strings are written as JSON string literals, which YAML reads as
    /// double-quoted scalars, so titles containing quotes or colons survive.
    pub fn render(&self, body: &str) -> String {
        let excerpt = self.excerpt.as_deref().unwrap_or_default();
        let tags: Vec<String> = self.tags.iter().map(|t| quote(t)).collect();
        let toc: Vec<String> = self
            .table_of_contents
            .iter()
            .map(|entry| {
                format!(
                    "{{\"level\": {}, \"text\": {}, \"id\": {}}}",
                    entry.level,
                    quote(&entry.text),
                    quote(&entry.id)
                )
            })
            .collect();

        let mut out = String::new();
        out.push_str("---\n");
        let _ = writeln!(out, "title: {}", quote(&self.title));
        let _ = writeln!(out, "date: {}", quote(&self.date));
        let _ = writeln!(out, "excerpt: {}", quote(excerpt));
        let _ = writeln!(out, "tags: [{}]", tags.join(", "));
        let _ = writeln!(out, "readTime: {}", self.read_time.unwrap_or(1));
        let _ = writeln!(out, "views: 0");
        let _ = writeln!(out, "tableOfContents: [{}]", toc.join(", "));
        out.push_str("---\n\n");
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// Find the closing `---` line. Returns (yaml, content after the fence line)
fn split_closing_fence(rest: &str) -> Result<(&str, &str), FrontMatterError> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
