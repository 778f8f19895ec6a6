//! JSON export of a crawl result
//!
//! The analysis stage consumes the page records together with
//! `stats.baseUrl`; field names are camelCase.

use crate::state::CrawlResult;
use std::io::Write;

/// Serializes a crawl result to a JSON string
pub fn to_json(result: &CrawlResult, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
}

/// Writes a crawl result as JSON, followed by a newline
pub fn write_json<W: Write>(result: &CrawlResult, mut writer: W, pretty: bool) -> std::io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, result)?;
    } else {
        serde_json::to_writer(&mut writer, result)?;
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CrawlStats, PageRecord};
    use serde_json::Value;

    fn sample_result() -> CrawlResult {
        CrawlResult {
            stopped: true,
            results: vec![
                PageRecord::fetched(
                    "https://a.com/".to_string(),
                    200,
                    "<p>hi</p>".to_string(),
                    vec!["https://a.com/x".to_string()],
                ),
                PageRecord::failed("https://a.com/x".to_string(), "boom"),
            ],
            stats: CrawlStats::start("https://a.com/"),
        }
    }

    #[test]
    fn test_json_shape() {
        let json = to_json(&sample_result(), false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["stopped"], true);
        assert_eq!(value["stats"]["baseUrl"], "https://a.com/");
        assert_eq!(value["results"][0]["statusCode"], 200);
        assert_eq!(value["results"][0]["links"][0], "https://a.com/x");
        assert!(value["results"][0].get("error").is_none());
        assert_eq!(value["results"][1]["statusCode"], 0);
        assert_eq!(value["results"][1]["error"], "boom");
        assert_eq!(value["results"][1]["html"], "");
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        write_json(&sample_result(), &mut buffer, true).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with('\n'));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
    }
}
