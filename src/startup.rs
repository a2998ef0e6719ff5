//! Startup parameters for overlay windows.
//!
//! Overlays can be created before their command channel is usable, so the
//! initial geometry and flags ride along in the page URL's query string.

use crate::config::Capabilities;
use crate::types::{CaptureMode, Region};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartupError {
    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },
    #[error("region needs x, y, w and h, got only some of them")]
    IncompleteRegion,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StartupParams {
    pub region: Option<Region>,
    pub mode: Option<CaptureMode>,
    pub capabilities: Capabilities,
}

fn flag(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

fn invalid(key: &str, value: &str) -> StartupError {
    StartupError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, StartupError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StartupError> {
    value.parse().map_err(|_| invalid(key, value))
}

impl StartupParams {
    pub fn for_region(region: Region, mode: CaptureMode, capabilities: Capabilities) -> Self {
        Self {
            region: Some(region),
            mode: Some(mode),
            capabilities,
        }
    }

    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(r) = self.region {
            pairs.push(("x", r.x.to_string()));
            pairs.push(("y", r.y.to_string()));
            pairs.push(("w", r.width.to_string()));
            pairs.push(("h", r.height.to_string()));
        }
        if let Some(mode) = self.mode {
            pairs.push(("mode", mode.as_str().to_string()));
        }
        let caps = &self.capabilities;
        pairs.push(("resizable", flag(caps.resizable).to_string()));
        pairs.push(("crop", flag(caps.crop_editing).to_string()));
        pairs.push(("titlebar", flag(caps.titlebar_exclusion).to_string()));
        pairs.push(("scroll", flag(caps.scroll_mode).to_string()));
        pairs.push(("scrub", flag(caps.live_scrub).to_string()));

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Page path with the encoded parameters, e.g.
    /// `/scroll-overlay.html?x=10&y=20&...`.
    pub fn page_url(&self, page: &str) -> String {
        format!("{}?{}", page, self.to_query())
    }

    /// Parse a query string, with or without the leading `?`. Unknown keys
    /// are ignored; missing flags keep their defaults.
    pub fn from_query(query: &str) -> Result<Self, StartupError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = StartupParams::default();
        let (mut x, mut y, mut w, mut h) = (None, None, None, None);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(raw_value).map_err(|_| invalid(raw_key, raw_value))?;
            let value = value.as_ref();
            match raw_key {
                "x" => x = Some(parse_num::<i32>(raw_key, value)?),
                "y" => y = Some(parse_num::<i32>(raw_key, value)?),
                "w" => w = Some(parse_num::<u32>(raw_key, value)?),
                "h" => h = Some(parse_num::<u32>(raw_key, value)?),
                "mode" => {
                    params.mode =
                        Some(CaptureMode::parse(value).ok_or_else(|| invalid(raw_key, value))?)
                }
                "resizable" => params.capabilities.resizable = parse_flag(raw_key, value)?,
                "crop" => params.capabilities.crop_editing = parse_flag(raw_key, value)?,
                "titlebar" => params.capabilities.titlebar_exclusion = parse_flag(raw_key, value)?,
                "scroll" => params.capabilities.scroll_mode = parse_flag(raw_key, value)?,
                "scrub" => params.capabilities.live_scrub = parse_flag(raw_key, value)?,
                _ => log::debug!("[startup] ignoring unknown parameter {}", raw_key),
            }
        }

        params.region = match (x, y, w, h) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(Region {
                x,
                y,
                width,
                height,
            }),
            (None, None, None, None) => None,
            _ => return Err(StartupError::IncompleteRegion),
        };

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_round_trip() {
        let params = StartupParams::for_region(
            Region {
                x: -120,
                y: 40,
                width: 800,
                height: 600,
            },
            CaptureMode::Scroll,
            Capabilities {
                live_scrub: false,
                ..Capabilities::default()
            },
        );
        let url = params.page_url("/scroll-overlay.html");
        assert!(url.starts_with("/scroll-overlay.html?x=-120&y=40&w=800&h=600&mode=scroll"));

        let (_, query) = url.split_once('?').unwrap();
        assert_eq!(StartupParams::from_query(query).unwrap(), params);
    }

    #[test]
    fn test_leading_question_mark_and_unknown_keys() {
        let params = StartupParams::from_query("?mode=gif&theme=dark&crop=0").unwrap();
        assert_eq!(params.mode, Some(CaptureMode::Gif));
        assert_eq!(params.region, None);
        assert!(!params.capabilities.crop_editing);
        assert!(params.capabilities.resizable);
    }

    #[test]
    fn test_partial_region_is_rejected() {
        assert_eq!(
            StartupParams::from_query("x=1&y=2&w=3"),
            Err(StartupError::IncompleteRegion)
        );
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(matches!(
            StartupParams::from_query("w=-5&x=0&y=0&h=1"),
            Err(StartupError::InvalidValue { .. })
        ));
        assert!(StartupParams::from_query("mode=movie").is_err());
        assert!(StartupParams::from_query("crop=maybe").is_err());
    }
}
