use std::fmt;
use std::str::FromStr;

/// Requested video quality, as understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    #[default]
    Best,
    P720,
    P480,
    P360,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Best, Quality::P720, Quality::P480, Quality::P360];

    pub fn as_wire(self) -> &'static str {
        match self {
            Quality::Best => "best",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
        }
    }
}

/// Requested container/format. `Auto` leaves the choice to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Auto,
    Mp4,
    Webm,
    Audio,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Auto, Format::Mp4, Format::Webm, Format::Audio];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Auto => "auto",
            Format::Mp4 => "mp4",
            Format::Webm => "webm",
            Format::Audio => "audio",
        }
    }

    /// Value sent in the start request; `Auto` is sent as `null`.
    pub fn as_wire(self) -> Option<&'static str> {
        match self {
            Format::Auto => None,
            other => Some(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseParamError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseParamError {}

impl FromStr for Quality {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Quality::ALL
            .into_iter()
            .find(|q| q.as_wire().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseParamError {
                kind: "quality",
                value: s.to_string(),
            })
    }
}

impl FromStr for Format {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Format::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseParamError {
                kind: "format",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters captured when the user submits; echoed back on acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: String,
    pub quality: Quality,
    pub format: Format,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_case_insensitively() {
        assert_eq!("720P".parse::<Quality>(), Ok(Quality::P720));
        assert_eq!(" best".parse::<Quality>(), Ok(Quality::Best));
        assert_eq!("WebM".parse::<Format>(), Ok(Format::Webm));
        let err = "1080p".parse::<Quality>().unwrap_err();
        assert_eq!(err.to_string(), "unknown quality '1080p'");
    }

    #[test]
    fn auto_format_is_sent_as_null() {
        assert_eq!(Format::Auto.as_wire(), None);
        assert_eq!(Format::Audio.as_wire(), Some("audio"));
    }
}
