//! `%field%` templates for naming tracks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::host::TrackRef;

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%([^%]*)%").expect("field pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Compiled `%field%` template. `%%` renders a literal percent sign and an
/// unterminated `%` is kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFormat {
    segments: Vec<Segment>,
}

impl TitleFormat {
    pub fn compile(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in FIELD_RE.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(template[last..whole.start()].to_string()));
            }
            if name.as_str().is_empty() {
                segments.push(Segment::Literal("%".to_string()));
            } else {
                segments.push(Segment::Field(name.as_str().to_string()));
            }
            last = whole.end();
        }
        if last < template.len() {
            segments.push(Segment::Literal(template[last..].to_string()));
        }
        Self { segments }
    }

    /// Render against `track`; missing fields render empty.
    pub fn format(&self, track: &TrackRef) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    if let Some(value) = track.meta(name) {
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryPlaylist;

    #[test]
    fn substitutes_fields() {
        let playlist = MemoryPlaylist::new();
        let id = playlist.insert([("artist", "Coltrane"), ("title", "Naima")]);
        let track = playlist.track_ref(id).expect("track");

        let tf = TitleFormat::compile("%artist% - %title%");
        assert_eq!(tf.format(&track), "Coltrane - Naima");
        assert_eq!(tf.fields().collect::<Vec<_>>(), vec!["artist", "title"]);
    }

    #[test]
    fn missing_fields_render_empty() {
        let playlist = MemoryPlaylist::new();
        let id = playlist.insert([("title", "Naima")]);
        let track = playlist.track_ref(id).expect("track");

        let tf = TitleFormat::compile("[%album%] %title%");
        assert_eq!(tf.format(&track), "[] Naima");
    }

    #[test]
    fn percent_escapes_and_unterminated_text() {
        let playlist = MemoryPlaylist::new();
        let id = playlist.insert([("title", "Gain")]);
        let track = playlist.track_ref(id).expect("track");

        assert_eq!(TitleFormat::compile("100%% %title%").format(&track), "100% Gain");
        assert_eq!(TitleFormat::compile("%title% 50%").format(&track), "Gain 50%");
    }
}
