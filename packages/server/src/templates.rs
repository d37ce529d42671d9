//! Page loading and view rendering.
//!
//! Static pages (intro, map, not-found) are served byte-for-byte as read at
//! startup. The results and error pages are templates with `{{ name }}`
//! placeholders whose values are HTML-escaped on substitution. The CSV
//! download is written with the `csv` crate.

use std::path::Path;

use popbuilder_database::detail::detail_columns;
use popbuilder_population_models::{PopulationSummary, ZoneDetail};
use popbuilder_server_models::ResultsView;

use crate::ServerError;

/// Message shown on the error page. Internal error detail is logged, never
/// rendered.
pub const DEFAULT_ERROR_MESSAGE: &str = "Sorry! An error has occurred.";

/// File names inside the template directory.
pub const INTRO_PAGE: &str = "intro.html";
/// Main map page.
pub const MAP_PAGE: &str = "map.html";
/// Results template.
pub const RESULTS_TEMPLATE: &str = "results.html";
/// Not-found page.
pub const NOT_FOUND_PAGE: &str = "notfound.html";
/// Error template.
pub const ERROR_TEMPLATE: &str = "error.html";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Errors from parsing or rendering a view.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A placeholder was opened but never closed.
    #[error("Unterminated placeholder in {template} at byte {offset}")]
    Unterminated {
        /// Template name.
        template: String,
        /// Byte offset of the opening `{{`.
        offset: usize,
    },

    /// A placeholder names a field the view does not have.
    #[error("Unknown field {field:?} in {template}")]
    UnknownField {
        /// Template name.
        template: String,
        /// Placeholder name.
        field: String,
    },

    /// Writing the CSV download failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// A parsed HTML template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `source`. `name` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Unterminated`] if a `{{` has no matching `}}`.
    pub fn parse(name: &str, source: &str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + OPEN.len()..];
            let Some(end) = after.find(CLOSE) else {
                return Err(RenderError::Unterminated {
                    template: name.to_string(),
                    offset: offset + start,
                });
            };
            segments.push(Segment::Field(after[..end].trim().to_string()));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    /// Reads and parses a template file.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let source = read_page(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::parse(&name, &source)?)
    }

    /// Placeholder names in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Renders the template, resolving each placeholder through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownField`] if `lookup` has no value for a
    /// placeholder.
    pub fn render(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, RenderError> {
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(name) => {
                    let value = lookup(name).ok_or_else(|| RenderError::UnknownField {
                        template: self.name.clone(),
                        field: name.clone(),
                    })?;
                    out.push_str(&escape_html(&value));
                }
            }
        }

        Ok(out)
    }
}

/// Escapes the characters that are significant in HTML text and attribute
/// values.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Pages and templates loaded once at startup.
#[derive(Debug, Clone)]
pub struct Pages {
    /// Introductory page.
    pub intro: String,
    /// Main map page.
    pub main: String,
    /// Not-found page.
    pub not_found: String,
    /// Results template.
    pub results: Template,
    /// Error template, with a `message` placeholder.
    pub error: Template,
}

impl Pages {
    /// Loads every page from `dir` and checks that the templates only use
    /// fields their views provide.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if a file is missing or a template is
    /// invalid. Both are fatal at startup.
    pub fn load(dir: &Path) -> Result<Self, ServerError> {
        let pages = Self {
            intro: read_page(&dir.join(INTRO_PAGE))?,
            main: read_page(&dir.join(MAP_PAGE))?,
            not_found: read_page(&dir.join(NOT_FOUND_PAGE))?,
            results: Template::load(&dir.join(RESULTS_TEMPLATE))?,
            error: Template::load(&dir.join(ERROR_TEMPLATE))?,
        };

        render_results(&pages.results, &ResultsView::new(PopulationSummary::default(), ""))?;
        render_error(&pages.error, DEFAULT_ERROR_MESSAGE)?;

        Ok(pages)
    }
}

fn read_page(path: &Path) -> Result<String, ServerError> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Template {
        path: path.display().to_string(),
        source,
    })
}

/// Renders the results page.
///
/// # Errors
///
/// Returns [`RenderError`] if the template uses an unknown field.
pub fn render_results(template: &Template, view: &ResultsView) -> Result<String, RenderError> {
    template.render(|name| view.field(name))
}

/// Renders the error page with `message`.
///
/// # Errors
///
/// Returns [`RenderError`] if the template uses a field other than
/// `message`.
pub fn render_error(template: &Template, message: &str) -> Result<String, RenderError> {
    template.render(|name| (name == "message").then(|| message.to_string()))
}

/// Writes the CSV download: a header of store column names, then one record
/// per zone with persons, male, and female bands.
///
/// # Errors
///
/// Returns [`RenderError::Csv`] if writing fails.
pub fn render_download(rows: &[ZoneDetail]) -> Result<Vec<u8>, RenderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(detail_columns())?;

    for row in rows {
        let record = std::iter::once(row.code.to_string()).chain(
            row.persons
                .iter()
                .chain(row.male.iter())
                .chain(row.female.iter())
                .map(ToString::to_string),
        );
        writer.write_record(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Csv(e.into_error().into()))
}

#[cfg(test)]
mod tests {
    use popbuilder_population_models::{DETAIL_BAND_COUNT, ZoneCode};

    use super::*;

    #[test]
    fn parse_and_render() {
        let template = Template::parse("t", "Hello {{ name }}, total <b>{{total}}</b>!").unwrap();
        assert_eq!(template.fields().collect::<Vec<_>>(), ["name", "total"]);

        let out = template
            .render(|name| match name {
                "name" => Some("Leeds".to_string()),
                "total" => Some("1,863".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(out, "Hello Leeds, total <b>1,863</b>!");
    }

    #[test]
    fn values_are_escaped() {
        let template = Template::parse("t", "<p>{{ zones }}</p>").unwrap();
        let out = template
            .render(|_| Some("<script>alert('x')</script>&".to_string()))
            .unwrap();
        assert_eq!(
            out,
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;&amp;</p>"
        );
    }

    #[test]
    fn unknown_field_is_an_error() {
        let template = Template::parse("results.html", "{{ nope }}").unwrap();
        let err = template.render(|_| None).unwrap_err();
        assert!(matches!(err, RenderError::UnknownField { ref field, .. } if field == "nope"));
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        let err = Template::parse("t", "abc {{ ok }} def {{ broken").unwrap_err();
        assert!(matches!(err, RenderError::Unterminated { offset: 17, .. }), "{err}");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let template = Template::parse("t", "plain { text }").unwrap();
        assert_eq!(template.render(|_| None).unwrap(), "plain { text }");
    }

    #[test]
    fn error_template_only_knows_message() {
        let template = Template::parse("error.html", "<h1>{{ message }}</h1>").unwrap();
        assert_eq!(
            render_error(&template, DEFAULT_ERROR_MESSAGE).unwrap(),
            "<h1>Sorry! An error has occurred.</h1>"
        );

        let template = Template::parse("error.html", "{{ detail }}").unwrap();
        assert!(render_error(&template, "x").is_err());
    }

    #[test]
    fn download_has_header_and_one_record_per_zone() {
        let row = ZoneDetail {
            code: ZoneCode::from("E01004736"),
            persons: [49; DETAIL_BAND_COUNT],
            male: [24; DETAIL_BAND_COUNT],
            female: [25; DETAIL_BAND_COUNT],
        };
        let body = String::from_utf8(render_download(&[row]).unwrap()).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("code,p_0_4,p_5_9,"));
        assert!(lines[0].ends_with(",f_85_89,f_90"));
        assert!(lines[1].starts_with("E01004736,49,49,"));
        assert!(lines[1].ends_with(",25,25"));
        assert_eq!(lines[1].split(',').count(), 1 + 3 * DETAIL_BAND_COUNT);
    }

    #[test]
    fn empty_download_is_just_the_header() {
        let body = String::from_utf8(render_download(&[]).unwrap()).unwrap();
        assert_eq!(body.lines().count(), 1);
    }

    #[test]
    fn shipped_templates_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let pages = Pages::load(&dir).unwrap();
        assert!(pages.results.fields().any(|f| f == "population"));
        assert!(pages.error.fields().all(|f| f == "message"));
    }
}
