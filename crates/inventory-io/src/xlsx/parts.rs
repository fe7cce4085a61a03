//! Small readers/editors for the package-level OOXML parts: relationships,
//! `workbook.xml`, `styles.xml` and `[Content_Types].xml`.

use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use zip::ZipArchive;

use super::PackageError;

pub(super) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub(super) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(super) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

const REL_TYPE_STYLES_SUFFIX: &str = "/styles";
const REL_TYPE_CALC_CHAIN_SUFFIX: &str = "/calcChain";

/// Built-in number formats Excel renders as calendar dates.
const BUILTIN_DATE_FORMATS: [u32; 5] = [14, 15, 16, 17, 22];

/// Number format used for the `xf` added when dates need one.
const SHORT_DATE_FORMAT: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Relationship {
    pub id: String,
    pub type_uri: String,
    pub target: String,
}

impl Relationship {
    pub fn is_styles(&self) -> bool {
        self.type_uri.ends_with(REL_TYPE_STYLES_SUFFIX)
    }

    pub fn is_calc_chain(&self) -> bool {
        self.type_uri.ends_with(REL_TYPE_CALC_CHAIN_SUFFIX)
    }
}

pub(super) fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, PackageError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut buf = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

pub(super) fn require_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, PackageError> {
    read_part(archive, name)?.ok_or_else(|| PackageError::MissingPart(name.to_string()))
}

/// Unescaped value of the attribute whose local name is `local`.
pub(super) fn attr_value(start: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, PackageError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|err| PackageError::Invalid(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

pub(super) fn attr_u32(start: &BytesStart<'_>, local: &[u8]) -> Result<Option<u32>, PackageError> {
    Ok(attr_value(start, local)?.and_then(|value| value.trim().parse().ok()))
}

/// Namespace prefix of a qualified element name (`x` in `x:sheetData`).
pub(super) fn prefix_of(name: &[u8]) -> Option<String> {
    let idx = name.iter().position(|&b| b == b':')?;
    std::str::from_utf8(&name[..idx]).ok().map(str::to_string)
}

pub(super) fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

pub(super) fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>, PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                // External targets (hyperlinks and the like) are not package parts.
                let external =
                    attr_value(&e, b"TargetMode")?.is_some_and(|mode| mode == "External");
                let id = attr_value(&e, b"Id")?;
                let type_uri = attr_value(&e, b"Type")?;
                let target = attr_value(&e, b"Target")?;
                if let (false, Some(id), Some(type_uri), Some(target)) =
                    (external, id, type_uri, target)
                {
                    relationships.push(Relationship {
                        id,
                        type_uri,
                        target,
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Resolve a relationship target against the part that owns the relationship.
pub(super) fn resolve_target(base_part: &str, target: &str) -> String {
    let target = target.split_once('#').map_or(target, |(base, _)| base);
    let (target, base_dir) = match target.strip_prefix('/') {
        Some(target) => (target, ""),
        None => (
            target,
            base_part.rsplit_once('/').map_or("", |(dir, _)| dir),
        ),
    };

    let mut components: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}

/// Relationship id of the first `<sheet>` listed in `workbook.xml`.
pub(super) fn first_sheet_relationship(workbook_xml: &[u8]) -> Result<Option<String>, PackageError> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                // `r:id` is the only attribute of `<sheet>` with local name `id`.
                return attr_value(&e, b"id");
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// What saving needs to know about `styles.xml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct StyleSummary {
    /// Number of cell formats (`<cellXfs>` children); valid style ids are below it.
    pub xf_count: u32,
    /// First cell format that renders its value as a date.
    pub date_xf: Option<u32>,
}

impl StyleSummary {
    pub fn is_valid(&self, style: u32) -> bool {
        style < self.xf_count
    }
}

pub(super) fn summarize_styles(xml: &[u8]) -> Result<StyleSummary, PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut date_formats: Vec<u32> = BUILTIN_DATE_FORMATS.to_vec();
    let mut in_cell_xfs = false;
    let mut summary = StyleSummary::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr_u32(&e, b"numFmtId")?;
                    let code = attr_value(&e, b"formatCode")?;
                    if let (Some(id), Some(code)) = (id, code) {
                        if is_date_format_code(&code) {
                            date_formats.push(id);
                        }
                    }
                }
                b"xf" if in_cell_xfs => {
                    let format = attr_u32(&e, b"numFmtId")?.unwrap_or(0);
                    if summary.date_xf.is_none() && date_formats.contains(&format) {
                        summary.date_xf = Some(summary.xf_count);
                    }
                    summary.xf_count += 1;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(summary)
}

/// Whether a custom number format code displays a calendar date.
///
/// Quoted literals and bracketed sections (colors, locales, elapsed time) are
/// ignored; what remains is a date format when it mentions years or days.
fn is_date_format_code(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut escaped = false;
    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            'y' | 'Y' | 'd' | 'D' if !in_quotes && !in_brackets => return true,
            _ => {}
        }
    }
    false
}

/// Append a short-date cell format to `<cellXfs>`; its id is the old count.
pub(super) fn append_date_xf(xml: &[u8]) -> Result<Vec<u8>, PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 128));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let mut start = BytesStart::new(name);
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.local_name().as_ref() == b"count" {
                        let count: u32 = std::str::from_utf8(&attr.value)
                            .ok()
                            .and_then(|v| v.trim().parse().ok())
                            .unwrap_or(0);
                        let count = (count + 1).to_string();
                        start.push_attribute(("count", count.as_str()));
                    } else {
                        start.push_attribute(attr);
                    }
                }
                writer.write_event(Event::Start(start))?;
            }
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => {
                let prefix = prefix_of(e.name().as_ref());
                let format = SHORT_DATE_FORMAT.to_string();
                let mut xf = BytesStart::new(qualified(prefix.as_deref(), "xf"));
                xf.push_attribute(("numFmtId", format.as_str()));
                xf.push_attribute(("fontId", "0"));
                xf.push_attribute(("fillId", "0"));
                xf.push_attribute(("borderId", "0"));
                xf.push_attribute(("xfId", "0"));
                xf.push_attribute(("applyNumberFormat", "1"));
                writer.write_event(Event::Empty(xf))?;
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}

/// Copy `xml`, leaving out every `local` element whose `attr` equals `value`.
pub(super) fn drop_elements(
    xml: &[u8],
    local: &[u8],
    attr: &[u8],
    value: &str,
) -> Result<Vec<u8>, PackageError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }
        match event {
            Event::Eof => break,
            Event::Empty(ref e)
                if e.local_name().as_ref() == local
                    && attr_value(e, attr)?.as_deref() == Some(value) => {}
            Event::Start(ref e)
                if e.local_name().as_ref() == local
                    && attr_value(e, attr)?.as_deref() == Some(value) =>
            {
                skip_depth = 1;
            }
            event => writer.write_event(event)?,
        }
        buf.clear();
    }
    Ok(writer.into_inner())
}
