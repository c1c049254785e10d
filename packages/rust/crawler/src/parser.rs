//! Schedule page parser.
//!
//! A schedule page holds one `#course-table` whose body rows are sections,
//! plus a pagination link to the next page. Cell layout, by column:
//!
//! | # | content |
//! |---|---------|
//! | 1 | crn |
//! | 2 | `SUBJ 1234` |
//! | 3 | section |
//! | 4 | credits, `3` or `1-3` |
//! | 5 | `<span data-content="description">title</span>` |
//! | 6 | note |
//! | 7–9 | days / `start-end` times / `building room` places, one per text line |
//! | 10 | `<a>instructor</a>` |
//! | 11 | `<strong>enrolled</strong>/capacity` |

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use schedkit_shared::{RawCredits, RawSection, Result, SchedKitError};

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#course-table tbody tr").expect("valid selector"));
static NEXT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a.icon.item[rel="next"]"#).expect("valid selector"));
static SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));
static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static STRONG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("valid selector"));
static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body > div:nth-of-type(4) > div:nth-of-type(2) > h2")
        .expect("valid selector")
});

/// Number of characters of fixed lead-in text before the term words in the
/// schedule heading.
const HEADING_LEAD_IN: usize = 28;

/// Rows and pagination link parsed from one schedule page.
#[derive(Debug, Clone)]
pub struct SchedulePage {
    pub sections: Vec<RawSection>,
    /// Absolute URL of the next page, if any.
    pub next: Option<Url>,
}

/// Parse every section row and the next-page link from a schedule page.
pub fn parse_schedule_page(html: &str, page_url: &Url) -> Result<SchedulePage> {
    let doc = Html::parse_document(html);

    let sections = doc
        .select(&ROW_SEL)
        .enumerate()
        .map(|(i, row)| parse_row(row).map_err(|e| row_error(page_url, i, e)))
        .collect::<Result<Vec<_>>>()?;

    let next = doc
        .select(&NEXT_SEL)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| {
            page_url
                .join(href)
                .map_err(|e| SchedKitError::parse(format!("bad next link '{href}' on {page_url}: {e}")))
        })
        .transpose()?;

    Ok(SchedulePage { sections, next })
}

/// Term words from the schedule heading, e.g. `["Spring", "2020"]`.
pub fn parse_term_title(html: &str) -> Option<Vec<String>> {
    let doc = Html::parse_document(html);
    let heading = doc.select(&HEADING_SEL).next()?;
    let text = first_text(heading)?;

    let words: Vec<String> = text
        .chars()
        .skip(HEADING_LEAD_IN)
        .collect::<String>()
        .split_whitespace()
        .map(String::from)
        .collect();

    (!words.is_empty()).then_some(words)
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

fn row_error(page_url: &Url, row: usize, err: SchedKitError) -> SchedKitError {
    match err {
        SchedKitError::Parse { message } => {
            SchedKitError::parse(format!("{page_url} row {}: {message}", row + 1))
        }
        other => other,
    }
}

fn parse_row(row: ElementRef<'_>) -> Result<RawSection> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();

    let cell = |n: usize| cells.get(n - 1).copied();

    let crn = cell(1)
        .and_then(first_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SchedKitError::parse("missing crn"))?;

    let code = cell(2).and_then(first_text).unwrap_or_default();
    let (subject, course) = match code.split_whitespace().collect::<Vec<_>>().as_slice() {
        [subject, course] => (subject.to_string(), course.to_string()),
        _ => {
            return Err(SchedKitError::parse(format!(
                "crn {crn}: expected 'SUBJ NUMBER', found {code:?}"
            )));
        }
    };

    let section = cell(3).and_then(first_text).unwrap_or_default();

    let credits = cell(4).and_then(first_text).unwrap_or_default();
    let credits = credits.trim();
    let cr = match credits.split_once('-') {
        Some((min, max)) => vec![min.to_string(), max.to_string()],
        None => vec![credits.to_string(), credits.to_string()],
    };

    let span = cell(5).and_then(|td| td.select(&SPAN_SEL).next());
    let title = span
        .and_then(first_text)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let description = span
        .and_then(|s| s.value().attr("data-content"))
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    let note = cell(6).and_then(first_text).unwrap_or_default();

    let days = cell(7).map(text_lines).unwrap_or_default();

    let times = cell(8)
        .map(text_lines)
        .unwrap_or_default()
        .into_iter()
        .map(|line| match line.split_once('-') {
            Some((start, end)) => Ok(vec![start.trim().to_string(), end.trim().to_string()]),
            None => Err(SchedKitError::parse(format!(
                "crn {crn}: time range without '-': {line:?}"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let places = cell(9)
        .map(text_lines)
        .unwrap_or_default()
        .into_iter()
        .map(|line| match line.split_once(' ') {
            Some((building, room)) => vec![building.to_string(), room.trim().to_string()],
            None => vec![line, String::new()],
        })
        .collect();

    let instructor = cell(10)
        .and_then(|td| td.select(&LINK_SEL).next())
        .and_then(first_text)
        .unwrap_or_default();

    let cap_cell = cell(11).ok_or_else(|| SchedKitError::parse(format!("crn {crn}: missing capacity")))?;
    let enrolled = cap_cell
        .select(&STRONG_SEL)
        .next()
        .and_then(first_text)
        .unwrap_or_default();
    // Remaining text is "/<capacity>".
    let capacity: String = first_text(cap_cell)
        .unwrap_or_default()
        .chars()
        .skip(1)
        .collect();

    Ok(RawSection {
        crn,
        subject,
        course,
        section,
        cr: RawCredits::Pair(cr),
        title,
        description,
        note,
        session: String::new(),
        days,
        times,
        places,
        instructor,
        cap: vec![enrolled, capacity],
    })
}

/// First direct text child of `el`, untrimmed.
fn first_text(el: ElementRef<'_>) -> Option<String> {
    el.children()
        .find_map(|node| node.value().as_text().map(|t| t.to_string()))
}

/// Every non-blank direct text child of `el`, trimmed.
fn text_lines(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(|node| node.value().as_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
