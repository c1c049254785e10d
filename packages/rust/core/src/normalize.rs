//! Section normalizer: raw scraped rows → typed [`Section`] records.
//!
//! Any numeric field that fails to coerce aborts the whole run; no record is
//! ever filled with placeholder values.

use tracing::{debug, info, instrument};

use schedkit_shared::{RawCredits, RawSection, Result, SchedKitError, Section};

use crate::reference::TagTable;
use crate::tags;

/// Normalize every raw row and sort the result ascending by crn.
///
/// The returned order is the canonical index space that every
/// `sectionIdxs` array refers to.
#[instrument(skip_all, fields(records = raw.len()))]
pub fn normalize_sections(raw: &[RawSection], tag_table: &TagTable) -> Result<Vec<Section>> {
    let mut sections = raw
        .iter()
        .enumerate()
        .map(|(position, record)| normalize_section(record, position, tag_table))
        .collect::<Result<Vec<_>>>()?;

    sections.sort_by_key(|s| s.crn);

    if let Some(dup) = sections.windows(2).find(|w| w[0].crn == w[1].crn) {
        return Err(SchedKitError::validation(format!(
            "duplicate crn {} in input snapshot",
            dup[0].crn
        )));
    }

    let tagged = sections.iter().filter(|s| !s.tags.is_empty()).count();
    info!(sections = sections.len(), tagged, "sections normalized");

    Ok(sections)
}

/// Normalize one raw row. `position` is only used to label errors when the
/// row has no crn text.
pub fn normalize_section(
    raw: &RawSection,
    position: usize,
    tag_table: &TagTable,
) -> Result<Section> {
    let record = record_label(raw, position);

    let crn = parse_int(&record, "crn", &raw.crn)?;
    let course = parse_int(&record, "course", &raw.course)?;

    let [enrolled, capacity] = exact_pair(&record, "cap", &raw.cap)?;
    let cap = [
        parse_int(&record, "cap", enrolled)?,
        parse_int(&record, "cap", capacity)?,
    ];

    let cr = parse_credits(&record, &raw.cr)?;

    let times = raw
        .times
        .iter()
        .map(|pair| {
            let [start, end] = exact_pair(&record, "times", pair)?;
            Ok([
                parse_int(&record, "times", start)?,
                parse_int(&record, "times", end)?,
            ])
        })
        .collect::<Result<Vec<_>>>()?;

    let tags = tags::classify(&raw.description, tag_table);
    if !tags.is_empty() {
        debug!(crn, tags = tags.len(), "description tagged");
    }

    Ok(Section {
        crn,
        subject: raw.subject.clone(),
        course,
        section: raw.section.clone(),
        cap,
        cr,
        tags,
        times,
        title: raw.title.clone(),
        description: raw.description.clone(),
        note: raw.note.clone(),
        session: raw.session.clone(),
        days: raw.days.clone(),
        places: raw.places.clone(),
        instructor: raw.instructor.clone(),
    })
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn record_label(raw: &RawSection, position: usize) -> String {
    let crn = raw.crn.trim();
    if crn.is_empty() {
        format!("#{position}")
    } else {
        format!("crn {crn}")
    }
}

fn parse_int(record: &str, field: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| SchedKitError::input_format(record, field, value))
}

fn parse_float(record: &str, field: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SchedKitError::input_format(record, field, value)),
    }
}

/// Borrow exactly two elements, or fail naming the whole list.
fn exact_pair<'a>(record: &str, field: &str, values: &'a [String]) -> Result<[&'a str; 2]> {
    match values {
        [a, b] => Ok([a.as_str(), b.as_str()]),
        _ => Err(SchedKitError::input_format(
            record,
            field,
            format!("{values:?}"),
        )),
    }
}

/// `"3"` → `[3, 3]`, `"1-3"` → `[1, 3]`, `["3", "4"]` → `[3, 4]`.
fn parse_credits(record: &str, raw: &RawCredits) -> Result<[f64; 2]> {
    let (min, max) = match raw {
        RawCredits::Pair(values) => {
            let [min, max] = exact_pair(record, "cr", values)?;
            (min, max)
        }
        RawCredits::Text(text) => match text.split_once('-') {
            Some((min, max)) => (min, max),
            None => (text.as_str(), text.as_str()),
        },
    };

    let cr = [
        parse_float(record, "cr", min)?,
        parse_float(record, "cr", max)?,
    ];

    if cr[0] > cr[1] {
        return Err(SchedKitError::input_format(
            record,
            "cr",
            format!("{min}-{max}"),
        ));
    }

    Ok(cr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(crn: &str, subject: &str, course: &str, cr: RawCredits) -> RawSection {
        RawSection {
            crn: crn.into(),
            subject: subject.into(),
            course: course.into(),
            section: "01".into(),
            cr,
            title: "Intro".into(),
            description: String::new(),
            note: String::new(),
            session: String::new(),
            days: vec!["MW".into()],
            times: vec![vec!["0800".into(), "0915".into()]],
            places: vec![vec!["OLS".into(), "128".into()]],
            instructor: "Smith, J".into(),
            cap: vec!["12".into(), "30".into()],
        }
    }

    fn pair(a: &str, b: &str) -> RawCredits {
        RawCredits::Pair(vec![a.into(), b.into()])
    }

    #[test]
    fn coerces_numeric_fields() {
        let table = TagTable::default();
        let mut record = raw(" 10234 ", "CSE", "1001", pair("3", "4"));
        record.description = "Programming for everyone (CL)".into();

        let section = normalize_section(&record, 0, &table).unwrap();
        assert_eq!(section.crn, 10234);
        assert_eq!(section.course, 1001);
        assert_eq!(section.cap, [12, 30]);
        assert_eq!(section.cr, [3.0, 4.0]);
        assert_eq!(section.times, vec![[800, 915]]);
        assert_eq!(section.tags.len(), 1);
        assert_eq!(section.tags[0].code(), "CL");
        assert_eq!(section.places, vec![vec!["OLS".to_string(), "128".to_string()]]);
    }

    #[test]
    fn credit_text_forms() {
        let table = TagTable::default();
        let single = normalize_section(&raw("1", "CSE", "1001", RawCredits::Text("3".into())), 0, &table)
            .unwrap();
        assert_eq!(single.cr, [3.0, 3.0]);

        let range = normalize_section(&raw("1", "CSE", "1001", RawCredits::Text("1-3".into())), 0, &table)
            .unwrap();
        assert_eq!(range.cr, [1.0, 3.0]);
    }

    #[test]
    fn malformed_number_is_fatal() {
        let table = TagTable::default();
        let mut record = raw("10234", "CSE", "1001", pair("3", "3"));
        record.cap = vec!["12".into(), "thirty".into()];

        let err = normalize_section(&record, 0, &table).unwrap_err();
        match err {
            SchedKitError::InputFormat { record, field, value } => {
                assert_eq!(record, "crn 10234");
                assert_eq!(field, "cap");
                assert_eq!(value, "thirty");
            }
            other => panic!("expected InputFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_crn_labels_by_position() {
        let table = TagTable::default();
        let record = raw("", "CSE", "1001", pair("3", "3"));
        let err = normalize_section(&record, 7, &table).unwrap_err();
        assert!(err.to_string().contains("record #7"));
    }

    #[test]
    fn inverted_or_non_finite_credits_are_fatal() {
        let table = TagTable::default();
        assert!(normalize_section(&raw("1", "CSE", "1001", pair("4", "3")), 0, &table).is_err());
        assert!(normalize_section(&raw("1", "CSE", "1001", pair("inf", "inf")), 0, &table).is_err());
        assert!(
            normalize_section(&raw("1", "CSE", "1001", RawCredits::Text("1-2-3".into())), 0, &table)
                .is_err()
        );
    }

    #[test]
    fn wrong_pair_arity_is_fatal() {
        let table = TagTable::default();
        let mut record = raw("1", "CSE", "1001", pair("3", "3"));
        record.times = vec![vec!["0800".into()]];
        let err = normalize_section(&record, 0, &table).unwrap_err();
        assert!(err.to_string().contains("`times`"));
    }

    #[test]
    fn sorted_by_crn() {
        let table = TagTable::default();
        let input = vec![
            raw("300", "CSE", "1001", pair("3", "3")),
            raw("100", "MTH", "1001", pair("4", "4")),
            raw("200", "CSE", "2010", pair("3", "3")),
        ];
        let sections = normalize_sections(&input, &table).unwrap();
        let crns: Vec<u32> = sections.iter().map(|s| s.crn).collect();
        assert_eq!(crns, vec![100, 200, 300]);
    }

    #[test]
    fn duplicate_crn_is_rejected() {
        let table = TagTable::default();
        let input = vec![
            raw("100", "CSE", "1001", pair("3", "3")),
            raw("100", "CSE", "1001", pair("3", "3")),
        ];
        let err = normalize_sections(&input, &table).unwrap_err();
        assert!(err.to_string().contains("duplicate crn 100"));
    }

    #[test]
    fn one_bad_record_fails_the_run() {
        let table = TagTable::default();
        let input = vec![
            raw("100", "CSE", "1001", pair("3", "3")),
            raw("101", "CSE", "x1001", pair("3", "3")),
        ];
        assert!(matches!(
            normalize_sections(&input, &table),
            Err(SchedKitError::InputFormat { .. })
        ));
    }
}
