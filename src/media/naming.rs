//! File naming for split parts.
//!
//! Parts are named `<base>_part<NNNN>.<ext>`. An optional brand suffix may
//! follow the stem; every parser strips it first so it never affects part
//! numbers or grouping.

use regex::Regex;
use std::sync::LazyLock;

/// Cosmetic suffix appended to shared file stems.
pub const BRAND_SUFFIX: &str = "_clipwise";

const PART_MARKER: &str = "_part";

static PART_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_part(\d+)$").expect("Invalid regex"));

/// Zero-padded part token.
///
/// The width is one digit wider than the estimate needs (at least 4) so names
/// still sort lexically when the real part count overshoots the estimate.
pub fn format_part_number(part: usize, estimated_total: usize) -> String {
    let digits = estimated_total.max(1).to_string().len();
    let width = (digits + 1).max(4);
    format!("{:0width$}", part, width = width)
}

/// `<base>_part<NNNN>.<ext>`, with the brand suffix stripped from `base`.
pub fn part_file_name(base: &str, part: usize, estimated_total: usize, extension: &str) -> String {
    let base = strip_brand_suffix(base);
    let token = format_part_number(part, estimated_total);
    if extension.is_empty() {
        format!("{base}{PART_MARKER}{token}")
    } else {
        format!("{base}{PART_MARKER}{token}.{extension}")
    }
}

/// Part number of a part file name, if it has one.
pub fn parse_part_number(file_name: &str) -> Option<usize> {
    let stem = strip_brand_suffix(file_stem(file_name));
    PART_NUMBER.captures(&stem)?[1].parse().ok()
}

/// Append the brand suffix to the stem. Idempotent.
pub fn append_brand_suffix(file_name: &str) -> String {
    let (stem, extension) = split_extension(file_name);
    if stem.ends_with(BRAND_SUFFIX) {
        return file_name.to_string();
    }
    match extension {
        Some(ext) => format!("{stem}{BRAND_SUFFIX}.{ext}"),
        None => format!("{stem}{BRAND_SUFFIX}"),
    }
}

/// Remove every trailing brand suffix from a stem.
pub fn strip_brand_suffix(stem: &str) -> String {
    let mut stem = stem;
    while let Some(stripped) = stem.strip_suffix(BRAND_SUFFIX) {
        stem = stripped;
    }
    stem.to_string()
}

fn file_stem(file_name: &str) -> &str {
    split_extension(file_name).0
}

fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => (&file_name[..pos], Some(&file_name[pos + 1..])),
        _ => (file_name, None),
    }
}
