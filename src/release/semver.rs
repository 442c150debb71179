//! Semver-like normalization of release ids
//!
//! `normalize(series, name)` walks [`RULES`] in order and returns the output of
//! the first rule that applies. `series` is the `major.minor` release line the
//! name belongs to, e.g. `1.21` for `25w45a`.

use std::sync::LazyLock;

use regex::Regex;

static RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+(\.\d+)?$").unwrap());

static PRE_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+(?:-pre| Pre-[Rr]elease )(\d+)$").unwrap());

static RELEASE_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+(?:-rc| [Rr]elease Candidate )(\d+)$").unwrap());

static WEEKLY_SNAPSHOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Snapshot )?(\d+)w0?(0|[1-9]\d*)([a-z])$").unwrap());

/// `major.minor.patch` anywhere in a name
static RELEASE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.(\d+)").unwrap());

static SERIES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\d+").unwrap());

/// Release candidates of this series continue the numbering of its pre-releases
const RC_OFFSET_SERIES: &str = "1.16";
const RC_OFFSET: u64 = 8;

/// Pre-releases before `1.16.1` are labelled `rc`, later ones `beta`
const BETA_PRE_RELEASE_MINOR: u64 = 16;

type Rule = fn(&str, &str) -> Option<String>;

/// Normalization rules, in the order they are tried
const RULES: &[(&str, Rule)] = &[
    ("combat_test", combat_test),
    ("release", release),
    ("series_pre_release", series_pre_release),
    ("weekly_snapshot", weekly_snapshot),
    ("generic", generic),
];

/// Turns a raw release id into a semver-like string
pub fn normalize(series: &str, name: &str) -> String {
    RULES
        .iter()
        .find_map(|(_, rule)| rule(series, name))
        .unwrap_or_else(|| normalize_generic(name))
}

/// `major.minor` prefix of a release id, if it has one
pub fn series_of(id: &str) -> Option<&str> {
    SERIES.find(id).map(|m| m.as_str())
}

fn with_series(series: &str, suffix: &str) -> String {
    format!("{}-{}", series.replace("-af", ""), suffix)
}

/// Combat test builds carry no usable series relation
fn combat_test(_series: &str, name: &str) -> Option<String> {
    name.contains("combat").then(|| normalize_generic(name))
}

fn release(_series: &str, name: &str) -> Option<String> {
    RELEASE.is_match(name).then(|| name.to_string())
}

fn series_pre_release(series: &str, name: &str) -> Option<String> {
    if !name.starts_with(series) {
        return None;
    }

    let suffix = if let Some(caps) = RELEASE_CANDIDATE.captures(name) {
        let build = &caps[1];
        let build = match build.parse::<u64>() {
            Ok(n) if name.split('-').next() == Some(RC_OFFSET_SERIES) => (n + RC_OFFSET).to_string(),
            _ => build.to_string(),
        };
        format!("rc.{build}")
    } else if let Some(caps) = PRE_RELEASE.captures(name) {
        let label = if is_legacy_pre_release(series, name) {
            "rc"
        } else {
            "beta"
        };
        format!("{label}.{}", &caps[1])
    } else {
        name.to_string()
    };

    Some(match RELEASE_PREFIX.find(name) {
        Some(m) => format!("{}-{}", m.as_str(), suffix),
        None => with_series(series, &suffix),
    })
}

fn is_legacy_pre_release(series: &str, name: &str) -> bool {
    let Some(minor) = series.split('.').nth(1).and_then(leading_number) else {
        return false;
    };

    let patch = RELEASE_PREFIX
        .captures(name)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .unwrap_or(0);

    minor < BETA_PRE_RELEASE_MINOR || (minor == BETA_PRE_RELEASE_MINOR && patch < 1)
}

fn leading_number(part: &str) -> Option<u64> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

fn weekly_snapshot(series: &str, name: &str) -> Option<String> {
    WEEKLY_SNAPSHOT.captures(name).map(|caps| {
        with_series(
            series,
            &format!("alpha.{}.{}.{}", &caps[1], &caps[2], &caps[3]),
        )
    })
}

fn generic(series: &str, name: &str) -> Option<String> {
    Some(with_series(series, &normalize_generic(name)))
}

/// Separates digit and letter runs with `.`, strips leading zeros, keeps `.`
/// and `-`, turns any other punctuation into `.` and collapses consecutive
/// separators. Leading and trailing dots are removed.
fn normalize_generic(version: &str) -> String {
    let mut out = String::with_capacity(version.len() + 5);
    let mut last_is_digit = false;
    let mut last_is_leading_zero = false;
    let mut last_is_separator = false;

    for (i, c) in version.chars().enumerate() {
        let c = if c.is_ascii_digit() {
            if i > 0 && !last_is_digit && !last_is_separator {
                out.push('.');
            } else if last_is_digit && last_is_leading_zero {
                out.pop();
            }

            last_is_leading_zero = c == '0' && (!last_is_digit || last_is_leading_zero);
            last_is_separator = false;
            last_is_digit = true;
            c
        } else if c == '.' || c == '-' {
            if last_is_separator {
                continue;
            }
            last_is_separator = true;
            last_is_digit = false;
            c
        } else if !c.is_ascii_alphabetic() {
            if last_is_separator {
                continue;
            }
            last_is_separator = true;
            last_is_digit = false;
            '.'
        } else {
            if last_is_digit {
                out.push('.');
            }
            last_is_separator = false;
            last_is_digit = false;
            c
        };

        out.push(c);
    }

    out.trim_matches('.').to_string()
}
