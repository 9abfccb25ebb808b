//! Shared utilities for resolver modules: regex cascades, HTML cleanup, and
//! file metadata normalization.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Returns the first capture of `regex` in `text`, trimmed.
#[must_use]
pub fn extract_capture(text: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}

/// Runs an ordered cascade of patterns and returns the first non-empty
/// capture. Providers change their markup frequently; later patterns are
/// fallbacks for older page layouts.
#[must_use]
pub fn extract_cascade(text: &str, patterns: &[&Regex]) -> Option<String> {
    patterns
        .iter()
        .find_map(|regex| extract_capture(text, regex).filter(|value| !value.is_empty()))
}

static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"<[^>]*>"));

/// Strips residual HTML tags from a scraped fragment and trims it.
#[must_use]
pub fn strip_html_tags(value: &str) -> String {
    HTML_TAG_RE.replace_all(value, "").trim().to_string()
}

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^([\d.]+)\s*([A-Za-z]+)?$"));

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Normalizes a scraped file-size string to `"<value> <unit>"` form.
///
/// Unit aliases fold to their canonical spelling (`K`, `kb`, and `KiB` all
/// become `KB`). A bare number is a byte count and is scaled to the largest
/// unit that keeps the value at or above one. Unparseable input is returned
/// as-is, minus any embedded markup.
#[must_use]
pub fn normalize_file_size(raw: &str) -> String {
    let cleaned = strip_html_tags(raw);
    let Some(caps) = SIZE_RE.captures(&cleaned) else {
        return cleaned;
    };
    let Ok(number) = caps[1].parse::<f64>() else {
        return cleaned;
    };
    match caps.get(2) {
        Some(unit) => match canonical_unit(unit.as_str()) {
            Some(unit) => format!("{} {unit}", format_size_value(number)),
            None => cleaned,
        },
        None => format_byte_count(number),
    }
}

/// Formats a byte count as a human-readable size.
#[must_use]
pub fn format_byte_count(bytes: f64) -> String {
    let mut value = bytes.max(0.0);
    let mut index = 0;
    while value >= 1024.0 && index < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    format!("{} {}", format_size_value(value), SIZE_UNITS[index])
}

fn canonical_unit(unit: &str) -> Option<&'static str> {
    match unit.to_ascii_uppercase().as_str() {
        "B" | "BYTE" | "BYTES" => Some("B"),
        "K" | "KB" | "KIB" => Some("KB"),
        "M" | "MB" | "MIB" => Some("MB"),
        "G" | "GB" | "GIB" => Some("GB"),
        "T" | "TB" | "TIB" => Some("TB"),
        _ => None,
    }
}

/// Rounds a size value with precision scaled to its magnitude, then lets the
/// float formatter trim trailing zeros.
fn format_size_value(value: f64) -> String {
    let rounded = if value >= 1000.0 {
        value.round()
    } else if value >= 100.0 {
        (value * 10.0).round() / 10.0
    } else {
        (value * 100.0).round() / 100.0
    };
    format!("{rounded}")
}

/// Maps a file name's extension to a coarse type label.
#[must_use]
pub fn file_type_from_name(file_name: &str) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let label = match extension.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "svg" => "图片文件",
        "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" => "视频文件",
        "mp3" | "wav" | "flac" | "aac" | "ogg" => "音频文件",
        "pdf" => "PDF文档",
        "doc" | "docx" => "Word文档",
        "xls" | "xlsx" => "Excel表格",
        "ppt" | "pptx" => "PowerPoint演示",
        "txt" => "文本文件",
        "zip" | "rar" | "7z" | "tar" | "gz" => "压缩文件",
        "exe" => "可执行文件",
        "msi" => "安装程序",
        "apk" => "Android应用",
        "ipa" => "iOS应用",
        "iso" => "镜像文件",
        "dmg" => "磁盘镜像",
        "deb" => "Debian包",
        "rpm" => "RPM包",
        _ => "未知文件",
    };
    label.to_string()
}

/// Pulls a file name out of a URL's query string, e.g. the `fn` parameter on
/// lanzou frame URLs or `download_name` on feijipan redirect targets.
#[must_use]
pub fn file_name_from_query(url: &str, param: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
