//! Mapping request paths onto the served directory.

use std::path::{Path, PathBuf};

use super::http::{escape_html, percent_decode, percent_encode};

/// Files served in place of a directory listing
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// What a request path refers to under the served root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// Directory without an index file, listed on the fly
    Listing { dir: PathBuf, url_path: String },
    /// Directory requested without trailing slash
    Redirect(String),
    Forbidden,
    NotFound,
}

/// Resolve a still-encoded request path against `root`.
///
/// `..` segments are refused outright rather than normalised away.
pub fn resolve(root: &Path, raw_path: &str) -> Resolved {
    let decoded = percent_decode(raw_path);
    if !decoded.starts_with('/') {
        return Resolved::NotFound;
    }

    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Resolved::Forbidden,
            s if s.contains('\\') || s.contains('\0') => return Resolved::Forbidden,
            s => path.push(s),
        }
    }

    if path.is_dir() {
        if !decoded.ends_with('/') {
            return Resolved::Redirect(format!("{}/", raw_path));
        }
        for index in INDEX_FILES {
            let candidate = path.join(index);
            if candidate.is_file() {
                return Resolved::File(candidate);
            }
        }
        return Resolved::Listing {
            dir: path,
            url_path: decoded,
        };
    }

    if path.is_file() {
        Resolved::File(path)
    } else {
        Resolved::NotFound
    }
}

/// Content-Type for a file, from its extension
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "md" | "markdown" => "text/markdown; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// HTML index of a directory, directories first then files, each sorted
pub fn directory_listing(dir: &Path, url_path: &str) -> std::io::Result<String> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    dirs.sort();
    files.sort();

    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &dirs {
        html.push_str(&format!(
            "<li><a href=\"{}/\">{}/</a></li>\n",
            percent_encode(name),
            escape_html(name)
        ));
    }
    for name in &files {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            percent_encode(name),
            escape_html(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}
