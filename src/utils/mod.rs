// imgpress/src/utils/mod.rs
use std::path::{Path, PathBuf};

/// Picks a path for `file_name` inside `output_dir` that does not clobber
/// an existing file, appending `_1`, `_2`, ... to the stem as needed.
pub fn generate_output_path(output_dir: &Path, file_name: &str) -> PathBuf {
    let file_name = sanitize_filename(file_name);
    let candidate = output_dir.join(&file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(&file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = path.extension().and_then(|ext| ext.to_str());

    let mut counter = 1;
    loop {
        let name = match extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = output_dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Swaps the extension of a bare file name, keeping the stem.
pub fn replace_extension(file_name: &str, extension: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}.{}", &file_name[..dot], extension),
        _ => format!("{}.{}", file_name, extension),
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

/// MIME type for a path, judged by extension the way a browser file
/// picker labels uploads.
pub fn mime_from_path(path: &Path) -> &'static str {
    match get_file_extension(path).as_deref() {
        Some("jpg") | Some("jpeg") | Some("jfif") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

pub fn sanitize_filename(filename: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    filename
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect()
}

pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
}
