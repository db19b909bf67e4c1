use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use super::error::AssetError;

const CHUNK: usize = 64 * 1024;

/// Where relative asset paths are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBase {
    Directory(PathBuf),
    /// Absolute `http(s)://` prefix, always ending in `/`.
    Url(String),
}

impl AssetBase {
    /// `http://` or `https://` strings become URLs, anything else a directory.
    pub fn parse(s: &str) -> Self {
        if is_url(s) {
            let mut url = s.to_string();
            if !url.ends_with('/') {
                url.push('/');
            }
            AssetBase::Url(url)
        } else {
            AssetBase::Directory(PathBuf::from(s))
        }
    }

    /// Resolves `relative` against this base. Absolute URLs pass through;
    /// a leading `/` means the base root.
    pub fn resolve(&self, relative: &str) -> AssetLocation {
        if is_url(relative) {
            return AssetLocation::Url(relative.to_string());
        }
        let rel = relative.trim_start_matches('/');
        match self {
            AssetBase::Directory(dir) => AssetLocation::File(dir.join(rel)),
            AssetBase::Url(base) => AssetLocation::Url(format!("{base}{rel}")),
        }
    }
}

impl fmt::Display for AssetBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetBase::Directory(p) => write!(f, "{}", p.display()),
            AssetBase::Url(u) => f.write_str(u),
        }
    }
}

/// A fully resolved asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::File(p) => write!(f, "{}", p.display()),
            AssetLocation::Url(u) => f.write_str(u),
        }
    }
}

/// Bytes received so far, and the expected total when the source reports one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Whole percent complete, when the total is known.
    pub fn percent(&self) -> Option<u32> {
        match self.total {
            Some(0) => Some(100),
            Some(t) => Some(((self.loaded.min(t) * 100) / t) as u32),
            None => None,
        }
    }
}

impl fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(p) => write!(f, "{p}%"),
            None => write!(f, "{} bytes", self.loaded),
        }
    }
}

/// Reads the whole asset, reporting progress after each chunk.
pub fn fetch(
    location: &AssetLocation,
    progress: &mut dyn FnMut(LoadProgress),
) -> Result<Vec<u8>, AssetError> {
    let read_err = |source| AssetError::Read { location: location.to_string(), source };

    match location {
        AssetLocation::File(path) => {
            let file = File::open(path).map_err(read_err)?;
            let total = file.metadata().ok().map(|m| m.len());
            read_with_progress(file, total, progress).map_err(read_err)
        }
        AssetLocation::Url(url) => {
            let response = ureq::get(url).call().map_err(|e| AssetError::Http {
                url: url.clone(),
                source: Box::new(e),
            })?;
            let total = response
                .header("Content-Length")
                .and_then(|v| v.trim().parse::<u64>().ok());
            read_with_progress(response.into_reader(), total, progress).map_err(read_err)
        }
    }
}

fn read_with_progress<R: Read>(
    mut reader: R,
    total: Option<u64>,
    progress: &mut dyn FnMut(LoadProgress),
) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(total.unwrap_or(0).min(256 * 1024 * 1024) as usize);
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.extend_from_slice(&buf[..n]);
        progress(LoadProgress { loaded: out.len() as u64, total });
    }
    Ok(out)
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── resolution ───────────────────────────────────────────────────────

    #[test]
    fn url_base_joins_with_single_slash() {
        let base = AssetBase::parse("https://www.tighterthreads.us");
        assert_eq!(
            base.resolve("/models/logo.glb"),
            AssetLocation::Url("https://www.tighterthreads.us/models/logo.glb".into())
        );
        assert_eq!(
            base.resolve("aerodynamics_workshop_1k.hdr"),
            AssetLocation::Url("https://www.tighterthreads.us/aerodynamics_workshop_1k.hdr".into())
        );
    }

    #[test]
    fn directory_base_joins_paths() {
        let base = AssetBase::parse("assets");
        assert_eq!(
            base.resolve("/models/logo.glb"),
            AssetLocation::File(PathBuf::from("assets").join("models/logo.glb"))
        );
    }

    #[test]
    fn absolute_urls_ignore_the_base() {
        let base = AssetBase::parse("assets");
        let url = "http://cdn.example.com/env.hdr";
        assert_eq!(base.resolve(url), AssetLocation::Url(url.into()));
    }

    // ── progress ─────────────────────────────────────────────────────────

    #[test]
    fn percent_needs_a_total() {
        assert_eq!(LoadProgress { loaded: 50, total: Some(200) }.percent(), Some(25));
        assert_eq!(LoadProgress { loaded: 50, total: None }.percent(), None);
        assert_eq!(LoadProgress { loaded: 0, total: Some(0) }.percent(), Some(100));
        assert_eq!(LoadProgress { loaded: 50, total: Some(200) }.to_string(), "25%");
    }

    #[test]
    fn chunked_read_reports_monotonic_progress() {
        let data = vec![7u8; CHUNK * 2 + 10];
        let mut seen = Vec::new();
        let out = read_with_progress(&data[..], Some(data.len() as u64), &mut |p| seen.push(p.loaded))
            .unwrap();
        assert_eq!(out, data);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last().copied(), Some(data.len() as u64));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let loc = AssetLocation::File(PathBuf::from("definitely/not/here.glb"));
        let err = fetch(&loc, &mut |_| {}).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }
}
