//! Poster reference normalization.
//!
//! The lookup service hands out relative image paths like `/abc.jpg`. The
//! catalog stores the final display URL instead, so nothing downstream has to
//! know about the image host.

/// Base URL prepended to raw poster paths.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Shown when the lookup service has no poster for a movie.
pub const NO_IMAGE_PATH: &str = "/static/images/No-Picture-Found.png";

/// Turn a raw poster path into its display form.
///
/// Values already in display form pass through unchanged, so calling this
/// twice is harmless.
pub fn normalize_poster_path(raw: &str) -> String {
    if raw.is_empty() {
        return NO_IMAGE_PATH.to_string();
    }
    if raw == NO_IMAGE_PATH || raw.starts_with(POSTER_BASE_URL) {
        return raw.to_string();
    }
    format!("{POSTER_BASE_URL}{raw}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_gets_base_url() {
        assert_eq!(
            normalize_poster_path("/abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn test_empty_path_becomes_sentinel() {
        assert_eq!(normalize_poster_path(""), NO_IMAGE_PATH);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_poster_path("/abc.jpg");
        assert_eq!(normalize_poster_path(&once), once);
        assert_eq!(normalize_poster_path(NO_IMAGE_PATH), NO_IMAGE_PATH);
    }
}
