use std::fmt;

/// Errors from the Plex client
#[derive(Debug)]
pub enum PlexError {
    Http(Box<reqwest::Error>),
    ApiError(String),
    SectionNotFound(String),
    NotFound(String),
    EmptyLibrary,
    MissingThumb(String),
}

impl fmt::Display for PlexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::ApiError(msg) => write!(f, "API error: {msg}"),
            Self::SectionNotFound(section) => write!(f, "Library section '{section}' not found"),
            Self::NotFound(title) => write!(f, "Movie '{title}' not found"),
            Self::EmptyLibrary => write!(f, "Library section has no movies"),
            Self::MissingThumb(title) => write!(f, "Movie '{title}' has no poster"),
        }
    }
}

impl std::error::Error for PlexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PlexError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PlexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = PlexError::NotFound("Heat".to_string());
        assert_eq!(format!("{}", err), "Movie 'Heat' not found");
    }

    #[test]
    fn test_section_not_found_display() {
        let err = PlexError::SectionNotFound("Movies".to_string());
        assert_eq!(format!("{}", err), "Library section 'Movies' not found");
    }
}
