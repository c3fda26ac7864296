use serde::{Deserialize, Serialize};

/// A movie title and a URL its poster can be downloaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poster {
    pub title: String,
    pub poster_url: String,
}

/// Every Plex JSON response wraps its payload in `MediaContainer`
#[derive(Debug, Deserialize)]
pub(crate) struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub(crate) media_container: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    pub(crate) directories: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LibrarySection {
    pub(crate) key: String,
    pub(crate) title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    pub(crate) metadata: Vec<MovieMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MovieMetadata {
    pub(crate) title: String,
    pub(crate) thumb: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_deserialization() {
        let json = r#"{
            "MediaContainer": {
                "size": 2,
                "Directory": [
                    {"key": "1", "title": "Movies", "type": "movie"},
                    {"key": "2", "title": "TV Shows", "type": "show"}
                ]
            }
        }"#;

        let response: PlexResponse<SectionsContainer> = serde_json::from_str(json).unwrap();
        let sections = response.media_container.directories;
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].key, "1");
        assert_eq!(sections[1].title, "TV Shows");
    }

    #[test]
    fn test_empty_section_has_no_metadata_key() {
        let json = r#"{"MediaContainer": {"size": 0}}"#;

        let response: PlexResponse<MetadataContainer> = serde_json::from_str(json).unwrap();
        assert!(response.media_container.metadata.is_empty());
    }

    #[test]
    fn test_movie_without_thumb() {
        let json = r#"{
            "MediaContainer": {
                "Metadata": [
                    {"ratingKey": "7", "title": "Alien", "thumb": "/library/metadata/7/thumb/1"},
                    {"ratingKey": "8", "title": "Untitled"}
                ]
            }
        }"#;

        let response: PlexResponse<MetadataContainer> = serde_json::from_str(json).unwrap();
        let movies = response.media_container.metadata;
        assert_eq!(movies[0].thumb.as_deref(), Some("/library/metadata/7/thumb/1"));
        assert!(movies[1].thumb.is_none());
    }
}
