use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

/// Key of the per-collection entry mapping field names to record positions.
const MAP_KEY: &str = "map";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Albums,
    Tracks,
    Playlists,
}

impl Collection {
    fn key(self) -> &'static str {
        match self {
            Collection::Albums => "albums",
            Collection::Tracks => "tracks",
            Collection::Playlists => "playlists",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What to do when a collection's `map` does not say where a required field lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Use the historic default position and log a warning
    #[default]
    Fallback,
    /// Refuse to decode the library
    Strict,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("The {collection} map has no `{field}` entry")]
    MissingFieldIndex {
        collection: Collection,
        field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub track_ids: Vec<String>,
}

/// A decoded snapshot of the remote library.
///
/// Records keep the order the service sent them in. Field positions are
/// resolved from each collection's `map` once, while decoding.
#[derive(Debug, Clone, Default)]
pub struct Library {
    albums: Vec<Album>,
    tracks: Vec<Track>,
    playlists: Vec<Playlist>,
    album_index: HashMap<String, usize>,
}

impl Library {
    /// Decode the raw `library` response.
    ///
    /// A missing `library` object or a missing collection decodes to an empty collection.
    pub fn from_value(response: &Value, policy: FieldPolicy) -> Result<Self, LibraryError> {
        let root = response.get("library");
        let collection = |c: Collection| root.and_then(|r| r.get(c.key())).and_then(Value::as_object);

        let albums = match collection(Collection::Albums) {
            Some(raw) => decode_albums(raw, policy)?,
            None => Vec::new(),
        };
        let tracks = match collection(Collection::Tracks) {
            Some(raw) => decode_tracks(raw, policy)?,
            None => Vec::new(),
        };
        let playlists = match collection(Collection::Playlists) {
            Some(raw) => decode_playlists(raw, policy)?,
            None => Vec::new(),
        };

        tracing::debug!(
            "Decoded library: {} albums, {} tracks, {} playlists",
            albums.len(),
            tracks.len(),
            playlists.len()
        );

        Ok(Self::new(albums, tracks, playlists))
    }

    pub fn new(albums: Vec<Album>, tracks: Vec<Track>, playlists: Vec<Playlist>) -> Self {
        let album_index = albums
            .iter()
            .enumerate()
            .map(|(i, album)| (album.id.clone(), i))
            .collect();
        Self {
            albums,
            tracks,
            playlists,
            album_index,
        }
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn album(&self, id: &str) -> Option<&Album> {
        self.album_index.get(id).map(|&i| &self.albums[i])
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    /// Find a playlist by its display name. Names are not unique on the
    /// service; the last one listed wins.
    pub fn playlist_by_name(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().rev().find(|p| p.name == name)
    }

    /// Forget a playlist that was deleted on the server.
    pub fn remove_playlist(&mut self, id: &str) {
        self.playlists.retain(|p| p.id != id);
    }
}

/// Field name to record position lookup for one collection.
struct FieldMap<'a> {
    collection: Collection,
    map: Option<&'a Map<String, Value>>,
    policy: FieldPolicy,
}

impl<'a> FieldMap<'a> {
    fn new(collection: Collection, raw: &'a Map<String, Value>, policy: FieldPolicy) -> Self {
        Self {
            collection,
            map: raw.get(MAP_KEY).and_then(Value::as_object),
            policy,
        }
    }

    fn lookup(&self, field: &str) -> Option<usize> {
        self.map
            .and_then(|map| map.get(field))
            .and_then(Value::as_u64)
            .map(|i| i as usize)
    }

    /// Position of a field every record must have.
    fn required(&self, field: &'static str, default: usize) -> Result<usize, LibraryError> {
        if let Some(index) = self.lookup(field) {
            return Ok(index);
        }
        match self.policy {
            FieldPolicy::Strict => Err(LibraryError::MissingFieldIndex {
                collection: self.collection,
                field,
            }),
            FieldPolicy::Fallback => {
                tracing::warn!(
                    "The {} map has no `{}` entry, assuming position {}",
                    self.collection,
                    field,
                    default
                );
                Ok(default)
            }
        }
    }
}

fn records(raw: &Map<String, Value>) -> impl Iterator<Item = (&String, &Vec<Value>)> {
    raw.iter()
        .filter(|(id, _)| id.as_str() != MAP_KEY)
        .filter_map(|(id, record)| match record.as_array() {
            Some(fields) => Some((id, fields)),
            None => {
                tracing::warn!("Skipping record {}: not an array", id);
                None
            }
        })
}

fn string_field(fields: &[Value], index: usize) -> Option<String> {
    fields.get(index).and_then(Value::as_str).map(str::to_string)
}

fn id_list_field(fields: &[Value], index: usize) -> Option<Vec<String>> {
    fields.get(index)?.as_array()?.iter().map(id_string).collect()
}

/// IDs come back either as numbers or as strings depending on the endpoint.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_albums(raw: &Map<String, Value>, policy: FieldPolicy) -> Result<Vec<Album>, LibraryError> {
    let map = FieldMap::new(Collection::Albums, raw, policy);
    let name_index = map.required("name", 0)?;
    let tracks_index = map.required("tracks", 1)?;

    let albums = records(raw)
        .filter_map(|(id, fields)| {
            let (Some(name), Some(track_ids)) = (
                string_field(fields, name_index),
                id_list_field(fields, tracks_index),
            ) else {
                tracing::warn!("Skipping album {}: unexpected record shape", id);
                return None;
            };
            Some(Album {
                id: id.clone(),
                name,
                track_ids,
            })
        })
        .collect();
    Ok(albums)
}

fn decode_tracks(raw: &Map<String, Value>, policy: FieldPolicy) -> Result<Vec<Track>, LibraryError> {
    let map = FieldMap::new(Collection::Tracks, raw, policy);
    let path_index = map.required("path", 12)?;
    let title_index = map.lookup("title");

    let tracks = records(raw)
        .filter_map(|(id, fields)| {
            let Some(path) = string_field(fields, path_index) else {
                tracing::warn!("Skipping track {}: no path at position {}", id, path_index);
                return None;
            };
            Some(Track {
                id: id.clone(),
                title: title_index.and_then(|i| string_field(fields, i)),
                path,
            })
        })
        .collect();
    Ok(tracks)
}

fn decode_playlists(
    raw: &Map<String, Value>,
    policy: FieldPolicy,
) -> Result<Vec<Playlist>, LibraryError> {
    let map = FieldMap::new(Collection::Playlists, raw, policy);
    let name_index = map.required("name", 0)?;
    let tracks_index = map.required("tracks", 1)?;

    let playlists = records(raw)
        .filter_map(|(id, fields)| {
            let Some(name) = string_field(fields, name_index) else {
                tracing::warn!("Skipping playlist {}: no name at position {}", id, name_index);
                return None;
            };
            tracing::debug!("Found playlist: {}", name);
            Some(Playlist {
                id: id.clone(),
                name,
                track_ids: id_list_field(fields, tracks_index).unwrap_or_default(),
            })
        })
        .collect();
    Ok(playlists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_library_json;
    use serde_json::json;

    #[test]
    fn test_decode_sample_library() {
        let library = Library::from_value(&sample_library_json(), FieldPolicy::Strict).unwrap();

        assert_eq!(library.albums().len(), 3);
        assert_eq!(library.tracks().len(), 5);
        assert_eq!(library.playlists().len(), 2);

        let abbey = library.album("100").unwrap();
        assert_eq!(abbey.name, "Abbey Road");
        assert_eq!(abbey.track_ids, vec!["1", "2"]);

        let track = library.track("3").unwrap();
        assert_eq!(track.path, "/music/pop/track.mp3");
        assert_eq!(track.title.as_deref(), Some("Pop Song"));
    }

    #[test]
    fn test_records_keep_document_order() {
        let library = Library::from_value(&sample_library_json(), FieldPolicy::Strict).unwrap();
        let ids: Vec<&str> = library.albums().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["100", "300", "200"]);
    }

    #[test]
    fn test_field_positions_follow_the_map() {
        let response = json!({
            "library": {
                "albums": {
                    "map": { "tracks": 0, "name": 2 },
                    "7": [[11, "12"], 1999, "Reordered"]
                }
            }
        });
        let library = Library::from_value(&response, FieldPolicy::Strict).unwrap();
        let album = library.album("7").unwrap();
        assert_eq!(album.name, "Reordered");
        assert_eq!(album.track_ids, vec!["11", "12"]);
    }

    #[test]
    fn test_missing_collections_are_empty() {
        let library = Library::from_value(&json!({}), FieldPolicy::Strict).unwrap();
        assert!(library.albums().is_empty());
        assert!(library.tracks().is_empty());
        assert!(library.playlists().is_empty());

        let library =
            Library::from_value(&json!({ "library": { "albums": {} } }), FieldPolicy::Strict)
                .unwrap();
        assert!(library.albums().is_empty());
    }

    #[test]
    fn test_missing_map_entry_strict() {
        let response = json!({
            "library": {
                "tracks": {
                    "map": { "title": 0 },
                    "1": ["Song", "/music/song.mp3"]
                }
            }
        });
        let err = Library::from_value(&response, FieldPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            LibraryError::MissingFieldIndex {
                collection: Collection::Tracks,
                field: "path"
            }
        );
    }

    #[test]
    fn test_missing_map_entry_falls_back_to_default_position() {
        let response = json!({
            "library": {
                "albums": {
                    "map": {},
                    "5": ["Fallback Album", [1, 2, 3]]
                }
            }
        });
        let library = Library::from_value(&response, FieldPolicy::Fallback).unwrap();
        let album = library.album("5").unwrap();
        assert_eq!(album.name, "Fallback Album");
        assert_eq!(album.track_ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_missing_track_path_uses_the_track_default_position() {
        let response = json!({
            "library": {
                "albums": {
                    "map": { "name": 0, "tracks": 1, "path": 0 },
                    "5": ["Some Album", [1]]
                },
                "tracks": {
                    "map": { "title": 0 },
                    "1": [
                        "Song", 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11,
                        "/music/deep/song.mp3"
                    ]
                }
            }
        });
        let library = Library::from_value(&response, FieldPolicy::Fallback).unwrap();
        let track = library.track("1").unwrap();
        assert_eq!(track.path, "/music/deep/song.mp3");
        assert_eq!(track.title.as_deref(), Some("Song"));

        let mut selection = crate::selection::Selection::new();
        assert_eq!(selection.select_tracks_by_folder(&library, "/music/deep", false), 1);
        assert_eq!(selection.tracks(), ["1".to_string()]);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let response = json!({
            "library": {
                "albums": {
                    "map": { "name": 0, "tracks": 1 },
                    "1": "not a record",
                    "2": [42, [1]],
                    "3": ["Good", [1]]
                }
            }
        });
        let library = Library::from_value(&response, FieldPolicy::Strict).unwrap();
        assert_eq!(library.albums().len(), 1);
        assert_eq!(library.albums()[0].id, "3");
    }

    #[test]
    fn test_playlist_by_name_prefers_last() {
        let library = Library::new(
            vec![],
            vec![],
            vec![
                Playlist {
                    id: "1".into(),
                    name: "Mix".into(),
                    track_ids: vec![],
                },
                Playlist {
                    id: "2".into(),
                    name: "Mix".into(),
                    track_ids: vec![],
                },
            ],
        );
        assert_eq!(library.playlist_by_name("Mix").unwrap().id, "2");
        assert!(library.playlist_by_name("mix").is_none());
    }
}
