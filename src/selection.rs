use std::collections::HashSet;

use crate::library::Library;
use crate::matcher;

/// An insertion-ordered set of IDs.
#[derive(Debug, Clone, Default)]
struct OrderedIds {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl OrderedIds {
    fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }
}

/// The albums and tracks picked for the next playlist.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    albums: OrderedIds,
    tracks: OrderedIds,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn albums(&self) -> &[String] {
        &self.albums.order
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks.order
    }

    /// Returns false if the album was already selected.
    pub fn select_album(&mut self, id: &str) -> bool {
        self.albums.insert(id)
    }

    /// Returns false if the track was already selected.
    pub fn select_track(&mut self, id: &str) -> bool {
        self.tracks.insert(id)
    }

    pub fn clear_albums(&mut self) {
        self.albums.clear();
    }

    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
    }

    /// Select every album whose name matches the wildcard `filter`.
    ///
    /// Without `append` the previous album selection is dropped first.
    /// Returns the size of the album selection afterwards.
    pub fn select_albums_by_name(&mut self, library: &Library, filter: &str, append: bool) -> usize {
        tracing::debug!("Select albums, filter: {}", filter);

        if !append {
            self.clear_albums();
        }

        for album in library.albums() {
            if matcher::matches(&album.name, filter) {
                tracing::debug!("Selected album: {}", album.name);
                self.select_album(&album.id);
            }
        }
        self.albums().len()
    }

    /// Select every track whose path starts with `folder`.
    ///
    /// This is a plain string prefix test: `/music/ab` also selects tracks
    /// below `/music/abc/`. Returns the size of the track selection afterwards.
    pub fn select_tracks_by_folder(&mut self, library: &Library, folder: &str, append: bool) -> usize {
        tracing::debug!("Select tracks, path: {}", folder);

        if !append {
            self.clear_tracks();
        }

        for track in library.tracks() {
            if track.path.starts_with(folder) {
                self.select_track(&track.id);
            }
        }
        self.tracks().len()
    }

    /// Flatten the selection into the track list of a playlist.
    ///
    /// Tracks of the selected albums come first, in album selection order,
    /// followed by the directly selected tracks. Duplicates are kept.
    pub fn playlist_track_list(&self, library: &Library) -> Vec<String> {
        let mut track_ids = Vec::new();

        for album_id in self.albums() {
            match library.album(album_id) {
                Some(album) => track_ids.extend(album.track_ids.iter().cloned()),
                None => tracing::warn!("Selected album {} is not in the library", album_id),
            }
        }
        track_ids.extend(self.tracks().iter().cloned());
        track_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::FieldPolicy;
    use crate::test_utils::sample_library_json;

    fn library() -> Library {
        Library::from_value(&sample_library_json(), FieldPolicy::Strict).unwrap()
    }

    #[test]
    fn test_select_albums_by_wildcard() {
        let library = library();
        let mut selection = Selection::new();

        let count = selection.select_albums_by_name(&library, "Abbey*", true);

        assert_eq!(count, 1);
        assert_eq!(selection.albums(), ["100"]);
    }

    #[test]
    fn test_select_albums_twice_does_not_duplicate() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_albums_by_name(&library, "*", true);
        let count = selection.select_albums_by_name(&library, "*", true);

        assert_eq!(count, 3);
        assert_eq!(selection.albums(), ["100", "300", "200"]);
    }

    #[test]
    fn test_select_albums_without_append_replaces() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_albums_by_name(&library, "Abbey*", true);
        let count = selection.select_albums_by_name(&library, "Kind of ????", false);

        assert_eq!(count, 1);
        assert_eq!(selection.albums(), ["300"]);
    }

    #[test]
    fn test_select_albums_no_match_keeps_count() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_albums_by_name(&library, "Abbey*", true);
        assert_eq!(selection.select_albums_by_name(&library, "Nothing*", true), 1);
        assert_eq!(selection.select_albums_by_name(&library, "Nothing*", false), 0);
    }

    #[test]
    fn test_select_tracks_by_folder() {
        let library = library();
        let mut selection = Selection::new();

        let count = selection.select_tracks_by_folder(&library, "/music/rock/", true);

        assert_eq!(count, 3);
        assert_eq!(selection.tracks(), ["1", "2", "4"]);
        assert!(!selection.tracks().contains(&"3".to_string()));
    }

    #[test]
    fn test_select_tracks_by_folder_is_a_plain_prefix() {
        let library = library();
        let mut selection = Selection::new();

        let count = selection.select_tracks_by_folder(&library, "/music/rock", true);

        // "/music/rock" also picks up "/music/rockabilly/..."
        assert_eq!(count, 4);
        assert_eq!(selection.tracks(), ["1", "2", "4", "5"]);
    }

    #[test]
    fn test_select_tracks_by_folder_append() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_tracks_by_folder(&library, "/music/pop", true);
        assert_eq!(selection.select_tracks_by_folder(&library, "/music/rock/", true), 4);
        assert_eq!(selection.select_tracks_by_folder(&library, "/music/rock/", false), 3);
        assert_eq!(selection.tracks()[0], "1");
    }

    #[test]
    fn test_select_tracks_from_empty_library() {
        let library = Library::default();
        let mut selection = Selection::new();
        assert_eq!(selection.select_tracks_by_folder(&library, "/music", true), 0);
        assert_eq!(selection.select_albums_by_name(&library, "*", true), 0);
    }

    #[test]
    fn test_playlist_track_list_order_and_duplicates() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_albums_by_name(&library, "Kind*", true);
        selection.select_albums_by_name(&library, "Abbey Road", true);
        selection.select_track("2");
        selection.select_track("3");

        assert_eq!(
            selection.playlist_track_list(&library),
            vec!["4", "5", "1", "2", "2", "3"]
        );
    }

    #[test]
    fn test_playlist_track_list_skips_unknown_albums() {
        let library = library();
        let mut selection = Selection::new();

        selection.select_album("999");
        selection.select_track("1");

        assert_eq!(selection.playlist_track_list(&library), vec!["1"]);
    }
}
