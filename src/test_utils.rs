use std::io::Write;
use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;

/// A small `library` response in the shape the service returns.
///
/// Albums are deliberately not sorted by ID, and the track records carry
/// extra fields so positions have to come from the map.
pub fn sample_library_json() -> Value {
    json!({
        "library": {
            "albums": {
                "map": { "name": 0, "tracks": 1, "year": 2 },
                "100": ["Abbey Road", [1, 2], 1969],
                "300": ["Kind of Blue", [4, 5], 1959],
                "200": ["Thriller", [3], 1982]
            },
            "tracks": {
                "map": { "track": 0, "title": 1, "year": 2, "path": 3 },
                "1": [1, "Come Together", 1969, "/music/rock/abbey/01.mp3"],
                "2": [2, "Something", 1969, "/music/rock/abbey/02.mp3"],
                "3": [1, "Pop Song", 1982, "/music/pop/track.mp3"],
                "4": [1, "So What", 1959, "/music/rock/album/track.mp3"],
                "5": [2, "Freddie Freeloader", 1959, "/music/rockabilly/freddie.mp3"]
            },
            "playlists": {
                "map": { "name": 0, "tracks": 1 },
                "900": ["Road Trip", [1, 2]],
                "901": ["Chill", [4]]
            }
        }
    })
}

/// Write `contents` to `name` inside a fresh temp dir.
pub fn temp_file(name: &str, contents: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents).unwrap();
    (dir, path)
}
