//! Creates a table and writes a couple of items into an in-memory store.
//!
//! Run with `RUST_LOG=dyna_pack=trace` to watch the encoder at work.

use dyna_pack::{record, Codec, MemoryTransport, Naming, PREFIX_ENV};
use tracing_subscriber::EnvFilter;

record! {
    #[derive(Debug)]
    pub struct Song {
        pub artist: String => "Artist,HASH",
        pub title: String => "SongTitle,RANGE",
        pub year: u16 => "Year",
        pub genres: Vec<String> => "Genres",
        pub album: Option<String> => "Album",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let naming = Naming::from_env().unwrap_or_else(|_| {
        println!("{} isn't set, using the prefix \"demo\"", PREFIX_ENV);
        Naming::new("demo")
    });
    let codec = Codec::new(&naming);
    let store = MemoryTransport::new();

    let table = codec.create_table::<Song, _>(&store, 5, 5)?;
    println!("{}", serde_json::to_string_pretty(&table)?);

    let songs = [
        Song {
            artist: "No One You Know".to_string(),
            title: "Call Me Today".to_string(),
            year: 2001,
            genres: vec!["pop".to_string(), "rock".to_string()],
            album: Some("Somewhat Famous".to_string()),
        },
        Song {
            artist: "Acme Band".to_string(),
            title: "Happy Day".to_string(),
            year: 1998,
            genres: Vec::new(),
            album: None,
        },
    ];
    for song in &songs {
        let input = codec.put_item(&store, song)?;
        println!("{}", serde_json::to_string(&input)?);
    }

    // Creating the table again is refused
    if let Err(e) = codec.create_table::<Song, _>(&store, 5, 5) {
        println!("{}", e);
    }

    println!(
        "{} holds {} items",
        table.table_name,
        store.items(&table.table_name).len()
    );
    Ok(())
}
