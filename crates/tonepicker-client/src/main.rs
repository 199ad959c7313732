use std::env;
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use tonepicker_client::{
    data_dir, export_to_file, import_from_file, ApiClient, ClientDocument, FileStore,
    LocalPersistence, SaveOutcome,
};

const USAGE: &str = "\
Usage: tonepicker <command>

Commands:
  adjust <x> <y> <text>   rewrite text at tone grid point (x, y), each 0..=2
  health                  check the API server
  undo | redo             step through the saved history
  show                    print the current text
  info                    show what is stored locally
  clear                   forget the saved document
  export [dir]            write the document to a dated JSON file
  import <file>           replace the saved document with an exported one";

type Store = LocalPersistence<FileStore>;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(message) = run(&args).await {
        eprintln!("{message}");
        process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("");
    let rest = args.get(1..).unwrap_or_default();
    let mut store = LocalPersistence::new(FileStore::new(data_dir()));

    match command {
        "adjust" => adjust(&mut store, rest).await,
        "health" => health().await,
        "undo" => step(&mut store, ClientDocument::undo, "Nothing to undo"),
        "redo" => step(&mut store, ClientDocument::redo, "Nothing to redo"),
        "show" => {
            println!("{}", load(&store).text);
            Ok(())
        }
        "info" => {
            info(&mut store);
            Ok(())
        }
        "clear" => {
            store.clear();
            println!("Cleared saved document in {}", store.store().dir().display());
            Ok(())
        }
        "export" => {
            let dir = rest.first().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let path = export_to_file(&load(&store), &dir).map_err(|e| format!("Failed to export data: {e}"))?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        "import" => {
            let file = rest.first().ok_or_else(|| USAGE.to_string())?;
            let document = import_from_file(Path::new(file)).map_err(|e| e.to_string())?;
            save(&mut store, &document)?;
            println!("Imported {} history entries", document.history.len());
            Ok(())
        }
        _ => Err(USAGE.to_string()),
    }
}

async fn adjust(store: &mut Store, rest: &[String]) -> Result<(), String> {
    let [x, y, words @ ..] = rest else {
        return Err(USAGE.to_string());
    };
    let x: i64 = x.parse().map_err(|_| format!("invalid x coordinate: {x}"))?;
    let y: i64 = y.parse().map_err(|_| format!("invalid y coordinate: {y}"))?;
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(USAGE.to_string());
    }

    let client = ApiClient::from_env().map_err(|e| e.to_string())?;
    let result = client.adjust_tone(&text, x, y).await.map_err(|e| e.to_string())?;

    let mut document = load(store);
    if document.text != text {
        document.record(text.as_str());
    }
    document.record(result.adjusted_text.as_str());
    save(store, &document)?;

    eprintln!(
        "[{}{}]",
        result.tone.description,
        if result.cached { ", cached" } else { "" }
    );
    println!("{}", result.adjusted_text);
    Ok(())
}

async fn health() -> Result<(), String> {
    let client = ApiClient::from_env().map_err(|e| e.to_string())?;
    let status = client.check_health().await.map_err(|e| e.to_string())?;
    println!(
        "{} at {} ({}), {} cached results",
        status.status,
        client.base_url(),
        status.timestamp,
        status.cache_size
    );
    Ok(())
}

fn step(store: &mut Store, apply: fn(&mut ClientDocument) -> bool, nothing: &str) -> Result<(), String> {
    let mut document = load(store);
    if !apply(&mut document) {
        return Err(nothing.to_string());
    }
    save(store, &document)?;
    println!("{}", document.text);
    Ok(())
}

fn info(store: &mut Store) {
    let available = store.is_available();
    let info = store.storage_info();
    println!("location:  {}", store.store().dir().display());
    println!("available: {available}");
    println!("size:      {} bytes", info.size);
    println!("history:   {} entries", info.history_count);
    match info.last_saved {
        Some(at) => println!("saved:     {}", at.to_rfc3339()),
        None => println!("saved:     never"),
    }
}

fn load(store: &Store) -> ClientDocument {
    store.load().unwrap_or_default()
}

fn save(store: &mut Store, document: &ClientDocument) -> Result<(), String> {
    match store.save(document) {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::SavedWithoutHistory => {
            eprintln!("Storage was full; history was dropped and only the current text was kept.");
            Ok(())
        }
        SaveOutcome::Failed => Err(format!(
            "Failed to save document to {}",
            store.store().dir().display()
        )),
    }
}
