// Entry point and high-level CLI flow.
//
// - Option [1] reads an upload (CSV or JSON) and shows a preview.
// - Option [2] runs the analytics pipeline, prints the report, exports the
//   tables and publishes the envelope to the shared store.
// - Option [3] reads back whatever the last session published.
// A file path given on the command line is loaded before the menu starts.
use digipine_analytics::config::Config;
use digipine_analytics::loader::{self, LoadedFile};
use digipine_analytics::output::{self, ReportExporter};
use digipine_analytics::store::{self, KvStore, UploadSink};
use digipine_analytics::types::ParsedUpload;
use digipine_analytics::util::{format_file_size, format_int};
use digipine_analytics::{analyze_parsed, AnalysisOptions, Result};
use std::io::{self, Write};
use tracing::error;
use tracing_subscriber::EnvFilter;

const PREVIEW_ROWS: usize = 10;

/// Everything the menu needs, passed explicitly instead of living in a
/// global.
struct Session {
    config: Config,
    loaded: Option<(LoadedFile, ParsedUpload)>,
}

/// Read a single line of input after printing `prompt`. `None` once stdin
/// is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the menu after a report.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to menu (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: read and parse a file, then show its preview.
fn handle_load(session: &mut Session, path: &str) {
    match load(&session.config, path) {
        Ok((file, parsed)) => {
            println!(
                "Selected file: {} ({})",
                file.file_name,
                format_file_size(file.size)
            );
            output::print_preview(&loader::preview(&parsed, file.format));
            session.loaded = Some((file, parsed));
        }
        Err(e) => {
            error!(path, error = %e, "load failed");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn load(config: &Config, path: &str) -> Result<(LoadedFile, ParsedUpload)> {
    let file = loader::read_upload(path, config.max_upload_bytes)?;
    let parsed = loader::parse(&file.content, file.format)?;
    Ok((file, parsed))
}

/// Handle option [2]: analytics, console report, export and publish.
fn handle_generate(session: &Session) {
    let Some((file, parsed)) = &session.loaded else {
        println!("Error: No data loaded. Please load a file first (option 1).\n");
        return;
    };

    println!("Processing {}...\n", file.file_name);
    let upload = analyze_parsed(
        &file.file_name,
        file.format,
        parsed.clone(),
        AnalysisOptions::from(&session.config),
    );
    output::print_report(&upload.analytics, PREVIEW_ROWS);

    let mut sinks: Vec<Box<dyn UploadSink>> = vec![
        Box::new(ReportExporter::new(&session.config.output_dir)),
        Box::new(KvStore::new(&session.config.store_path)),
    ];
    let failures = store::publish_all(&mut sinks, &upload);
    for (sink, e) in &failures {
        error!(sink = sink.as_str(), error = %e, "publish failed");
        eprintln!("Write error ({}): {}", sink, e);
    }
    if failures.is_empty() {
        println!(
            "Reports exported to {} and shared via {}\n",
            session.config.output_dir.display(),
            session.config.store_path.display()
        );
    }
}

/// Handle option [3]: show the upload the last session published.
fn handle_show_last(session: &Session) {
    let kv = KvStore::new(&session.config.store_path);
    match store::load_last_upload(&kv) {
        Ok(Some(last)) => {
            println!(
                "Last upload: {} ({} records) published {}\n",
                last.uploaded_data.file_name,
                format_int(last.uploaded_data.record_count),
                last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
            output::print_report(&last.processed_analytics, PREVIEW_ROWS);
        }
        Ok(None) => println!("No upload has been shared yet.\n"),
        Err(e) => eprintln!("Failed to read store: {}\n", e),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut session = Session {
        config: Config::from_env(),
        loaded: None,
    };
    if let Some(path) = std::env::args().nth(1) {
        handle_load(&mut session, &path);
    }

    loop {
        println!("DIGIPINE Upload Analytics");
        println!("[1] Load a file");
        println!("[2] Generate analytics");
        println!("[3] Show last shared upload\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Some(path) = read_line("File path (.csv or .json): ") {
                    handle_load(&mut session, &path);
                }
            }
            "2" => {
                println!();
                handle_generate(&session);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!();
                handle_show_last(&session);
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
