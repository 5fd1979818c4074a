use stitchdesk::domain::SchemaRegistry;
use stitchdesk::infra::config::StoreConfig;
use stitchdesk::storage::table::{SheetsClient, TableStore, HEADER_ROW_INDEX};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Requires env vars:\n\
           SHEETS_SPREADSHEET_ID, SHEETS_API_TOKEN\n\
         Optional:\n\
           SHEETS_BASE_URL (default https://sheets.googleapis.com)\n\
           SHEETS_TIMEOUT_SECS (default 10)\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Force-read config (nice error messages if missing)
    let config = StoreConfig::from_env()?;

    println!("> Preflight:");
    println!("  SHEETS_BASE_URL={}", config.base_url);
    println!("  SHEETS_SPREADSHEET_ID={}", config.spreadsheet_id);
    println!("  SHEETS_TIMEOUT_SECS={}", config.timeout_secs);

    let registry = SchemaRegistry::with_catalog()?;

    // Basic connectivity
    let client = SheetsClient::connect(&config).await?;
    println!("  Spreadsheet is reachable.");

    // Every tab must carry the header row the codec assumes; a drifted
    // header means someone edited the document by hand.
    let mut entities = registry.list_entities();
    entities.sort();
    let mut drifted = 0usize;
    for entity in &entities {
        let schema = registry.schema_for(entity)?;
        let rows = client.read_all(schema.table_name).await?;
        let expected: Vec<&str> = schema.columns.iter().map(|c| c.name).collect();
        match rows.first() {
            Some(header) if header.iter().map(String::as_str).eq(expected.iter().copied()) => {
                let data_rows = rows.len() as u32 - HEADER_ROW_INDEX;
                println!(
                    "  {}: header ok ({} columns, {} data rows)",
                    schema.table_name,
                    schema.column_count(),
                    data_rows
                );
            }
            Some(header) => {
                drifted += 1;
                eprintln!(
                    "  {}: header drift. Expected {:?}, found {:?}",
                    schema.table_name, expected, header
                );
            }
            None => {
                drifted += 1;
                eprintln!(
                    "  {}: tab is empty; expected header {:?}",
                    schema.table_name, expected
                );
            }
        }
    }

    client.close();

    if drifted > 0 {
        anyhow::bail!(
            "{} tab(s) have a drifted or missing header row; fix the document before serving",
            drifted
        );
    }

    println!("> Preflight OK.");
    Ok(())
}
