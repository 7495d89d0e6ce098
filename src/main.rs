//! `PartDesk` command line - catalogue queries and the application workflow
//! against the configured hosted stores.

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use partdesk::config::{self, Settings};
use partdesk::core::{application, bom, parts, render};
use partdesk::entities::{ApplicationDraft, ImageAttachment, PartApplication, content_type_for};
use partdesk::errors::{Error, Result};
use partdesk::store::rest::{RestBlobStore, RestDocumentStore, build_client};

#[derive(Parser)]
#[command(name = "partdesk", about = "Parts catalogue and part-application workflow")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalogue; no term lists the first entries
    Search {
        term: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Page through the parts collection in key order
    Page {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Last material code of the previous page
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Show one part by material code
    Part { material_code: String },
    /// List models that have a bill of materials
    Models,
    /// List the components of one model
    Bom { model: String },
    /// Submit a new part application
    Submit {
        #[arg(long)]
        requester: String,
        #[arg(long)]
        department: String,
        /// low, medium, or high
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        specifications: String,
        #[arg(long)]
        supplier: String,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long)]
        justification: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Path to the part photo (png, jpg, or webp)
        #[arg(long)]
        image: PathBuf,
    },
    /// List applications, newest first
    Applications,
    /// Approve a pending application and assign its catalogue code
    Approve { id: String, part_code: String },
    /// Reject a pending application
    Reject { id: String },
    /// Render an application form to PDF
    Render {
        id: String,
        /// Output path, defaults to `{id}_application.pdf`
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn print_application(app: &PartApplication) {
    println!(
        "{}  {}  {}  {}  {}",
        app.id,
        app.status,
        app.priority,
        app.requester,
        app.part_code.as_deref().unwrap_or("-")
    );
}

/// Content type for an attachment file extension. Anything outside the
/// supported image formats is rejected instead of silently defaulting
/// to png.
fn attachment_content_type(extension: Option<&str>) -> Result<&'static str> {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        Some(ext @ ("png" | "jpg" | "jpeg" | "webp")) => Ok(content_type_for(ext)),
        _ => Err(Error::Config {
            message: "image must be a .png, .jpg, or .webp file".to_string(),
        }),
    }
}

fn read_attachment(path: &PathBuf) -> Result<ImageAttachment> {
    let content_type = attachment_content_type(path.extension().and_then(|e| e.to_str()))?;
    let bytes = std::fs::read(path)?;
    Ok(ImageAttachment::new(bytes.into(), content_type))
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let client = build_client()?;
    let docs = RestDocumentStore::new(client.clone(), &settings.database_url)?;
    let blobs = RestBlobStore::new(client, &settings.storage_url)?;

    match cli.command {
        Command::Search { term, limit } => {
            let results = parts::search(&docs, term.as_deref().unwrap_or(""), limit).await;
            for part in results {
                println!(
                    "{}  {}  {}  {:.2}",
                    part.material_code, part.description, part.supplier, part.price
                );
            }
        }
        Command::Page { limit, cursor } => {
            let page = parts::paginate(&docs, limit, cursor.as_deref()).await;
            for part in &page {
                println!("{}  {}", part.material_code, part.description);
            }
            if let Some(last) = page.last() {
                println!("next cursor: {}", last.material_code);
            }
        }
        Command::Part { material_code } => match parts::get_by_key(&docs, &material_code).await {
            Some(part) => println!("{part:#?}"),
            None => println!("no part with code {material_code}"),
        },
        Command::Models => {
            for model in bom::list_models(&docs).await {
                println!("{model}");
            }
        }
        Command::Bom { model } => {
            for component in bom::get_components(&docs, &model).await {
                println!(
                    "{}  {}  {:.2}  {}",
                    component.material_code,
                    component.description,
                    component.standard_price,
                    component.supplier
                );
            }
        }
        Command::Submit {
            requester,
            department,
            priority,
            specifications,
            supplier,
            price,
            justification,
            notes,
            image,
        } => {
            let draft = ApplicationDraft {
                requester,
                department,
                priority: priority
                    .parse()
                    .map_err(|message| Error::Config { message })?,
                specifications,
                supplier,
                standard_price: price,
                justification,
                notes,
                image: Some(read_attachment(&image)?),
            };
            let id = application::submit(&docs, &blobs, settings.id_strategy, &draft).await?;
            println!("submitted {id}");
        }
        Command::Applications => {
            for app in application::list(&docs).await {
                print_application(&app);
            }
        }
        Command::Approve { id, part_code } => {
            let approved = application::approve(&docs, &blobs, &id, &part_code).await?;
            print_application(&approved);
        }
        Command::Reject { id } => {
            let rejected = application::reject(&docs, &id).await?;
            print_application(&rejected);
        }
        Command::Render { id, out } => {
            let app = application::get(&docs, &id)
                .await
                .ok_or_else(|| Error::NotFound { id: id.clone() })?;
            let image = render::resolve_image(&blobs, &app).await;
            let pdf = render::render_application(&app, image.as_ref())?;
            let path = out.unwrap_or_else(|| PathBuf::from(render::pdf_filename(&id)));
            std::fs::write(&path, pdf)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing first, then .env, so config loading is already visible in logs.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    let cli = Cli::parse();
    let settings = config::load_settings()?;
    info!("Using document store at {}", settings.database_url);

    run(cli, settings).await
}
