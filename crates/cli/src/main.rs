use anyhow::{Context, Result, bail};
use catalog::{Catalog, JsonFileStore, MovieRecord};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lookup_client::{DEFAULT_API_URL, TmdbClient};
use server::{
    AssignRequest, CatalogCoordinator, CatalogView, CoordinatorConfig, CoordinatorError,
    MovieDetails, PromoteRequest, default_categories,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// movie-slots - one movie per genre, and one winner
#[derive(Parser)]
#[command(name = "movie-slots")]
#[command(about = "Curate one movie per genre slot and crown a winner", long_about = None)]
struct Cli {
    /// Catalog file
    #[arg(short, long, default_value = "m.json", env = "MOVIE_SLOTS_STORE")]
    store: PathBuf,

    /// Root of the TMDB API
    #[arg(long, default_value = DEFAULT_API_URL, env = "TMDB_API_URL")]
    api_url: String,

    /// TMDB bearer token (needed for search, assign and about)
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Recognized categories, comma separated
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Give up on a metadata lookup after this many seconds
    #[arg(long, default_value = "10")]
    lookup_timeout_secs: u64,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current lineup and winner
    Lineup,

    /// Search movies by title
    Search {
        #[arg(long)]
        query: String,
    },

    /// Put a movie into a category slot
    Assign {
        #[arg(long)]
        category: String,

        #[arg(long)]
        movie_id: String,
    },

    /// Make a curated movie the winner
    Promote {
        #[arg(long)]
        movie_id: String,
    },

    /// Show details and trailers for a movie
    About {
        #[arg(long)]
        movie_id: String,
    },
}

impl Commands {
    fn needs_lookup(&self) -> bool {
        matches!(
            self,
            Commands::Search { .. } | Commands::Assign { .. } | Commands::About { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing. Logs go to stderr; stdout carries only results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let coordinator = build_coordinator(&cli)?;

    match cli.command {
        Commands::Lineup => {
            let view = coordinator.lineup().await;
            print_view(&view, cli.json)
        }
        Commands::Search { query } => handle_search(&coordinator, &query, cli.json).await,
        Commands::Assign { category, movie_id } => {
            let request = AssignRequest {
                category: Some(category),
                movie_id: Some(movie_id),
            };
            handle_assign(&coordinator, request, cli.json).await
        }
        Commands::Promote { movie_id } => {
            let request = PromoteRequest {
                movie_id: Some(movie_id),
            };
            handle_promote(&coordinator, request, cli.json).await
        }
        Commands::About { movie_id } => handle_about(&coordinator, &movie_id, cli.json).await,
    }
}

/// Open the catalog and wire it to the lookup client.
fn build_coordinator(cli: &Cli) -> Result<CatalogCoordinator> {
    // Nowhere to store the catalog is the one thing we cannot work around.
    let store = JsonFileStore::new(&cli.store).context("Failed to set up catalog storage")?;

    let categories = if cli.categories.is_empty() {
        default_categories()
    } else {
        cli.categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    };

    let (catalog, warning) = Catalog::open(Box::new(store), categories.clone());
    if let Some(e) = warning {
        eprintln!("{} {}", "!".yellow(), e);
    }

    let api_key = match (&cli.api_key, cli.command.needs_lookup()) {
        (Some(key), _) => key.clone(),
        (None, true) => bail!("API_KEY is not set"),
        (None, false) => String::new(),
    };

    let config = CoordinatorConfig {
        lineup_size: categories.len(),
        lookup_timeout: Duration::from_secs(cli.lookup_timeout_secs),
        ..Default::default()
    };
    let lookup = TmdbClient::new(&cli.api_url, api_key, config.lookup_timeout)
        .context("Failed to create lookup client")?;

    info!("Using catalog at {}", cli.store.display());
    Ok(CatalogCoordinator::new(catalog, Arc::new(lookup), config))
}

/// Handle the 'assign' command
async fn handle_assign(
    coordinator: &CatalogCoordinator,
    request: AssignRequest,
    json: bool,
) -> Result<()> {
    match coordinator.assign(request).await {
        Ok(outcome) => {
            if !json {
                println!("{} Stored in slot {}", "✓".green(), outcome.slot);
            }
            print_view(&outcome.view, json)
        }
        Err(e) => Err(report(e)),
    }
}

/// Handle the 'promote' command
async fn handle_promote(
    coordinator: &CatalogCoordinator,
    request: PromoteRequest,
    json: bool,
) -> Result<()> {
    match coordinator.promote(request).await {
        Ok(view) => print_view(&view, json),
        Err(e) => Err(report(e)),
    }
}

/// Handle the 'search' command
async fn handle_search(coordinator: &CatalogCoordinator, query: &str, json: bool) -> Result<()> {
    let results = coordinator.search(query).await.map_err(report)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    if results.is_empty() {
        println!("  (no movies found)");
    }
    for movie in &results {
        print_movie_line(movie);
    }
    Ok(())
}

/// Handle the 'about' command
async fn handle_about(coordinator: &CatalogCoordinator, movie_id: &str, json: bool) -> Result<()> {
    let details = coordinator.about(movie_id).await.map_err(report)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }
    print_details(&details);
    Ok(())
}

/// Persistence failures get called out: the change happened, but only in
/// this process.
fn report(e: CoordinatorError) -> anyhow::Error {
    if e.is_persistence_failure() {
        eprintln!(
            "{} Update applied but NOT saved to disk; it will be lost on exit",
            "!".red()
        );
    }
    anyhow::Error::from(e)
}

fn print_view(view: &CatalogView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    print!("{}", "Current lineup:\n".bold().blue());
    if view.lineup.is_empty() {
        println!("  (no movies yet)");
    }
    for (rank, movie) in view.lineup.iter().enumerate() {
        println!(
            "{}. {} {}",
            (rank + 1).to_string().green(),
            format!("[{}]", movie.category).cyan(),
            movie.title
        );
    }
    if view.total_slots > view.lineup.len() {
        println!("  ... and {} more", view.total_slots - view.lineup.len());
    }

    match &view.winner {
        Some(winner) => println!(
            "{} {} ({}) [{}]",
            "Winner:".bold().yellow(),
            winner.title,
            winner.id,
            winner.category
        ),
        None => println!("{} none yet", "Winner:".bold().yellow()),
    }
    Ok(())
}

fn print_movie_line(movie: &MovieRecord) {
    println!(
        "{}: {} ({}) avg {:.1}",
        movie.id,
        movie.title,
        if movie.release_date.is_empty() {
            "????"
        } else {
            movie.release_date.as_str()
        },
        movie.vote_average
    );
}

fn print_details(details: &MovieDetails) {
    let movie = &details.movie;
    println!("{}", movie.title.bold().blue());
    println!("{}Released: {}", "• ".green(), movie.release_date);
    println!("{}Rating: {:.1}", "• ".green(), movie.vote_average);
    println!("{}Poster: {}", "• ".green(), movie.poster_path);
    if !movie.overview.is_empty() {
        println!("\n{}\n", movie.overview);
    }

    if details.trailers.is_empty() {
        println!("No trailers found.");
    }
    for trailer in &details.trailers {
        println!(
            "  - {} ({}: {}){}",
            trailer.name,
            trailer.site,
            trailer.key,
            if trailer.official { " official" } else { "" }
        );
    }
}
