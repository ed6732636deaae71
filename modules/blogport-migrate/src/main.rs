use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blogport_common::{Config, MigrateError};
use blogport_migrate::archive::archive_unlinked_assets;
use blogport_migrate::authors::{send_author_slugs, send_authors};
use blogport_migrate::categories::create_categories;
use blogport_migrate::posts::{post_body_contains, update_posts_without_categories};
use blogport_migrate::reachability::HttpReachability;
use blogport_migrate::source::PgRecordSource;
use blogport_migrate::{AssetResolver, PacedPlatform, Pacer, PostMigration};
use blogport_richtext::{normalize_document, parse_document};
use contentful_client::ContentfulClient;

#[derive(Parser)]
#[command(name = "blogport-migrate", about = "Migrate the legacy blog into Contentful")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a person entry for every author with posts
    SendAuthors,
    /// Set the slug of every migrated author
    SendAuthorSlugs,
    /// Create the fixed set of blog categories
    CreateCategories,
    /// Migrate every converted post not yet in the space
    SendPosts {
        /// Leave the body out and do not publish
        #[arg(long)]
        draft: bool,
    },
    /// Attach categories to posts created without any
    UpdatePostsWithoutCategories,
    /// Unpublish and archive assets no published entry links to
    ArchiveUnlinkedAssets,
    /// List posts whose body mentions some text
    PostBodyContains { text: String },
    /// Normalize a stored rich-text document and print it (offline)
    Normalize { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("blogport=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let command = match cli.command {
        Command::Normalize { file } => return print_normalized(&file),
        command => command,
    };

    let config = Config::from_env()?;

    let mut client =
        ContentfulClient::new(&config.space_id, &config.environment, &config.management_token)
            .with_locale(&config.locale);
    if let Some(ref token) = config.delivery_token {
        client = client.with_delivery_token(token);
    }
    let platform = PacedPlatform::new(client, Pacer::new(config.pace));

    match command {
        Command::SendAuthors => {
            let source = PgRecordSource::connect(&config.database_url).await?;
            let stats = send_authors(&source, &platform).await?;
            info!(succeeded = stats.succeeded, failed = stats.failed, "Authors sent");
        }
        Command::SendAuthorSlugs => {
            let source = PgRecordSource::connect(&config.database_url).await?;
            let stats = send_author_slugs(&source, &platform).await?;
            info!(succeeded = stats.succeeded, failed = stats.failed, "Author slugs sent");
        }
        Command::CreateCategories => {
            let created = create_categories(&platform).await?;
            info!(created, "Categories created");
        }
        Command::SendPosts { draft } => {
            let source = PgRecordSource::connect(&config.database_url).await?;
            let reachability = HttpReachability::new()?;
            let resolver =
                AssetResolver::new(&platform, &reachability, &config.image_not_found_asset_id);
            let migration = PostMigration::new(
                &source,
                &platform,
                resolver,
                &config.legacy_site_url,
                &config.default_hero_asset_id,
            );
            let stats = migration.send_posts(draft).await?;
            println!("{stats}");
        }
        Command::UpdatePostsWithoutCategories => {
            let source = PgRecordSource::connect(&config.database_url).await?;
            let stats =
                update_posts_without_categories(&source, &platform, &config.legacy_site_url)
                    .await?;
            info!(
                updated = stats.updated,
                without_categories = stats.without_categories,
                failed = stats.failed,
                "Post categories updated"
            );
        }
        Command::ArchiveUnlinkedAssets => {
            if config.delivery_token.is_none() {
                return Err(MigrateError::Config(
                    "CONTENTFUL_DELIVERY_ACCESS_TOKEN is required to count asset links".to_string(),
                )
                .into());
            }
            let stats = archive_unlinked_assets(&platform).await?;
            info!(
                checked = stats.checked,
                archived = stats.archived,
                failed = stats.failed,
                "Unlinked assets archived"
            );
        }
        Command::PostBodyContains { text } => {
            for (id, slug) in post_body_contains(&platform, &text).await? {
                println!("{id}\t{slug}");
            }
        }
        Command::Normalize { .. } => {}
    }

    Ok(())
}

fn print_normalized(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = normalize_document(parse_document(&raw)?)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
