//! Subcommand implementations.

use std::io;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;

use backoffice_lib::BackofficeClient;
use backoffice_lib::api::CollectionApi;
use backoffice_lib::api::CollectionEndpoint;
use backoffice_lib::manager::CellEdit;
use backoffice_lib::manager::CollectionManager;
use backoffice_lib::model::catalog;
use backoffice_lib::query::Direction;
use backoffice_lib::query::SearchScope;
use backoffice_lib::text::BlogFeed;
use backoffice_lib::text::strip_html;
use tokio_util::sync::CancellationToken;

use crate::cli::BlogsArgs;
use crate::cli::Command;
use crate::cli::ContentArgs;
use crate::cli::CreateArgs;
use crate::cli::DeleteArgs;
use crate::cli::EditCellArgs;
use crate::cli::ListArgs;
use crate::cli::LoginArgs;
use crate::cli::UpdateArgs;
use crate::config::Config;
use crate::error::CliError;
use crate::error::Result;
use crate::render;
use crate::session::SessionStore;

/// Everything a subcommand needs.
pub struct App {
    config: Config,
    client: BackofficeClient,
    session: SessionStore,
    cancel: CancellationToken,
}

impl App {
    pub fn new(config: Config, session: SessionStore, cancel: CancellationToken) -> Result<Self> {
        let mut builder = BackofficeClient::builder()
            .url(&config.api_url)
            .token_provider(session.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        log::debug!("Using backend {}", client.base_url());

        Ok(Self {
            config,
            client,
            session,
            cancel,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login(args) => self.login(args),
            Command::Logout => self.logout(),
            Command::Collections => {
                self.collections();
                Ok(())
            }
            Command::List(args) => self.list(args).await,
            Command::Create(args) => self.create(args).await,
            Command::Update(args) => self.update(args).await,
            Command::EditCell(args) => self.edit_cell(args).await,
            Command::Delete(args) => self.delete(args).await,
            Command::Content(args) => self.content(args).await,
            Command::Blogs(args) => self.blogs(args).await,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    fn login(&self, args: LoginArgs) -> Result<()> {
        let token = match args.token {
            Some(token) => token,
            None => prompt("Token: ")?,
        };
        self.session.save(&token, args.expires_at)?;
        println!("Token stored at {}", self.session.path().display());
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        if self.session.clear()? {
            println!("Logged out");
        } else {
            println!("No stored token");
        }
        Ok(())
    }

    // =========================================================================
    // Collections
    // =========================================================================

    fn collections(&self) {
        for schema in catalog::all() {
            let access = if schema.allows_changes() { "" } else { " (list and create only)" };
            println!("{:<18} {}{}", schema.path, schema.label, access);
        }
    }

    fn manager(&self, name: &str) -> Result<CollectionManager<CollectionEndpoint>> {
        let schema =
            catalog::find(name).ok_or_else(|| CliError::UnknownCollection(name.to_string()))?;
        let mut manager =
            CollectionManager::with_parent(self.client.collection(&schema), schema, &self.cancel);
        if let Some(scope) = self.config.search_scope {
            manager.set_search_scope(scope);
        }
        Ok(manager)
    }

    async fn loaded(&self, name: &str) -> Result<CollectionManager<CollectionEndpoint>> {
        let mut manager = self.manager(name)?;
        let result = manager.load().await;
        report(&mut manager);
        result?;
        Ok(manager)
    }

    async fn list(&self, args: ListArgs) -> Result<()> {
        let mut manager = self.loaded(&args.collection).await?;

        if args.all_fields {
            manager.set_search_scope(SearchScope::AllFields);
        }
        if let Some(term) = args.search {
            manager.set_filter_term(term);
        }
        if let Some(field) = &args.sort {
            let wanted = if args.desc {
                Direction::Descending
            } else {
                Direction::Ascending
            };
            manager.request_sort(field)?;
            if manager.sort().direction != wanted {
                manager.request_sort(field)?;
            }
        }

        let view = manager.view()?;
        if args.json {
            let json = serde_json::to_string_pretty(&render::records_json(&view))
                .map_err(backoffice_lib::error::Error::from)?;
            println!("{}", json);
        } else {
            print!("{}", render::table(manager.schema(), &view, manager.sort()));
            println!("{} of {} records", view.len(), manager.len());
        }
        Ok(())
    }

    async fn create(&self, args: CreateArgs) -> Result<()> {
        let values = parse_assignments(&args.values)?;
        let mut manager = self.manager(&args.collection)?;

        manager.open_create();
        let result = manager
            .create_from_input(values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .await;
        report(&mut manager);

        match result?.and_then(|record| record.id()) {
            Some(id) => println!("Created record {}", id),
            None => println!("Created record"),
        }
        Ok(())
    }

    async fn update(&self, args: UpdateArgs) -> Result<()> {
        let values = parse_assignments(&args.values)?;
        let mut manager = self.loaded(&args.collection).await?;

        manager.begin_edit(args.id)?;
        let result = manager
            .update_from_input(values.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .await;
        report(&mut manager);
        result?;

        println!("Updated record {}", args.id);
        Ok(())
    }

    async fn edit_cell(&self, args: EditCellArgs) -> Result<()> {
        let mut manager = self.loaded(&args.collection).await?;

        manager.begin_cell_edit(args.id, &args.field)?;
        manager.set_cell_draft(args.id, &args.field, args.value)?;
        let result = manager.commit_cell_edit(args.id, &args.field).await;
        report(&mut manager);

        if let CellEdit::Error { message, .. } = manager.cell(args.id, &args.field) {
            log::warn!("Cell {}.{} left in error state: {}", args.id, args.field, message);
        }
        result?;

        let shown = manager
            .record(args.id)
            .map(|record| record.display(&args.field))
            .unwrap_or_default();
        println!("{} {} = {}", args.id, args.field, shown);
        Ok(())
    }

    async fn delete(&self, args: DeleteArgs) -> Result<()> {
        let mut manager = self.loaded(&args.collection).await?;

        manager.request_delete(args.id)?;
        let question = format!("Delete {} record {}?", manager.schema().label, args.id);
        let confirmed = args.yes || confirm(&question)?;
        if !confirmed {
            manager.cancel_delete();
            println!("Cancelled");
            return Ok(());
        }

        let result = manager.confirm_delete().await;
        report(&mut manager);
        result?;

        println!("Deleted record {}", args.id);
        Ok(())
    }

    // =========================================================================
    // Content site
    // =========================================================================

    async fn content(&self, args: ContentArgs) -> Result<()> {
        let Some(slug) = args.slug else {
            for item in self.client.fetch_contents().await? {
                println!("{:<24} {}", item.slug, item.title);
            }
            return Ok(());
        };

        let item = self.client.content_by_slug(&slug).await?;
        let item = item.ok_or(CliError::ContentNotFound(slug))?;
        println!("{}\n", item.title);
        println!("{}", strip_html(&item.text).trim());
        Ok(())
    }

    async fn blogs(&self, args: BlogsArgs) -> Result<()> {
        let mut feed = BlogFeed::new(self.client.fetch_blogs().await?);

        if let Some(slug) = args.slug {
            let post = feed
                .find(&slug)
                .ok_or(CliError::ContentNotFound(slug.clone()))?;
            println!("{} [{}]\n", post.title, post.category_label());
            println!("{}", strip_html(&post.text).trim());
            return Ok(());
        }

        for _ in 0..args.more {
            if feed.load_more() == 0 {
                break;
            }
        }
        for post in feed.visible() {
            println!("{} [{}]", post.title, post.category_label());
            println!("  {}\n", post.excerpt());
        }
        if feed.has_more() {
            let hidden = feed.len() - feed.visible().len();
            println!("{} more posts (use --more)", hidden);
        }
        Ok(())
    }
}

/// Prints and clears the manager's notices.
fn report<A: CollectionApi>(manager: &mut CollectionManager<A>) {
    for notice in manager.take_notices() {
        if notice.is_error() {
            eprintln!("error: {}", notice);
        } else {
            println!("{}", notice);
        }
    }
}

/// Splits `field=value` arguments.
fn parse_assignments(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|arg| match arg.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                Ok((field.trim().to_string(), value.to_string()))
            }
            _ => Err(CliError::InvalidAssignment(arg.clone())),
        })
        .collect()
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|source| CliError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(line.trim().to_string())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.as_str(), "y" | "Y" | "yes"))
}
