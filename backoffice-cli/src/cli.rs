//! Command-line arguments.

use std::path::PathBuf;

use backoffice_lib::model::RecordId;
use chrono::DateTime;
use chrono::Utc;
use clap::Args;
use clap::Parser;
use clap::Subcommand;

/// Back-office collection manager.
#[derive(Debug, Parser)]
#[command(
    name = "backoffice",
    version,
    about = "Manage back-office reference data from the terminal",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Override the backend base URL.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Store the bearer token used for every request.
    Login(LoginArgs),
    /// Forget the stored token.
    Logout,
    /// List the managed collections.
    Collections,
    /// Show a collection as a table.
    List(ListArgs),
    /// Create a record.
    Create(CreateArgs),
    /// Update fields of a record.
    Update(UpdateArgs),
    /// Change a single cell of a record.
    EditCell(EditCellArgs),
    /// Delete a record.
    Delete(DeleteArgs),
    /// Show content pages.
    Content(ContentArgs),
    /// Show the blog index.
    Blogs(BlogsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Token to store; read from stdin when omitted.
    #[arg(long)]
    pub token: Option<String>,
    /// When the token stops being valid (RFC 3339).
    #[arg(long, value_name = "TIMESTAMP")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Collection path or label, e.g. `prices` or `paper-colors`.
    pub collection: String,
    /// Case-insensitive search term.
    #[arg(short, long)]
    pub search: Option<String>,
    /// Sort by this field (ascending).
    #[arg(long, value_name = "FIELD")]
    pub sort: Option<String>,
    /// Sort descending instead.
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Match the search term against every field.
    #[arg(long)]
    pub all_fields: bool,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    pub collection: String,
    /// Field values.
    #[arg(value_name = "FIELD=VALUE", required = true)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct UpdateArgs {
    pub collection: String,
    pub id: RecordId,
    /// Field values; unspecified fields keep their current value.
    #[arg(value_name = "FIELD=VALUE", required = true)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EditCellArgs {
    pub collection: String,
    pub id: RecordId,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    pub collection: String,
    pub id: RecordId,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ContentArgs {
    /// Show one page instead of the list.
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct BlogsArgs {
    /// Extra pages to reveal after the first window.
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub more: usize,
    /// Show one post in full.
    #[arg(long)]
    pub slug: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from([
            "backoffice", "list", "prices", "--search", "a4", "--sort", "price_value", "--desc",
        ]);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.collection, "prices");
                assert_eq!(args.search.as_deref(), Some("a4"));
                assert!(args.desc);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["backoffice", "list", "prices", "--desc"]).is_err());
    }

    #[test]
    fn test_parse_edit_cell() {
        let cli = Cli::parse_from(["backoffice", "edit-cell", "paper_colors", "3", "color_price", "4.5"]);
        match cli.command {
            Command::EditCell(args) => {
                assert_eq!(args.id, RecordId(3));
                assert_eq!(args.value, "4.5");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["backoffice", "collections", "--config", "/tmp/b.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/b.toml")));
    }
}
