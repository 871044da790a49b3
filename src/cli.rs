use crate::search::ScanField;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tracker-dedup")]
#[command(about = "Find existing tracker issues similar to a new one", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config_dir>/tracker-dedup/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rank existing issues by similarity to a candidate ticket
    Find {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Report pairs of existing issues that look like duplicates of each other
    Audit {
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short, long, value_enum, default_value_t = AuditField::FullText)]
        field: AuditField,
        #[arg(long)]
        json: bool,
    },
    /// Fetch issues now, ignoring the snapshot's age
    Refresh,
    /// Show snapshot age, size and freshness without fetching
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuditField {
    Title,
    Description,
    FullText,
}

impl From<AuditField> for ScanField {
    fn from(field: AuditField) -> Self {
        match field {
            AuditField::Title => Self::Title,
            AuditField::Description => Self::Description,
            AuditField::FullText => Self::FullText,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::parse_from([
            "tracker-dedup",
            "find",
            "--title",
            "Login fails",
            "-n",
            "3",
        ]);
        let_assert!(Commands::Find { title, description, top_n, json } = cli.command);
        check!(title == "Login fails");
        check!(description.is_empty());
        check!(top_n == Some(3));
        check!(!json);
    }

    #[test]
    fn test_parse_audit_field() {
        let cli = Cli::parse_from(["tracker-dedup", "audit", "--field", "title", "-t", "0.9"]);
        let_assert!(Commands::Audit { threshold, field, .. } = cli.command);
        check!(threshold == Some(0.9));
        check!(ScanField::from(field) == ScanField::Title);
    }
}
