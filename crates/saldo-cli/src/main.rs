//! Saldo CLI - Bank statement consolidation and spending analysis
//!
//! Usage:
//!   saldo ingest nubank.csv itau.xlsx       Consolidate statements into one table
//!   saldo report kpis nubank.csv            Income, expenses and savings rate
//!   saldo report subscriptions *.csv        Recurring charges
//!   saldo rules add uber Trabalho           Teach a categorization rule

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let session = commands::open_session(
        cli.data_dir.as_deref(),
        cli.user.as_deref(),
        cli.config.as_deref(),
    )?;

    match cli.command {
        Commands::Ingest {
            statements,
            json,
            limit,
        } => commands::cmd_ingest(&session, &statements.files, json, limit),
        Commands::Categories { statements } => {
            commands::cmd_categories(&session, &statements.files)
        }
        Commands::Report { report_type } => match report_type {
            ReportType::Kpis { statements, filter } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_kpis(&table, &scope)
            }
            ReportType::Compare { statements, filter } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_compare(&table, &scope)
            }
            ReportType::Subscriptions { statements, filter } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_subscriptions(&table, &scope, &session.config.subscriptions)
            }
            ReportType::Pix { statements, filter } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_pix(&table, &scope)
            }
            ReportType::Categories {
                statements,
                filter,
                detail,
            } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_categories(&table, &scope, detail.as_deref())
            }
            ReportType::Monthly { statements, filter } => {
                let table = commands::load_statements(&session, &statements.files)?;
                let scope = commands::resolve_scope(&table, &filter)?;
                commands::cmd_report_monthly(&table, &scope)
            }
        },
        Commands::Rules { action } => match action {
            None | Some(RulesAction::List) => commands::cmd_rules_list(&session.store),
            Some(RulesAction::Add { keyword, category }) => {
                commands::cmd_rules_add(&session.store, &keyword, &category)
            }
            Some(RulesAction::Delete { keyword }) => {
                commands::cmd_rules_delete(&session.store, &keyword)
            }
            Some(RulesAction::Test { description }) => {
                commands::cmd_rules_test(&session.store, &description)
            }
        },
    }
}
