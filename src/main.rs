//! # pmb - Task Board Client
//!
//! A terminal client for the company's project-management backend, covering
//! the annual → semester → monthly → task hierarchy with a scriptable CLI
//! and an interactive TUI board.
//!
//! ## Key Features
//!
//! - **Monthly Task Boards**: status workflow, weighted progress tracking,
//!   priority and title filters, owner/PIC assignment
//! - **Evidence & Comments**: multipart file attachments with preview
//!   classification, append-only remark threads per task
//! - **Role-Aware Controls**: create/assign affordances follow the cached
//!   employee's job level (the backend still enforces authorization)
//! - **Multiple Interfaces**: full CLI for automation + interactive TUI for
//!   visual board management
//!
//! ## Quick Start
//!
//! ```bash
//! # Authenticate once; the session cookie is stored in ~/.pmb/
//! pmb login rina@example.com
//!
//! # Drill down the hierarchy
//! pmb annuals
//! pmb semesters 3
//! pmb monthlies 7
//!
//! # Inspect a board and work with tasks
//! pmb board 12
//! pmb add 12 "Finalise outlet location" --due "in 2w" --priority critical
//! pmb status 81 in-progress
//! pmb comment 81 "Waiting on the landlord's countersign"
//! pmb evidence add 81 photos/site-a.png photos/site-b.png
//!
//! # Or do all of the above visually
//! pmb ui 12
//! ```
//!
//! The backend is the system of record; nothing is persisted locally except
//! the session file. Point the client at another deployment with
//! `--api-url` or `PMB_API_URL`.

use clap::Parser;

pub mod api;
pub mod board;
pub mod cli;
pub mod cmd;
pub mod comments;
pub mod dates;
pub mod evidence;
pub mod fields;
pub mod session;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod board_form;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use api::{ApiClient, BASE_URL_ENV, DEFAULT_BASE_URL};
use cli::Cli;
use cmd::*;
use session::{Capabilities, Session};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Completions need neither a session nor a runtime.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let base_url = cli
        .api_url
        .clone()
        .or_else(|| std::env::var(BASE_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let session_path = cli.session.clone().unwrap_or_else(Session::default_path);
    let session = Session::load(&session_path).unwrap_or_default();
    let client = ApiClient::new(&base_url, session.cookie.clone());
    let caps = Capabilities::of(session.employee());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Login { email, password } => {
            rt.block_on(cmd_login(&client, &session_path, email, password))
        }
        Commands::Logout => cmd_logout(&session_path),
        Commands::Whoami => cmd_whoami(&session, caps),

        Commands::Annuals => rt.block_on(cmd_annuals(&client)),
        Commands::NewAnnual { title, desc } => {
            rt.block_on(cmd_new_annual(&client, caps, title, desc))
        }
        Commands::Semesters { project_id } => rt.block_on(cmd_semesters(&client, project_id)),
        Commands::NewSemester {
            project_id,
            title,
            semester,
            desc,
        } => rt.block_on(cmd_new_semester(
            &client, caps, project_id, semester, title, desc,
        )),
        Commands::Monthlies { semester_id } => rt.block_on(cmd_monthlies(&client, semester_id)),
        Commands::NewMonthly {
            semester_id,
            title,
            project_id,
            month,
            desc,
        } => rt.block_on(cmd_new_monthly(
            &client,
            caps,
            semester_id,
            project_id,
            month,
            title,
            desc,
        )),

        Commands::Board {
            monthly_id,
            status,
            priority,
            query,
        } => rt.block_on(cmd_board(
            &client, caps, monthly_id, status, priority, query,
        )),
        Commands::View {
            monthly_id,
            task_id,
        } => rt.block_on(cmd_view(&client, caps, monthly_id, task_id)),
        Commands::Add {
            monthly_id,
            title,
            desc,
            start,
            due,
            status,
            priority,
            pic,
        } => rt.block_on(cmd_add(
            &client, caps, monthly_id, title, desc, start, due, status, priority, pic,
        )),
        Commands::Update {
            monthly_id,
            task_id,
            title,
            desc,
            start,
            due,
            status,
            priority,
            pic,
        } => rt.block_on(cmd_update(
            &client, caps, monthly_id, task_id, title, desc, start, due, status, priority, pic,
        )),
        Commands::Status { task_id, status } => rt.block_on(cmd_status(&client, task_id, status)),

        Commands::Comments { task_id } => rt.block_on(cmd_comments(&client, task_id)),
        Commands::Comment { task_id, text } => rt.block_on(cmd_comment(&client, task_id, text)),

        Commands::Evidence { action } => match action {
            EvidenceAction::List { task_id } => rt.block_on(cmd_evidence_list(&client, task_id)),
            EvidenceAction::Add { task_id, files } => {
                rt.block_on(cmd_evidence_add(&client, task_id, files))
            }
            EvidenceAction::Rm {
                task_id,
                evidence_id,
                yes,
            } => rt.block_on(cmd_evidence_rm(&client, task_id, evidence_id, yes)),
        },

        Commands::Ui { monthly_id } => tui::run::run_tui(
            &rt,
            client.clone(),
            caps,
            session.employee().cloned(),
            monthly_id,
        )
        .map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
