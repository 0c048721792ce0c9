use std::path::PathBuf;

use clap::Parser;
use shared::model::FormulaName;

#[derive(Debug, Clone, Parser)]
#[clap(name = "repbook server")]
pub struct Cli {
    #[clap(long, env, default_value = "repbook.sqlite")]
    pub sqlite_connection_string: String,
    #[clap(long, env, default_value = "8080")]
    pub port: u16,
    #[clap(long, env, default_value = "127.0.0.1")]
    pub bind_addr: String,
    #[arg(long, env, default_value = "http://localhost:8080")]
    pub cors_origin: String,

    /// Audience and issuer suffix expected in identity tokens
    #[arg(long, env, default_value = "repbook")]
    pub firebase_project_id: String,
    /// JSON object mapping key id to PEM encoded RSA public key
    #[arg(long, env, default_value = "firebase_keys.json")]
    pub firebase_keys_path: PathBuf,

    /// epley or lombardi
    #[arg(long, env, default_value = "epley")]
    pub one_rep_max_formula: FormulaName,

    /// Maximum accepted request body in bytes
    #[arg(long, env, default_value = "65536")]
    pub request_body_limit: usize,

    /// Deletes the database before starting the main program for debug purposes
    #[arg(long, env, default_value = "false")]
    pub debug_delete_database: bool,
}
