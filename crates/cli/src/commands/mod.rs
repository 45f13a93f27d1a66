pub mod build;
pub mod login;
pub mod plan;

use clap::Args;

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Extra query string passed to the server (e.g. "expand=plans.plan")
    #[arg(long)]
    pub params: Option<String>,
    /// Stop after this many entries instead of walking every page
    #[arg(long)]
    pub limit: Option<usize>,
}
