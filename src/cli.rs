//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "atrium",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_SHORT"), ")"),
    about = "Administrative console for the Atrium agent platform"
)]
pub struct Args {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = TracingFormat::Pretty)]
    pub tracing: TracingFormat,

    /// Print raw JSON instead of formatted output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Bypass the response cache for every read in this invocation.
    #[arg(long, global = true)]
    pub fresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage registered agents.
    Agents {
        #[command(subcommand)]
        action: AgentAction,
    },
    /// Manage tool definitions.
    Tools {
        #[command(subcommand)]
        action: ToolAction,
    },
    /// Manage knowledge collections.
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeAction,
    },
    /// Manage projects.
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage scheduler jobs.
    Scheduler {
        #[command(subcommand)]
        action: SchedulerAction,
    },
    /// Inspect workflows and start runs.
    Workflows {
        #[command(subcommand)]
        action: WorkflowAction,
    },
    /// Fetch a combined summary of every resource.
    Overview,
    /// Poll dashboard metrics until interrupted.
    ///
    /// Polls are served through the response cache, so displayed values
    /// refresh at the cache TTL even when the interval is tighter.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum AgentAction {
    /// List agents, one page at a time.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 8)]
        page_size: u32,
    },
    /// Show a single agent.
    Get { id: String },
    /// Register a new agent.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Update an agent's fields.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Remove an agent.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ToolAction {
    /// List tools, optionally filtered by category.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 8)]
        page_size: u32,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show a single tool.
    Get { id: String },
    /// Register a new tool.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Remove a tool.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum KnowledgeAction {
    /// List knowledge collections.
    List,
    /// Show a single collection.
    Get { id: String },
    /// Create a new collection.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a collection and its documents.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// List projects, one page at a time.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 8)]
        page_size: u32,
    },
    /// Show a single project.
    Get { id: String },
    /// Create a new project.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a project's fields.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a project.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum SchedulerAction {
    /// List scheduler jobs.
    List,
    /// Show a single job.
    Get { id: String },
    /// Create a new job.
    Create {
        #[arg(long)]
        name: String,
        /// Cron expression controlling when the job fires.
        #[arg(long)]
        cron: String,
        /// Workflow the job starts.
        #[arg(long)]
        workflow: String,
    },
    /// Pause a job.
    Pause { id: String },
    /// Resume a paused job.
    Resume { id: String },
    /// Remove a job.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum WorkflowAction {
    /// List deployed workflows.
    List,
    /// Show a single workflow.
    Get { id: String },
    /// Start a new run of a workflow.
    Start {
        id: String,
        /// JSON object passed as the run's input variables.
        #[arg(long)]
        input: Option<String>,
    },
    /// List runs of a workflow.
    Runs {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}
