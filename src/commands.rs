//! Command dispatch and terminal rendering.
//!
//! Every handler is a thin consumer of the API client: fetch, then either
//! dump raw JSON (`--json`) or print a small table of what the backend
//! returned.

use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use yansi::Paint;

use crate::api::ApiClient;
use crate::cli::{
    AgentAction, Args, Command, KnowledgeAction, ProjectAction, SchedulerAction, ToolAction,
    WorkflowAction,
};
use crate::resources::{agents, dashboard, knowledge, projects, scheduler, tools, workflows};

pub async fn run(args: Args, mut api: ApiClient) -> Result<()> {
    api.force_fresh(args.fresh);
    let json = args.json;

    match args.command {
        Command::Agents { action } => run_agents(&api, json, action).await,
        Command::Tools { action } => run_tools(&api, json, action).await,
        Command::Knowledge { action } => run_knowledge(&api, json, action).await,
        Command::Projects { action } => run_projects(&api, json, action).await,
        Command::Scheduler { action } => run_scheduler(&api, json, action).await,
        Command::Workflows { action } => run_workflows(&api, json, action).await,
        Command::Overview => run_overview(&api, json).await,
        Command::Watch { interval } => run_watch(&api, interval).await,
    }
}

/// Print raw JSON or hand off to a renderer.
fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn paint_status(status: &str) -> String {
    match status {
        "active" | "running" | "completed" | "enabled" => status.green().to_string(),
        "error" | "failed" => status.red().to_string(),
        "paused" | "disabled" | "pending" => status.yellow().to_string(),
        _ => status.to_string(),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn fmt_count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

async fn run_agents(api: &ApiClient, json: bool, action: AgentAction) -> Result<()> {
    match action {
        AgentAction::List { page, page_size } => {
            let result = agents::list(api, page, page_size).await?;
            emit(json, &result, |page| {
                println!(
                    "{:<12} {:<24} {:<10} {:<16}",
                    "ID", "NAME", "STATUS", "MODEL"
                );
                for agent in &page.agents {
                    println!(
                        "{:<12} {:<24} {:<10} {:<16}",
                        agent.id,
                        agent.name,
                        paint_status(or_dash(agent.status.as_deref())),
                        or_dash(agent.model.as_deref()),
                    );
                }
                println!("{} total (page {})", fmt_count(page.total), page.page);
            })
        }
        AgentAction::Get { id } => {
            let agent = agents::get(api, &id).await?;
            emit(json, &agent, |agent| {
                println!("{}  {}", agent.id, agent.name.bold());
                println!("  model:  {}", or_dash(agent.model.as_deref()));
                println!(
                    "  status: {}",
                    paint_status(or_dash(agent.status.as_deref()))
                );
                if let Some(description) = &agent.description {
                    println!("  {description}");
                }
            })
        }
        AgentAction::Create {
            name,
            description,
            model,
        } => {
            let draft = agents::AgentDraft {
                name: Some(name),
                description,
                model,
            };
            let agent = agents::create(api, &draft).await?;
            info!(id = %agent.id, "agent created");
            emit(json, &agent, |agent| println!("created agent {}", agent.id))
        }
        AgentAction::Update {
            id,
            name,
            description,
            model,
        } => {
            let draft = agents::AgentDraft {
                name,
                description,
                model,
            };
            let agent = agents::update(api, &id, &draft).await?;
            emit(json, &agent, |agent| println!("updated agent {}", agent.id))
        }
        AgentAction::Delete { id } => {
            agents::delete(api, &id).await?;
            println!("deleted agent {id}");
            Ok(())
        }
    }
}

async fn run_tools(api: &ApiClient, json: bool, action: ToolAction) -> Result<()> {
    match action {
        ToolAction::List {
            page,
            page_size,
            category,
        } => {
            let result = tools::list(api, page, page_size, category.as_deref()).await?;
            emit(json, &result, |page| {
                println!("{:<12} {:<24} {:<14} {}", "ID", "NAME", "CATEGORY", "ENABLED");
                for tool in &page.tools {
                    println!(
                        "{:<12} {:<24} {:<14} {}",
                        tool.id,
                        tool.name,
                        or_dash(tool.category.as_deref()),
                        tool.enabled.unwrap_or(true),
                    );
                }
                println!("{} total (page {})", fmt_count(page.total), page.page);
            })
        }
        ToolAction::Get { id } => {
            let tool = tools::get(api, &id).await?;
            emit(json, &tool, |tool| {
                println!("{}  {}", tool.id, tool.name.bold());
                println!("  category: {}", or_dash(tool.category.as_deref()));
                if let Some(description) = &tool.description {
                    println!("  {description}");
                }
            })
        }
        ToolAction::Create {
            name,
            description,
            category,
        } => {
            let draft = tools::ToolDraft {
                name,
                description,
                category,
            };
            let tool = tools::create(api, &draft).await?;
            emit(json, &tool, |tool| println!("created tool {}", tool.id))
        }
        ToolAction::Delete { id } => {
            tools::delete(api, &id).await?;
            println!("deleted tool {id}");
            Ok(())
        }
    }
}

async fn run_knowledge(api: &ApiClient, json: bool, action: KnowledgeAction) -> Result<()> {
    match action {
        KnowledgeAction::List => {
            let collections = knowledge::list(api).await?;
            emit(json, &collections, |collections| {
                println!("{:<12} {:<28} {:>10}", "ID", "NAME", "DOCUMENTS");
                for collection in collections {
                    println!(
                        "{:<12} {:<28} {:>10}",
                        collection.id,
                        collection.name,
                        fmt_count(collection.document_count),
                    );
                }
            })
        }
        KnowledgeAction::Get { id } => {
            let collection = knowledge::get(api, &id).await?;
            emit(json, &collection, |collection| {
                println!("{}  {}", collection.id, collection.name.bold());
                println!("  documents: {}", fmt_count(collection.document_count));
                if let Some(description) = &collection.description {
                    println!("  {description}");
                }
            })
        }
        KnowledgeAction::Create { name, description } => {
            let draft = knowledge::CollectionDraft { name, description };
            let collection = knowledge::create(api, &draft).await?;
            emit(json, &collection, |collection| {
                println!("created collection {}", collection.id)
            })
        }
        KnowledgeAction::Delete { id } => {
            knowledge::delete(api, &id).await?;
            println!("deleted collection {id}");
            Ok(())
        }
    }
}

async fn run_projects(api: &ApiClient, json: bool, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::List { page, page_size } => {
            let result = projects::list(api, page, page_size).await?;
            emit(json, &result, |page| {
                println!("{:<12} {:<28} {:>8}", "ID", "NAME", "AGENTS");
                for project in &page.projects {
                    println!(
                        "{:<12} {:<28} {:>8}",
                        project.id,
                        project.name,
                        fmt_count(project.agent_count),
                    );
                }
                println!("{} total (page {})", fmt_count(page.total), page.page);
            })
        }
        ProjectAction::Get { id } => {
            let project = projects::get(api, &id).await?;
            emit(json, &project, |project| {
                println!("{}  {}", project.id, project.name.bold());
                println!("  agents: {}", fmt_count(project.agent_count));
                if let Some(description) = &project.description {
                    println!("  {description}");
                }
            })
        }
        ProjectAction::Create { name, description } => {
            let draft = projects::ProjectDraft {
                name: Some(name),
                description,
            };
            let project = projects::create(api, &draft).await?;
            emit(json, &project, |project| {
                println!("created project {}", project.id)
            })
        }
        ProjectAction::Update {
            id,
            name,
            description,
        } => {
            let draft = projects::ProjectDraft { name, description };
            let project = projects::update(api, &id, &draft).await?;
            emit(json, &project, |project| {
                println!("updated project {}", project.id)
            })
        }
        ProjectAction::Delete { id } => {
            projects::delete(api, &id).await?;
            println!("deleted project {id}");
            Ok(())
        }
    }
}

async fn run_scheduler(api: &ApiClient, json: bool, action: SchedulerAction) -> Result<()> {
    match action {
        SchedulerAction::List => {
            let jobs = scheduler::list(api).await?;
            emit(json, &jobs, |jobs| {
                println!(
                    "{:<12} {:<24} {:<16} {:<10} {}",
                    "ID", "NAME", "CRON", "STATE", "NEXT RUN"
                );
                for job in jobs {
                    let state = if job.enabled { "enabled" } else { "paused" };
                    let next_run = job
                        .next_run_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_owned());
                    println!(
                        "{:<12} {:<24} {:<16} {:<10} {}",
                        job.id,
                        job.name,
                        job.cron,
                        paint_status(state),
                        next_run,
                    );
                }
            })
        }
        SchedulerAction::Get { id } => {
            let job = scheduler::get(api, &id).await?;
            emit(json, &job, |job| {
                println!("{}  {}", job.id, job.name.bold());
                println!("  cron:     {}", job.cron);
                println!("  workflow: {}", or_dash(job.workflow_id.as_deref()));
                println!("  enabled:  {}", job.enabled);
            })
        }
        SchedulerAction::Create {
            name,
            cron,
            workflow,
        } => {
            let draft = scheduler::JobDraft {
                name,
                cron,
                workflow_id: workflow,
            };
            let job = scheduler::create(api, &draft).await?;
            emit(json, &job, |job| println!("created job {}", job.id))
        }
        SchedulerAction::Pause { id } => {
            let job = scheduler::set_enabled(api, &id, false).await?;
            emit(json, &job, |job| println!("paused job {}", job.id))
        }
        SchedulerAction::Resume { id } => {
            let job = scheduler::set_enabled(api, &id, true).await?;
            emit(json, &job, |job| println!("resumed job {}", job.id))
        }
        SchedulerAction::Delete { id } => {
            scheduler::delete(api, &id).await?;
            println!("deleted job {id}");
            Ok(())
        }
    }
}

async fn run_workflows(api: &ApiClient, json: bool, action: WorkflowAction) -> Result<()> {
    match action {
        WorkflowAction::List => {
            let list = workflows::list(api).await?;
            emit(json, &list, |list| {
                println!("{:<12} {:<28} {:>8}", "ID", "NAME", "VERSION");
                for workflow in list {
                    println!(
                        "{:<12} {:<28} {:>8}",
                        workflow.id,
                        workflow.name,
                        workflow
                            .version
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "-".to_owned()),
                    );
                }
            })
        }
        WorkflowAction::Get { id } => {
            let workflow = workflows::get(api, &id).await?;
            emit(json, &workflow, |workflow| {
                println!("{}  {}", workflow.id, workflow.name.bold());
                if let Some(deployed_at) = workflow.deployed_at {
                    println!("  deployed: {}", deployed_at.format("%Y-%m-%d %H:%M"));
                }
            })
        }
        WorkflowAction::Start { id, input } => {
            let input = input
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .map_err(|e| anyhow::anyhow!("--input is not valid JSON: {e}"))?;
            let run = workflows::start(api, &id, input).await?;
            emit(json, &run, |run| {
                println!("started run {} ({})", run.id, paint_status(&run.status))
            })
        }
        WorkflowAction::Runs { id, page } => {
            let result = workflows::runs(api, &id, page).await?;
            emit(json, &result, |page| {
                println!("{:<12} {:<12} {:<22} {}", "ID", "STATUS", "STARTED", "ENDED");
                for run in &page.runs {
                    let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
                        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "-".to_owned())
                    };
                    println!(
                        "{:<12} {:<12} {:<22} {}",
                        run.id,
                        paint_status(&run.status),
                        fmt_time(run.started_at),
                        fmt_time(run.ended_at),
                    );
                }
                println!("{} total (page {})", fmt_count(page.total), page.page);
            })
        }
    }
}

/// Fetch a summary of every resource concurrently. Identical in-flight
/// reads collapse inside the coordinator, so this is cheap to re-run.
async fn run_overview(api: &ApiClient, json: bool) -> Result<()> {
    let (metrics, agents, tools, projects, collections, jobs) = tokio::join!(
        dashboard::metrics(api),
        agents::list(api, 1, 5),
        tools::list(api, 1, 5, None),
        projects::list(api, 1, 5),
        knowledge::list(api),
        scheduler::list(api),
    );

    if json {
        let combined = serde_json::json!({
            "metrics": metrics.ok(),
            "agents": agents.ok(),
            "tools": tools.ok(),
            "projects": projects.ok(),
            "collections": collections.ok(),
            "jobs": jobs.ok(),
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    match metrics {
        Ok(metrics) => println!(
            "{}  agents={} tools={} projects={} collections={} jobs={} active runs={}",
            "atrium".bold(),
            fmt_count(metrics.agents),
            fmt_count(metrics.tools),
            fmt_count(metrics.projects),
            fmt_count(metrics.collections),
            fmt_count(metrics.scheduler_jobs),
            fmt_count(metrics.active_runs),
        ),
        Err(e) => println!("metrics unavailable: {e}"),
    }

    section("agents", &agents, |page| {
        for agent in &page.agents {
            println!(
                "  {:<12} {:<24} {}",
                agent.id,
                agent.name,
                paint_status(or_dash(agent.status.as_deref()))
            );
        }
    });
    section("tools", &tools, |page| {
        for tool in &page.tools {
            println!("  {:<12} {}", tool.id, tool.name);
        }
    });
    section("projects", &projects, |page| {
        for project in &page.projects {
            println!("  {:<12} {}", project.id, project.name);
        }
    });
    section("collections", &collections, |collections| {
        for collection in collections {
            println!(
                "  {:<12} {:<28} {} docs",
                collection.id,
                collection.name,
                fmt_count(collection.document_count)
            );
        }
    });
    section("scheduler jobs", &jobs, |jobs| {
        for job in jobs {
            let state = if job.enabled { "enabled" } else { "paused" };
            println!("  {:<12} {:<24} {}", job.id, job.name, paint_status(state));
        }
    });

    Ok(())
}

fn section<T>(name: &str, result: &Result<T>, render: impl FnOnce(&T)) {
    println!("\n{}", name.bold());
    match result {
        Ok(value) => render(value),
        Err(e) => println!("  unavailable: {e}"),
    }
}

/// Poll dashboard metrics until ctrl-c. Reads go through the coordinator,
/// so the displayed values refresh at the cache TTL cadence.
async fn run_watch(api: &ApiClient, interval: u64) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    info!(interval, "watching dashboard metrics, ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                match dashboard::metrics(api).await {
                    Ok(metrics) => println!(
                        "{}  agents={} tools={} projects={} jobs={} active runs={}",
                        chrono::Local::now().format("%H:%M:%S"),
                        fmt_count(metrics.agents),
                        fmt_count(metrics.tools),
                        fmt_count(metrics.projects),
                        fmt_count(metrics.scheduler_jobs),
                        fmt_count(metrics.active_runs),
                    ),
                    Err(e) => warn!(error = %e, "metrics poll failed"),
                }
            }
        }
    }

    api.clear_cache();
    Ok(())
}
