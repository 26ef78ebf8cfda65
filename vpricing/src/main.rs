use time::OffsetDateTime;
use tokio::select;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};
use vp_axum::start_server;
use vp_core::models::CycleTag;
use vp_core::ports::{AdminRepository as _, Application as _};
use vp_ingest::GraphClient;
use vp_postgres::Db;
use vpricing::{AppConfig, Cli, Commands, impls::App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file feeds the environment-variable config layer, so it
    // has to land before config resolution.
    dotenvy::dotenv().ok();

    // By convention, we leverage `tracing` to instrument and log various
    // operations throughout this project.
    // Accordingly, we likely want to subscribe to these events so we can
    // write them to stdio and possibly some durable location.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args, then layer the config sources
    let cli = Cli::import()?;
    let AppConfig {
        server,
        database,
        graph,
        pricing,
        schedule,
    } = AppConfig::load(&cli)?;

    let db = Db::open(&database).await?;
    let graph = GraphClient::new(graph);
    let app = App::new(db, graph.clone(), &pricing);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CreateTables => {
            app.database().ensure_schema().await?;
            println!("tables created (or already exist)");
        }

        Commands::Ingest { cycle } => {
            let cycle = match cycle {
                Some(tag) => tag.parse()?,
                None => CycleTag::from_datetime(OffsetDateTime::now_utc()),
            };
            let report = app.run_cycle(cycle).await?;
            serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
            println!();
        }

        Commands::Mailbox { limit } => {
            for message in graph.latest_messages(limit).await? {
                println!(
                    "{}\t{}\t{}",
                    message.received.unwrap_or_default(),
                    message.from.unwrap_or_default(),
                    message.subject.unwrap_or_default()
                );
            }
        }

        Commands::Serve => {
            // We always run the server task.
            let server_app = app.clone();
            let server_task = tokio::spawn(async move { start_server(server, server_app).await });

            // However, we may or may not also run a scheduled cycle task
            if schedule.every.is_some() {
                let cycle_task = tokio::spawn(async move {
                    let f = async move |cycle: CycleTag| {
                        let report = app.run_cycle(cycle).await?;
                        tracing::info!(
                            cycle = %report.cycle_tag,
                            baseline = report.baseline_rows,
                            proposals = report.proposals,
                            "scheduled cycle finished"
                        );
                        Ok::<(), vp_ingest::CycleError>(())
                    };
                    schedule.schedule(f).await
                });

                select! {
                    r = server_task => r??,
                    r = cycle_task => r??,
                }
            } else {
                // Otherwise, we just run the server task to completion
                server_task.await??;
            }
        }
    }

    Ok(())
}
