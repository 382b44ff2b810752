use console::style;
use pgmigrate::{
    render_status, MigrationManager, MigrationReport, MigrationRunner, MigratorConfig,
    OutcomeStatus,
};

/// Apply every pending migration and print the outcome table.
///
/// The table is printed whether or not the run failed; the error is returned afterwards.
pub async fn up(config: MigratorConfig) -> anyhow::Result<()> {
    let runner = MigrationRunner::connect(config).await?;

    let mut report = MigrationReport::new();
    let result = runner.run_migrations(&mut report).await;

    print!("{}", report);

    let result = result?;
    if result.applied_count == 0 {
        println!("{}", style("Nothing to migrate").dim());
    } else {
        println!(
            "{} {} applied, {} already applied ({} ms)",
            style("✓").green(),
            report.count(OutcomeStatus::AppliedNow),
            report.count(OutcomeStatus::AlreadyApplied),
            result.execution_time_ms
        );
    }
    Ok(())
}

/// Create an empty migration file in the migrations directory
pub fn create(config: MigratorConfig, name: &str) -> anyhow::Result<()> {
    let manager = MigrationManager::with_config(config);
    let filename = manager.create_migration(name)?;

    println!("created migration {}", filename);
    Ok(())
}

/// Print every discovered migration with its applied/pending state
pub async fn status(config: MigratorConfig) -> anyhow::Result<()> {
    let runner = MigrationRunner::connect(config).await?;
    let states = runner.migration_status().await?;

    if states.is_empty() {
        println!("No migrations found");
        return Ok(());
    }

    print!("{}", render_status(&states));
    let pending = states.iter().filter(|s| !s.applied).count();
    if pending > 0 {
        println!("{} {} pending", style("⏳").yellow(), pending);
    } else {
        println!("{}", style("Up to date").green());
    }
    Ok(())
}
