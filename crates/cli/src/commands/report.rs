use crate::commands::CommandResult;
use rankscope_core::config::{AppConfig, LoadOptions};
use rankscope_core::domain::site::{DomainId, UserId};
use rankscope_core::visibility::build_region_report;
use rankscope_db::repositories::{
    DomainRepository, MetricsRepository, SqlDomainRepository, SqlMetricsRepository,
};
use rankscope_db::connect_with_settings;

/// Offline region report: same engine invocation as the API, printed to
/// stdout for operators and support tooling.
pub fn run(user: &str, domain: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "report",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "report",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let user_id = UserId(user.to_string());
    let domain_id = DomainId(domain.to_string());
    let options = config.report.to_options();

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let domains = SqlDomainRepository::new(pool.clone());
        let owned = domains
            .find_for_user(&user_id, &domain_id)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        if owned.is_none() {
            pool.close().await;
            return Err((
                "domain_not_found",
                format!("domain `{domain}` does not exist for user `{user}`"),
                6u8,
            ));
        }

        let metrics = SqlMetricsRepository::new(pool.clone());
        let records = metrics
            .list_for_domain(&user_id, &domain_id)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;

        let report = build_region_report(&records, &options);
        serde_json::to_string_pretty(&report)
            .map_err(|error| ("serialization", error.to_string(), 7u8))
    });

    match result {
        Ok(rendered) => CommandResult { exit_code: 0, output: rendered },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}
