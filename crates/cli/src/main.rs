//! `revive` binary entry point.

use std::io;

use anyhow::Context;

use revive_cli::{Config, Menu};
use revive_infra::{JsonFileGateway, RegistryService};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    revive_observability::init_with(config.log_format);

    tracing::info!(
        data_dir = %config.data_dir.display(),
        audit = ?config.audit,
        "starting revive"
    );

    let audit_sink = config.audit_sink().context("failed to open audit log")?;
    let gateway = JsonFileGateway::new(&config.data_dir);
    let service = RegistryService::open(gateway, audit_sink)
        .with_context(|| format!("failed to load data from {}", config.data_dir.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu::new(service, stdin.lock(), stdout.lock());
    menu.run()
}
