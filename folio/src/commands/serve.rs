use folio_config::Config;
use tracing::{info, warn};

use crate::environment;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    for problem in config.problems() {
        warn!("Configuration problem: {problem}");
    }

    if !config.rate_limit.enabled {
        warn!("Rate limiting is disabled");
    }

    let server = environment::rest_server(&config)?;
    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    server.serve().await
}
