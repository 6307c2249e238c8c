//! Command implementations.

mod info;
mod ingest;
mod topics;
mod validate;

pub use info::run_info;
pub use ingest::run_ingest;
pub use topics::run_topics;
pub use validate::run_validate;

use contracts::SinkBlueprint;
use tracing::debug;

use crate::cli::ConfigArg;
use crate::error::{CliError, Result};

/// Load and validate the configuration named on the command line
fn load_blueprint(arg: &ConfigArg) -> Result<SinkBlueprint> {
    if !arg.config.exists() {
        return Err(CliError::config_not_found(arg.config.display().to_string()));
    }
    let blueprint = config_loader::ConfigLoader::load_from_path(&arg.config)?;
    debug!(
        config = %arg.config.display(),
        topics = blueprint.topics.all_topics().len(),
        "Configuration loaded"
    );
    Ok(blueprint)
}
