use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config_lsp::config::ServerConfig;
use config_lsp::observer::TracingObserver;
use config_lsp::workspace::Workspace;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("Usage: {} <workspace_root> <config_file> [marker_type]", args[0]);
    }

    let root = PathBuf::from(&args[1]);
    let mut config = ServerConfig::default();
    if let Some(marker) = args.get(3) {
        config.marker_type = marker.clone();
    }

    let mut workspace = Workspace::new(root.clone(), config);
    workspace.initialize()?;
    println!("Indexed {} files under {}", workspace.program.len(), root.display());

    let file = root.join(&args[2]);
    let suggestions = workspace.suggestions(&file, &TracingObserver)?;

    println!("\n{} suggestions:", suggestions.len());
    for suggestion in &suggestions {
        let depth = suggestion.path.matches('.').count();
        println!(
            "{}{}{}{}",
            "  ".repeat(depth),
            suggestion.path,
            suggestion
                .detail
                .as_deref()
                .map(|d| format!(": {}", d))
                .unwrap_or_default(),
            if suggestion.is_leaf { "" } else { " {..}" }
        );
    }

    Ok(())
}
