//! CLI subcommand handlers

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::Value;

use crate::{api::ApiClient, config::Config, output};

/// Read a constraint list from a JSON file.
///
/// Accepts a bare array or an object carrying it under `constraints`
/// (or `Constraints`, as solver requests spell it).
pub fn load_constraints(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map
            .remove("constraints")
            .or_else(|| map.remove("Constraints"))
        {
            Some(Value::Array(items)) => items,
            _ => bail!("{} has no constraints array", path.display()),
        },
        _ => bail!("{} must hold a constraint array", path.display()),
    };

    if list.is_empty() {
        bail!("{} holds no constraints", path.display());
    }
    Ok(list)
}

pub async fn status(api: &ApiClient) -> Result<()> {
    output::print_header("SABRES Status");

    match api.health().await {
        Ok(health) => output::print_success(&format!(
            "Server: {} ({} {})",
            api.base_url(),
            health.status,
            health.version
        )),
        Err(err) => output::print_error(&format!(
            "Server: {} not reachable ({})",
            api.base_url(),
            err
        )),
    }

    match api.show_graph().await {
        Ok(view) if view.exists => output::print_info("Topology: built"),
        Ok(_) => output::print_info("Topology: not built"),
        Err(err) => tracing::debug!("topology lookup failed: {}", err),
    }

    println!();
    println!("  {} {}", "Version:".dimmed(), env!("CARGO_PKG_VERSION"));
    println!("  {} {}", "Config:".dimmed(), Config::config_path().display());
    Ok(())
}

pub async fn create_graph(api: &ApiClient) -> Result<()> {
    api.create_graph().await?;
    output::print_success("Topology built from inventory");
    Ok(())
}

pub async fn delete_graph(api: &ApiClient) -> Result<()> {
    api.delete_graph().await?;
    output::print_success("Topology deleted");
    Ok(())
}

pub async fn show_graph(api: &ApiClient) -> Result<()> {
    let view = api.show_graph().await?;
    if view.exists {
        println!("{}", view.dotviz);
    } else {
        output::print_info("No topology has been built. Run: sabres graph create");
    }
    Ok(())
}

pub async fn graph_json(api: &ApiClient) -> Result<()> {
    let graph = api.graph_json().await?;
    println!("{}", output::pretty_json(&graph));
    Ok(())
}

pub async fn set_solver(api: &ApiClient, host: &str, port: &str) -> Result<()> {
    api.set_solver(host, port).await?;
    output::print_success(&format!("Solver location set to {}:{}", host, port));
    Ok(())
}

pub async fn solve(api: &ApiClient, file: &Path) -> Result<()> {
    let constraints = load_constraints(file)?;
    tracing::debug!("sending {} constraints", constraints.len());
    let response = api.solve(constraints).await?;
    println!("{}", output::pretty_json(&response));
    Ok(())
}

pub async fn create_slice(api: &ApiClient, file: &Path, solver: Option<&str>) -> Result<()> {
    let constraints = load_constraints(file)?;
    let uuid = api.create_slice(constraints, solver).await?;
    output::print_success(&format!("Slice created: {}", uuid.bright_white()));
    Ok(())
}

pub async fn list_slices(api: &ApiClient) -> Result<()> {
    output::print_header("Slices");
    let slices = api.list_slices().await?;
    if slices.is_empty() {
        output::print_info("No slices found.");
        return Ok(());
    }
    output::print_slices_table(&slices);
    Ok(())
}

pub async fn show_slice(api: &ApiClient, uuid: &str) -> Result<()> {
    let slice = api.get_slice(uuid).await?;
    println!("{}", serde_json::to_string_pretty(&slice)?);
    Ok(())
}

pub async fn delete_slice(api: &ApiClient, uuid: &str) -> Result<()> {
    api.delete_slice(uuid).await?;
    output::print_success(&format!("Slice {} deleted", uuid));
    Ok(())
}

pub async fn configure_slice(api: &ApiClient, uuid: &str) -> Result<()> {
    let config = api.configure_slice(uuid).await?;
    output::print_header(&format!("Slice {}", uuid));
    println!("{}", output::format_configuration(&config));
    Ok(())
}

pub fn show_config(config: &Config) -> Result<()> {
    output::print_header("Configuration");
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

pub fn set_config(config: &mut Config, kv: &str) -> Result<()> {
    let Some((key, value)) = kv.split_once('=') else {
        bail!("Expected key=value, got {}", kv);
    };
    config.set(key.trim(), value.trim())?;
    config.save()?;
    output::print_success(&format!("{} = {}", key.trim(), value.trim()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_constraints_forms() {
        let bare = write_json(r#"[{"object":"cpu","vertices":["a"]}]"#);
        assert_eq!(load_constraints(bare.path()).unwrap().len(), 1);

        let wrapped = write_json(r#"{"constraints":[{"object":"cpu"},{"object":"bw"}]}"#);
        assert_eq!(load_constraints(wrapped.path()).unwrap().len(), 2);

        let solver_style = write_json(r#"{"Constraints":[{"object":"cpu"}],"Graph":{}}"#);
        let list = load_constraints(solver_style.path()).unwrap();
        assert_eq!(list[0]["object"], "cpu");
    }

    #[test]
    fn test_load_constraints_rejects_bad_input() {
        assert!(load_constraints(write_json("[]").path()).is_err());
        assert!(load_constraints(write_json(r#"{"other":[]}"#).path()).is_err());
        assert!(load_constraints(write_json("42").path()).is_err());
        assert!(load_constraints(write_json("{").path()).is_err());
        assert!(load_constraints(Path::new("/definitely/not/here.json")).is_err());
    }
}
