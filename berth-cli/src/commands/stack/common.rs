//! Helpers shared by the stack commands.

use crate::client::ManagerApi;
use anyhow::Result;
use berth_core::stack::stack_filter;
use berth_core::{BerthError, Bundle, Network, Service};
use std::io::Write;
use std::path::PathBuf;

/// Driver of networks created for a stack.
pub const DEFAULT_NETWORK_DRIVER: &str = "overlay";

/// Services belonging to the stack.
pub async fn get_services(client: &dyn ManagerApi, namespace: &str) -> Result<Vec<Service>> {
    client.service_list(&stack_filter(namespace)).await
}

/// Networks belonging to the stack.
pub async fn get_networks(client: &dyn ManagerApi, namespace: &str) -> Result<Vec<Network>> {
    client.network_list(&stack_filter(namespace)).await
}

/// Load `path`, or `<namespace>.dab` when no path or an empty one is given.
pub fn load_bundlefile(
    err: &mut dyn Write,
    namespace: &str,
    path: Option<&str>,
) -> Result<Bundle> {
    let path = match path.filter(|p| !p.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(format!("{}.dab", namespace)),
    };

    if !path.exists() {
        return Err(BerthError::BundleNotFound { path }.into());
    }

    writeln!(err, "Loading bundle from {}", path.display())?;
    Ok(Bundle::load_file(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    #[test]
    fn test_missing_bundle_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.dab");
        let mut err = Vec::new();

        let e = load_bundlefile(&mut err, "shop", path.to_str()).unwrap_err();

        assert_eq!(
            e.to_string(),
            format!("Bundle {} not found. Specify the path with --file", path.display())
        );
        assert!(err.is_empty());
    }

    #[test]
    fn test_load_announces_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shop.dab");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"Version": "0.1", "Services": {{"web": {{"Image": "nginx"}}}}}}"#)
            .unwrap();

        let mut err = Vec::new();
        let bundle = load_bundlefile(&mut err, "shop", path.to_str()).unwrap();

        assert_eq!(bundle.services.len(), 1);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            format!("Loading bundle from {}\n", path.display())
        );
    }

    #[test]
    fn test_default_path_is_namespace_dab() {
        let mut err = Vec::new();
        let e = load_bundlefile(&mut err, "no-such-stack-here", None).unwrap_err();

        assert_eq!(
            e.to_string(),
            "Bundle no-such-stack-here.dab not found. Specify the path with --file"
        );
    }

    #[test]
    fn test_empty_file_flag_uses_default_path() {
        let mut err = Vec::new();
        let e = load_bundlefile(&mut err, "no-such-stack-here", Some("")).unwrap_err();

        assert_eq!(
            e.to_string(),
            "Bundle no-such-stack-here.dab not found. Specify the path with --file"
        );
    }
}
