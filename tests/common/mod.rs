use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("chatline.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn config_for_backend(base_url: &str) -> String {
    format!(
        r#"
backend:
  base_url: {}
  timeout_seconds: 5
sessions:
  page_size: 10
"#,
        base_url
    )
}
