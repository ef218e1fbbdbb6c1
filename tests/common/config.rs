//! Configuration builders for integration tests

use notification_extractor::Config;
use std::path::Path;

/// Customer tool every fixture notification is addressed to
pub const CUSTOMER_TOOL: &str = "ACMEDESK";

/// Configuration pointing at `db_path`, with extra TOML appended to `[processing]`
pub fn test_config(db_path: &Path, tz_code: &str, processing: &str) -> Config {
    let toml = format!(
        r#"
customer_tool = "{}"
tz_code = "{}"

[database]
path = "{}"

[processing]
concurrency = 4
{}
"#,
        CUSTOMER_TOOL,
        tz_code,
        db_path.display(),
        processing
    );
    Config::from_toml_str(&toml).unwrap()
}
