use anyhow::Result;

use crate::config::Config;

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<10} {:<40} HEALTHY", "SOURCE", "STATUS");

    let bulk_status = match &config.sources.bulk {
        Some(bulk) => {
            if bulk.path.exists() {
                ("OK".to_string(), true)
            } else {
                (
                    format!("PATH MISSING ({})", bulk.path.display()),
                    false,
                )
            }
        }
        None => ("NOT CONFIGURED".to_string(), false),
    };
    println!("{:<10} {:<40} {}", "bulk", bulk_status.0, bulk_status.1);

    let api_status = match &config.sources.api {
        Some(api) => {
            if std::env::var(&api.api_key_env).is_ok() {
                (format!("OK ({} regions)", api.regions.len()), true)
            } else {
                (format!("MISSING KEY ({})", api.api_key_env), false)
            }
        }
        None => ("NOT CONFIGURED".to_string(), false),
    };
    println!("{:<10} {:<40} {}", "api", api_status.0, api_status.1);

    let cms_status = match &config.sources.cms {
        Some(cms) => {
            if std::env::var(&cms.token_env).is_ok() {
                ("OK".to_string(), true)
            } else {
                (format!("MISSING TOKEN ({})", cms.token_env), false)
            }
        }
        None => ("NOT CONFIGURED".to_string(), false),
    };
    println!("{:<10} {:<40} {}", "cms", cms_status.0, cms_status.1);

    Ok(())
}
