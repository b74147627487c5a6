use crate::config::types::{
    Config, CrawlerConfig, DnsConfig, DomainsConfig, ErrorKind, HttpConfig, InputKind,
    NatsConfig, OutputKind, RenderConfig, SearchIndexConfig,
};
use crate::model::CrawlingType;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Run again after command-line overrides are applied, since they can
/// select transports whose sections the file left out.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_render_config(&config.render)?;
    validate_dns_config(&config.dns)?;
    validate_transports(config)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 10_000 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 10000, got {}",
            config.batch_size
        )));
    }
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.fetch_timeout_secs == 0 || config.render_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch timeouts must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    // The render strategy is always registered, so its endpoint is mandatory.
    validate_url("render.api_url", &config.api_url)?;

    if !config.wait.is_finite() || config.wait < 0.0 {
        return Err(ConfigError::Validation(format!(
            "render wait must be a non-negative number of seconds, got {}",
            config.wait
        )));
    }

    Ok(())
}

fn validate_dns_config(config: &DnsConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "dns timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.attempts == 0 {
        return Err(ConfigError::Validation(
            "dns attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Checks that every selected transport has its section configured
fn validate_transports(config: &Config) -> Result<(), ConfigError> {
    match config.sinks.input {
        InputKind::Nats => {
            validate_nats_config(required(config.nats.as_ref(), "nats")?)?;
        }
        InputKind::Domains => {
            validate_domains_config(required(config.domains.as_ref(), "domains")?)?;
        }
    }

    if config.sinks.output.is_empty() {
        return Err(ConfigError::Validation(
            "at least one output sink must be selected".to_string(),
        ));
    }

    for output in &config.sinks.output {
        match output {
            OutputKind::Console => {}
            OutputKind::SearchIndex => {
                validate_search_index_config(required(
                    config.search_index.as_ref(),
                    "search-index",
                )?)?;
            }
            OutputKind::Queue => {
                let nats = required(config.nats.as_ref(), "nats")?;
                validate_nats_config(nats)?;
                required(nats.output_subject.as_ref(), "nats.output-subject")?;
            }
        }
    }

    if config.sinks.errors == ErrorKind::Queue {
        let nats = required(config.nats.as_ref(), "nats")?;
        validate_nats_config(nats)?;
        required(nats.error_subject.as_ref(), "nats.error-subject")?;
    }

    Ok(())
}

fn validate_nats_config(config: &NatsConfig) -> Result<(), ConfigError> {
    validate_url("nats.url", &config.url)?;

    for (name, value) in [
        ("stream", &config.stream),
        ("input_subject", &config.input_subject),
        ("consumer", &config.consumer),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "nats {} cannot be empty",
                name
            )));
        }
    }

    if config.ack_wait_secs == 0 {
        return Err(ConfigError::Validation(
            "nats ack_wait_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_search_index_config(config: &SearchIndexConfig) -> Result<(), ConfigError> {
    validate_url("search_index.url", &config.url)?;

    if config.index.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search index name cannot be empty".to_string(),
        ));
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "search index password given without a username".to_string(),
        ));
    }

    Ok(())
}

fn validate_domains_config(config: &DomainsConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "domains database_path cannot be empty".to_string(),
        ));
    }

    config
        .crawling_type
        .parse::<CrawlingType>()
        .map_err(|e| ConfigError::Validation(format!("domains: {}", e)))?;

    Ok(())
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;
    Ok(())
}

fn required<'a, T>(section: Option<&'a T>, name: &str) -> Result<&'a T, ConfigError> {
    section.ok_or_else(|| {
        ConfigError::Validation(format!("[{}] must be configured for the selected sinks", name))
    })
}
