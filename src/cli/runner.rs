//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_operation, OperationConfig};
use crate::error::{Error, Result};
use crate::operation::{HttpListOperation, ListRequest};
use crate::output::{OutputFormat, WriterSink};
use crate::pagination::{run_paginated, CancelSignal, PaginationOptions};
use crate::selector::Selector;
use crate::types::JsonObject;
use serde_json::{json, Value};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::List {
                next_token,
                no_auto_iteration,
                page_size,
                select,
                params,
                params_json,
            } => {
                self.list(ListArgs {
                    next_token: next_token.as_deref(),
                    no_auto_iteration: *no_auto_iteration,
                    page_size: *page_size,
                    select: select.as_deref(),
                    params,
                    params_json: params_json.as_deref(),
                })
                .await
            }
            Commands::Validate => self.validate(),
            Commands::Show => self.show(),
        }
    }

    /// Load the operation definition
    fn load_operation(&self) -> Result<OperationConfig> {
        let path = self
            .cli
            .operation
            .as_ref()
            .ok_or_else(|| Error::config("Operation file not specified (use -o flag)"))?;
        load_operation(path)
    }

    /// Fetch pages and print each projected value
    async fn list(&self, args: ListArgs<'_>) -> Result<()> {
        let config = self.load_operation()?;

        // Everything the caller controls is validated before the first call.
        let request = build_request(&config, args.params, args.params_json)?;
        let selector = match args.select {
            Some(expr) => Selector::parse(expr)?,
            None => config.default_selector()?,
        };

        let mut options = PaginationOptions::new();
        if let Some(token) = args.next_token {
            options = options.starting_at(token);
        }
        if args.no_auto_iteration {
            options = options.no_auto_iteration();
        }
        if let Some(size) = args.page_size {
            options = options.with_page_size(config.check_page_size(size)?);
        }

        let operation = HttpListOperation::from_config(&config)?;
        let mut sink = WriterSink::stdout(self.cli.format);

        let cancel = CancelSignal::new();
        let trigger = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                trigger.cancel();
            }
        });

        let result = run_paginated(
            &operation,
            request,
            options,
            &selector,
            &mut sink,
            Some(cancel),
        )
        .await;
        ctrl_c.abort();

        let summary = result?;
        if let Some(token) = &summary.next_token {
            info!("More results available, continue with --next-token {token}");
        }

        Ok(())
    }

    /// Validate the operation definition
    fn validate(&self) -> Result<()> {
        let config = self.load_operation()?;

        self.output(&json!({
            "operation": config.name,
            "valid": true,
            "endpoint": format!(
                "{:?} {}/{}",
                config.method,
                config.base_url.trim_end_matches('/'),
                config.path.trim_start_matches('/')
            ),
            "paginated_by": config.token.request_field,
            "page_size_field": config.page_size.as_ref().map(|p| &p.request_field),
        }));

        Ok(())
    }

    /// Print the parsed operation definition, header values masked
    fn show(&self) -> Result<()> {
        let config = self.load_operation()?.redacted();
        self.output(&serde_json::to_value(&config)?);
        Ok(())
    }

    /// Write one value to stdout in the selected format
    fn output(&self, value: &Value) {
        match self.cli.format {
            OutputFormat::Json => println!("{value}"),
            OutputFormat::Pretty => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
                );
            }
        }
    }
}

/// Arguments of the `list` command
struct ListArgs<'a> {
    next_token: Option<&'a str>,
    no_auto_iteration: bool,
    page_size: Option<u32>,
    select: Option<&'a str>,
    params: &'a [String],
    params_json: Option<&'a str>,
}

/// Build the request: operation defaults, then `--params-json`, then `--param`
pub(crate) fn build_request(
    config: &OperationConfig,
    params: &[String],
    params_json: Option<&str>,
) -> Result<ListRequest> {
    let mut request = config.new_request();

    if let Some(raw) = params_json {
        let fields: JsonObject = serde_json::from_str(raw).map_err(|e| {
            Error::invalid_value("params-json", format!("expected a JSON object: {e}"))
        })?;
        request.extend(fields);
    }

    for param in params {
        let (name, value) = parse_param(param)?;
        request.set(name, value);
    }

    check_page_size_field(config, &request)?;
    Ok(request)
}

/// Hold a page size passed as a plain field to the same limits as `--page-size`
fn check_page_size_field(config: &OperationConfig, request: &ListRequest) -> Result<()> {
    let Some(field) = request.page_size_field() else {
        return Ok(());
    };
    let Some(value) = request.get(field).filter(|v| !v.is_null()) else {
        return Ok(());
    };

    let size = value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            Error::invalid_value(field, format!("expected a positive integer, got {value}"))
        })?;
    config.check_page_size(size)?;
    Ok(())
}

/// Parse a `NAME=VALUE` parameter
///
/// The value is read as JSON when it parses (`25`, `true`, `["a","b"]`),
/// otherwise it is taken as a plain string.
pub fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| Error::invalid_value("param", format!("'{raw}' is not NAME=VALUE")))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_value(
            "param",
            format!("'{raw}' has an empty name"),
        ));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}
