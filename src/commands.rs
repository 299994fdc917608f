//! Handlers for every subcommand: validate input, make the call, print the result.

use std::net::Ipv4Addr;

use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::api::{
    ApiResponse, CurlRequest, DiagnosticClient, DiagnosticLinkRequest, ErrorCode, Target,
    TranslationApi,
};
use crate::cli::{
    Command, CurlArgs, DiagnosticLinkCommand, DigArgs, GhostCommand, GtmCommand, IpCommand,
    MtrArgs, TranslateRequestCommand,
};
use crate::config::Settings;
use crate::error::DiagError;
use crate::orchestrator::RetryOrchestrator;
use crate::ui::{self, TranslationProgress};

pub struct Context<'a> {
    pub client: &'a DiagnosticClient,
    pub settings: &'a Settings,
    pub debug: bool,
}

pub async fn dispatch(ctx: &Context<'_>, command: Command) -> Result<(), DiagError> {
    match command {
        Command::TranslateError {
            error_code,
            retries,
        } => translate_error(ctx, &error_code, retries).await,
        Command::TranslateRequest(cmd) => translate_request(ctx.client, cmd).await,
        Command::Ip(cmd) => ip(ctx.client, cmd).await,
        Command::Ghost(cmd) => ghost(ctx.client, cmd).await,
        Command::Gtm(cmd) => gtm(ctx.client, cmd).await,
        Command::DiagnosticLink(cmd) => diagnostic_link(ctx.client, cmd).await,
    }
}

async fn translate_error(
    ctx: &Context<'_>,
    error_code: &str,
    retries: Option<u32>,
) -> Result<(), DiagError> {
    let policy = ctx.settings.poll_policy(retries);
    info!(error_code, retries = policy.retries, "translating error code");

    let orchestrator = RetryOrchestrator::new(ctx.client, policy);
    let progress = TranslationProgress::start(error_code);
    let (run, outcome) = orchestrator.run(error_code).await;

    let request_id = run.job.as_ref().map(|job| job.id.as_str());
    match outcome {
        Ok(_) => progress.succeed(request_id),
        Err(_) => progress.fail("Translation failed"),
    }
    if ctx.debug {
        progress.print_summary(&run.summary());
    }

    let result = outcome?;
    if let Some(reason) = result.reason_for_failure() {
        info!(reason, "translation retrieved");
    }
    ui::print_json(&result)?;
    Ok(())
}

async fn translate_request(
    client: &DiagnosticClient,
    cmd: TranslateRequestCommand,
) -> Result<(), DiagError> {
    match cmd {
        TranslateRequestCommand::Launch { error_code } => {
            let code = ErrorCode::new(&error_code);
            let submission = client.submit(&code).await?;
            if submission.status() != 202 {
                return Err(unexpected(submission.response));
            }
            ui::print_body(&submission.response.body)?;
        }
        TranslateRequestCommand::Check { request_id } => {
            let response = client.check(&request_id).await?;
            if response.status == 303 {
                info!(%request_id, "translation is ready");
                ui::print_json(&json!({
                    "requestId": request_id,
                    "status": "ready",
                    "next": format!("edgediag translate-request get {request_id}"),
                }))?;
            } else {
                ui::print_body(&response.body)?;
            }
        }
        TranslateRequestCommand::Get { request_id } => {
            let response = client.fetch(&request_id).await?;
            if response.status != 200 {
                ui::print_body(&response.body)?;
                return Err(DiagError::TranslationUnavailable {
                    request_id,
                    status: response.status,
                });
            }
            ui::print_body(&response.body)?;
        }
    }
    Ok(())
}

async fn ip(client: &DiagnosticClient, cmd: IpCommand) -> Result<(), DiagError> {
    match cmd {
        IpCommand::IsCdnIp { ip } => {
            let response = expect_success(client.cdn_status(parse_ipv4(&ip)?).await?)?;
            ui::print_body(&response.body)?;
        }
        IpCommand::Geolocation { ip } => {
            let response = expect_success(client.geolocation(parse_ipv4(&ip)?).await?)?;
            ui::print_json(&response.field("geoLocation")?)?;
        }
        IpCommand::Dig { ip, args } => {
            let target = Target::IpAddress(parse_ipv4(&ip)?);
            dig(client, &target, &args).await?;
        }
        IpCommand::Mtr { ip, args } => {
            let target = Target::IpAddress(parse_ipv4(&ip)?);
            mtr(client, &target, &args).await?;
        }
        IpCommand::Curl { ip, args } => {
            let target = Target::IpAddress(parse_ipv4(&ip)?);
            curl(client, &target, &args).await?;
        }
    }
    Ok(())
}

async fn ghost(client: &DiagnosticClient, cmd: GhostCommand) -> Result<(), DiagError> {
    match cmd {
        GhostCommand::Locations => {
            let response = expect_success(client.ghost_locations().await?)?;
            ui::print_json(&response.field("locations")?)?;
        }
        GhostCommand::Dig { location, args } => {
            dig(client, &Target::GhostLocation(location), &args).await?;
        }
        GhostCommand::Mtr { location, args } => {
            mtr(client, &Target::GhostLocation(location), &args).await?;
        }
        GhostCommand::Curl { location, args } => {
            curl(client, &Target::GhostLocation(location), &args).await?;
        }
    }
    Ok(())
}

async fn gtm(client: &DiagnosticClient, cmd: GtmCommand) -> Result<(), DiagError> {
    match cmd {
        GtmCommand::Properties => {
            let response = expect_success(client.gtm_properties().await?)?;
            ui::print_json(&response.field("gtmProperties")?)?;
        }
        GtmCommand::IpAddresses { property, domain } => {
            let domain = required("--domain", domain.as_deref())?;
            let response = expect_success(client.gtm_property_ips(&property, domain).await?)?;
            ui::print_json(&response.field("gtmPropertyIps")?)?;
        }
    }
    Ok(())
}

async fn diagnostic_link(
    client: &DiagnosticClient,
    cmd: DiagnosticLinkCommand,
) -> Result<(), DiagError> {
    match cmd {
        DiagnosticLinkCommand::Generate { url, user } => {
            let request = DiagnosticLinkRequest {
                end_user_name: user,
                url: parse_absolute_url("URL", Some(&url))?,
            };
            let response = expect_success(client.generate_diagnostic_link(&request).await?)?;
            ui::print_body(&response.body)?;
        }
        DiagnosticLinkCommand::List => {
            let response = expect_success(client.diagnostic_link_requests().await?)?;
            ui::print_json(&response.field("endUserIpRequests")?)?;
        }
        DiagnosticLinkCommand::Get { request_id } => {
            let response = expect_success(client.diagnostic_link_details(&request_id).await?)?;
            ui::print_json(&response.field("endUserIpDetails")?)?;
        }
    }
    Ok(())
}

async fn dig(client: &DiagnosticClient, target: &Target, args: &DigArgs) -> Result<(), DiagError> {
    let hostname = parse_hostname("--hostname", args.hostname.as_deref())?;
    let response = expect_success(client.dig(target, hostname, args.query_type.as_str()).await?)?;
    ui::print_body(&response.body)?;
    Ok(())
}

async fn mtr(client: &DiagnosticClient, target: &Target, args: &MtrArgs) -> Result<(), DiagError> {
    let destination = parse_hostname("--destination-domain", args.destination_domain.as_deref())?;
    let response = expect_success(client.mtr(target, destination, args.resolve_dns).await?)?;
    ui::print_body(&response.body)?;
    Ok(())
}

async fn curl(client: &DiagnosticClient, target: &Target, args: &CurlArgs) -> Result<(), DiagError> {
    let request = CurlRequest {
        url: parse_absolute_url("--url", args.url.as_deref())?,
        user_agent: args.user_agent.clone(),
    };
    let response = expect_success(client.curl(target, &request).await?)?;
    ui::print_body(&response.body)?;
    Ok(())
}

fn expect_success(response: ApiResponse) -> Result<ApiResponse, DiagError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(unexpected(response))
    }
}

fn unexpected(response: ApiResponse) -> DiagError {
    debug!(status = response.status, "diagnostic api call failed");
    DiagError::UnexpectedStatus {
        status: response.status,
        body: response.body,
    }
}

fn parse_ipv4(raw: &str) -> Result<Ipv4Addr, DiagError> {
    raw.trim()
        .parse()
        .map_err(|_| DiagError::InvalidIp(raw.to_string()))
}

fn required<'a>(flag: &str, value: Option<&'a str>) -> Result<&'a str, DiagError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DiagError::InvalidArgument(format!("{flag} is required"))),
    }
}

fn parse_hostname<'a>(flag: &str, value: Option<&'a str>) -> Result<&'a str, DiagError> {
    let hostname = required(flag, value)?;
    if hostname.contains("://") {
        return Err(DiagError::InvalidArgument(format!(
            "{flag} must be a hostname without scheme, got '{hostname}'"
        )));
    }
    Ok(hostname)
}

fn parse_absolute_url(flag: &str, value: Option<&str>) -> Result<String, DiagError> {
    let raw = required(flag, value)?;
    match Url::parse(raw) {
        Ok(url) if !url.cannot_be_a_base() && url.has_host() => Ok(url.to_string()),
        _ => Err(DiagError::InvalidArgument(format!(
            "{flag} must be an absolute URL, got '{raw}'"
        ))),
    }
}
