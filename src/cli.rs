//! Interface de linha de comando do edgediag baseada em clap.
//!
//! Define a struct [`Cli`] com os grupos de subcomandos [`Command`]
//! (translate-error, translate-request, ip, ghost, gtm, diagnostic-link)
//! e as flags globais (--config, --section, --debug).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// edgediag — ferramentas de diagnóstico da rede de borda pela linha de comando.
#[derive(Debug, Parser)]
#[command(name = "edgediag", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de credenciais (padrão: ~/.edgerc).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seção do arquivo de credenciais a usar.
    #[arg(long, global = true, default_value = crate::config::DEFAULT_SECTION)]
    pub section: String,

    /// Habilita logs de depuração (requisições e respostas).
    #[arg(long, short, global = true, default_value_t = false)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Get information about error strings produced by edge servers when a request to retrieve content fails.
    #[command(visible_alias = "t")]
    TranslateError {
        /// Error string reported by the edge server; a leading '#' is ignored.
        error_code: String,

        /// Number of retries to get the translation result.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        retries: Option<u32>,
    },

    /// Same as 'translate-error', but without waiting: launch, check and get the result yourself.
    #[command(visible_alias = "tr", subcommand)]
    TranslateRequest(TranslateRequestCommand),

    /// IP address actions: is-cdn-ip, geolocation, dig, mtr, curl.
    #[command(subcommand)]
    Ip(IpCommand),

    /// Edge server location actions: locations, dig, mtr, curl.
    #[command(subcommand)]
    Ghost(GhostCommand),

    /// Global Traffic Management properties and their test and target IPs.
    #[command(subcommand)]
    Gtm(GtmCommand),

    /// Generate, list or inspect links sent to end users to diagnose a problem.
    #[command(subcommand)]
    DiagnosticLink(DiagnosticLinkCommand),
}

#[derive(Debug, Subcommand)]
pub enum TranslateRequestCommand {
    /// Launches an asynchronous error translation request.
    Launch {
        /// Error string reported by the edge server.
        error_code: String,
    },
    /// Checks the status of a request started with 'launch'.
    Check {
        /// Request ID from the 'launch' output.
        request_id: String,
    },
    /// Gets the translated error once the request is ready.
    Get {
        /// Request ID from the 'launch' output.
        request_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum IpCommand {
    /// Checks whether the IP address is part of the edge network.
    IsCdnIp { ip: String },
    /// Geolocation of an IP address within the edge network.
    Geolocation { ip: String },
    /// Runs dig from an edge IP address.
    Dig {
        ip: String,
        #[command(flatten)]
        args: DigArgs,
    },
    /// Runs mtr from an edge IP address.
    Mtr {
        ip: String,
        #[command(flatten)]
        args: MtrArgs,
    },
    /// Runs curl from an edge IP address.
    Curl {
        ip: String,
        #[command(flatten)]
        args: CurlArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum GhostCommand {
    /// Lists active edge server locations that can run diagnostics.
    Locations,
    /// Runs dig from an edge server location.
    Dig {
        location: String,
        #[command(flatten)]
        args: DigArgs,
    },
    /// Runs mtr from an edge server location.
    Mtr {
        location: String,
        #[command(flatten)]
        args: MtrArgs,
    },
    /// Runs curl from an edge server location.
    Curl {
        location: String,
        #[command(flatten)]
        args: CurlArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum GtmCommand {
    /// Lists all GTM properties you have access to.
    Properties,
    /// Gets test and target IPs for a GTM property.
    IpAddresses {
        property: String,
        /// GTM domain the property belongs to.
        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DiagnosticLinkCommand {
    /// Generates a unique link to send to a user.
    Generate {
        /// URL the user should load.
        url: String,
        /// Name of the user the link is for.
        #[arg(long, default_value = "beloved-customer")]
        user: String,
    },
    /// Lists users who loaded diagnostic links over the past six months.
    List,
    /// Gets the IP details collected by a diagnostic link.
    Get { request_id: String },
}

#[derive(Debug, Clone, Args)]
pub struct DigArgs {
    /// Hostname to look up, without scheme.
    #[arg(long)]
    pub hostname: Option<String>,

    /// DNS record type.
    #[arg(long, value_enum, default_value_t = QueryType::A)]
    pub query_type: QueryType,
}

#[derive(Debug, Clone, Args)]
pub struct MtrArgs {
    /// Domain to test connectivity to, without scheme.
    #[arg(long)]
    pub destination_domain: Option<String>,

    /// Resolve hostnames along the route.
    #[arg(long, default_value_t = false)]
    pub resolve_dns: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CurlArgs {
    /// URL to fetch.
    #[arg(long)]
    pub url: Option<String>,

    /// User agent to present.
    #[arg(long, default_value = "Chrome")]
    pub user_agent: String,
}

/// Tipo de registro DNS aceito pelo dig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum QueryType {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Ptr,
    Soa,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::A => "A",
            QueryType::Aaaa => "AAAA",
            QueryType::Cname => "CNAME",
            QueryType::Mx => "MX",
            QueryType::Ns => "NS",
            QueryType::Ptr => "PTR",
            QueryType::Soa => "SOA",
        }
    }
}
