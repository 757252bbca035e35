//! `leilao-cartaz` command line: list auctions, inspect summaries and
//! export the summary card on an emulated device.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use leilao_cartaz::card::{CartazResumo, RenderTarget};
use leilao_cartaz::format::{formatar_data, linhas_resumo, pegar_imagem_capa, status_texto};
use leilao_cartaz::gateway::{GatewayClient, GatewayConfig};
use leilao_cartaz::model::{Leilao, LeilaoResponse};
use leilao_cartaz::platform::device::DeviceProfile;
use leilao_cartaz::platform::headless::HeadlessBuilder;
use leilao_cartaz::{new_exporter, ExportConfig, ExportOutcome, Rgba};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "leilao-cartaz", version, about = "Auction listings and summary card export")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List upcoming and running auctions.
    Abertos,

    /// List closed auctions.
    Finalizados,

    /// Show one auction.
    Detalhe {
        id: u64,
        /// Print the raw record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the financial and lot summary of one auction.
    Resumo { id: u64 },

    /// Render the summary card and deliver it as a PNG.
    Cartaz(CartazArgs),
}

#[derive(Parser)]
struct CartazArgs {
    /// Auction id; without it a sample card is exported.
    id: Option<u64>,

    /// Directory that receives the delivered file.
    #[arg(long = "out-dir", value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Device to emulate.
    #[arg(long, value_enum, default_value = "desktop")]
    device: DeviceArg,

    /// Page scroll at the time of the export, in CSS pixels.
    #[arg(long = "scroll-y", default_value_t = 0.0)]
    scroll_y: f32,

    /// Canvas background as `#rrggbb`.
    #[arg(long, default_value = "#0f0f10")]
    background: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Desktop,
    Iphone,
    Android,
}

impl DeviceArg {
    fn profile(self) -> DeviceProfile {
        match self {
            DeviceArg::Desktop => DeviceProfile::desktop_chrome(),
            DeviceArg::Iphone => DeviceProfile::iphone(),
            DeviceArg::Android => DeviceProfile::android_chrome(),
        }
    }
}

fn gateway() -> Result<GatewayClient> {
    let config = GatewayConfig::from_env().context("gateway configuration")?;
    Ok(GatewayClient::new(config)?)
}

fn print_listing(res: &LeilaoResponse) {
    let rows: Vec<&Leilao> = res.hoje.iter().chain(res.result.iter()).collect();
    if rows.is_empty() {
        println!("Nenhum leilão encontrado.");
        return;
    }
    for l in rows {
        println!(
            "{:>6}  {:<16}  {:<40}  {:<16}  {}",
            l.id,
            formatar_data(l.data_proximo_leilao.as_ref()),
            l.titulo.as_deref().unwrap_or("-"),
            status_texto(l),
            pegar_imagem_capa(l).unwrap_or("-")
        );
    }
}

fn print_detalhe(l: &Leilao) {
    println!("Leilão {} ({})", l.id, l.codigo.as_deref().unwrap_or("-"));
    println!("  Título:        {}", l.titulo.as_deref().unwrap_or("-"));
    println!("  Status:        {}", status_texto(l));
    println!("  Próximo leilão: {}", formatar_data(l.data_proximo_leilao.as_ref()));
    println!("  Abertura:      {}", formatar_data(l.data_abertura.as_ref()));
    println!("  Lotes:         {}", l.total_lotes.unwrap_or(0));
    println!("  Habilitados:   {}", l.habilitados.unwrap_or(0));
    println!("  Visitas:       {}", l.stats_visitas.unwrap_or(0));
    if let Some(c) = l.comitente_principal() {
        println!("  Comitente:     {}", c.apelido.as_deref().unwrap_or("-"));
    }
}

async fn load_target(id: Option<u64>) -> Result<RenderTarget> {
    match id {
        Some(id) => {
            let client = gateway()?;
            let agora = chrono::Local::now().naive_local();
            Ok(client
                .load_render_target(id, agora)
                .await
                .with_context(|| format!("loading card for auction {}", id))?)
        }
        None => Ok(RenderTarget::new(CartazResumo::default())),
    }
}

async fn cartaz(args: CartazArgs) -> Result<()> {
    let profile = args.device.profile();
    info!(
        "emulating {} ({}x{} @{}x)",
        profile.name, profile.metrics.width, profile.metrics.height, profile.metrics.dpr
    );
    let target = load_target(args.id).await?;

    let platform = Arc::new(
        HeadlessBuilder::from_profile(&profile)
            .scroll_y(args.scroll_y)
            .output_dir(&args.out_dir)
            .build(),
    );
    let config = ExportConfig { background: Rgba::parse_hex(&args.background)?, ..Default::default() };
    let exporter = new_exporter(platform.clone(), config)?;
    let outcome = exporter.export_and_share(&target).await;
    drop(exporter);

    match outcome {
        ExportOutcome::Delivered(strategy) => {
            for path in platform.saved_files() {
                println!("{} ({})", path.display(), strategy);
            }
            Ok(())
        }
        ExportOutcome::Dismissed => {
            println!("Compartilhamento cancelado.");
            Ok(())
        }
        ExportOutcome::Failed(reason) => bail!("export failed: {}", reason),
        ExportOutcome::Busy => bail!("another export is running"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Abertos => print_listing(&gateway()?.list_open().await?),
        Command::Finalizados => print_listing(&gateway()?.list_finalized().await?),
        Command::Detalhe { id, json } => {
            let leilao = gateway()?.get_leilao(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&leilao)?);
            } else {
                print_detalhe(&leilao);
            }
        }
        Command::Resumo { id } => {
            let resumo = gateway()?.get_resumo(id).await?;
            let Some(stats) = resumo.stats() else {
                bail!("auction {} has no summary report", id);
            };
            for (label, valor) in linhas_resumo(stats) {
                println!("{:<19} {}", format!("{}:", label), valor);
            }
        }
        Command::Cartaz(args) => cartaz(args).await?,
    }
    Ok(())
}
