use anyhow::{Context, Result};
use certforge::{CertificateRenderer, CertificateRendererBuilder, PathPolicy, RenderConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "certforge", version, about = "Render achievement certificates as PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one certificate from a JSON request file.
    Render {
        #[arg(short, long)]
        input: PathBuf,
        /// Overrides `outputPath` from the request.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        asset_root: Option<PathBuf>,
        #[arg(long)]
        font_dir: Option<PathBuf>,
        /// Refuse local photo paths that escape the asset root.
        #[arg(long)]
        contained_paths: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            asset_root,
            font_dir,
            contained_paths,
        } => {
            let mut request = certforge::load_request(&input)
                .with_context(|| format!("reading request {}", input.display()))?;
            if let Some(output) = output {
                request.output_path = output;
            }

            let mut builder = CertificateRendererBuilder::from_config(RenderConfig::from_env());
            if let Some(root) = asset_root {
                builder = builder.asset_root(root);
            }
            if let Some(dir) = font_dir {
                builder = builder.font_dir(dir);
            }
            if contained_paths {
                builder = builder.path_policy(PathPolicy::Contained);
            }
            let renderer: CertificateRenderer =
                builder.build().context("initializing renderer")?;

            let summary = renderer
                .render(&request)
                .await
                .with_context(|| format!("rendering certificate {}", request.certificate_number))?;
            println!(
                "{} ({} bytes{})",
                summary.output_path.display(),
                summary.bytes,
                if summary.photo_embedded { "" } else { ", no photo" }
            );
        }
    }
    Ok(())
}
